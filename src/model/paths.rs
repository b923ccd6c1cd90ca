use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{expect_object, Cursor, Fields, Parse};
use crate::model::{
    ExternalDocs, Extensions, Parameter, RefOr, RequestBody, Responses, SecurityRequirement,
    Server,
};
use crate::types::is_extension;

/// Path templates mapped to their path items, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Paths {
    #[serde(flatten)]
    pub items: IndexMap<String, RefOr<PathItem>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, template: &str) -> Option<&RefOr<PathItem>> {
        self.items.get(template)
    }

    pub fn insert(&mut self, template: impl Into<String>, item: impl Into<RefOr<PathItem>>) {
        self.items.insert(template.into(), item.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Split an object into its `x-` fields and the remaining entries.
pub(crate) fn parse_keyed<T: Parse>(
    value: Value,
    cursor: &Cursor,
) -> Result<(IndexMap<String, T>, Extensions), StructuralError> {
    let map = expect_object(value, cursor)?;
    let mut items = IndexMap::new();
    let mut extensions = Extensions::new();
    for (key, value) in map {
        if is_extension(&key) {
            extensions.insert(key, value);
        } else {
            let parsed = T::parse(value, &cursor.join(&key))?;
            items.insert(key, parsed);
        }
    }
    Ok((items, extensions))
}

impl Parse for Paths {
    const KIND: &'static str = "paths";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let (items, extensions) = parse_keyed(value, cursor)?;
        Ok(Self { items, extensions })
    }
}

impl Materialize for Paths {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.items.materialize(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl PathItem {
    /// Operations in method order: get, put, post, delete, options, head, patch, trace.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.as_ref().map(|op| (method, op)))
    }

    pub fn set_operation(&mut self, method: &str, operation: Operation) -> bool {
        let slot = match method.to_ascii_lowercase().as_str() {
            "get" => &mut self.get,
            "put" => &mut self.put,
            "post" => &mut self.post,
            "delete" => &mut self.delete,
            "options" => &mut self.options,
            "head" => &mut self.head,
            "patch" => &mut self.patch,
            "trace" => &mut self.trace,
            _ => return false,
        };
        *slot = Some(operation);
        true
    }
}

impl Parse for PathItem {
    const KIND: &'static str = "path item";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            summary: f.take("summary")?,
            description: f.take("description")?,
            get: f.take("get")?,
            put: f.take("put")?,
            post: f.take("post")?,
            delete: f.take("delete")?,
            options: f.take("options")?,
            head: f.take("head")?,
            patch: f.take("patch")?,
            trace: f.take("trace")?,
            servers: f.take_or_default("servers")?,
            parameters: f.take_or_default("parameters")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for PathItem {}

impl Materialize for PathItem {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.parameters.materialize(m)?;
        for (_, operation) in self.operations() {
            operation.materialize(m)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RefOr<Parameter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBody>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<Responses>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Operation {
    const KIND: &'static str = "operation";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            tags: f.take_or_default("tags")?,
            summary: f.take("summary")?,
            description: f.take("description")?,
            external_docs: f.take("externalDocs")?,
            operation_id: f.take("operationId")?,
            parameters: f.take_or_default("parameters")?,
            request_body: f.take("requestBody")?,
            responses: f.take("responses")?,
            callbacks: f.take_or_default("callbacks")?,
            deprecated: f.take_or_default("deprecated")?,
            security: f.take("security")?,
            servers: f.take_or_default("servers")?,
            extensions: f.finish()?,
        })
    }
}

impl Materialize for Operation {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.parameters.materialize(m)?;
        self.request_body.materialize(m)?;
        self.responses.materialize(m)?;
        self.callbacks.materialize(m)
    }
}

/// Runtime expressions mapped to the path items describing the callback requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Callback {
    #[serde(flatten)]
    pub items: IndexMap<String, RefOr<PathItem>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Callback {
    const KIND: &'static str = "callback";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let (items, extensions) = parse_keyed(value, cursor)?;
        Ok(Self { items, extensions })
    }
}

impl Referable for Callback {}

impl Materialize for Callback {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.items.materialize(m)
    }
}
