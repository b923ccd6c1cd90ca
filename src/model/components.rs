use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{
    Callback, Example, Extensions, Header, Link, Parameter, RefOr, RequestBody, Response, Schema,
    SecurityScheme,
};
use crate::pointer::JsonPointer;

/// Named, reusable objects. Each kind is its own ordered map.
///
/// Inline entries are held as [`RefOr::Node`]: a reference to
/// `#/components/<kind>/<name>` resolves to the entry itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, RefOr<Schema>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOr<Response>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, RefOr<Parameter>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, RefOr<SecurityScheme>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Components {
    const KIND: &'static str = "components";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            schemas: shared(f.take_or_default("schemas")?),
            responses: shared(f.take_or_default("responses")?),
            parameters: shared(f.take_or_default("parameters")?),
            examples: shared(f.take_or_default("examples")?),
            request_bodies: shared(f.take_or_default("requestBodies")?),
            headers: shared(f.take_or_default("headers")?),
            security_schemes: shared(f.take_or_default("securitySchemes")?),
            links: shared(f.take_or_default("links")?),
            callbacks: shared(f.take_or_default("callbacks")?),
            extensions: f.finish()?,
        })
    }
}

impl Components {
    /// Move every owned inline entry behind shared ownership.
    ///
    /// Entries inserted by hand as [`RefOr::Item`] are not addressable until
    /// this runs; loading and [`Loader::resolve_document`](crate::Loader::resolve_document)
    /// call it for you.
    pub fn share_inline(&mut self) {
        share(&mut self.schemas);
        share(&mut self.responses);
        share(&mut self.parameters);
        share(&mut self.examples);
        share(&mut self.request_bodies);
        share(&mut self.headers);
        share(&mut self.security_schemes);
        share(&mut self.links);
        share(&mut self.callbacks);
    }

    /// Register every shared entry under its own location.
    pub(crate) fn anchor(&self, m: &mut Materializer<'_>) {
        anchor_kind(m, "schemas", &self.schemas);
        anchor_kind(m, "responses", &self.responses);
        anchor_kind(m, "parameters", &self.parameters);
        anchor_kind(m, "examples", &self.examples);
        anchor_kind(m, "requestBodies", &self.request_bodies);
        anchor_kind(m, "headers", &self.headers);
        anchor_kind(m, "securitySchemes", &self.security_schemes);
        anchor_kind(m, "links", &self.links);
        anchor_kind(m, "callbacks", &self.callbacks);
    }
}

fn shared<T>(map: IndexMap<String, RefOr<T>>) -> IndexMap<String, RefOr<T>> {
    map.into_iter()
        .map(|(name, holder)| (name, holder.into_node()))
        .collect()
}

fn share<T>(map: &mut IndexMap<String, RefOr<T>>) {
    *map = shared(std::mem::take(map));
}

fn anchor_kind<T: 'static>(m: &mut Materializer<'_>, kind: &str, map: &IndexMap<String, RefOr<T>>) {
    let base = JsonPointer::root().join("components").join(kind);
    for (name, holder) in map {
        if let Some(node) = holder.as_node() {
            m.anchor(base.join(name.as_str()), node);
        }
    }
}

impl Materialize for Components {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.schemas.materialize(m)?;
        self.responses.materialize(m)?;
        self.parameters.materialize(m)?;
        self.examples.materialize(m)?;
        self.request_bodies.materialize(m)?;
        self.headers.materialize(m)?;
        self.security_schemes.materialize(m)?;
        self.links.materialize(m)?;
        self.callbacks.materialize(m)
    }
}
