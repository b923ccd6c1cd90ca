//! Fluent construction of model objects without a textual source.
//!
//! Builders skip the strict parse path entirely, so nothing they produce is
//! checked until [`Document::validate`] (or the object's own `validate`) runs.
//! Illegal extension keys set here are reported there.

use serde_json::Value;

use crate::model::{
    Components, Content, Document, Header, Info, Link, MediaType, Operation, Parameter, PathItem,
    Paths, RefOr, RequestBody, Response, Responses, Schema, SchemaTypes, SecurityRequirement,
    Server,
};

/// OpenAPI version written by [`DocumentBuilder`] unless overridden.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";

impl Document {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    pub fn openapi(mut self, version: impl Into<String>) -> Self {
        self.document.openapi = version.into();
        self
    }

    /// Set `info.title` and `info.version`.
    pub fn info(mut self, title: impl Into<String>, version: impl Into<String>) -> Self {
        let info = self.document.info.get_or_insert_with(Info::default);
        info.title = title.into();
        info.version = version.into();
        self
    }

    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.document.servers.push(Server {
            url: url.into(),
            ..Server::default()
        });
        self
    }

    /// Add an operation under `template`, creating the path item as needed.
    ///
    /// An operation already registered for the same method is replaced.
    pub fn operation(mut self, template: impl Into<String>, method: &str, operation: Operation) -> Self {
        let paths = self.document.paths.get_or_insert_with(Paths::new);
        let entry = paths
            .items
            .entry(template.into())
            .or_insert_with(|| RefOr::Item(PathItem::default()));
        if let RefOr::Item(item) = entry {
            item.set_operation(method, operation);
        }
        self
    }

    pub fn path(mut self, template: impl Into<String>, item: impl Into<RefOr<PathItem>>) -> Self {
        self.document
            .paths
            .get_or_insert_with(Paths::new)
            .insert(template, item);
        self
    }

    /// Add a named schema. Inline schemas are held as shared nodes, so
    /// references to `#/components/schemas/<name>` resolve to them.
    pub fn schema(mut self, name: impl Into<String>, schema: impl Into<RefOr<Schema>>) -> Self {
        self.components().schemas.insert(name.into(), schema.into().into_node());
        self
    }

    pub fn response(mut self, name: impl Into<String>, response: impl Into<RefOr<Response>>) -> Self {
        self.components().responses.insert(name.into(), response.into().into_node());
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, parameter: impl Into<RefOr<Parameter>>) -> Self {
        self.components().parameters.insert(name.into(), parameter.into().into_node());
        self
    }

    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.document
            .security
            .get_or_insert_with(Vec::new)
            .push(requirement);
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.document.extensions.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Document {
        let mut document = self.document;
        if document.openapi.is_empty() {
            document.openapi = DEFAULT_OPENAPI_VERSION.to_string();
        }
        document
    }

    fn components(&mut self) -> &mut Components {
        self.document.components.get_or_insert_with(Components::default)
    }
}

impl Operation {
    pub fn builder() -> OperationBuilder {
        OperationBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct OperationBuilder {
    operation: Operation,
}

impl OperationBuilder {
    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.operation.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.operation.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.operation.tags.push(tag.into());
        self
    }

    pub fn parameter(mut self, parameter: impl Into<RefOr<Parameter>>) -> Self {
        self.operation.parameters.push(parameter.into());
        self
    }

    pub fn request_body(mut self, body: impl Into<RefOr<RequestBody>>) -> Self {
        self.operation.request_body = Some(body.into());
        self
    }

    /// Add a response under a status code or `default`.
    pub fn response(mut self, code: impl Into<String>, response: impl Into<RefOr<Response>>) -> Self {
        self.operation
            .responses
            .get_or_insert_with(Responses::empty)
            .insert(code, response);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.operation.deprecated = deprecated;
        self
    }

    pub fn security(mut self, requirement: SecurityRequirement) -> Self {
        self.operation
            .security
            .get_or_insert_with(Vec::new)
            .push(requirement);
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.operation.extensions.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Operation {
        self.operation
    }
}

impl Response {
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.response.description = Some(description.into());
        self
    }

    /// Describe the `application/json` body with a reference to a schema.
    pub fn json_schema_ref(self, reference: impl Into<String>) -> Self {
        self.json_schema(RefOr::reference(reference))
    }

    /// Describe the `application/json` body with a schema.
    pub fn json_schema(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        let content = self.response.content.get_or_insert_with(Content::new);
        content.insert(
            crate::model::JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: Some(schema.into()),
                ..MediaType::default()
            },
        );
        self
    }

    pub fn content(mut self, media_type: impl Into<String>, value: MediaType) -> Self {
        self.response
            .content
            .get_or_insert_with(Content::new)
            .insert(media_type.into(), value);
        self
    }

    pub fn header(mut self, name: impl Into<String>, header: impl Into<RefOr<Header>>) -> Self {
        self.response.headers.insert(name.into(), header.into());
        self
    }

    pub fn link(mut self, name: impl Into<String>, link: impl Into<RefOr<Link>>) -> Self {
        self.response.links.insert(name.into(), link.into());
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.response.extensions.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn schema_type(mut self, name: impl Into<String>) -> Self {
        self.schema.type_ = Some(SchemaTypes::Single(name.into()));
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.schema.format = Some(format.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.schema.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.schema.description = Some(description.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.schema.nullable = nullable;
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schema.properties.insert(name.into(), schema.into());
        self
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.schema.required.push(name.into());
        self
    }

    pub fn items(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schema.items = Some(Box::new(schema.into()));
        self
    }

    pub fn all_of(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schema.all_of.push(schema.into());
        self
    }

    pub fn one_of(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        self.schema.one_of.push(schema.into());
        self
    }

    pub fn enum_values(mut self, values: Vec<Value>) -> Self {
        self.schema.enum_values = Some(values);
        self
    }

    pub fn minimum(mut self, minimum: impl Into<serde_json::Number>) -> Self {
        self.schema.minimum = Some(minimum.into());
        self
    }

    pub fn maximum(mut self, maximum: impl Into<serde_json::Number>) -> Self {
        self.schema.maximum = Some(maximum.into());
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.schema.pattern = Some(pattern.into());
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.schema.example = Some(example);
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.schema.extensions.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl Parameter {
    /// A parameter named `name` in location `location`.
    ///
    /// Path parameters start out required.
    pub fn builder(name: impl Into<String>, location: impl Into<String>) -> ParameterBuilder {
        let location = location.into();
        ParameterBuilder {
            parameter: Parameter {
                name: name.into(),
                required: location == "path",
                location,
                ..Parameter::default()
            },
        }
    }
}

#[derive(Debug)]
pub struct ParameterBuilder {
    parameter: Parameter,
}

impl ParameterBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.parameter.description = Some(description.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.parameter.required = required;
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.parameter.style = Some(style.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<RefOr<Schema>>) -> Self {
        self.parameter.schema = Some(schema.into());
        self
    }

    pub fn example(mut self, example: Value) -> Self {
        self.parameter.example = Some(example);
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameter.extensions.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Parameter {
        self.parameter
    }
}
