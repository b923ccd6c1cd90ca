use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{MarshalError, ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Components, Extensions, Paths, SecurityRequirement};

/// Root of an OpenAPI 3.0 description.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub openapi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Paths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Document {
    /// Re-serialize to compact JSON. References are emitted as `$ref` objects.
    pub fn to_json(&self) -> Result<Vec<u8>, MarshalError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<Vec<u8>, MarshalError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }
}

impl Parse for Document {
    const KIND: &'static str = "document";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            openapi: f.take_or_default("openapi")?,
            info: f.take("info")?,
            servers: f.take_or_default("servers")?,
            paths: f.take("paths")?,
            components: f.take("components")?,
            security: f.take("security")?,
            tags: f.take_or_default("tags")?,
            external_docs: f.take("externalDocs")?,
            extensions: f.finish()?,
        })
    }
}

impl Materialize for Document {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        // Components are addressable before anything refers to them.
        if let Some(components) = &self.components {
            components.anchor(m);
        }
        self.paths.materialize(m)?;
        self.components.materialize(m)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Info {
    const KIND: &'static str = "info";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            title: f.take_or_default("title")?,
            description: f.take("description")?,
            terms_of_service: f.take("termsOfService")?,
            contact: f.take("contact")?,
            license: f.take("license")?,
            version: f.take_or_default("version")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Contact {
    const KIND: &'static str = "contact";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            name: f.take("name")?,
            url: f.take("url")?,
            email: f.take("email")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct License {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for License {
    const KIND: &'static str = "license";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            name: f.take_or_default("name")?,
            url: f.take("url")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Server {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Server {
    const KIND: &'static str = "server";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            url: f.take_or_default("url")?,
            description: f.take("description")?,
            variables: f.take_or_default("variables")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for ServerVariable {
    const KIND: &'static str = "server variable";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            enum_values: f.take("enum")?,
            default: f.take_or_default("default")?,
            description: f.take("description")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for ExternalDocs {
    const KIND: &'static str = "external docs";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            description: f.take("description")?,
            url: f.take_or_default("url")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Tag {
    const KIND: &'static str = "tag";

    fn parse(value: serde_json::Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            name: f.take_or_default("name")?,
            description: f.take("description")?,
            external_docs: f.take("externalDocs")?,
            extensions: f.finish()?,
        })
    }
}
