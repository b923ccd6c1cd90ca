//! Typed OpenAPI 3.0 object model.
//!
//! Every object parses strictly from a generic JSON tree (see [`strict`]) and
//! serializes back with its extensions. Values that may be written as a
//! `$ref` are held in a [`RefOr`].

mod components;
mod content;
mod document;
mod example;
mod extensions;
mod link;
mod parameter;
mod paths;
pub mod reference;
mod request_body;
mod response;
mod schema;
mod security;
pub mod strict;

pub use components::Components;
pub use content::{Content, Encoding, MediaType, JSON_MEDIA_TYPE};
pub use document::{Contact, Document, ExternalDocs, Info, License, Server, ServerVariable, Tag};
pub use example::Example;
pub use extensions::Extensions;
pub use link::Link;
pub use parameter::{Header, Parameter};
pub use paths::{Callback, Operation, PathItem, Paths};
pub use reference::{Ref, RefOr, RefState, Referable, Target, REF_KEY};
pub use request_body::RequestBody;
pub use response::{Response, Responses, DEFAULT_RESPONSE};
pub use schema::{
    AdditionalProperties, Discriminator, ExclusiveBound, Schema, SchemaTypes, Xml,
    DIALECT_KEYWORDS, TYPE_NAMES,
};
pub use security::{OAuthFlow, OAuthFlows, SecurityRequirement, SecurityScheme};
pub use strict::{Cursor, Parse};

use crate::types::Dialect;

/// Implement `Deserialize` through the strict parse path.
///
/// The value is read into a generic tree first, so unknown fields are
/// rejected exactly as they are during a load. References are left
/// unresolved.
macro_rules! strict_deserialize {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'de> serde::Deserialize<'de> for $ty {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                    let dialect = Dialect::detect(&value);
                    <$ty as Parse>::parse(value, &Cursor::root(dialect))
                        .map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

strict_deserialize!(
    Document,
    Info,
    Contact,
    License,
    Server,
    ServerVariable,
    ExternalDocs,
    Tag,
    Paths,
    PathItem,
    Operation,
    Callback,
    Parameter,
    Header,
    RequestBody,
    Responses,
    Response,
    Content,
    MediaType,
    Encoding,
    Example,
    Link,
    Components,
    SecurityScheme,
    OAuthFlows,
    OAuthFlow,
    SecurityRequirement,
    Schema,
    Discriminator,
    Xml,
);
