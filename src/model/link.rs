use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Extensions, Server};

/// A design-time link from a response to another operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Link {
    const KIND: &'static str = "link";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            operation_ref: f.take("operationRef")?,
            operation_id: f.take("operationId")?,
            parameters: f.take_or_default("parameters")?,
            request_body: f.take_raw("requestBody"),
            description: f.take("description")?,
            server: f.take("server")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for Link {}

impl Materialize for Link {
    fn materialize(&self, _m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralErrorKind;
    use crate::model::RefOr;
    use crate::types::Dialect;
    use serde_json::json;

    #[test]
    fn link_reference_must_stand_alone() {
        let err = RefOr::<Link>::parse(
            json!({ "$ref": "#/components/links/Next", "operationId": "next" }),
            &Cursor::root(Dialect::OpenApi30),
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            StructuralErrorKind::RefWithSiblings {
                siblings: vec!["operationId".into()]
            }
        );
    }

    #[test]
    fn runtime_expressions_stay_opaque() {
        let link = Link::parse(
            json!({
                "operationId": "getUser",
                "parameters": { "userId": "$response.body#/id" }
            }),
            &Cursor::root(Dialect::OpenApi30),
        )
        .unwrap();
        assert_eq!(link.parameters["userId"], json!("$response.body#/id"));
    }
}
