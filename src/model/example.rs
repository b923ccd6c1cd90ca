use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::Extensions;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Example {
    const KIND: &'static str = "example";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            summary: f.take("summary")?,
            description: f.take("description")?,
            value: f.take_raw("value"),
            external_value: f.take("externalValue")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for Example {}

// Examples hold opaque values only.
impl Materialize for Example {
    fn materialize(&self, _m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        Ok(())
    }
}
