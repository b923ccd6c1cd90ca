use serde::Serialize;
use serde_json::Value;

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{Content, Extensions};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for RequestBody {
    const KIND: &'static str = "request body";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            description: f.take("description")?,
            content: f.take("content")?,
            required: f.take_or_default("required")?,
            extensions: f.finish()?,
        })
    }
}

impl Referable for RequestBody {}

impl Materialize for RequestBody {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.content.materialize(m)
    }
}
