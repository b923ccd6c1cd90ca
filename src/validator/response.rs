use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{
    Content, Encoding, Example, Header, Link, MediaType, Parameter, RefOr, RequestBody, Response,
    Responses, Schema,
};
use crate::validator::examples::check_value;
use crate::validator::{entries, Validate, ValidationContext, Validator};

impl Responses {
    /// # Errors
    ///
    /// Fails when the collection is empty or when any entry is invalid.
    pub fn validate(&self, context: &ValidationContext) -> Result<(), ValidationError> {
        Validator::run(context, self)
    }
}

impl Response {
    /// # Errors
    ///
    /// Fails when `description` is absent, whatever else the response holds.
    pub fn validate(&self, context: &ValidationContext) -> Result<(), ValidationError> {
        Validator::run(context, self)
    }
}

impl Validate for Responses {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.items.is_empty() {
            return Err(v.error(ValidationErrorKind::EmptyResponses));
        }
        for (code, response) in &self.items {
            v.at(code.as_str(), |v| response.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Response {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.description.is_none() {
            return Err(v.error(ValidationErrorKind::MissingDescription));
        }
        v.extensions(&self.extensions)?;
        if let Some(content) = &self.content {
            v.at("content", |v| content.validate_with(v))?;
        }
        v.each("headers", entries(&self.headers))?;
        v.each("links", entries(&self.links))
    }
}

impl Validate for RequestBody {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        match &self.content {
            Some(content) => v.at("content", |v| content.validate_with(v))?,
            None => return Err(v.error(ValidationErrorKind::MissingField { field: "content" })),
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Content {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        for (media_type, value) in self.iter() {
            v.at(media_type.as_str(), |v| value.validate_with(v))?;
        }
        Ok(())
    }
}

impl Validate for MediaType {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        exclusive_examples(self.example.as_ref(), &self.examples, v)?;
        if let Some(schema) = &self.schema {
            v.at("schema", |v| schema.validate_with(v))?;
        }
        v.each("examples", entries(&self.examples))?;
        v.each("encoding", entries(&self.encoding))?;
        check_examples(self.schema.as_ref(), self.example.as_ref(), &self.examples, v)?;
        v.extensions(&self.extensions)
    }
}

impl Validate for Encoding {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if let Some(style) = &self.style {
            if !matches!(style.as_str(), "form" | "spaceDelimited" | "pipeDelimited" | "deepObject") {
                return Err(v.error_at("style", ValidationErrorKind::UnsupportedValue {
                    field: "encoding style",
                    value: style.clone(),
                }));
            }
        }
        v.each("headers", entries(&self.headers))?;
        v.extensions(&self.extensions)
    }
}

/// Serialization styles allowed for each parameter location.
fn styles_for(location: &str) -> &'static [&'static str] {
    match location {
        "query" => &["form", "spaceDelimited", "pipeDelimited", "deepObject"],
        "path" => &["matrix", "label", "simple"],
        "header" => &["simple"],
        "cookie" => &["form"],
        _ => &[],
    }
}

impl Validate for Parameter {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "name" }));
        }
        if self.location.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "in" }));
        }
        if !Parameter::LOCATIONS.contains(&self.location.as_str()) {
            return Err(v.error_at("in", ValidationErrorKind::UnsupportedValue {
                field: "parameter location",
                value: self.location.clone(),
            }));
        }
        if self.location == "path" && !self.required {
            return Err(v.error_at("required", ValidationErrorKind::Invalid {
                message: format!("path parameter \"{}\" must be required", self.name),
            }));
        }
        if let Some(style) = &self.style {
            if !styles_for(&self.location).contains(&style.as_str()) {
                return Err(v.error_at("style", ValidationErrorKind::UnsupportedValue {
                    field: "style",
                    value: format!("{} (in {})", style, self.location),
                }));
            }
        }
        check_serialization(
            self.schema.as_ref(),
            self.content.as_ref(),
            self.example.as_ref(),
            &self.examples,
            v,
        )?;
        v.extensions(&self.extensions)
    }
}

impl Validate for Header {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if let Some(style) = &self.style {
            if style != "simple" {
                return Err(v.error_at("style", ValidationErrorKind::UnsupportedValue {
                    field: "header style",
                    value: style.clone(),
                }));
            }
        }
        check_serialization(
            self.schema.as_ref(),
            self.content.as_ref(),
            self.example.as_ref(),
            &self.examples,
            v,
        )?;
        v.extensions(&self.extensions)
    }
}

/// Rules shared by parameters and headers: exactly one of `schema` and
/// `content`, a single-entry `content`, and consistent examples.
fn check_serialization(
    schema: Option<&RefOr<Schema>>,
    content: Option<&Content>,
    example: Option<&Value>,
    examples: &IndexMap<String, RefOr<Example>>,
    v: &mut Validator<'_>,
) -> Result<(), ValidationError> {
    match (schema, content) {
        (Some(_), Some(_)) => {
            return Err(v.error(ValidationErrorKind::MutuallyExclusive {
                first: "schema",
                second: "content",
            }))
        }
        (None, None) => {
            return Err(v.error(ValidationErrorKind::OneRequired {
                first: "schema",
                second: "content",
            }))
        }
        (Some(schema), None) => v.at("schema", |v| schema.validate_with(v))?,
        (None, Some(content)) => {
            if content.len() != 1 {
                return Err(v.error_at("content", ValidationErrorKind::Invalid {
                    message: format!("content must hold exactly one entry, got {}", content.len()),
                }));
            }
            v.at("content", |v| content.validate_with(v))?;
        }
    }
    exclusive_examples(example, examples, v)?;
    v.each("examples", entries(examples))?;
    check_examples(schema, example, examples, v)
}

fn exclusive_examples(
    example: Option<&Value>,
    examples: &IndexMap<String, RefOr<Example>>,
    v: &Validator<'_>,
) -> Result<(), ValidationError> {
    if example.is_some() && !examples.is_empty() {
        return Err(v.error(ValidationErrorKind::MutuallyExclusive {
            first: "example",
            second: "examples",
        }));
    }
    Ok(())
}

/// Check `example` and every inline example value against `schema`.
fn check_examples(
    schema: Option<&RefOr<Schema>>,
    example: Option<&Value>,
    examples: &IndexMap<String, RefOr<Example>>,
    v: &mut Validator<'_>,
) -> Result<(), ValidationError> {
    if !v.options().examples {
        return Ok(());
    }
    let Some(schema) = schema.and_then(RefOr::value) else {
        return Ok(());
    };
    let options = *v.options();
    if let Some(example) = example {
        check_value(&schema, example, &options).map_err(|message| {
            v.error_at("example", ValidationErrorKind::Schema {
                field: "example",
                message,
            })
        })?;
    }
    for (name, holder) in examples {
        let Some(value) = holder.value().and_then(|e| e.value.clone()) else {
            continue;
        };
        v.at("examples", |v| {
            v.at(name.as_str(), |v| {
                check_value(&schema, &value, &options).map_err(|message| {
                    v.error_at("value", ValidationErrorKind::Schema {
                        field: "example",
                        message,
                    })
                })
            })
        })?;
    }
    Ok(())
}

impl Validate for Example {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.value.is_some() && self.external_value.is_some() {
            return Err(v.error(ValidationErrorKind::MutuallyExclusive {
                first: "value",
                second: "externalValue",
            }));
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Link {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        match (&self.operation_id, &self.operation_ref) {
            (Some(_), Some(_)) => {
                return Err(v.error(ValidationErrorKind::MutuallyExclusive {
                    first: "operationId",
                    second: "operationRef",
                }))
            }
            (None, None) => {
                return Err(v.error(ValidationErrorKind::OneRequired {
                    first: "operationId",
                    second: "operationRef",
                }))
            }
            _ => {}
        }
        if let Some(server) = &self.server {
            v.at("server", |v| server.validate_with(v))?;
        }
        v.extensions(&self.extensions)
    }
}
