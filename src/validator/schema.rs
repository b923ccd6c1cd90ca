use std::collections::HashSet;

use serde_json::Number;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{Discriminator, ExclusiveBound, Schema, Xml, TYPE_NAMES};
use crate::validator::examples::check_value;
use crate::validator::{Validate, ValidationContext, Validator};

/// Formats understood for each type. Anything else is only rejected when
/// strict format checking is enabled.
const INTEGER_FORMATS: &[&str] = &["int32", "int64"];
const NUMBER_FORMATS: &[&str] = &["float", "double", "int32", "int64"];
const STRING_FORMATS: &[&str] = &[
    "byte",
    "binary",
    "date",
    "date-time",
    "password",
    "email",
    "uuid",
    "uri",
    "uri-reference",
    "hostname",
    "ipv4",
    "ipv6",
    "time",
    "duration",
    "regex",
];

impl Schema {
    /// Validate this schema and every schema reachable from it.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation in depth-first order.
    pub fn validate(&self, context: &ValidationContext) -> Result<(), ValidationError> {
        Validator::run(context, self)
    }
}

impl Validate for Schema {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        v.extensions(&self.extensions)?;
        check_types(self, v)?;
        check_format(self, v)?;
        check_pattern(self, v)?;
        check_bounds(self, v)?;

        if self.has_type("array") && self.items.is_none() && !self.dialect.is_json_schema() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "items" }));
        }
        if self.read_only && self.write_only {
            return Err(v.error(ValidationErrorKind::MutuallyExclusive {
                first: "readOnly",
                second: "writeOnly",
            }));
        }
        let mut seen = HashSet::new();
        for name in &self.required {
            if !seen.insert(name.as_str()) {
                return Err(v.error_at("required", ValidationErrorKind::Duplicate {
                    what: "required property",
                    name: name.clone(),
                }));
            }
        }
        if matches!(&self.enum_values, Some(values) if values.is_empty()) {
            return Err(v.error_at("enum", ValidationErrorKind::Invalid {
                message: "enum must contain at least one value".to_string(),
            }));
        }
        if let Some(discriminator) = &self.discriminator {
            v.at("discriminator", |v| discriminator.validate_with(v))?;
        }
        if let Some(xml) = &self.xml {
            v.at("xml", |v| xml.validate_with(v))?;
        }
        if let Some(docs) = &self.external_docs {
            v.at("externalDocs", |v| docs.validate_with(v))?;
        }

        for (tokens, schema) in self.subschemas() {
            nested(v, &tokens, |v| schema.validate_with(v))?;
        }

        if v.options().examples {
            let options = *v.options();
            for (field, value) in [("example", &self.example), ("default", &self.default)] {
                if let Some(value) = value {
                    check_value(self, value, &options).map_err(|message| {
                        v.error_at(field, ValidationErrorKind::Schema { field, message })
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Run `f` at the position `tokens` below the current one.
fn nested<F>(v: &mut Validator<'_>, tokens: &[String], f: F) -> Result<(), ValidationError>
where
    F: FnOnce(&mut Validator<'_>) -> Result<(), ValidationError>,
{
    match tokens.split_first() {
        None => f(v),
        Some((head, rest)) => v.at(head.as_str(), |v| nested(v, rest, f)),
    }
}

fn check_types(schema: &Schema, v: &Validator<'_>) -> Result<(), ValidationError> {
    for name in schema.type_names() {
        let known = TYPE_NAMES.contains(&name) || (name == "null" && schema.dialect.is_json_schema());
        if !known {
            return Err(v.error_at("type", ValidationErrorKind::UnsupportedValue {
                field: "type",
                value: name.to_string(),
            }));
        }
    }
    Ok(())
}

fn check_format(schema: &Schema, v: &Validator<'_>) -> Result<(), ValidationError> {
    let Some(format) = schema.format.as_deref() else {
        return Ok(());
    };
    if schema.has_type("integer") && !schema.has_type("number") && matches!(format, "float" | "double") {
        return Err(v.error_at("format", ValidationErrorKind::Invalid {
            message: format!("format \"{}\" is not valid for an integer", format),
        }));
    }
    if v.options().formats {
        let known = INTEGER_FORMATS.contains(&format)
            || NUMBER_FORMATS.contains(&format)
            || STRING_FORMATS.contains(&format);
        if !known {
            return Err(v.error_at("format", ValidationErrorKind::UnsupportedValue {
                field: "format",
                value: format.to_string(),
            }));
        }
    }
    Ok(())
}

fn check_pattern(schema: &Schema, v: &Validator<'_>) -> Result<(), ValidationError> {
    let Some(pattern) = &schema.pattern else {
        return Ok(());
    };
    if !v.options().patterns {
        return Ok(());
    }
    regex::Regex::new(pattern).map(|_| ()).map_err(|e| {
        v.error_at("pattern", ValidationErrorKind::Schema {
            field: "pattern",
            message: e.to_string(),
        })
    })
}

fn check_bounds(schema: &Schema, v: &Validator<'_>) -> Result<(), ValidationError> {
    if let Some(n) = &schema.multiple_of {
        if n.as_f64().map_or(true, |n| n <= 0.0) {
            return Err(v.error_at("multipleOf", ValidationErrorKind::Invalid {
                message: format!("multipleOf must be greater than 0, got {}", n),
            }));
        }
    }

    for (field, bound) in [
        ("exclusiveMinimum", &schema.exclusive_minimum),
        ("exclusiveMaximum", &schema.exclusive_maximum),
    ] {
        let flag_form = schema.dialect.boolean_exclusive_bounds();
        match bound {
            Some(ExclusiveBound::Limit(_)) if flag_form => {
                return Err(v.error_at(field, ValidationErrorKind::Invalid {
                    message: format!("{} must be a boolean in this dialect", field),
                }))
            }
            Some(ExclusiveBound::Flag(_)) if !flag_form => {
                return Err(v.error_at(field, ValidationErrorKind::Invalid {
                    message: format!("{} must be a number in this dialect", field),
                }))
            }
            _ => {}
        }
    }

    ordered(v, "minimum", "maximum", number(&schema.minimum), number(&schema.maximum))?;
    ordered(v, "minLength", "maxLength", count(schema.min_length), count(schema.max_length))?;
    ordered(v, "minItems", "maxItems", count(schema.min_items), count(schema.max_items))?;
    ordered(
        v,
        "minProperties",
        "maxProperties",
        count(schema.min_properties),
        count(schema.max_properties),
    )
}

fn number(n: &Option<Number>) -> Option<f64> {
    n.as_ref().and_then(Number::as_f64)
}

fn count(n: Option<u64>) -> Option<f64> {
    n.map(|n| n as f64)
}

fn ordered(
    v: &Validator<'_>,
    low: &str,
    high: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<(), ValidationError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(v.error_at(low, ValidationErrorKind::Invalid {
            message: format!("{} ({}) is greater than {} ({})", low, min, high, max),
        })),
        _ => Ok(()),
    }
}

impl Validate for Discriminator {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        if self.property_name.is_empty() {
            return Err(v.error(ValidationErrorKind::MissingField { field: "propertyName" }));
        }
        v.extensions(&self.extensions)
    }
}

impl Validate for Xml {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        v.extensions(&self.extensions)
    }
}
