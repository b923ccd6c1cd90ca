use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{ResolutionError, StructuralError};
use crate::materializer::{Materialize, Materializer};
use crate::model::reference::Referable;
use crate::model::strict::{Cursor, Fields, Parse};
use crate::model::{ExternalDocs, Extensions, RefOr};
use crate::types::Dialect;

/// JSON-Schema keywords accepted in every dialect and kept verbatim.
pub const DIALECT_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "definitions",
    "$defs",
    "const",
    "examples",
    "contains",
    "if",
    "then",
    "else",
    "dependencies",
    "patternProperties",
    "propertyNames",
    "$comment",
    "additionalItems",
    "dependentRequired",
    "dependentSchemas",
];

/// Keywords introduced by draft 2019-09 and 2020-12, accepted only in
/// standalone JSON-Schema documents.
pub const LATE_DRAFT_KEYWORDS: &[&str] = &[
    "$anchor",
    "$vocabulary",
    "$recursiveRef",
    "$recursiveAnchor",
    "$dynamicRef",
    "$dynamicAnchor",
    "unevaluatedProperties",
    "unevaluatedItems",
    "prefixItems",
    "minContains",
    "maxContains",
    "contentMediaType",
    "contentEncoding",
    "contentSchema",
];

/// The primitive type names of a schema `type`.
pub const TYPE_NAMES: &[&str] = &["array", "boolean", "integer", "number", "object", "string"];

/// A schema object. Nested schemas are reference holders and may form cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<SchemaTypes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub write_only: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<ExclusiveBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<ExclusiveBound>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RefOr<Schema>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, RefOr<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<RefOr<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<RefOr<Schema>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<Xml>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,

    /// Dialect keywords the typed model does not interpret.
    #[serde(flatten)]
    pub keywords: IndexMap<String, Value>,
    #[serde(flatten)]
    pub extensions: Extensions,

    /// Dialect of the document this schema was read from.
    #[serde(skip)]
    pub dialect: Dialect,
}

impl Schema {
    /// A schema of the single type `name`.
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            type_: Some(SchemaTypes::Single(name.into())),
            ..Self::default()
        }
    }

    /// Declared type names, in declaration order.
    pub fn type_names(&self) -> Vec<&str> {
        match &self.type_ {
            None => Vec::new(),
            Some(SchemaTypes::Single(name)) => vec![name.as_str()],
            Some(SchemaTypes::Multiple(names)) => names.iter().map(String::as_str).collect(),
        }
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_names().contains(&name)
    }

    /// Nested schemas in traversal order, each with its path relative to this schema.
    pub fn subschemas(&self) -> Vec<(Vec<String>, &RefOr<Schema>)> {
        let mut out = Vec::new();
        if let Some(items) = &self.items {
            out.push((vec!["items".to_string()], &**items));
        }
        for (name, property) in &self.properties {
            out.push((vec!["properties".to_string(), name.clone()], property));
        }
        if let Some(AdditionalProperties::Schema(schema)) = &self.additional_properties {
            out.push((vec!["additionalProperties".to_string()], &**schema));
        }
        for (field, list) in [("allOf", &self.all_of), ("anyOf", &self.any_of), ("oneOf", &self.one_of)] {
            for (i, schema) in list.iter().enumerate() {
                out.push((vec![field.to_string(), i.to_string()], schema));
            }
        }
        if let Some(not) = &self.not {
            out.push((vec!["not".to_string()], &**not));
        }
        out
    }
}

impl Parse for Schema {
    const KIND: &'static str = "schema";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let dialect = cursor.dialect();
        let value = match value {
            // Boolean schemas only exist in standalone JSON-Schema documents.
            Value::Bool(accept) if dialect.is_json_schema() => {
                let mut schema = Schema {
                    dialect,
                    ..Schema::default()
                };
                if !accept {
                    schema.not = Some(Box::new(RefOr::Item(Schema {
                        dialect,
                        ..Schema::default()
                    })));
                }
                return Ok(schema);
            }
            other => other,
        };

        let mut f = Fields::new(value, cursor)?;
        let mut keywords = f.take_keywords(DIALECT_KEYWORDS);
        if dialect.is_json_schema() {
            keywords.extend(f.take_keywords(LATE_DRAFT_KEYWORDS));
        }
        // Tuple-form `items` is kept verbatim.
        let items = match f.take_raw("items") {
            Some(tuple @ Value::Array(_)) if dialect.is_json_schema() => {
                keywords.insert("items".to_string(), tuple);
                None
            }
            Some(other) => Some(Box::new(RefOr::parse(other, &f.cursor().join("items"))?)),
            None => None,
        };

        Ok(Self {
            type_: f.take("type")?,
            format: f.take("format")?,
            title: f.take("title")?,
            description: f.take("description")?,
            enum_values: f.take("enum")?,
            default: f.take_raw("default"),
            example: f.take_raw("example"),
            nullable: f.take_or_default("nullable")?,
            read_only: f.take_or_default("readOnly")?,
            write_only: f.take_or_default("writeOnly")?,
            deprecated: f.take_or_default("deprecated")?,
            multiple_of: f.take("multipleOf")?,
            minimum: f.take("minimum")?,
            exclusive_minimum: f.take("exclusiveMinimum")?,
            maximum: f.take("maximum")?,
            exclusive_maximum: f.take("exclusiveMaximum")?,
            min_length: f.take("minLength")?,
            max_length: f.take("maxLength")?,
            pattern: f.take("pattern")?,
            items,
            min_items: f.take("minItems")?,
            max_items: f.take("maxItems")?,
            unique_items: f.take_or_default("uniqueItems")?,
            properties: f.take_or_default("properties")?,
            required: f.take_or_default("required")?,
            additional_properties: f.take("additionalProperties")?,
            min_properties: f.take("minProperties")?,
            max_properties: f.take("maxProperties")?,
            all_of: f.take_or_default("allOf")?,
            any_of: f.take_or_default("anyOf")?,
            one_of: f.take_or_default("oneOf")?,
            not: f.take("not")?,
            discriminator: f.take("discriminator")?,
            xml: f.take("xml")?,
            external_docs: f.take("externalDocs")?,
            keywords,
            extensions: f.finish()?,
            dialect,
        })
    }
}

impl Referable for Schema {
    const REF_SIBLINGS_IGNORED: bool = true;
}

impl Materialize for Schema {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        for (_, schema) in self.subschemas() {
            schema.materialize(m)?;
        }
        Ok(())
    }
}

/// `type` as a single name or, in JSON-Schema dialects, a list of names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SchemaTypes {
    Single(String),
    Multiple(Vec<String>),
}

impl Parse for SchemaTypes {
    const KIND: &'static str = "schema type";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::String(name) => Ok(SchemaTypes::Single(name)),
            list @ Value::Array(_) => Vec::parse(list, cursor).map(SchemaTypes::Multiple),
            other => Err(cursor.invalid_type("string or array", &other)),
        }
    }
}

/// `exclusiveMinimum`/`exclusiveMaximum`: a flag modifying the matching bound
/// (OpenAPI 3.0, draft 4) or a bound of its own (draft 6 and later).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Limit(Number),
}

impl Parse for ExclusiveBound {
    const KIND: &'static str = "exclusive bound";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::Bool(flag) => Ok(ExclusiveBound::Flag(flag)),
            Value::Number(n) => Ok(ExclusiveBound::Limit(n)),
            other => Err(cursor.invalid_type("boolean or number", &other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<RefOr<Schema>>),
}

impl Parse for AdditionalProperties {
    const KIND: &'static str = "additional properties";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::Bool(allowed) => Ok(AdditionalProperties::Allowed(allowed)),
            object @ Value::Object(_) => {
                RefOr::parse(object, cursor).map(|schema| AdditionalProperties::Schema(Box::new(schema)))
            }
            other => Err(cursor.invalid_type("boolean or object", &other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub property_name: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Discriminator {
    const KIND: &'static str = "discriminator";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            property_name: f.take_or_default("propertyName")?,
            mapping: f.take_or_default("mapping")?,
            extensions: f.finish()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Xml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub attribute: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub wrapped: bool,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl Parse for Xml {
    const KIND: &'static str = "xml";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut f = Fields::new(value, cursor)?;
        Ok(Self {
            name: f.take("name")?,
            namespace: f.take("namespace")?,
            prefix: f.take("prefix")?,
            attribute: f.take_or_default("attribute")?,
            wrapped: f.take_or_default("wrapped")?,
            extensions: f.finish()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StructuralErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(value: Value, dialect: Dialect) -> Result<Schema, StructuralError> {
        Schema::parse(value, &Cursor::root(dialect))
    }

    #[test]
    fn openapi_schema_round_trips() {
        let raw = json!({
            "type": "object",
            "required": ["id"],
            "properties": {
                "id": { "type": "integer", "format": "int64", "minimum": 1 },
                "tags": { "type": "array", "items": { "$ref": "#/components/schemas/Tag" } },
                "note": { "type": "string", "nullable": true, "maxLength": 140 }
            },
            "additionalProperties": false,
            "x-order": 3
        });
        let schema = parse(raw.clone(), Dialect::OpenApi30).unwrap();
        assert_eq!(schema.type_names(), vec!["object"]);
        assert_eq!(schema.properties.len(), 3);
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
    }

    #[test]
    fn dialect_keywords_are_kept() {
        let raw = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "http://schemas.example.com/category.json",
            "type": ["string", "null"],
            "const": "books",
            "exclusiveMinimum": 0
        });
        let schema = parse(raw.clone(), Dialect::Draft7).unwrap();
        assert_eq!(schema.type_names(), vec!["string", "null"]);
        assert_eq!(schema.keywords["const"], json!("books"));
        assert_eq!(
            schema.exclusive_minimum,
            Some(ExclusiveBound::Limit(Number::from(0)))
        );
        assert_eq!(serde_json::to_value(&schema).unwrap(), raw);
    }

    #[test]
    fn late_draft_keywords_need_a_json_schema_dialect() {
        let raw = json!({ "prefixItems": [{ "type": "string" }] });
        assert!(parse(raw.clone(), Dialect::Draft202012).is_ok());
        let err = parse(raw, Dialect::OpenApi30).unwrap_err();
        assert_eq!(
            err.kind,
            StructuralErrorKind::UnknownFields {
                fields: vec!["prefixItems".into()]
            }
        );
    }

    #[test]
    fn boolean_schemas() {
        let schema = parse(json!({ "properties": { "any": true, "none": false } }), Dialect::Draft7)
            .unwrap();
        assert!(schema.properties["any"].as_item().unwrap().not.is_none());
        assert!(schema.properties["none"].as_item().unwrap().not.is_some());
        assert!(parse(json!(true), Dialect::OpenApi30).is_err());
    }

    #[test]
    fn tuple_items_stay_raw() {
        let schema = parse(json!({ "items": [{ "type": "string" }] }), Dialect::Draft4).unwrap();
        assert!(schema.items.is_none());
        assert_eq!(schema.keywords["items"], json!([{ "type": "string" }]));
    }

    #[test]
    fn all_of_must_be_an_array() {
        let err = parse(
            json!({ "allOf": { "$ref": "#/components/schemas/schemaArray" } }),
            Dialect::OpenApi30,
        )
        .unwrap_err();
        assert_eq!(err.path, "/allOf");
        assert_eq!(
            err.kind,
            StructuralErrorKind::InvalidType {
                expected: "array",
                actual: "object"
            }
        );
    }

    #[test]
    fn subschemas_in_traversal_order() {
        let schema = parse(
            json!({
                "not": { "type": "null" },
                "properties": { "a": {}, "b": {} },
                "items": { "type": "string" },
                "oneOf": [{}, {}]
            }),
            Dialect::OpenApi30,
        )
        .unwrap();
        let paths: Vec<String> = schema
            .subschemas()
            .into_iter()
            .map(|(path, _)| path.join("/"))
            .collect();
        assert_eq!(
            paths,
            ["items", "properties/a", "properties/b", "oneOf/0", "oneOf/1", "not"]
        );
    }
}
