//! Checking example values against the schema that describes them.
//!
//! A schema object is translated into a draft 2020-12 document and handed to
//! `jsonschema`. OpenAPI-only keywords are mapped onto their JSON-Schema
//! equivalents (`nullable` adds `"null"` to the type, boolean exclusive
//! bounds become numeric ones). Every shared node is translated once into
//! `$defs` and referenced from each use, so cycles become recursive
//! references. Unresolved references accept anything.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Map, Value};

use crate::model::{AdditionalProperties, ExclusiveBound, RefOr, Schema, SchemaTypes};
use crate::validator::ValidationOptions;

const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Keywords copied verbatim from the raw keyword map.
const PASSTHROUGH: &[&str] = &["const", "dependentRequired", "patternProperties", "propertyNames"];

/// Check `value` against `schema`, returning the first violation.
pub(crate) fn check_value(
    schema: &Schema,
    value: &Value,
    options: &ValidationOptions,
) -> Result<(), String> {
    let document = translate_document(schema, options);
    let validator = jsonschema::validator_for(&document)
        .map_err(|e| format!("schema cannot be compiled: {}", e))?;
    let first = validator.iter_errors(value).next().map(|e| {
        let path = e.instance_path.to_string();
        if path.is_empty() {
            e.to_string()
        } else {
            format!("{} at \"{}\"", e, path)
        }
    });
    first.map_or(Ok(()), Err)
}

/// The standalone JSON-Schema document equivalent to `schema`.
fn translate_document(schema: &Schema, options: &ValidationOptions) -> Value {
    let mut translator = Translator {
        options,
        root: schema,
        names: HashMap::new(),
        defs: Map::new(),
    };
    let mut document = translator.schema(schema);
    if let Value::Object(map) = &mut document {
        map.insert("$schema".to_string(), json!(DRAFT_2020_12));
        if !translator.defs.is_empty() {
            map.insert("$defs".to_string(), Value::Object(translator.defs));
        }
    }
    document
}

struct Translator<'a> {
    options: &'a ValidationOptions,
    root: *const Schema,
    /// `$defs` name of each shared node already seen, by address.
    names: HashMap<*const Schema, String>,
    defs: Map<String, Value>,
}

impl Translator<'_> {
    fn holder(&mut self, holder: &RefOr<Schema>) -> Value {
        match holder {
            RefOr::Item(schema) => self.schema(schema),
            RefOr::Node(node) => self.shared(node),
            RefOr::Ref(r) => match r.node() {
                Some(node) => self.shared(&node),
                None => Value::Bool(true),
            },
        }
    }

    fn shared(&mut self, node: &Rc<Schema>) -> Value {
        let address = Rc::as_ptr(node);
        if address == self.root {
            return json!({ "$ref": "#" });
        }
        if let Some(name) = self.names.get(&address) {
            return json!({ "$ref": format!("#/$defs/{}", name) });
        }
        let name = format!("n{}", self.names.len());
        self.names.insert(address, name.clone());
        let value = self.schema(node);
        self.defs.insert(name.clone(), value);
        json!({ "$ref": format!("#/$defs/{}", name) })
    }

    fn schema(&mut self, schema: &Schema) -> Value {
        let mut out = Map::new();

        if let Some(types) = &schema.type_ {
            let mut names: Vec<Value> = match types {
                SchemaTypes::Single(name) => vec![json!(name)],
                SchemaTypes::Multiple(names) => names.iter().map(|n| json!(n)).collect(),
            };
            if schema.nullable && !names.contains(&json!("null")) {
                names.push(json!("null"));
            }
            let value = if names.len() == 1 {
                names.remove(0)
            } else {
                Value::Array(names)
            };
            out.insert("type".into(), value);
        }
        if let Some(values) = &schema.enum_values {
            let mut values = values.clone();
            if schema.nullable && !values.contains(&Value::Null) {
                values.push(Value::Null);
            }
            out.insert("enum".into(), Value::Array(values));
        }
        if let Some(format) = &schema.format {
            out.insert("format".into(), json!(format));
        }

        if let Some(n) = &schema.multiple_of {
            out.insert("multipleOf".into(), json!(n));
        }
        bound(&mut out, "minimum", "exclusiveMinimum", &schema.minimum, &schema.exclusive_minimum);
        bound(&mut out, "maximum", "exclusiveMaximum", &schema.maximum, &schema.exclusive_maximum);

        if let Some(n) = schema.min_length {
            out.insert("minLength".into(), json!(n));
        }
        if let Some(n) = schema.max_length {
            out.insert("maxLength".into(), json!(n));
        }
        if self.options.patterns {
            if let Some(pattern) = &schema.pattern {
                out.insert("pattern".into(), json!(pattern));
            }
        }

        if let Some(items) = &schema.items {
            let items = self.holder(items);
            out.insert("items".into(), items);
        }
        if let Some(n) = schema.min_items {
            out.insert("minItems".into(), json!(n));
        }
        if let Some(n) = schema.max_items {
            out.insert("maxItems".into(), json!(n));
        }
        if schema.unique_items {
            out.insert("uniqueItems".into(), json!(true));
        }

        if !schema.properties.is_empty() {
            let mut properties = Map::new();
            for (name, property) in &schema.properties {
                let property = self.holder(property);
                properties.insert(name.clone(), property);
            }
            out.insert("properties".into(), Value::Object(properties));
        }
        if !schema.required.is_empty() {
            out.insert("required".into(), json!(schema.required));
        }
        match &schema.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                out.insert("additionalProperties".into(), json!(allowed));
            }
            Some(AdditionalProperties::Schema(s)) => {
                let additional = self.holder(s);
                out.insert("additionalProperties".into(), additional);
            }
            None => {}
        }
        if let Some(n) = schema.min_properties {
            out.insert("minProperties".into(), json!(n));
        }
        if let Some(n) = schema.max_properties {
            out.insert("maxProperties".into(), json!(n));
        }

        for (field, list) in [("allOf", &schema.all_of), ("anyOf", &schema.any_of), ("oneOf", &schema.one_of)] {
            if !list.is_empty() {
                let list = list.iter().map(|s| self.holder(s)).collect();
                out.insert(field.into(), Value::Array(list));
            }
        }
        if let Some(not) = &schema.not {
            let not = self.holder(not);
            out.insert("not".into(), not);
        }

        for keyword in PASSTHROUGH {
            if let Some(value) = schema.keywords.get(*keyword) {
                out.insert((*keyword).to_string(), value.clone());
            }
        }

        Value::Object(out)
    }
}

fn bound(
    out: &mut Map<String, Value>,
    inclusive: &str,
    exclusive: &str,
    limit: &Option<serde_json::Number>,
    modifier: &Option<ExclusiveBound>,
) {
    match (limit, modifier) {
        (Some(n), Some(ExclusiveBound::Flag(true))) => {
            out.insert(exclusive.to_string(), json!(n));
        }
        (limit, modifier) => {
            if let Some(n) = limit {
                out.insert(inclusive.to_string(), json!(n));
            }
            if let Some(ExclusiveBound::Limit(n)) = modifier {
                out.insert(exclusive.to_string(), json!(n));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ref;

    fn options() -> ValidationOptions {
        ValidationOptions::default()
    }

    #[test]
    fn nullable_accepts_null() {
        let mut schema = Schema::of_type("string");
        assert!(check_value(&schema, &Value::Null, &options()).is_err());
        schema.nullable = true;
        assert!(check_value(&schema, &Value::Null, &options()).is_ok());
    }

    #[test]
    fn boolean_exclusive_minimum() {
        let mut schema = Schema::of_type("integer");
        schema.minimum = Some(1.into());
        schema.exclusive_minimum = Some(ExclusiveBound::Flag(true));
        assert!(check_value(&schema, &json!(1), &options()).is_err());
        assert!(check_value(&schema, &json!(2), &options()).is_ok());
    }

    #[test]
    fn reports_instance_path() {
        let mut schema = Schema::of_type("object");
        schema.properties.insert("age".into(), RefOr::item(Schema::of_type("integer")));
        let err = check_value(&schema, &json!({ "age": "old" }), &options()).unwrap_err();
        assert!(err.contains("/age"), "{}", err);
    }

    #[test]
    fn pattern_only_when_enabled() {
        let mut schema = Schema::of_type("string");
        schema.pattern = Some("^a".into());
        assert!(check_value(&schema, &json!("b"), &options()).is_err());
        assert!(check_value(&schema, &json!("b"), &options().patterns(false)).is_ok());
    }

    #[test]
    fn cyclic_reference_is_recursive() {
        let node = Rc::new_cyclic(|weak| {
            let back = Ref::new("#/components/schemas/Node");
            back.resolve_cycle(weak.clone());
            let mut schema = Schema::of_type("object");
            schema.properties.insert("next".into(), RefOr::Ref(back));
            schema
        });
        assert!(check_value(&node, &json!({ "next": { "next": {} } }), &options()).is_ok());
        let err = check_value(&node, &json!({ "next": { "next": 3 } }), &options()).unwrap_err();
        assert!(err.contains("/next/next"), "{}", err);
    }

    #[test]
    fn unresolved_reference_accepts_anything() {
        let mut schema = Schema::of_type("object");
        schema
            .properties
            .insert("gone".into(), RefOr::reference("#/components/schemas/Gone"));
        assert!(check_value(&schema, &json!({ "gone": 3 }), &options()).is_ok());
    }

    #[test]
    fn shared_nodes_are_translated_once() {
        // Each level refers to the next one twice.
        let mut next: Option<Rc<Schema>> = None;
        for level in (0..24).rev() {
            let mut schema = Schema::of_type("object");
            if let Some(child) = &next {
                let reference = format!("#/components/schemas/S{}", level + 1);
                for name in ["a", "b"] {
                    schema
                        .properties
                        .insert(name.into(), RefOr::shared(reference.clone(), Rc::clone(child)));
                }
            }
            next = Some(Rc::new(schema));
        }
        let mut top = Schema::default();
        top.all_of.push(RefOr::shared("#/components/schemas/S0", next.unwrap()));

        let document = translate_document(&top, &options());
        assert_eq!(document["$defs"].as_object().unwrap().len(), 24);
        assert!(check_value(&top, &json!({}), &options()).is_ok());
        let err = check_value(&top, &json!({ "a": { "b": 1 } }), &options()).unwrap_err();
        assert!(err.contains("/a/b"), "{}", err);
    }
}
