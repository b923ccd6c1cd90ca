//! Strict decoding of generic JSON trees into the typed model.
//!
//! Every object type consumes its known fields by name, routes the remaining
//! `x-` fields into its extension map, and rejects anything else with the full
//! sorted list of offending names.

use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::error::{StructuralError, StructuralErrorKind};
use crate::model::Extensions;
use crate::pointer::JsonPointer;
use crate::types::{is_extension, json_type_name, Dialect};

/// Position of the node being decoded.
#[derive(Debug, Clone)]
pub struct Cursor {
    origin: Option<Rc<str>>,
    pointer: JsonPointer,
    dialect: Dialect,
}

impl Cursor {
    /// Cursor at the root of the document being loaded.
    pub fn root(dialect: Dialect) -> Self {
        Self {
            origin: None,
            pointer: JsonPointer::root(),
            dialect,
        }
    }

    /// Cursor at a fragment of a referenced document.
    pub fn fragment(origin: &str, pointer: JsonPointer, dialect: Dialect) -> Self {
        Self {
            origin: Some(Rc::from(origin)),
            pointer,
            dialect,
        }
    }

    pub fn join(&self, token: &str) -> Self {
        Self {
            origin: self.origin.clone(),
            pointer: self.pointer.join(token),
            dialect: self.dialect,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn path(&self) -> String {
        match &self.origin {
            Some(origin) => format!("{}#{}", origin, self.pointer),
            None => self.pointer.to_string(),
        }
    }

    pub fn error(&self, kind: StructuralErrorKind) -> StructuralError {
        StructuralError::new(self.path(), kind)
    }

    pub fn invalid_type(&self, expected: &'static str, actual: &Value) -> StructuralError {
        self.error(StructuralErrorKind::InvalidType {
            expected,
            actual: json_type_name(actual),
        })
    }
}

/// Decode a value of the typed model from a generic tree.
pub trait Parse: Sized {
    /// Name used in error messages.
    const KIND: &'static str;

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError>;
}

impl Parse for String {
    const KIND: &'static str = "string";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(cursor.invalid_type("string", &other)),
        }
    }
}

impl Parse for bool {
    const KIND: &'static str = "boolean";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(cursor.invalid_type("boolean", &other)),
        }
    }
}

impl Parse for Number {
    const KIND: &'static str = "number";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::Number(n) => Ok(n),
            other => Err(cursor.invalid_type("number", &other)),
        }
    }
}

impl Parse for u64 {
    const KIND: &'static str = "non-negative integer";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match &value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    return Ok(u);
                }
                // 3.0 descriptions written by tools sometimes carry `1.0`.
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                        Ok(f as u64)
                    }
                    _ => Err(cursor.error(StructuralErrorKind::Invalid {
                        message: format!("expected non-negative integer, got {}", n),
                    })),
                }
            }
            other => Err(cursor.invalid_type("non-negative integer", other)),
        }
    }
}

impl Parse for Value {
    const KIND: &'static str = "value";

    fn parse(value: Value, _cursor: &Cursor) -> Result<Self, StructuralError> {
        Ok(value)
    }
}

impl<T: Parse> Parse for Vec<T> {
    const KIND: &'static str = "array";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::parse(item, &cursor.join(&i.to_string())))
                .collect(),
            other => Err(cursor.invalid_type("array", &other)),
        }
    }
}

impl<T: Parse> Parse for IndexMap<String, T> {
    const KIND: &'static str = "object";

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let map = expect_object(value, cursor)?;
        let mut out = IndexMap::with_capacity(map.len());
        for (key, item) in map {
            let parsed = T::parse(item, &cursor.join(&key))?;
            out.insert(key, parsed);
        }
        Ok(out)
    }
}

impl<T: Parse> Parse for Box<T> {
    const KIND: &'static str = T::KIND;

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        T::parse(value, cursor).map(Box::new)
    }
}

pub(crate) fn expect_object(
    value: Value,
    cursor: &Cursor,
) -> Result<Map<String, Value>, StructuralError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(cursor.invalid_type("object", &other)),
    }
}

/// The raw field set of one object, consumed field by field.
pub struct Fields<'c> {
    map: Map<String, Value>,
    cursor: &'c Cursor,
}

impl<'c> Fields<'c> {
    pub fn new(value: Value, cursor: &'c Cursor) -> Result<Self, StructuralError> {
        Ok(Self {
            map: expect_object(value, cursor)?,
            cursor,
        })
    }

    pub fn from_map(map: Map<String, Value>, cursor: &'c Cursor) -> Self {
        Self { map, cursor }
    }

    pub fn cursor(&self) -> &Cursor {
        self.cursor
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Remove and decode an optional field.
    pub fn take<T: Parse>(&mut self, name: &str) -> Result<Option<T>, StructuralError> {
        match self.map.remove(name) {
            Some(value) => T::parse(value, &self.cursor.join(name)).map(Some),
            None => Ok(None),
        }
    }

    /// Remove and decode a field, falling back to its zero value.
    pub fn take_or_default<T: Parse + Default>(&mut self, name: &str) -> Result<T, StructuralError> {
        Ok(self.take(name)?.unwrap_or_default())
    }

    /// Remove a field without decoding it.
    pub fn take_raw(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    /// Move every remaining field named in `keywords` into a raw side map.
    pub fn take_keywords(&mut self, keywords: &[&str]) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        let names: Vec<String> = self
            .map
            .keys()
            .filter(|k| keywords.contains(&k.as_str()))
            .cloned()
            .collect();
        for name in names {
            if let Some(value) = self.map.remove(&name) {
                out.insert(name, value);
            }
        }
        out
    }

    /// Route leftover `x-` fields to extensions; any other leftover is an error.
    pub fn finish(self) -> Result<Extensions, StructuralError> {
        let mut extensions = Extensions::default();
        let mut unknowns = Vec::new();
        for (name, value) in self.map {
            if is_extension(&name) {
                extensions.insert(name, value);
            } else {
                unknowns.push(name);
            }
        }
        if !unknowns.is_empty() {
            unknowns.sort();
            return Err(self.cursor.error(StructuralErrorKind::UnknownFields { fields: unknowns }));
        }
        Ok(extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finish_routes_extensions() {
        let cursor = Cursor::root(Dialect::OpenApi30);
        let mut fields = Fields::new(json!({ "name": "a", "x-one": 1 }), &cursor).unwrap();
        let name: Option<String> = fields.take("name").unwrap();
        assert_eq!(name.as_deref(), Some("a"));
        let extensions = fields.finish().unwrap();
        assert_eq!(extensions.get("x-one"), Some(&json!(1)));
    }

    #[test]
    fn finish_lists_unknown_fields_sorted() {
        let cursor = Cursor::root(Dialect::OpenApi30).join("info");
        let fields = Fields::new(json!({ "zeta": 1, "alpha": 2, "x-ok": 3 }), &cursor).unwrap();
        let err = fields.finish().unwrap_err();
        assert_eq!(err.path, "/info");
        assert_eq!(
            err.kind,
            StructuralErrorKind::UnknownFields {
                fields: vec!["alpha".into(), "zeta".into()]
            }
        );
    }

    #[test]
    fn wrong_kind_names_the_field() {
        let cursor = Cursor::root(Dialect::OpenApi30);
        let mut fields = Fields::new(json!({ "tags": {} }), &cursor).unwrap();
        let err = fields.take::<Vec<String>>("tags").unwrap_err();
        assert_eq!(err.path, "/tags");
        assert_eq!(
            err.kind,
            StructuralErrorKind::InvalidType {
                expected: "array",
                actual: "object"
            }
        );
    }

    #[test]
    fn fragment_cursor_path_includes_origin() {
        let cursor = Cursor::fragment(
            "http://example.org/pet.json",
            JsonPointer::parse("/Pet").unwrap(),
            Dialect::Draft7,
        );
        assert_eq!(cursor.join("type").path(), "http://example.org/pet.json#/Pet/type");
        assert_eq!(cursor.dialect(), Dialect::Draft7);
    }

    #[test]
    fn integral_float_is_accepted_as_count() {
        let cursor = Cursor::root(Dialect::OpenApi30);
        assert_eq!(u64::parse(json!(3.0), &cursor).unwrap(), 3);
        assert!(u64::parse(json!(-1), &cursor).is_err());
    }
}
