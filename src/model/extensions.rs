use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::types::is_extension;

/// Opaque `x-` fields of a specification object, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions(IndexMap<String, Value>);

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys lacking the extension prefix, sorted. Only reachable for objects
    /// assembled programmatically; strict parsing never produces them.
    pub fn illegal_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .0
            .keys()
            .filter(|k| !is_extension(k))
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl Deref for Extensions {
    type Target = IndexMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Extensions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<IndexMap<String, Value>> for Extensions {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

impl Serialize for Extensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let illegals = self.illegal_keys();
        if !illegals.is_empty() {
            return Err(S::Error::custom(format!(
                "expected \"x-\" prefixes, got: [{}]",
                illegals.join(", ")
            )));
        }
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
