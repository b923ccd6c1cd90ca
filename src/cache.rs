//! Per-session document cache.
//!
//! Maps canonical locations to their parsed generic trees, and
//! `(location, fragment)` pairs to the typed nodes materialized from them.
//! Entries are only ever inserted; the first writer for a key wins.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use url::Url;

use crate::error::ResolutionError;
use crate::fetch::Fetch;
use crate::pointer::RefTarget;
use crate::syntax::parse_document;
use crate::types::Dialect;

pub struct DocumentCache {
    fetcher: Rc<dyn Fetch>,
    allow_external_refs: bool,
    documents: HashMap<Url, Rc<Value>>,
    nodes: HashMap<RefTarget, Rc<dyn Any>>,
}

impl DocumentCache {
    pub fn new(fetcher: Rc<dyn Fetch>, allow_external_refs: bool) -> Self {
        Self {
            fetcher,
            allow_external_refs,
            documents: HashMap::new(),
            nodes: HashMap::new(),
        }
    }

    pub fn allows_external_refs(&self) -> bool {
        self.allow_external_refs
    }

    /// Register an already-parsed tree. An existing entry is kept.
    pub fn insert_document(&mut self, location: Url, tree: Value) -> Rc<Value> {
        Rc::clone(self.documents.entry(location).or_insert_with(|| Rc::new(tree)))
    }

    pub fn contains_document(&self, location: &Url) -> bool {
        self.documents.contains_key(location)
    }

    /// Number of documents held by the cache.
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// The generic tree at `location`, fetching and parsing it on first use.
    pub fn document(&mut self, location: &Url) -> Result<Rc<Value>, ResolutionError> {
        if let Some(tree) = self.documents.get(location) {
            tracing::trace!(%location, "document cache hit");
            return Ok(Rc::clone(tree));
        }

        tracing::debug!(%location, "fetching document");
        let bytes = self
            .fetcher
            .fetch(location)
            .map_err(|source| ResolutionError::Fetch {
                location: location.to_string(),
                source,
            })?;
        let tree = parse_document(&bytes).map_err(|message| ResolutionError::TargetSyntax {
            location: location.to_string(),
            message,
        })?;
        Ok(self.insert_document(location.clone(), tree))
    }

    /// Dialect of schemas read from the document at `location`.
    pub fn dialect(&self, location: &Url) -> Dialect {
        self.documents
            .get(location)
            .map(|tree| Dialect::detect(tree))
            .unwrap_or_default()
    }

    /// The node materialized for `key`, if any. `Err` when the node exists
    /// but was materialized as a different type.
    pub(crate) fn node<T: 'static>(&self, key: &RefTarget) -> Result<Option<Rc<T>>, ()> {
        match self.nodes.get(key) {
            None => Ok(None),
            Some(node) => Rc::clone(node).downcast::<T>().map(Some).map_err(|_| ()),
        }
    }

    pub(crate) fn insert_node<T: 'static>(&mut self, key: RefTarget, node: Rc<T>) {
        self.nodes.entry(key).or_insert(node);
    }

    /// Number of typed nodes held by the cache.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::pointer::JsonPointer;
    use serde_json::json;
    use std::cell::Cell;

    fn counting_fetcher(calls: Rc<Cell<usize>>) -> Rc<dyn Fetch> {
        Rc::new(move |_: &Url| {
            calls.set(calls.get() + 1);
            Ok::<_, FetchError>(br#"{"$schema": "http://json-schema.org/draft-07/schema#"}"#.to_vec())
        })
    }

    #[test]
    fn fetches_each_location_once() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DocumentCache::new(counting_fetcher(Rc::clone(&calls)), true);
        let url = Url::parse("https://example.org/a.json").unwrap();

        let first = cache.document(&url).unwrap();
        let second = cache.document(&url).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.dialect(&url), Dialect::Draft7);
    }

    #[test]
    fn first_writer_wins() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DocumentCache::new(counting_fetcher(calls), false);
        let url = Url::parse("memory:///root.json").unwrap();
        cache.insert_document(url.clone(), json!({ "a": 1 }));
        let kept = cache.insert_document(url.clone(), json!({ "a": 2 }));
        assert_eq!(*kept, json!({ "a": 1 }));
        assert_eq!(cache.document_count(), 1);
    }

    #[test]
    fn fetch_failure_is_reported_with_location() {
        let fetcher: Rc<dyn Fetch> =
            Rc::new(|_: &Url| Err::<Vec<u8>, _>(FetchError::Other("boom".into())));
        let mut cache = DocumentCache::new(fetcher, true);
        let url = Url::parse("https://example.org/missing.json").unwrap();
        let err = cache.document(&url).unwrap_err();
        assert!(matches!(err, ResolutionError::Fetch { ref location, .. } if location == url.as_str()));
    }

    #[test]
    fn typed_nodes_keep_their_type() {
        let fetcher: Rc<dyn Fetch> = Rc::new(|_: &Url| Ok::<_, FetchError>(Vec::new()));
        let mut cache = DocumentCache::new(fetcher, false);
        let key = RefTarget {
            location: Url::parse("memory:///root.json").unwrap(),
            pointer: JsonPointer::parse("/a").unwrap(),
        };
        cache.insert_node(key.clone(), Rc::new(5_u32));
        assert_eq!(cache.node::<u32>(&key).unwrap().as_deref(), Some(&5));
        assert!(cache.node::<String>(&key).is_err());
        assert_eq!(cache.node_count(), 1);
    }
}
