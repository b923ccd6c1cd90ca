//! Reference materialization.
//!
//! Walks a freshly parsed document and turns every unresolved [`Ref`] into a
//! live pointer. Each `(location, fragment)` pair is decoded at most once per
//! session; later references to it share the same node. A reference to a node
//! that is still being built (a cycle) becomes a weak back-edge to that node,
//! so the strong graph stays acyclic and is released together with the
//! document.
//!
//! Named components of the root document are anchored before the walk: a
//! reference to `#/components/<kind>/<name>` resolves to the component node
//! itself, and the component's contents are materialized the first time it is
//! reached, under the same in-flight rule.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use url::Url;

use crate::cache::DocumentCache;
use crate::error::ResolutionError;
use crate::model::strict::{Cursor, Parse};
use crate::model::{Ref, RefOr, Referable};
use crate::pointer::{resolve_reference, JsonPointer, NavigateError, RefTarget};
use crate::types::json_type_name;

/// Implemented by every model type that may contain reference holders.
pub(crate) trait Materialize {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError>;
}

pub(crate) struct Materializer<'s> {
    cache: &'s mut DocumentCache,
    /// Location of the document being loaded.
    root: Url,
    /// Location of the document the current node was read from.
    base: Url,
    /// Nodes under construction, as `Weak<T>` behind `dyn Any`.
    in_flight: HashMap<RefTarget, Box<dyn Any>>,
    /// Targets whose `$ref` chain is being followed.
    following: HashSet<RefTarget>,
    /// Inline nodes of the root document, by their own location.
    anchors: HashMap<RefTarget, Rc<dyn Any>>,
    /// Materialization state of anchored nodes, by address.
    anchor_states: HashMap<*const (), AnchorState>,
}

enum AnchorState {
    Pending(RefTarget),
    Done,
}

impl<'s> Materializer<'s> {
    pub fn new(cache: &'s mut DocumentCache, root: Url) -> Self {
        Self {
            cache,
            base: root.clone(),
            root,
            in_flight: HashMap::new(),
            following: HashSet::new(),
            anchors: HashMap::new(),
            anchor_states: HashMap::new(),
        }
    }

    /// Register `node` as the value at `pointer` in the root document.
    pub fn anchor<T: 'static>(&mut self, pointer: JsonPointer, node: &Rc<T>) {
        let target = RefTarget {
            location: self.root.clone(),
            pointer,
        };
        self.cache.insert_node(target.clone(), Rc::clone(node));
        self.anchor_states
            .insert(address(node), AnchorState::Pending(target.clone()));
        self.anchors.insert(target, Rc::clone(node) as Rc<dyn Any>);
    }

    /// Materialize the contents of a shared inline node. Anchored nodes are
    /// walked once, with themselves in flight.
    fn materialize_node<T>(&mut self, node: &Rc<T>) -> Result<(), ResolutionError>
    where
        T: Referable + Materialize + 'static,
    {
        let target = match self.anchor_states.get(&address(node)) {
            None => return (**node).materialize(self),
            Some(AnchorState::Done) => return Ok(()),
            Some(AnchorState::Pending(target)) => target.clone(),
        };
        self.anchor_states.insert(address(node), AnchorState::Done);
        self.in_flight
            .insert(target.clone(), Box::new(Rc::downgrade(node)));
        let previous = std::mem::replace(&mut self.base, target.location.clone());
        let result = (**node).materialize(self);
        self.base = previous;
        self.in_flight.remove(&target);
        result
    }

    pub fn run<M: Materialize + ?Sized>(&mut self, node: &M) -> Result<(), ResolutionError> {
        node.materialize(self)
    }

    pub fn resolve<T>(&mut self, holder: &Ref<T>) -> Result<(), ResolutionError>
    where
        T: Referable + Materialize + 'static,
    {
        if holder.is_resolved() {
            return Ok(());
        }

        let reference = holder.reference();
        let target = resolve_reference(reference, &self.base)?;

        if target.location != self.root && !self.cache.allows_external_refs() {
            return Err(ResolutionError::ExternalRefsDisallowed {
                reference: reference.to_string(),
                location: target.location.to_string(),
            });
        }

        if let Some(pending) = self.in_flight.get(&target) {
            let weak = pending
                .downcast_ref::<Weak<T>>()
                .ok_or_else(|| mismatch::<T>(reference))?;
            tracing::trace!(reference, "reference closes a cycle");
            holder.resolve_cycle(Weak::clone(weak));
            return Ok(());
        }

        if let Some(anchored) = self.anchors.get(&target) {
            let node = Rc::clone(anchored)
                .downcast::<T>()
                .map_err(|_| mismatch::<T>(reference))?;
            tracing::trace!(reference, "reference resolves to an anchored node");
            self.materialize_node(&node)?;
            holder.resolve_shared(node);
            return Ok(());
        }

        match self.cache.node::<T>(&target) {
            Ok(Some(node)) => {
                tracing::trace!(reference, "node cache hit");
                holder.resolve_shared(node);
                return Ok(());
            }
            Ok(None) => {}
            Err(()) => return Err(mismatch::<T>(reference)),
        }

        if !self.following.insert(target.clone()) {
            return Err(ResolutionError::AliasCycle {
                reference: reference.to_string(),
            });
        }
        let result = self.fetch_and_build(holder, &target);
        self.following.remove(&target);
        result
    }

    fn fetch_and_build<T>(&mut self, holder: &Ref<T>, target: &RefTarget) -> Result<(), ResolutionError>
    where
        T: Referable + Materialize + 'static,
    {
        let reference = holder.reference();
        let document = self.cache.document(&target.location)?;
        let value = target
            .pointer
            .navigate(&document)
            .map_err(|e| match e {
                NavigateError::NotFound => ResolutionError::NotFound {
                    reference: reference.to_string(),
                    location: target.location.to_string(),
                    pointer: target.pointer.to_string(),
                },
                NavigateError::NotAddressable { at, message } => ResolutionError::NotAddressable {
                    reference: reference.to_string(),
                    location: target.location.to_string(),
                    pointer: at.to_string(),
                    message,
                },
            })?;
        if !value.is_object() {
            return Err(ResolutionError::NotAddressable {
                reference: reference.to_string(),
                location: target.location.to_string(),
                pointer: target.pointer.to_string(),
                message: format!("is a {}, not a {} object", json_type_name(value), T::KIND),
            });
        }

        let origin = if target.location == self.root {
            String::new()
        } else {
            target.location.to_string()
        };
        let cursor = Cursor::fragment(
            &origin,
            target.pointer.clone(),
            self.cache.dialect(&target.location),
        );
        let parsed = RefOr::<T>::parse(value.clone(), &cursor).map_err(|source| {
            ResolutionError::Target {
                reference: reference.to_string(),
                source,
            }
        })?;

        tracing::debug!(
            location = %target.location,
            fragment = %target.pointer,
            kind = T::KIND,
            "materializing reference"
        );

        let previous = std::mem::replace(&mut self.base, target.location.clone());
        let result = match parsed {
            RefOr::Ref(next) => self.resolve(&next).map(|()| {
                holder.resolve_like(&next);
                if let (Some(node), false) = (next.node(), next.is_cycle()) {
                    self.cache.insert_node(target.clone(), node);
                }
            }),
            RefOr::Item(item) => self
                .build(item, target)
                .map(|node| holder.resolve_shared(node)),
            RefOr::Node(node) => {
                holder.resolve_shared(node);
                Ok(())
            }
        };
        self.base = previous;
        result
    }

    fn build<T>(&mut self, item: T, target: &RefTarget) -> Result<Rc<T>, ResolutionError>
    where
        T: Referable + Materialize + 'static,
    {
        let mut failure = None;
        let node = Rc::new_cyclic(|weak: &Weak<T>| {
            self.in_flight
                .insert(target.clone(), Box::new(Weak::clone(weak)));
            if let Err(e) = item.materialize(self) {
                failure = Some(e);
            }
            self.in_flight.remove(target);
            item
        });
        if let Some(e) = failure {
            return Err(e);
        }
        self.cache.insert_node(target.clone(), Rc::clone(&node));
        Ok(node)
    }
}

fn address<T>(node: &Rc<T>) -> *const () {
    Rc::as_ptr(node) as *const ()
}

fn mismatch<T: Referable>(reference: &str) -> ResolutionError {
    ResolutionError::TypeMismatch {
        reference: reference.to_string(),
        expected: T::KIND,
    }
}

impl<T> Materialize for RefOr<T>
where
    T: Referable + Materialize + 'static,
{
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        match self {
            RefOr::Ref(holder) => m.resolve(holder),
            RefOr::Item(item) => item.materialize(m),
            RefOr::Node(node) => m.materialize_node(node),
        }
    }
}

impl<T: Materialize> Materialize for Option<T> {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        match self {
            Some(inner) => inner.materialize(m),
            None => Ok(()),
        }
    }
}

impl<T: Materialize> Materialize for Box<T> {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        (**self).materialize(m)
    }
}

impl<T: Materialize> Materialize for Vec<T> {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.iter().try_for_each(|item| item.materialize(m))
    }
}

impl<T: Materialize> Materialize for IndexMap<String, T> {
    fn materialize(&self, m: &mut Materializer<'_>) -> Result<(), ResolutionError> {
        self.values().try_for_each(|item| item.materialize(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetch::Fetch;
    use crate::model::Schema;
    use crate::types::Dialect;
    use serde_json::json;

    fn root() -> Url {
        Url::parse("memory:///root.json").unwrap()
    }

    fn cache_with(tree: serde_json::Value) -> DocumentCache {
        let fetcher: Rc<dyn Fetch> =
            Rc::new(|url: &Url| Err::<Vec<u8>, _>(FetchError::Other(format!("no {}", url))));
        let mut cache = DocumentCache::new(fetcher, false);
        cache.insert_document(root(), tree);
        cache
    }

    fn schema_at(tree: &serde_json::Value, pointer: &str) -> Schema {
        let value = tree.pointer(pointer).unwrap().clone();
        Schema::parse(value, &Cursor::root(Dialect::OpenApi30)).unwrap()
    }

    #[test]
    fn self_reference_becomes_back_edge() {
        let tree = json!({
            "definitions": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/definitions/Node" } }
                }
            }
        });
        let mut cache = cache_with(tree);
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/Node");
        Materializer::new(&mut cache, root()).run(&holder).unwrap();

        let node = holder.as_reference().unwrap().node().unwrap();
        let next = node.properties["next"].as_reference().unwrap();
        assert!(next.is_cycle());
        assert!(Rc::ptr_eq(&next.node().unwrap(), &node));
    }

    #[test]
    fn anchored_node_is_its_own_reference_target() {
        let tree = json!({
            "components": {
                "schemas": {
                    "Node": { "properties": { "next": { "$ref": "#/components/schemas/Node" } } }
                }
            }
        });
        let node = Rc::new(schema_at(&tree, "/components/schemas/Node"));
        let mut cache = cache_with(tree);
        let holder: RefOr<Schema> = RefOr::reference("#/components/schemas/Node");
        let mut m = Materializer::new(&mut cache, root());
        m.anchor(JsonPointer::parse("/components/schemas/Node").unwrap(), &node);
        m.run(&holder).unwrap();

        assert!(Rc::ptr_eq(&holder.as_reference().unwrap().node().unwrap(), &node));
        let next = node.properties["next"].as_reference().unwrap();
        assert!(next.is_cycle());
        assert!(Rc::ptr_eq(&next.node().unwrap(), &node));
    }

    #[test]
    fn anchored_node_of_another_kind_is_a_mismatch() {
        let node = Rc::new(Schema::default());
        let mut cache = cache_with(json!({ "components": { "schemas": { "S": {} } } }));
        let holder: RefOr<crate::model::Response> = RefOr::reference("#/components/schemas/S");
        let mut m = Materializer::new(&mut cache, root());
        m.anchor(JsonPointer::parse("/components/schemas/S").unwrap(), &node);
        let err = m.run(&holder).unwrap_err();
        assert!(matches!(err, ResolutionError::TypeMismatch { .. }));
    }

    #[test]
    fn repeated_references_share_one_node() {
        let tree = json!({
            "definitions": {
                "Name": { "type": "string" },
                "Pair": {
                    "properties": {
                        "a": { "$ref": "#/definitions/Name" },
                        "b": { "$ref": "#/definitions/Name" }
                    }
                }
            }
        });
        let pair = schema_at(&tree, "/definitions/Pair");
        let mut cache = cache_with(tree);
        Materializer::new(&mut cache, root()).run(&pair).unwrap();

        let a = pair.properties["a"].as_reference().unwrap().node().unwrap();
        let b = pair.properties["b"].as_reference().unwrap().node().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn ref_chain_resolves_to_final_node() {
        let tree = json!({
            "definitions": {
                "Alias": { "$ref": "#/definitions/Real" },
                "Real": { "type": "integer" }
            }
        });
        let mut cache = cache_with(tree);
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/Alias");
        Materializer::new(&mut cache, root()).run(&holder).unwrap();
        let node = holder.value().unwrap();
        assert_eq!(node.type_names(), vec!["integer"]);
    }

    #[test]
    fn pure_ref_cycle_is_an_error() {
        let tree = json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            }
        });
        let mut cache = cache_with(tree);
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/A");
        let err = Materializer::new(&mut cache, root()).run(&holder).unwrap_err();
        assert!(matches!(err, ResolutionError::AliasCycle { .. }));
    }

    #[test]
    fn missing_fragment_is_not_found() {
        let mut cache = cache_with(json!({ "definitions": {} }));
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/Missing");
        let err = Materializer::new(&mut cache, root()).run(&holder).unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound { .. }));
    }

    #[test]
    fn scalar_target_is_not_addressable() {
        let mut cache = cache_with(json!({ "definitions": { "Name": "text" } }));
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/Name");
        let err = Materializer::new(&mut cache, root()).run(&holder).unwrap_err();
        assert!(matches!(err, ResolutionError::NotAddressable { .. }));
    }

    #[test]
    fn external_reference_disallowed_by_default() {
        let mut cache = cache_with(json!({}));
        let holder: RefOr<Schema> = RefOr::reference("http://example.org/foo.json#/Bar");
        let err = Materializer::new(&mut cache, root()).run(&holder).unwrap_err();
        assert!(matches!(err, ResolutionError::ExternalRefsDisallowed { .. }));
        assert!(err.to_string().contains("external references are not allowed"));
    }

    #[test]
    fn target_with_unknown_field_is_structural() {
        let mut cache = cache_with(json!({ "definitions": { "Bad": { "typo": 1 } } }));
        let holder: RefOr<Schema> = RefOr::reference("#/definitions/Bad");
        let err = Materializer::new(&mut cache, root()).run(&holder).unwrap_err();
        match err {
            ResolutionError::Target { source, .. } => {
                assert_eq!(source.path, "#/definitions/Bad");
            }
            other => panic!("expected target error, got {other:?}"),
        }
    }
}
