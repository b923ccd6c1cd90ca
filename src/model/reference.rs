//! Reference holders: values that are either written inline or point at a
//! shared node elsewhere in the document graph.

use std::cell::OnceCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{StructuralError, StructuralErrorKind};
use crate::model::strict::{Cursor, Parse};

/// Types that may stand behind a `$ref`.
pub trait Referable: Parse {
    /// OpenAPI 3.0 ignores siblings next to a schema `$ref`. Every other
    /// reference object must be a lone `$ref`.
    const REF_SIBLINGS_IGNORED: bool = false;
}

/// Key of the reference field.
pub const REF_KEY: &str = "$ref";

enum Link<T> {
    Shared(Rc<T>),
    /// Back-edge to a node that was still under construction when the
    /// reference was materialized.
    Cycle(Weak<T>),
}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        match self {
            Link::Shared(rc) => Link::Shared(Rc::clone(rc)),
            Link::Cycle(weak) => Link::Cycle(Weak::clone(weak)),
        }
    }
}

/// A `$ref` expression and, once materialized, the node it designates.
///
/// Resolution happens at most once and is never undone.
pub struct Ref<T> {
    reference: String,
    target: OnceCell<Link<T>>,
}

/// Resolution state of a [`Ref`].
pub enum RefState<T> {
    Unresolved,
    /// The back-edge target has been dropped.
    Dangling,
    Resolved(Rc<T>),
}

impl<T> Ref<T> {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            target: OnceCell::new(),
        }
    }

    /// A reference already pointing at `node`.
    pub fn resolved(reference: impl Into<String>, node: Rc<T>) -> Self {
        let target = OnceCell::new();
        let _ = target.set(Link::Shared(node));
        Self {
            reference: reference.into(),
            target,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// True when this reference closes a cycle back to an ancestor.
    pub fn is_cycle(&self) -> bool {
        matches!(self.target.get(), Some(Link::Cycle(_)))
    }

    pub fn state(&self) -> RefState<T> {
        match self.target.get() {
            None => RefState::Unresolved,
            Some(Link::Shared(rc)) => RefState::Resolved(Rc::clone(rc)),
            Some(Link::Cycle(weak)) => match weak.upgrade() {
                Some(rc) => RefState::Resolved(rc),
                None => RefState::Dangling,
            },
        }
    }

    /// The resolved node, if any.
    pub fn node(&self) -> Option<Rc<T>> {
        match self.state() {
            RefState::Resolved(rc) => Some(rc),
            _ => None,
        }
    }

    pub(crate) fn resolve_shared(&self, node: Rc<T>) {
        let _ = self.target.set(Link::Shared(node));
    }

    pub(crate) fn resolve_cycle(&self, node: Weak<T>) {
        let _ = self.target.set(Link::Cycle(node));
    }

    /// Adopt the resolution of another holder (for `$ref` chains).
    pub(crate) fn resolve_like(&self, other: &Ref<T>) {
        if let Some(link) = other.target.get() {
            let _ = self.target.set(link.clone());
        }
    }
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        let target = OnceCell::new();
        if let Some(link) = self.target.get() {
            let _ = target.set(link.clone());
        }
        Self {
            reference: self.reference.clone(),
            target,
        }
    }
}

impl<T> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.target.get() {
            None => "unresolved",
            Some(Link::Shared(_)) => "resolved",
            Some(Link::Cycle(_)) => "cycle",
        };
        f.debug_struct("Ref")
            .field("reference", &self.reference)
            .field("state", &state)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Ref<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.reference != other.reference {
            return false;
        }
        match (self.target.get(), other.target.get()) {
            (None, None) => true,
            (Some(Link::Shared(a)), Some(Link::Shared(b))) => Rc::ptr_eq(a, b) || **a == **b,
            // Cycles are compared by their reference alone; comparing the
            // targets would recurse forever.
            (Some(Link::Cycle(_)), Some(Link::Cycle(_))) => true,
            _ => false,
        }
    }
}

/// Either an inline value or a reference to a shared one.
#[derive(Debug, Clone, PartialEq)]
pub enum RefOr<T> {
    Ref(Ref<T>),
    Item(T),
    /// An inline value held behind shared ownership, so that references to
    /// its location resolve to this very node. Named components are held
    /// this way.
    Node(Rc<T>),
}

/// Borrowed view of a holder's value.
pub enum Target<'a, T> {
    Inline(&'a T),
    Shared(Rc<T>),
}

impl<T> Deref for Target<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Target::Inline(value) => value,
            Target::Shared(rc) => rc,
        }
    }
}

impl<T> RefOr<T> {
    pub fn item(value: T) -> Self {
        RefOr::Item(value)
    }

    /// An unresolved reference, to be materialized by a loader.
    pub fn reference(reference: impl Into<String>) -> Self {
        RefOr::Ref(Ref::new(reference))
    }

    /// A reference already pointing at a shared node.
    pub fn shared(reference: impl Into<String>, node: Rc<T>) -> Self {
        RefOr::Ref(Ref::resolved(reference, node))
    }

    /// An inline value other references may point at.
    pub fn node(value: T) -> Self {
        RefOr::Node(Rc::new(value))
    }

    pub fn as_reference(&self) -> Option<&Ref<T>> {
        match self {
            RefOr::Ref(r) => Some(r),
            RefOr::Item(_) | RefOr::Node(_) => None,
        }
    }

    /// The inline value, whether owned or shared.
    pub fn as_item(&self) -> Option<&T> {
        match self {
            RefOr::Item(value) => Some(value),
            RefOr::Node(node) => Some(&**node),
            RefOr::Ref(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Rc<T>> {
        match self {
            RefOr::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Move an owned inline value behind shared ownership. References and
    /// shared nodes are returned unchanged.
    pub fn into_node(self) -> Self {
        match self {
            RefOr::Item(value) => RefOr::Node(Rc::new(value)),
            other => other,
        }
    }

    /// The inline value or the resolved target. `None` for references that
    /// are unresolved or dangling.
    pub fn value(&self) -> Option<Target<'_, T>> {
        match self {
            RefOr::Item(value) => Some(Target::Inline(value)),
            RefOr::Node(node) => Some(Target::Shared(Rc::clone(node))),
            RefOr::Ref(r) => r.node().map(Target::Shared),
        }
    }
}

impl<T> From<T> for RefOr<T> {
    fn from(value: T) -> Self {
        RefOr::Item(value)
    }
}

impl<T: Referable> Parse for RefOr<T> {
    const KIND: &'static str = T::KIND;

    fn parse(value: Value, cursor: &Cursor) -> Result<Self, StructuralError> {
        let mut map = match value {
            Value::Object(map) if map.contains_key(REF_KEY) => map,
            other => return T::parse(other, cursor).map(RefOr::Item),
        };
        let reference = match map.remove(REF_KEY) {
            Some(Value::String(s)) => s,
            other => {
                return Err(cursor
                    .join(REF_KEY)
                    .invalid_type("string", &other.unwrap_or(Value::Null)))
            }
        };
        if !map.is_empty() {
            let mut siblings: Vec<String> = map.keys().cloned().collect();
            siblings.sort();
            if T::REF_SIBLINGS_IGNORED {
                tracing::warn!(
                    path = %cursor.path(),
                    reference = %reference,
                    ignored = ?siblings,
                    "ignoring fields next to $ref"
                );
            } else {
                return Err(cursor.error(StructuralErrorKind::RefWithSiblings { siblings }));
            }
        }
        Ok(RefOr::Ref(Ref::new(reference)))
    }
}

impl<T> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(REF_KEY, &self.reference)?;
        map.end()
    }
}

impl<T: Serialize> Serialize for RefOr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RefOr::Ref(r) => r.serialize(serializer),
            RefOr::Item(value) => value.serialize(serializer),
            RefOr::Node(node) => (**node).serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Response, Schema};
    use crate::types::Dialect;
    use serde_json::json;

    fn cursor() -> Cursor {
        Cursor::root(Dialect::OpenApi30)
    }

    #[test]
    fn lone_ref_parses_unresolved() {
        let holder =
            RefOr::<Response>::parse(json!({ "$ref": "#/components/responses/Ok" }), &cursor())
                .unwrap();
        let r = holder.as_reference().unwrap();
        assert_eq!(r.reference(), "#/components/responses/Ok");
        assert!(!r.is_resolved());
        assert!(holder.value().is_none());
    }

    #[test]
    fn response_ref_with_siblings_is_rejected() {
        let err = RefOr::<Response>::parse(
            json!({ "$ref": "#/components/responses/Ok", "description": "Success" }),
            &cursor().join("200"),
        )
        .unwrap_err();
        assert_eq!(err.path, "/200");
        assert_eq!(
            err.kind,
            StructuralErrorKind::RefWithSiblings {
                siblings: vec!["description".into()]
            }
        );
    }

    #[test]
    fn schema_ref_siblings_are_ignored() {
        let holder = RefOr::<Schema>::parse(
            json!({ "$ref": "#/components/schemas/Pet", "description": "a pet" }),
            &cursor(),
        )
        .unwrap();
        assert_eq!(holder.as_reference().unwrap().reference(), "#/components/schemas/Pet");
    }

    #[test]
    fn non_string_ref_is_invalid() {
        let err = RefOr::<Schema>::parse(json!({ "$ref": 12 }), &cursor()).unwrap_err();
        assert_eq!(err.path, "/$ref");
    }

    #[test]
    fn resolution_is_one_way() {
        let first = Rc::new(Schema::default());
        let second = Rc::new(Schema::builder().title("other").build());
        let r = Ref::new("#/a");
        r.resolve_shared(Rc::clone(&first));
        r.resolve_shared(second);
        assert!(Rc::ptr_eq(&r.node().unwrap(), &first));
    }

    #[test]
    fn dropped_cycle_target_is_dangling() {
        let r: Ref<Schema> = Ref::new("#");
        {
            let node = Rc::new(Schema::default());
            r.resolve_cycle(Rc::downgrade(&node));
            assert!(r.is_cycle());
            assert!(r.node().is_some());
        }
        assert!(matches!(r.state(), RefState::Dangling));
    }

    #[test]
    fn node_serializes_inline() {
        let holder = RefOr::Item(Schema::of_type("string")).into_node();
        let node = holder.as_node().unwrap();
        assert!(std::ptr::eq(holder.as_item().unwrap(), Rc::as_ptr(node)));
        assert_eq!(
            serde_json::to_value(&holder).unwrap(),
            json!({ "type": "string" })
        );
    }

    #[test]
    fn serializes_as_ref_object() {
        let holder: RefOr<Schema> =
            RefOr::shared("#/components/schemas/Pet", Rc::new(Schema::default()));
        assert_eq!(
            serde_json::to_value(&holder).unwrap(),
            json!({ "$ref": "#/components/schemas/Pet" })
        );
    }
}
