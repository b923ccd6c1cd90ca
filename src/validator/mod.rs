//! Semantic validation of a materialized document graph.
//!
//! Validation never triggers resolution: it walks the graph as loaded and
//! reports the first violation in a fixed traversal order (document, paths
//! in insertion order, operations, responses, content, schemas depth-first).
//! Nodes shared between several references are checked once.

mod document;
mod examples;
mod response;
mod schema;

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::model::{Extensions, RefOr, RefState};
use crate::pointer::JsonPointer;

/// Options for a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Validate `example`, `default` and media-type examples against their
    /// schema. Defaults to true.
    pub examples: bool,
    /// Reject `format` values this crate does not know. Defaults to false,
    /// since formats are an open vocabulary.
    pub formats: bool,
    /// Check that every `pattern` compiles. Defaults to true.
    pub patterns: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            examples: true,
            formats: false,
            patterns: true,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set example validation.
    pub fn examples(mut self, examples: bool) -> Self {
        self.examples = examples;
        self
    }

    /// Set strict format checking.
    pub fn formats(mut self, formats: bool) -> Self {
        self.formats = formats;
        self
    }

    /// Set pattern compilation checks.
    pub fn patterns(mut self, patterns: bool) -> Self {
        self.patterns = patterns;
        self
    }
}

/// Cooperative cancellation flag shared between a caller and a validation pass.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a validation pass needs from its caller.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    pub options: ValidationOptions,
    pub cancellation: Cancellation,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidationOptions) -> Self {
        Self {
            options,
            cancellation: Cancellation::new(),
        }
    }

    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// Implemented by every model type with validation rules.
pub(crate) trait Validate {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError>;
}

/// State of one validation pass.
pub(crate) struct Validator<'c> {
    context: &'c ValidationContext,
    path: JsonPointer,
    /// Shared nodes already checked, by address.
    visited: HashSet<*const ()>,
    /// Security scheme names declared by the document, when validating one.
    security_schemes: Option<HashSet<String>>,
    operation_ids: HashSet<String>,
}

impl<'c> Validator<'c> {
    pub fn new(context: &'c ValidationContext) -> Self {
        Self {
            context,
            path: JsonPointer::root(),
            visited: HashSet::new(),
            security_schemes: None,
            operation_ids: HashSet::new(),
        }
    }

    /// Validate `node` from the root of a fresh pass.
    pub fn run<T: Validate + ?Sized>(context: &'c ValidationContext, node: &T) -> Result<(), ValidationError> {
        let mut v = Self::new(context);
        v.checkpoint()?;
        node.validate_with(&mut v)
    }

    pub fn options(&self) -> &ValidationOptions {
        &self.context.options
    }

    /// An error at the current position.
    pub fn error(&self, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            path: self.path.to_string(),
            kind,
        }
    }

    /// An error one level below the current position.
    pub fn error_at(&self, token: &str, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            path: self.path.join(token).to_string(),
            kind,
        }
    }

    /// Run `f` one level below the current position.
    pub fn at<F>(&mut self, token: impl Into<String>, f: F) -> Result<(), ValidationError>
    where
        F: FnOnce(&mut Self) -> Result<(), ValidationError>,
    {
        self.path.push(token);
        let result = f(self);
        self.path.pop();
        result
    }

    /// Validate every entry of a named collection, in order.
    pub fn each<'a, T, I>(&mut self, field: &str, entries: I) -> Result<(), ValidationError>
    where
        T: Validate + 'a,
        I: IntoIterator<Item = (String, &'a T)>,
    {
        self.at(field, |v| {
            for (key, entry) in entries {
                v.at(key, |v| entry.validate_with(v))?;
            }
            Ok(())
        })
    }

    /// Fails once the caller has cancelled the pass.
    pub fn checkpoint(&self) -> Result<(), ValidationError> {
        if self.context.cancellation.is_cancelled() {
            return Err(self.error(ValidationErrorKind::Cancelled));
        }
        Ok(())
    }

    /// Record a visit to a shared node; false when it was already checked.
    pub fn first_visit<T>(&mut self, node: &Rc<T>) -> bool {
        self.visited.insert(Rc::as_ptr(node) as *const ())
    }

    pub fn extensions(&self, extensions: &Extensions) -> Result<(), ValidationError> {
        let keys = extensions.illegal_keys();
        if keys.is_empty() {
            Ok(())
        } else {
            Err(self.error(ValidationErrorKind::IllegalExtensions { keys }))
        }
    }

    pub fn declare_security_schemes(&mut self, names: HashSet<String>) {
        self.security_schemes = Some(names);
    }

    pub fn security_scheme_declared(&self, name: &str) -> bool {
        self.security_schemes
            .as_ref()
            .map_or(true, |names| names.contains(name))
    }

    /// Record an operation id; false when it was already used.
    pub fn claim_operation_id(&mut self, id: &str) -> bool {
        self.operation_ids.insert(id.to_string())
    }
}

impl<T: Validate> Validate for RefOr<T> {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        match self {
            RefOr::Item(item) => item.validate_with(v),
            RefOr::Node(node) => {
                if v.first_visit(node) {
                    node.validate_with(v)
                } else {
                    Ok(())
                }
            }
            RefOr::Ref(holder) => match holder.state() {
                RefState::Unresolved => Err(v.error(ValidationErrorKind::UnresolvedRef {
                    reference: holder.reference().to_string(),
                })),
                RefState::Dangling => Err(v.error(ValidationErrorKind::DanglingRef {
                    reference: holder.reference().to_string(),
                })),
                RefState::Resolved(node) => {
                    if v.first_visit(&node) {
                        node.validate_with(v)
                    } else {
                        Ok(())
                    }
                }
            },
        }
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        match self {
            Some(inner) => inner.validate_with(v),
            None => Ok(()),
        }
    }
}

impl<T: Validate + ?Sized> Validate for Box<T> {
    fn validate_with(&self, v: &mut Validator<'_>) -> Result<(), ValidationError> {
        (**self).validate_with(v)
    }
}

/// `(key, value)` pairs of an ordered map, for [`Validator::each`].
pub(crate) fn entries<T>(map: &indexmap::IndexMap<String, T>) -> impl Iterator<Item = (String, &T)> {
    map.iter().map(|(k, v)| (k.clone(), v))
}

/// `(index, value)` pairs of a list, for [`Validator::each`].
pub(crate) fn indexed<T>(list: &[T]) -> impl Iterator<Item = (String, &T)> {
    list.iter().enumerate().map(|(i, v)| (i.to_string(), v))
}
