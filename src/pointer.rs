//! Reference expressions and JSON Pointer fragments.
//!
//! A reference such as `other.yaml#/components/schemas/Pet` is split into the
//! document it names (joined against the referencing document's location) and
//! an RFC 6901 pointer into that document.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde_json::Value;
use url::Url;

use crate::error::ResolutionError;
use crate::types::json_type_name;

/// A parsed RFC 6901 JSON Pointer. The empty pointer addresses the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    tokens: Vec<String>,
}

impl JsonPointer {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the pointer form used in fragments: empty, or `/`-separated tokens.
    pub fn parse(pointer: &str) -> Result<Self, String> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = pointer.strip_prefix('/') else {
            return Err(format!(
                "pointer \"{}\" must be empty or start with '/'",
                pointer
            ));
        };
        let tokens = rest
            .split('/')
            // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
            .map(|part| part.replace("~1", "/").replace("~0", "~"))
            .collect();
        Ok(Self { tokens })
    }

    /// Returns a new pointer one level deeper.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Self { tokens }
    }

    pub(crate) fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub(crate) fn pop(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Walk `document` along this pointer.
    pub fn navigate<'v>(&self, document: &'v Value) -> Result<&'v Value, NavigateError> {
        let mut current = document;
        let mut walked = JsonPointer::root();
        for token in &self.tokens {
            walked = walked.join(token.as_str());
            current = match current {
                Value::Object(map) => map.get(token).ok_or(NavigateError::NotFound)?,
                Value::Array(items) => {
                    let index: usize = token.parse().map_err(|_| NavigateError::NotAddressable {
                        at: walked.clone(),
                        message: format!("uses \"{}\" as an array index", token),
                    })?;
                    items.get(index).ok_or(NavigateError::NotFound)?
                }
                other => {
                    return Err(NavigateError::NotAddressable {
                        at: walked,
                        message: format!("steps into a {}", json_type_name(other)),
                    })
                }
            };
        }
        Ok(current)
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// Why a pointer could not be walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigateError {
    NotFound,
    NotAddressable { at: JsonPointer, message: String },
}

/// The document and fragment a reference expression designates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefTarget {
    /// Canonical location of the target document (never carries a fragment).
    pub location: Url,
    pub pointer: JsonPointer,
}

/// Resolve `reference` against the location of the document that contains it.
///
/// A fragment of `#` or no fragment at all addresses the root of the target
/// document. Only JSON Pointer fragments are understood; plain-name anchors
/// are rejected as malformed.
pub fn resolve_reference(reference: &str, base: &Url) -> Result<RefTarget, ResolutionError> {
    let malformed = |message: String| ResolutionError::MalformedRef {
        reference: reference.to_string(),
        message,
    };

    if reference.trim().is_empty() {
        return Err(malformed("reference is empty".to_string()));
    }

    let (document, fragment) = match reference.find('#') {
        Some(idx) => (&reference[..idx], &reference[idx + 1..]),
        None => (reference, ""),
    };

    let location = if document.is_empty() {
        base.clone()
    } else {
        base.join(document)
            .map_err(|e| malformed(format!("cannot resolve \"{}\": {}", document, e)))?
    };

    let fragment = percent_decode_str(fragment)
        .decode_utf8()
        .map_err(|_| malformed("fragment is not valid UTF-8".to_string()))?;
    let pointer = JsonPointer::parse(&fragment).map_err(malformed)?;

    Ok(RefTarget {
        location: canonical_location(location),
        pointer,
    })
}

/// Normalize a document location for use as a cache key.
///
/// Drops the fragment; `file://` locations are canonicalized on disk when the
/// file exists.
pub fn canonical_location(mut location: Url) -> Url {
    location.set_fragment(None);
    if location.scheme() == "file" {
        if let Ok(path) = location.to_file_path() {
            if let Ok(canonical) = path.canonicalize() {
                if let Ok(url) = Url::from_file_path(canonical) {
                    return url;
                }
            }
        }
    }
    location
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
