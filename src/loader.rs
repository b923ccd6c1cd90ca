//! Loading documents from bytes, files and URLs.
//!
//! A [`Session`] owns the document cache. Every load through one session
//! shares it, so a document referenced by several loads is fetched and
//! decoded once. Loading a location twice returns the same document. A
//! session is single-threaded; use one per thread.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use url::Url;

use crate::cache::DocumentCache;
use crate::error::{FetchError, LoadError, ResolutionError};
use crate::fetch::{DefaultFetcher, Fetch};
use crate::materializer::Materializer;
use crate::model::strict::{Cursor, Parse};
use crate::model::Document;
use crate::pointer::canonical_location;
use crate::types::Dialect;

/// Location given to documents loaded from bytes without a base.
pub const DEFAULT_BASE: &str = "memory:///root.json";

/// Configuration for loading documents.
#[derive(Clone)]
pub struct LoaderConfig {
    /// Allow references to documents other than the one being loaded.
    /// Defaults to false.
    pub allow_external_refs: bool,
    /// Transport for external documents. Defaults to [`DefaultFetcher`].
    pub fetcher: Rc<dyn Fetch>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            allow_external_refs: false,
            fetcher: Rc::new(DefaultFetcher),
        }
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("allow_external_refs", &self.allow_external_refs)
            .finish_non_exhaustive()
    }
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether external references are followed.
    pub fn allow_external_refs(mut self, allow: bool) -> Self {
        self.allow_external_refs = allow;
        self
    }

    /// Set the transport used for external documents.
    pub fn fetcher(mut self, fetcher: impl Fetch + 'static) -> Self {
        self.fetcher = Rc::new(fetcher);
        self
    }
}

/// Load a document from bytes and resolve every reference in it.
///
/// `base` is the location relative references are resolved against: a URL,
/// or a file path. An empty base means [`DEFAULT_BASE`].
///
/// # Errors
///
/// Returns `LoadError::Syntax` if the bytes are not JSON or YAML,
/// `LoadError::Structural` if a node violates the typed model, or
/// `LoadError::Resolution` if a reference cannot be materialized.
pub fn load(bytes: &[u8], base: &str, config: &LoaderConfig) -> Result<Document, LoadError> {
    Session::new(config.clone()).load(bytes, base)
}

/// A load session: a document cache shared by every load made through it.
pub struct Session {
    cache: DocumentCache,
    /// Documents built as load roots, by location.
    documents: HashMap<Url, Document>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Session {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            cache: DocumentCache::new(config.fetcher, config.allow_external_refs),
            documents: HashMap::new(),
        }
    }

    /// Load a document from bytes. See [`load`].
    ///
    /// A location already loaded or fetched in this session must be given
    /// the same content again; the earlier document is then returned.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::LocationConflict` if `base` names a location
    /// this session already holds with a different tree, otherwise as
    /// [`load`].
    pub fn load(&mut self, bytes: &[u8], base: &str) -> Result<Document, LoadError> {
        let location = if base.is_empty() {
            parse_location(DEFAULT_BASE)?
        } else {
            parse_location(base)?
        };
        let tree = crate::syntax::parse_document(bytes).map_err(|message| LoadError::Syntax {
            location: location.to_string(),
            message,
        })?;
        if self.cache.contains_document(&location) {
            let cached = self.cache.document(&location)?;
            if *cached != tree {
                return Err(ResolutionError::LocationConflict {
                    location: location.to_string(),
                }
                .into());
            }
            tracing::debug!(%location, "location already loaded in this session");
        } else {
            self.cache.insert_document(location.clone(), tree);
        }
        self.build(location)
    }

    /// Load the document at a file path.
    ///
    /// # Errors
    ///
    /// Returns a `Fetch` resolution error (exit code 3) if the file cannot
    /// be read, otherwise as [`load`].
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<Document, LoadError> {
        let location = file_location(path.as_ref())?;
        self.load_location(location)
    }

    /// Load the document at a URL through the configured fetcher.
    ///
    /// # Errors
    ///
    /// As [`Session::load_file`].
    pub fn load_url(&mut self, url: &str) -> Result<Document, LoadError> {
        let location = parse_location(url)?;
        self.load_location(location)
    }

    /// Load from a URL when `source` looks like one, from a file path otherwise.
    ///
    /// # Errors
    ///
    /// As [`Session::load_file`].
    pub fn load_source(&mut self, source: &str) -> Result<Document, LoadError> {
        if has_scheme(source) {
            self.load_url(source)
        } else {
            self.load_file(source)
        }
    }

    /// Number of documents fetched or loaded so far.
    pub fn document_count(&self) -> usize {
        self.cache.document_count()
    }

    fn load_location(&mut self, location: Url) -> Result<Document, LoadError> {
        self.cache.document(&location).map_err(|e| match e {
            ResolutionError::TargetSyntax { location, message } => LoadError::Syntax { location, message },
            other => LoadError::Resolution(other),
        })?;
        self.build(location)
    }

    fn build(&mut self, location: Url) -> Result<Document, LoadError> {
        if let Some(document) = self.documents.get(&location) {
            return Ok(document.clone());
        }
        let tree = self.cache.document(&location)?;
        let document = Document::parse((*tree).clone(), &Cursor::root(Dialect::detect(&tree)))?;
        Materializer::new(&mut self.cache, location.clone()).run(&document)?;
        tracing::debug!(
            %location,
            documents = self.cache.document_count(),
            nodes = self.cache.node_count(),
            "document loaded"
        );
        self.documents.insert(location, document.clone());
        Ok(document)
    }
}

/// Resolves references in documents assembled in code.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    config: LoaderConfig,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Materialize every reference in `document` against the document itself.
    ///
    /// Holders already resolved are left alone. External references follow
    /// the configuration as they would during a load.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Resolution` if a reference cannot be materialized,
    /// or `LoadError::Structural` if its target violates the typed model.
    pub fn resolve_document(&self, document: &mut Document) -> Result<(), LoadError> {
        let location = parse_location(DEFAULT_BASE)?;
        if let Some(components) = document.components.as_mut() {
            components.share_inline();
        }
        let tree = serde_json::to_value(&*document).map_err(|e| LoadError::Syntax {
            location: location.to_string(),
            message: e.to_string(),
        })?;
        let mut cache = DocumentCache::new(Rc::clone(&self.config.fetcher), self.config.allow_external_refs);
        cache.insert_document(location.clone(), tree);
        Materializer::new(&mut cache, location).run(&*document)?;
        Ok(())
    }
}

fn has_scheme(source: &str) -> bool {
    // Single letters are drive prefixes such as `C:`.
    matches!(Url::parse(source), Ok(url) if url.scheme().len() > 1)
}

fn parse_location(source: &str) -> Result<Url, LoadError> {
    if has_scheme(source) {
        let url = Url::parse(source).map_err(|e| invalid_location(source, e.to_string()))?;
        Ok(canonical_location(url))
    } else {
        file_location(Path::new(source))
    }
}

fn file_location(path: &Path) -> Result<Url, LoadError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| {
                LoadError::Resolution(ResolutionError::Fetch {
                    location: path.display().to_string(),
                    source: FetchError::Io {
                        path: path.to_path_buf(),
                        source,
                    },
                })
            })?
            .join(path)
    };
    let url = Url::from_file_path(&absolute)
        .map_err(|()| invalid_location(&absolute.display().to_string(), "not an absolute path".to_string()))?;
    Ok(canonical_location(url))
}

fn invalid_location(location: &str, message: String) -> LoadError {
    LoadError::Resolution(ResolutionError::MalformedRef {
        reference: location.to_string(),
        message,
    })
}
