//! Transport for external documents.
//!
//! The loader never performs I/O itself: it asks a [`Fetch`] implementation
//! for the bytes at a location, and only when external references are enabled.

use std::path::PathBuf;

use url::Url;

use crate::error::FetchError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieve the raw bytes of the document at `location`.
pub trait Fetch {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, FetchError>;
}

impl<F> Fetch for F
where
    F: Fn(&Url) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, FetchError> {
        self(location)
    }
}

/// Reads `file://` locations from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, FetchError> {
        if location.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme {
                scheme: location.scheme().to_string(),
            });
        }
        let path = location
            .to_file_path()
            .map_err(|()| FetchError::Other(format!("not a local path: {}", location)))?;
        read_path(path)
    }
}

fn read_path(path: PathBuf) -> Result<Vec<u8>, FetchError> {
    std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
}

/// Fetches `http://` and `https://` locations with a blocking client.
///
/// Requires the `remote` feature (enabled by default).
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl Fetch for HttpFetcher {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(%location, "fetching remote document");
        let response = self.client.get(location.as_str()).send()?;
        // Check for HTTP errors before reading the body
        let response = response.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Dispatches on the location scheme: `file` to disk, `http(s)` to the
/// network when the `remote` feature is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFetcher;

impl Fetch for DefaultFetcher {
    fn fetch(&self, location: &Url) -> Result<Vec<u8>, FetchError> {
        match location.scheme() {
            "file" => FileFetcher.fetch(location),
            #[cfg(feature = "remote")]
            "http" | "https" => HttpFetcher::new()?.fetch(location),
            scheme => Err(FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
            }),
        }
    }
}
