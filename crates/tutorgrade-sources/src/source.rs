//! Document sources: local files and HTTP(S) URLs.

use std::io::ErrorKind;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::SourceError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Something that can fetch the raw text of a definitions document.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Short name used in logs ("file", "http").
    fn name(&self) -> &str;

    /// Fetch the document at `location` as text.
    async fn fetch(&self, location: &str) -> Result<String, SourceError>;
}

/// Whether a location should be fetched over HTTP.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reads documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

#[async_trait]
impl DocumentSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, location: &str) -> Result<String, SourceError> {
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SourceError::NotFound(location.to_string()),
                _ => SourceError::Io {
                    location: location.to_string(),
                    message: e.to_string(),
                },
            })
    }
}

/// Fetches documents with an HTTP GET.
pub struct HttpSource {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpSource {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> Result<String, SourceError> {
        let response = self.client.get(location).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout_secs)
            } else {
                SourceError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(SourceError::NotFound(location.to_string()));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::HttpStatus {
                status,
                location: location.to_string(),
                message: body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("failed to read response body: {e}")))
    }
}

/// Pick the source matching a location.
pub fn source_for(location: &str) -> Result<Box<dyn DocumentSource>, SourceError> {
    if is_remote(location) {
        Ok(Box::new(HttpSource::new()?))
    } else {
        Ok(Box::new(FileSource))
    }
}
