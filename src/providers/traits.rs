use crate::models::Song;
use crate::providers::types::SourceId;
use async_trait::async_trait;
use thiserror::Error;

/// Why a single tier produced nothing. Never escapes the search pipeline.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Missing credential for {0}")]
    MissingCredential(SourceId),

    #[error("{0} does not support related lookups")]
    Unsupported(SourceId),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            SourceError::Http(status.as_u16())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Unavailable(err.to_string())
    }
}

/// One tier of the search fallback chain.
#[async_trait]
pub trait SongSource: Send + Sync {
    fn id(&self) -> SourceId;

    /// User-friendly name
    fn name(&self) -> &str;

    /// Tiers that need the user's personal API key are skipped without one.
    fn requires_credential(&self) -> bool {
        false
    }

    fn supports_related(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, credential: Option<&str>)
        -> Result<Vec<Song>, SourceError>;

    async fn related(
        &self,
        _song_id: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<Song>, SourceError> {
        Err(SourceError::Unsupported(self.id()))
    }
}
