use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::REQUEST_TIMEOUT_SECONDS;
use crate::errors::AppError;
use crate::models::{songs_from_items, Song};
use crate::providers::{SongSource, SourceError, SourceId};

pub const PROXY_PATH: &str = "/api/invidious-proxy";

/// Backend proxy in front of a pool of alternate video-index instances.
/// Instance selection and retries happen server-side.
pub struct ProxySource {
    client: Client,
    base_url: String,
}

impl ProxySource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn request_url(&self, query: &str, kind: &str) -> Result<reqwest::Url, SourceError> {
        let endpoint = format!("{}{}", self.base_url, PROXY_PATH);
        reqwest::Url::parse_with_params(&endpoint, &[("q", query), ("type", kind)])
            .map_err(|e| SourceError::Unavailable(format!("Invalid proxy URL '{}': {}", endpoint, e)))
    }

    async fn fetch(&self, query: &str, kind: &str) -> Result<Vec<Song>, SourceError> {
        let url = self.request_url(query, kind)?;
        log::debug!("Proxy {} request: {}", kind, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http(status.as_u16()));
        }

        let text = response.text().await?;
        parse_items(&text)
    }
}

/// `{ "items": [...] }`; a body without an `items` array counts as malformed.
pub fn parse_items(body: &str) -> Result<Vec<Song>, SourceError> {
    let data: Value = serde_json::from_str(body)?;
    let items = data
        .get("items")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SourceError::Parse("Missing 'items' array".to_string()))?;

    Ok(songs_from_items(items))
}

#[async_trait]
impl SongSource for ProxySource {
    fn id(&self) -> SourceId {
        SourceId::Proxy
    }

    fn name(&self) -> &str {
        "Backend Proxy"
    }

    async fn search(
        &self,
        query: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<Song>, SourceError> {
        self.fetch(query, "search").await
    }

    async fn related(
        &self,
        song_id: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<Song>, SourceError> {
        self.fetch(song_id, "related").await
    }
}
