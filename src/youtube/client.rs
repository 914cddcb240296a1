use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::models::{songs_from_response, ErrorResponse, SearchListResponse};
use crate::config::REQUEST_TIMEOUT_SECONDS;
use crate::errors::AppError;
use crate::models::Song;
use crate::providers::{SongSource, SourceError, SourceId};

pub const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/search";
pub const SEARCH_MAX_RESULTS: u32 = 40;
pub const RELATED_MAX_RESULTS: u32 = 25;

/// Quota-limited public search API, only used with the user's own key.
pub struct YouTubeSource {
    client: Client,
    base_url: String,
}

impl YouTubeSource {
    pub fn new() -> Result<Self, AppError> {
        Self::with_base_url(YOUTUBE_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn search_url(&self, query: &str, key: &str) -> Result<reqwest::Url, SourceError> {
        self.build_url(&[
            ("q", query),
            ("maxResults", &SEARCH_MAX_RESULTS.to_string()),
            ("key", key),
        ])
    }

    pub fn related_url(&self, video_id: &str, key: &str) -> Result<reqwest::Url, SourceError> {
        self.build_url(&[
            ("relatedToVideoId", video_id),
            ("maxResults", &RELATED_MAX_RESULTS.to_string()),
            ("key", key),
        ])
    }

    fn build_url(&self, extra: &[(&str, &str)]) -> Result<reqwest::Url, SourceError> {
        let mut params: Vec<(&str, &str)> = vec![("part", "snippet"), ("type", "video")];
        params.extend_from_slice(extra);
        reqwest::Url::parse_with_params(&self.base_url, &params)
            .map_err(|e| SourceError::Unavailable(format!("URL parse error: {}", e)))
    }

    async fn fetch(&self, url: reqwest::Url, operation: &str) -> Result<Vec<Song>, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(body) if body.error.is_quota_exceeded() => {
                    log::warn!("YouTube API quota exhausted for the user key ({})", operation);
                }
                Ok(body) => {
                    log::warn!(
                        "YouTube API {} failed ({}): {}",
                        operation,
                        body.error.code,
                        body.error.message
                    );
                }
                Err(_) => log::warn!("YouTube API {} failed ({})", operation, status),
            }
            return Err(SourceError::Http(status.as_u16()));
        }

        let data: SearchListResponse = serde_json::from_str(&text)?;
        Ok(songs_from_response(data))
    }
}

fn require_key(credential: Option<&str>) -> Result<&str, SourceError> {
    credential
        .filter(|k| !k.trim().is_empty())
        .ok_or(SourceError::MissingCredential(SourceId::YouTube))
}

#[async_trait]
impl SongSource for YouTubeSource {
    fn id(&self) -> SourceId {
        SourceId::YouTube
    }

    fn name(&self) -> &str {
        "YouTube Data API"
    }

    fn requires_credential(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, credential: Option<&str>) -> Result<Vec<Song>, SourceError> {
        let key = require_key(credential)?;
        let url = self.search_url(query, key)?;
        self.fetch(url, "search").await
    }

    async fn related(
        &self,
        song_id: &str,
        credential: Option<&str>,
    ) -> Result<Vec<Song>, SourceError> {
        let key = require_key(credential)?;
        let url = self.related_url(song_id, key)?;
        self.fetch(url, "related").await
    }
}
