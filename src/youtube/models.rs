use serde::Deserialize;
use serde_json::Value;

use crate::models::Song;

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: ItemId,
    pub snippet: Snippet,
}

/// `search.list` nests the id (`{"kind": "youtube#video", "videoId": ...}`),
/// some older payloads carry it as a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Plain(String),
    Resource {
        #[serde(rename = "videoId")]
        video_id: Option<String>,
        kind: Option<String>,
    },
}

impl ItemId {
    pub fn video_id(&self) -> Option<&str> {
        match self {
            ItemId::Plain(id) => Some(id.as_str()),
            ItemId::Resource { video_id, .. } => video_id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: Option<String>,
    pub channel_title: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Highest resolution first, then the small default one.
    pub fn best_url(&self) -> String {
        [&self.high, &self.default, &self.medium]
            .into_iter()
            .flatten()
            .map(|t| t.url.as_str())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub reason: String,
}

impl ApiError {
    pub fn is_quota_exceeded(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.reason == "quotaExceeded" || e.reason == "dailyLimitExceeded")
    }
}

impl SearchItem {
    pub fn into_song(self) -> Option<Song> {
        let id = self.id.video_id()?.to_string();
        let title = self.snippet.title.filter(|t| !t.is_empty())?;
        let channel = self.snippet.channel_title?;
        let thumbnail = self.snippet.thumbnails.best_url();
        Some(Song::new(id, title, thumbnail, channel))
    }
}

/// Normalize a `search.list` body into songs, dropping items that are not
/// videos or lack the fields a `Song` needs.
pub fn songs_from_response(response: SearchListResponse) -> Vec<Song> {
    response
        .items
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<SearchItem>(raw).ok())
        .filter_map(SearchItem::into_song)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> Vec<Song> {
        songs_from_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_normalizes_nested_fields() {
        let songs = normalize(json!({
            "items": [{
                "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
                "snippet": {
                    "title": "Never Gonna Give You Up",
                    "channelTitle": "Rick Astley",
                    "thumbnails": {
                        "default": { "url": "https://i.ytimg.com/default.jpg" },
                        "high": { "url": "https://i.ytimg.com/hqdefault.jpg" }
                    }
                }
            }]
        }));

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "dQw4w9WgXcQ");
        assert_eq!(songs[0].title, "Never Gonna Give You Up");
        assert_eq!(songs[0].channel, "Rick Astley");
        assert_eq!(songs[0].thumbnail, "https://i.ytimg.com/hqdefault.jpg");
    }

    #[test]
    fn test_thumbnail_falls_back_to_default_then_empty() {
        let songs = normalize(json!({
            "items": [
                {
                    "id": { "videoId": "a" },
                    "snippet": {
                        "title": "A", "channelTitle": "C",
                        "thumbnails": { "default": { "url": "https://low.jpg" } }
                    }
                },
                {
                    "id": "b",
                    "snippet": { "title": "B", "channelTitle": "C" }
                }
            ]
        }));

        assert_eq!(songs[0].thumbnail, "https://low.jpg");
        assert_eq!(songs[1].id, "b");
        assert_eq!(songs[1].thumbnail, "");
    }

    #[test]
    fn test_drops_channels_playlists_and_broken_items() {
        let songs = normalize(json!({
            "items": [
                { "id": { "kind": "youtube#channel", "channelId": "UC1" },
                  "snippet": { "title": "A channel", "channelTitle": "C" } },
                { "id": { "videoId": "ok" },
                  "snippet": { "title": "Fine", "channelTitle": "C" } },
                { "id": { "videoId": "no-snippet" } },
                { "id": { "videoId": "no-channel" }, "snippet": { "title": "X" } },
                { "snippet": { "title": "No id", "channelTitle": "C" } }
            ]
        }));

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].id, "ok");
    }

    #[test]
    fn test_missing_items_is_empty() {
        assert!(normalize(json!({ "kind": "youtube#searchListResponse" })).is_empty());
    }

    #[test]
    fn test_quota_error_detection() {
        let err: ErrorResponse = serde_json::from_value(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
            }
        }))
        .unwrap();

        assert_eq!(err.error.code, 403);
        assert!(err.error.is_quota_exceeded());
    }
}
