use serde::{Deserialize, Serialize};

use crate::models::Song;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntry {
    #[serde(flatten)]
    pub song: Song,
    /// Unix milliseconds
    #[serde(default)]
    pub last_played_at_ms: i64,
}

impl RecentEntry {
    pub fn now(song: &Song) -> Self {
        Self {
            song: song.core(),
            last_played_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}
