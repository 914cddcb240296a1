//! Multi-tier song search.
//!
//! Tiers are tried strictly in priority order: the native host capability
//! (when one was detected at startup), the backend proxy, then the YouTube
//! Data API with the user's own key. The first tier with a non-empty answer
//! wins, and failures are logged and skipped rather than returned.

pub mod precise;
pub mod session;

use std::sync::Arc;

use crate::config::Settings;
use crate::errors::AppError;
use crate::models::Song;
use crate::providers::{SongSource, SourceChain, SourceId, SourceOp};
use crate::proxy::ProxySource;
use crate::youtube::YouTubeSource;

pub use precise::apply_precise_filter;
pub use session::{SearchSession, SearchSnapshot, SearchTicket};

pub struct SearchPipeline {
    chain: SourceChain,
}

impl SearchPipeline {
    pub fn new(chain: SourceChain) -> Self {
        Self { chain }
    }

    /// Standard chain. `native` is the host capability resolved once at
    /// startup, if any.
    pub fn from_settings(
        settings: &Settings,
        native: Option<Arc<dyn SongSource>>,
    ) -> Result<Self, AppError> {
        let mut chain = SourceChain::new();
        if let Some(native) = native {
            chain.register(native);
        }
        chain.register(Arc::new(ProxySource::new(settings.api_url())?));
        chain.register(Arc::new(YouTubeSource::new()?));
        Ok(Self::new(chain))
    }

    pub fn tiers(&self) -> Vec<SourceId> {
        self.chain.tiers()
    }

    pub async fn search(
        &self,
        query: &str,
        user_api_key: Option<&str>,
        is_precise: bool,
    ) -> Vec<Song> {
        let query = query.trim();
        if query.is_empty() {
            log::debug!("Ignoring empty search query");
            return Vec::new();
        }

        log::info!("Searching: \"{}\" (precise: {})", query, is_precise);

        match self.chain.first_hit(SourceOp::Search(query), user_api_key).await {
            Some(hit) if is_precise => apply_precise_filter(hit.songs, query),
            Some(hit) => hit.songs,
            None => {
                log::warn!("All search tiers failed for query: \"{}\"", query);
                Vec::new()
            }
        }
    }

    pub async fn related(&self, song_id: &str, user_api_key: Option<&str>) -> Vec<Song> {
        let song_id = song_id.trim();
        if song_id.is_empty() {
            return Vec::new();
        }

        log::info!("Finding related songs for: {}", song_id);

        match self
            .chain
            .first_hit(SourceOp::Related(song_id), user_api_key)
            .await
        {
            Some(hit) => hit.songs,
            None => {
                log::warn!("Could not find related songs for: {}", song_id);
                Vec::new()
            }
        }
    }

    /// Search and publish into `session`. Returns `None` when a newer search
    /// started while this one was in flight.
    pub async fn search_in_session(
        &self,
        session: &SearchSession,
        query: &str,
        user_api_key: Option<&str>,
        is_precise: bool,
    ) -> Option<Vec<Song>> {
        let ticket = session.begin(query.trim());
        let songs = self.search(query, user_api_key, is_precise).await;

        if session.complete(&ticket, songs.clone()) {
            Some(songs)
        } else {
            None
        }
    }
}
