use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{get_recents_file_path, Settings};
use crate::download::DownloadManager;
use crate::errors::AppError;
use crate::history::{build_local_recs, RecentsStore, LOCAL_RECS_LIMIT};
use crate::models::Song;
use crate::native::YtDlpSearch;
use crate::providers::SongSource;
use crate::queue::{PlayQueue, SharedQueue, TrackEnd};
use crate::search::{SearchPipeline, SearchSession};

/// Everything the host shell needs, passed around explicitly.
pub struct AppState {
    settings: RwLock<Settings>,
    pub pipeline: SearchPipeline,
    pub queue: SharedQueue,
    pub session: SearchSession,
    pub recents: RecentsStore,
    pub downloads: DownloadManager,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let native = YtDlpSearch::detect(&settings.ytdlp_path)
            .map(|native| Arc::new(native) as Arc<dyn SongSource>);
        if native.is_none() {
            log::info!(
                "yt-dlp not found at \"{}\", native search disabled",
                settings.ytdlp_path
            );
        }

        let pipeline = SearchPipeline::from_settings(&settings, native)?;
        let recents = RecentsStore::load(get_recents_file_path());
        Ok(Self::with_parts(settings, pipeline, recents))
    }

    pub fn with_parts(settings: Settings, pipeline: SearchPipeline, recents: RecentsStore) -> Self {
        let downloads = DownloadManager::new(
            settings.ytdlp_path.clone(),
            settings.resolved_download_dir(),
        );
        Self {
            settings: RwLock::new(settings),
            pipeline,
            queue: PlayQueue::new().shared(),
            session: SearchSession::new(),
            recents,
            downloads,
        }
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, settings: Settings) -> Result<(), AppError> {
        settings.save()?;
        self.downloads
            .set_download_path(settings.resolved_download_dir());
        *self.settings.write() = settings;
        Ok(())
    }

    /// Run a search with the saved preferences. `None` means a newer search
    /// replaced this one before it finished.
    pub async fn search(&self, query: &str) -> Option<Vec<Song>> {
        let settings = self.settings();
        self.pipeline
            .search_in_session(
                &self.session,
                query,
                settings.user_api_key(),
                settings.precise_search,
            )
            .await
    }

    pub async fn related_to_current(&self) -> Vec<Song> {
        let Some(current) = self.queue.read().current_song() else {
            return Vec::new();
        };
        let settings = self.settings();
        self.pipeline
            .related(&current.id, settings.user_api_key())
            .await
    }

    /// Replace the queue and start at `start_index`.
    pub fn play(&self, songs: Vec<Song>, start_index: usize) -> Option<Song> {
        let current = {
            let mut queue = self.queue.write();
            queue.load(songs, start_index);
            queue.current_song()
        };
        self.record(current)
    }

    pub fn next(&self) -> Option<Song> {
        let song = self.queue.write().next();
        self.record(song)
    }

    pub fn previous(&self) -> Option<Song> {
        let song = self.queue.write().previous();
        self.record(song)
    }

    pub fn track_ended(&self) -> TrackEnd {
        let (outcome, current) = {
            let mut queue = self.queue.write();
            let outcome = queue.track_ended();
            (outcome, queue.current_song())
        };
        if outcome == TrackEnd::Advanced {
            self.record(current);
        }
        outcome
    }

    pub fn local_recommendations(&self) -> Vec<Song> {
        if !self.settings.read().show_recommendations {
            return Vec::new();
        }
        build_local_recs(&self.recents.list(), LOCAL_RECS_LIMIT)
    }

    pub fn download_current(&self) -> Result<PathBuf, AppError> {
        let current = self
            .queue
            .read()
            .current_song()
            .ok_or_else(|| AppError::Download("Nothing is playing".to_string()))?;
        self.downloads.start(&current.id, &current.title)
    }

    fn record(&self, song: Option<Song>) -> Option<Song> {
        if let Some(song) = &song {
            if let Err(e) = self.recents.add(song) {
                log::warn!("Failed to save recents: {}", e);
            }
        }
        song
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{SourceChain, SourceError, SourceId};
    use async_trait::async_trait;

    struct StaticSource(Vec<Song>);

    #[async_trait]
    impl SongSource for StaticSource {
        fn id(&self) -> SourceId {
            SourceId::Proxy
        }

        fn name(&self) -> &str {
            "static"
        }

        async fn search(&self, _query: &str, _credential: Option<&str>) -> Result<Vec<Song>, SourceError> {
            Ok(self.0.clone())
        }

        async fn related(&self, song_id: &str, _credential: Option<&str>) -> Result<Vec<Song>, SourceError> {
            Ok(self.0.iter().filter(|s| s.id != song_id).cloned().collect())
        }
    }

    fn songs() -> Vec<Song> {
        vec![
            Song::new("1", "One", "", "Band"),
            Song::new("2", "Two", "", "Band"),
            Song::new("3", "Three", "", "Other"),
        ]
    }

    fn state(dir: &tempfile::TempDir) -> AppState {
        let settings = Settings {
            precise_search: false,
            download_dir: Some(dir.path().to_path_buf()),
            ..Settings::default()
        };
        let pipeline = SearchPipeline::new(SourceChain::new().with(Arc::new(StaticSource(songs()))));
        let recents = RecentsStore::load(dir.path().join("recents.json"));
        AppState::with_parts(settings, pipeline, recents)
    }

    #[tokio::test]
    async fn test_search_then_play_records_recents() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        let results = state.search("anything").await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(state.session.snapshot().songs.len(), 3);

        assert_eq!(state.play(results, 1).map(|s| s.id), Some("2".to_string()));
        assert_eq!(state.next().map(|s| s.id), Some("3".to_string()));

        let recent_ids: Vec<String> = state.recents.list().into_iter().map(|s| s.id).collect();
        assert_eq!(recent_ids, vec!["3", "2"]);
    }

    #[tokio::test]
    async fn test_related_excludes_current() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        assert!(state.related_to_current().await.is_empty());

        state.play(songs(), 0);
        let related = state.related_to_current().await;
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|s| s.id != "1"));
    }

    #[test]
    fn test_track_end_at_last_song_stops() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);

        state.play(songs(), 2);
        assert_eq!(state.track_ended(), TrackEnd::Stopped);
        assert!(!state.queue.read().is_playing());
    }

    #[test]
    fn test_local_recommendations_follow_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.play(songs(), 0);
        state.next();
        state.next();

        let recs = state.local_recommendations();
        assert_eq!(recs.first().map(|s| s.channel.as_str()), Some("Band"));

        state.settings.write().show_recommendations = false;
        assert!(state.local_recommendations().is_empty());
    }

    #[test]
    fn test_download_current_without_runtime_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.play(songs(), 0);

        assert!(matches!(state.download_current(), Err(AppError::Internal(_))));
    }

    #[test]
    fn test_download_requires_current_song() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        assert!(matches!(state.download_current(), Err(AppError::Download(_))));
    }
}
