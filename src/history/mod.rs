pub mod models;

use models::RecentEntry;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppError;
use crate::models::Song;

pub const MAX_RECENTS: usize = 30;
pub const LOCAL_RECS_LIMIT: usize = 24;

/// Recently played songs, newest first, kept in a JSON file.
pub struct RecentsStore {
    path: PathBuf,
    entries: RwLock<Vec<RecentEntry>>,
}

impl RecentsStore {
    /// Missing or unreadable files start an empty list.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path);
        log::debug!("Loaded {} recents from {}", entries.len(), path.display());
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Vec<RecentEntry> {
        let Ok(content) = fs::read_to_string(path) else {
            return Vec::new();
        };

        match serde_json::from_str::<Vec<serde_json::Value>>(&content) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RecentEntry>(v).ok())
                .filter(|e| e.song.is_valid())
                .take(MAX_RECENTS)
                .collect(),
            Err(e) => {
                log::warn!("Ignoring unreadable recents file {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    pub fn list(&self) -> Vec<Song> {
        self.entries.read().iter().map(|e| e.song.clone()).collect()
    }

    pub fn entries(&self) -> Vec<RecentEntry> {
        self.entries.read().clone()
    }

    /// Move `song` to the front, dropping any older entry for the same id.
    pub fn add(&self, song: &Song) -> Result<(), AppError> {
        if !song.is_valid() {
            return Ok(());
        }

        {
            let mut entries = self.entries.write();
            entries.retain(|e| e.song.id != song.id);
            entries.insert(0, RecentEntry::now(song));
            entries.truncate(MAX_RECENTS);
        }

        self.save()
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.entries.write().clear();
        self.save()
    }

    pub fn save(&self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = {
            let entries = self.entries.read();
            serde_json::to_string_pretty(&*entries)?
        };
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Offline recommendations: the recents themselves, songs from the most
/// frequent channels first.
pub fn build_local_recs(recents: &[Song], limit: usize) -> Vec<Song> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for song in recents {
        *counts.entry(song.channel.as_str()).or_insert(0) += 1;
    }

    let mut seen = HashSet::new();
    let mut unique: Vec<&Song> = recents
        .iter()
        .filter(|s| seen.insert(s.id.as_str()))
        .collect();

    unique.sort_by(|a, b| {
        let ca = counts.get(a.channel.as_str()).copied().unwrap_or(0);
        let cb = counts.get(b.channel.as_str()).copied().unwrap_or(0);
        cb.cmp(&ca)
    });

    unique.into_iter().take(limit).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, channel: &str) -> Song {
        Song::new(id, format!("Title {}", id), "", channel)
    }

    fn ids(list: &[Song]) -> Vec<&str> {
        list.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_add_moves_existing_song_to_front() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentsStore::load(dir.path().join("recents.json"));

        store.add(&song("a", "x")).unwrap();
        store.add(&song("b", "x")).unwrap();
        store.add(&song("a", "x")).unwrap();

        assert_eq!(ids(&store.list()), vec!["a", "b"]);
    }

    #[test]
    fn test_add_caps_list_length() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecentsStore::load(dir.path().join("recents.json"));

        for i in 0..(MAX_RECENTS + 5) {
            store.add(&song(&format!("s{}", i), "x")).unwrap();
        }

        let list = store.list();
        assert_eq!(list.len(), MAX_RECENTS);
        assert_eq!(list[0].id, format!("s{}", MAX_RECENTS + 4));
    }

    #[test]
    fn test_add_strips_optional_metadata_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        let store = RecentsStore::load(&path);

        let mut full = song("a", "x");
        full.views = Some(10);
        full.duration = Some("3:00".to_string());
        store.add(&full).unwrap();

        let reloaded = RecentsStore::load(&path);
        let entries = reloaded.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].song.views, None);
        assert_eq!(entries[0].song.duration, None);
        assert!(entries[0].last_played_at_ms > 0);
    }

    #[test]
    fn test_load_filters_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        fs::write(
            &path,
            r#"[
                { "id": "ok", "title": "Fine", "thumbnail": "", "channel": "c", "lastPlayedAtMs": 5 },
                { "id": "", "title": "Blank id", "thumbnail": "", "channel": "c" },
                { "title": "No id" },
                42
            ]"#,
        )
        .unwrap();

        assert_eq!(ids(&RecentsStore::load(&path).list()), vec!["ok"]);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        fs::write(&path, "{{{").unwrap();

        let store = RecentsStore::load(&path);
        assert!(store.list().is_empty());
        store.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
    }

    #[test]
    fn test_local_recs_rank_by_channel_frequency() {
        let recents = vec![
            song("1", "rare"),
            song("2", "common"),
            song("3", "mid"),
            song("4", "common"),
            song("2", "common"),
            song("5", "mid"),
        ];

        let recs = build_local_recs(&recents, LOCAL_RECS_LIMIT);

        assert_eq!(ids(&recs), vec!["2", "4", "3", "5", "1"]);
        assert_eq!(build_local_recs(&recents, 2).len(), 2);
    }
}
