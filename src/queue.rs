use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::models::Song;

pub const DEFAULT_VOLUME: f32 = 0.8;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    None,
    One,
    All,
}

impl LoopMode {
    /// Order used by the transport button: none -> all -> one -> none.
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::None => LoopMode::All,
            LoopMode::All => LoopMode::One,
            LoopMode::One => LoopMode::None,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::None => write!(f, "none"),
            LoopMode::One => write!(f, "one"),
            LoopMode::All => write!(f, "all"),
        }
    }
}

impl FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(LoopMode::None),
            "one" => Ok(LoopMode::One),
            "all" => Ok(LoopMode::All),
            _ => Err(format!("Invalid loop mode: '{}'. Valid: none, one, all", s)),
        }
    }
}

/// What happened when the current track finished on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    /// Loop mode `one`: play the same track again, cursor untouched.
    Replay,
    Advanced,
    Stopped,
}

/// Serializable view of the queue for the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub playlist: Vec<Song>,
    pub current_index: Option<usize>,
    pub current_song: Option<Song>,
    pub is_playing: bool,
    pub is_shuffle: bool,
    pub loop_mode: LoopMode,
    pub volume: f32,
}

pub type SharedQueue = Arc<RwLock<PlayQueue>>;

pub struct PlayQueue {
    playlist: Vec<Song>,
    original_playlist: Vec<Song>, // Load order, restored when shuffle is turned off
    current_index: Option<usize>, // Index into `playlist`
    is_playing: bool,
    is_shuffle: bool,
    loop_mode: LoopMode,
    volume: f32,
    rng: StdRng,
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic shuffles, for tests and reproducible sessions.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            playlist: Vec::new(),
            original_playlist: Vec::new(),
            current_index: None,
            is_playing: false,
            is_shuffle: false,
            loop_mode: LoopMode::None,
            volume: DEFAULT_VOLUME,
            rng,
        }
    }

    pub fn shared(self) -> SharedQueue {
        Arc::new(RwLock::new(self))
    }

    pub fn load(&mut self, songs: Vec<Song>, start_index: usize) {
        if songs.is_empty() {
            log::debug!("Loaded an empty list, queue is now idle");
            self.original_playlist.clear();
            self.playlist.clear();
            self.current_index = None;
            self.is_playing = false;
            return;
        }

        let start_index = if start_index < songs.len() {
            start_index
        } else {
            log::warn!(
                "Start index {} out of range for {} songs, starting at 0",
                start_index,
                songs.len()
            );
            0
        };

        let start_id = songs[start_index].id.clone();
        self.original_playlist = songs;
        self.playlist = self.original_playlist.clone();

        self.current_index = if self.is_shuffle {
            self.playlist.shuffle(&mut self.rng);
            Some(
                self.playlist
                    .iter()
                    .position(|s| s.id == start_id)
                    .unwrap_or(0),
            )
        } else {
            Some(start_index)
        };
        self.is_playing = true;

        log::debug!(
            "Loaded {} songs (shuffle: {}, index: {:?})",
            self.playlist.len(),
            self.is_shuffle,
            self.current_index
        );
    }

    pub fn toggle_play(&mut self) {
        if !self.playlist.is_empty() {
            self.is_playing = !self.is_playing;
        }
    }

    /// Advance the cursor. At the last track, wraps with loop `all` and
    /// stops (cursor kept) otherwise.
    pub fn next(&mut self) -> Option<Song> {
        let idx = self.current_index?;
        if self.playlist.is_empty() {
            return None;
        }

        let next_idx = idx + 1;
        if next_idx >= self.playlist.len() {
            if self.loop_mode == LoopMode::All {
                self.current_index = Some(0);
                self.is_playing = true;
            } else {
                self.is_playing = false;
                return None;
            }
        } else {
            self.current_index = Some(next_idx);
            self.is_playing = true;
        }

        self.current_song()
    }

    /// Step back. At the first track, wraps with loop `all` and does
    /// nothing otherwise.
    pub fn previous(&mut self) -> Option<Song> {
        let idx = self.current_index?;
        if self.playlist.is_empty() {
            return None;
        }

        if idx == 0 {
            if self.loop_mode != LoopMode::All {
                return None;
            }
            self.current_index = Some(self.playlist.len() - 1);
        } else {
            self.current_index = Some(idx - 1);
        }
        self.is_playing = true;

        self.current_song()
    }

    pub fn toggle_shuffle(&mut self) {
        // Nothing playing: keep state as is, shuffle flag included
        let Some(current) = self.current_song() else {
            return;
        };

        self.is_shuffle = !self.is_shuffle;

        if self.is_shuffle {
            // Remove one copy of the current song; repeated ids stay queued
            let pinned = self
                .current_index
                .filter(|&idx| {
                    self.original_playlist
                        .get(idx)
                        .is_some_and(|s| s.id == current.id)
                })
                .or_else(|| {
                    self.original_playlist
                        .iter()
                        .position(|s| s.id == current.id)
                });
            let mut rest: Vec<Song> = self
                .original_playlist
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != pinned)
                .map(|(_, s)| s.clone())
                .collect();
            rest.shuffle(&mut self.rng);

            let mut playlist = Vec::with_capacity(rest.len() + 1);
            playlist.push(current);
            playlist.extend(rest);

            self.playlist = playlist;
            self.current_index = Some(0);
        } else {
            self.playlist = self.original_playlist.clone();
            self.current_index = Some(
                self.original_playlist
                    .iter()
                    .position(|s| s.id == current.id)
                    .unwrap_or(0),
            );
        }

        log::debug!(
            "Shuffle {} (index: {:?})",
            if self.is_shuffle { "on" } else { "off" },
            self.current_index
        );
    }

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        self.loop_mode = self.loop_mode.cycle();
        self.loop_mode
    }

    /// Returns the volume actually applied.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        if !volume.is_finite() {
            log::warn!("Ignoring non-finite volume {}", volume);
            return self.volume;
        }
        if !(0.0..=1.0).contains(&volume) {
            log::warn!("Volume {} out of range, clamping to [0, 1]", volume);
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.volume
    }

    /// Auto-advance at natural end of track.
    pub fn track_ended(&mut self) -> TrackEnd {
        if self.current_index.is_none() {
            return TrackEnd::Stopped;
        }
        if self.loop_mode == LoopMode::One {
            return TrackEnd::Replay;
        }
        match self.next() {
            Some(_) => TrackEnd::Advanced,
            None => TrackEnd::Stopped,
        }
    }

    pub fn can_go_next(&self) -> bool {
        match self.current_index {
            Some(idx) => idx + 1 < self.playlist.len() || self.loop_mode == LoopMode::All,
            None => false,
        }
    }

    pub fn current_song(&self) -> Option<Song> {
        self.current_index
            .and_then(|idx| self.playlist.get(idx))
            .cloned()
    }

    pub fn playlist(&self) -> &[Song] {
        &self.playlist
    }

    pub fn original_playlist(&self) -> &[Song] {
        &self.original_playlist
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_shuffle(&self) -> bool {
        self.is_shuffle
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            playlist: self.playlist.clone(),
            current_index: self.current_index,
            current_song: self.current_song(),
            is_playing: self.is_playing,
            is_shuffle: self.is_shuffle,
            loop_mode: self.loop_mode,
            volume: self.volume,
        }
    }
}
