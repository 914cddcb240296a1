use crate::models::Song;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handed out when a search starts; only the newest ticket may publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchSnapshot {
    pub generation: u64,
    pub query: String,
    pub songs: Vec<Song>,
}

/// Results of the most recent search, guarded against late responses from
/// searches the user has already replaced.
#[derive(Default)]
pub struct SearchSession {
    generation: AtomicU64,
    latest: RwLock<SearchSnapshot>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, query: &str) -> SearchTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Search #{} started: \"{}\"", generation, query);
        SearchTicket {
            generation,
            query: query.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Publish results for `ticket`. Returns false and drops them if a newer
    /// search has started since.
    pub fn complete(&self, ticket: &SearchTicket, songs: Vec<Song>) -> bool {
        let mut latest = self.latest.write();
        // Checked under the write lock so two completions can't interleave
        if !self.is_current(ticket) {
            log::debug!(
                "Discarding stale results for search #{} (\"{}\")",
                ticket.generation,
                ticket.query
            );
            return false;
        }

        *latest = SearchSnapshot {
            generation: ticket.generation,
            query: ticket.query.clone(),
            songs,
        };
        true
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.latest.read().clone()
    }
}
