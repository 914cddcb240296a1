use crate::models::Song;
use crate::providers::traits::{SongSource, SourceError};
use crate::providers::types::SourceId;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub enum SourceOp<'a> {
    Search(&'a str),
    Related(&'a str),
}

impl SourceOp<'_> {
    fn label(&self) -> &'static str {
        match self {
            SourceOp::Search(_) => "search",
            SourceOp::Related(_) => "related",
        }
    }
}

/// Winning tier and its results.
#[derive(Debug, Clone)]
pub struct SourceHit {
    pub source: SourceId,
    pub songs: Vec<Song>,
}

/// Ordered list of source tiers, highest priority first.
#[derive(Default, Clone)]
pub struct SourceChain {
    tiers: Vec<Arc<dyn SongSource>>,
}

impl SourceChain {
    pub fn new() -> Self {
        Self { tiers: Vec::new() }
    }

    /// Appends a tier at the lowest priority so far.
    pub fn register(&mut self, source: Arc<dyn SongSource>) {
        log::info!(
            "Registering search tier {}: {} ({})",
            self.tiers.len() + 1,
            source.name(),
            source.id()
        );
        self.tiers.push(source);
    }

    pub fn with(mut self, source: Arc<dyn SongSource>) -> Self {
        self.register(source);
        self
    }

    pub fn tiers(&self) -> Vec<SourceId> {
        self.tiers.iter().map(|t| t.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Try each eligible tier once, in order, and stop at the first
    /// non-empty result. Failures and empty results fall through.
    pub async fn first_hit(&self, op: SourceOp<'_>, credential: Option<&str>) -> Option<SourceHit> {
        let credential = credential.map(str::trim).filter(|c| !c.is_empty());

        for (idx, tier) in self.tiers.iter().enumerate() {
            if tier.requires_credential() && credential.is_none() {
                log::debug!("Skipping {}: no user credential", tier.name());
                continue;
            }

            let result = match op {
                SourceOp::Search(query) => tier.search(query, credential).await,
                SourceOp::Related(id) => {
                    if !tier.supports_related() {
                        continue;
                    }
                    tier.related(id, credential).await
                }
            };

            match result {
                Ok(songs) if !songs.is_empty() => {
                    log::info!(
                        "Found {} {} results via {}",
                        songs.len(),
                        op.label(),
                        tier.name()
                    );
                    return Some(SourceHit {
                        source: tier.id(),
                        songs,
                    });
                }
                Ok(_) => {
                    log::debug!(
                        "[{}/{}] {} returned no {} results",
                        idx + 1,
                        self.tiers.len(),
                        tier.name(),
                        op.label()
                    );
                }
                Err(e) => {
                    log_tier_failure(tier.as_ref(), &e, idx + 1, self.tiers.len());
                }
            }
        }

        None
    }
}

fn log_tier_failure(tier: &dyn SongSource, err: &SourceError, position: usize, total: usize) {
    match err {
        SourceError::Unsupported(_) => {
            log::debug!("[{}/{}] {}", position, total, err);
        }
        _ if tier.id().is_remote() => {
            log::warn!("[{}/{}] {} failed: {}", position, total, tier.name(), err);
        }
        _ => {
            log::info!("[{}/{}] {} unavailable: {}", position, total, tier.name(), err);
        }
    }
}
