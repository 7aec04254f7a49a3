//! Rankings provider abstraction (the raid-log API).

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::types::{Identity, RankingRequest, Rankings};

/// Source of per-encounter rankings for a character.
#[async_trait]
pub trait RankingProvider: Send + Sync {
    /// Rankings for every requested encounter the character has data for.
    /// Encounters without data may be omitted from the result.
    async fn rankings(&self, requests: &[RankingRequest], identity: &Identity) -> Result<Rankings>;
}

/// Fixed rankings, e.g. loaded from a JSON export.
#[derive(Debug, Clone, Default)]
pub struct StaticRankings {
    rankings: Rankings,
}

impl StaticRankings {
    pub fn new(rankings: Rankings) -> Self {
        Self { rankings }
    }

    /// Load a `{"<encounter>": {"total_kills": N, "best_percent": P}}` file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::new(serde_json::from_str(&raw)?))
    }
}

#[async_trait]
impl RankingProvider for StaticRankings {
    async fn rankings(&self, requests: &[RankingRequest], _identity: &Identity) -> Result<Rankings> {
        Ok(requests
            .iter()
            .filter_map(|req| {
                self.rankings
                    .get(&req.key)
                    .map(|r| (req.key.clone(), r.clone()))
            })
            .collect())
    }
}
