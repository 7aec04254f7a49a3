//! Clearway — Lodestone character verification and clear-role sync.
//!
//! Resolves a character name to its Lodestone id, checks that the requester
//! owns the character, crawls achievements, and keeps a member's roles in
//! line with their raid rankings.

pub mod config;
pub mod error;
pub mod frontier;
pub mod http_client;
pub mod lodestone;
pub mod pipeline;
pub mod rankings;
pub mod roles;
pub mod store;
pub mod types;

pub use config::{load_config, ClearwayConfig, ParseRole};
pub use error::{ClearwayError, Result, SyncAction};
pub use frontier::Frontier;
pub use lodestone::achievements::AchievementCrawl;
pub use lodestone::{AchievementEntry, Lodestone, LodestoneId};
pub use pipeline::{ClearsOutcome, ClearsPipeline, ClearsReport};
pub use rankings::{RankingProvider, StaticRankings};
pub use roles::{
    compute_diff, synchronize_labels, DecisionContext, MemberRef, MembershipDiff, RoleRule,
    RuleBook, RulePass, SyncReport,
};
pub use store::{InMemoryStore, MembershipStore};
pub use types::{Encounter, Identity, Ranking, RankingRequest, Rankings, Tier};
