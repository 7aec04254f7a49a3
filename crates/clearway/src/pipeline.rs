//! The full `/clears` flow: find the character, check ownership, pull
//! rankings, and sync roles.
//!
//! The chat layer feeds user input in and posts `status` lines and the
//! final message back out.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::ClearwayConfig;
use crate::error::{ClearwayError, Result};
use crate::lodestone::Lodestone;
use crate::rankings::RankingProvider;
use crate::roles::{synchronize_labels, MemberRef, RuleBook, SyncReport};
use crate::store::MembershipStore;
use crate::types::{Identity, RankingRequest};

/// Where the Lodestone profile can be edited.
pub const PROFILE_SETTINGS_URL: &str =
    "https://na.finalfantasyxiv.com/lodestone/my/setting/profile/";

/// How a clears request ended, short of an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearsOutcome {
    /// The token was not in the character's self introduction.
    NotOwner { token: String },
    /// Synced within the refresh window; nothing was fetched.
    UpToDate,
    Synchronized(SyncReport),
}

/// Status lines emitted along the way plus the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearsReport {
    pub status: Vec<String>,
    pub outcome: ClearsOutcome,
}

impl ClearsReport {
    /// Final message for the user.
    pub fn message(&self, identity: &Identity) -> String {
        match &self.outcome {
            ClearsOutcome::NotOwner { token } => format!(
                "I could not verify your ownership of `{identity}`!\nIf this is your character, add the following code to your Lodestone profile and then run `/clears` again:\n\n**{token}**\n\nYou can edit your Lodestone profile at {PROFILE_SETTINGS_URL}"
            ),
            ClearsOutcome::UpToDate => format!("Finished analysis for `{identity}`."),
            ClearsOutcome::Synchronized(report) => format!(
                "Finished analysis for `{identity}`.\n{}",
                report.narration()
            ),
        }
    }
}

/// Runs clears requests against one guild's rule book.
pub struct ClearsPipeline {
    config: ClearwayConfig,
    lodestone: Lodestone,
    rankings: Arc<dyn RankingProvider>,
    store: Arc<dyn MembershipStore>,
    book: RuleBook,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ClearsPipeline {
    pub fn new(
        config: ClearwayConfig,
        lodestone: Lodestone,
        rankings: Arc<dyn RankingProvider>,
        store: Arc<dyn MembershipStore>,
        book: RuleBook,
    ) -> Self {
        Self {
            config,
            lodestone,
            rankings,
            store,
            book,
            locks: DashMap::new(),
        }
    }

    pub fn lodestone(&self) -> &Lodestone {
        &self.lodestone
    }

    /// Ranking requests for every configured encounter.
    pub fn ranking_requests(&self) -> Vec<RankingRequest> {
        self.config.encounters.iter().map(RankingRequest::from).collect()
    }

    /// Run the whole flow for `identity` on behalf of `user_id`.
    ///
    /// Requests for the same character are serialized; different characters
    /// proceed concurrently.
    pub async fn run(
        &self,
        identity: &mut Identity,
        user_id: &str,
        token: &str,
    ) -> Result<ClearsReport> {
        let key = identity.key();
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(identity, user_id, token).await
        };
        drop(lock);
        // Forget the lock once no other run holds or waits on it.
        self.locks
            .remove_if(&key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Characters with a run in flight or waiting.
    pub fn active_identities(&self) -> usize {
        self.locks.len()
    }

    async fn run_locked(
        &self,
        identity: &mut Identity,
        user_id: &str,
        token: &str,
    ) -> Result<ClearsReport> {
        let mut status = vec![format!("Finding `{identity}` in the Lodestone...")];
        self.lodestone.resolve_identity(identity).await?;

        status.push(format!("Verifying ownership of `{identity}`..."));
        if !self.lodestone.verify_ownership(identity, token).await? {
            return Ok(ClearsReport {
                status,
                outcome: ClearsOutcome::NotOwner {
                    token: token.to_string(),
                },
            });
        }

        status.push(format!("Analyzing logs for `{identity}`..."));
        if identity.updated_within(self.config.refresh_window(), Utc::now()) {
            info!("{identity} was synced recently, skipping");
            return Ok(ClearsReport {
                status,
                outcome: ClearsOutcome::UpToDate,
            });
        }

        let report = self.sync(identity, user_id).await?;
        Ok(ClearsReport {
            status,
            outcome: ClearsOutcome::Synchronized(report),
        })
    }

    /// Fetch rankings and current roles, then synchronize.
    pub async fn sync(&self, identity: &mut Identity, user_id: &str) -> Result<SyncReport> {
        let rankings = self
            .rankings
            .rankings(&self.ranking_requests(), identity)
            .await
            .map_err(|e| ClearwayError::Provider(format!("{e:#}")))?;

        let member = MemberRef::new(self.config.guild_id.clone(), user_id);
        let held = self
            .store
            .current_labels(&member.group_id, &member.user_id)
            .await
            .map_err(|e| ClearwayError::Membership(format!("{e:#}")))?;

        synchronize_labels(
            identity,
            &rankings,
            &held,
            &self.book,
            self.store.as_ref(),
            &member,
        )
        .await
    }
}
