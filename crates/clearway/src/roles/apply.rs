//! Apply a membership diff to the store and narrate what changed.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use super::engine::{compute_diff, MembershipDiff, RuleBook};
use super::rule::LabelKey;
use crate::error::{ClearwayError, Result, SyncAction};
use crate::store::MembershipStore;
use crate::types::{Identity, Rankings};

/// Whose roles are being synchronized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub group_id: String,
    pub user_id: String,
}

impl MemberRef {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Outcome of a completed synchronization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub diff: MembershipDiff,
    /// One line per action, in application order.
    pub actions: Vec<String>,
}

impl SyncReport {
    /// Narration suitable for posting back to the user.
    pub fn narration(&self) -> String {
        self.actions.iter().map(|a| format!("{a}\n")).collect()
    }
}

/// Apply adds, then removes. Stops at the first failure; anything already
/// applied stays applied.
pub async fn apply_diff(
    store: &dyn MembershipStore,
    member: &MemberRef,
    diff: &MembershipDiff,
) -> Result<Vec<String>> {
    let mut actions = Vec::with_capacity(diff.to_add.len() + diff.to_remove.len());

    for rule in &diff.to_add {
        store
            .add_label(&member.group_id, &member.user_id, &rule.key)
            .await
            .map_err(|e| {
                warn!("adding role {} failed: {e:#}", rule.name);
                ClearwayError::Sync {
                    rule: rule.name.clone(),
                    action: SyncAction::Add,
                    reason: format!("{e:#}"),
                }
            })?;
        actions.push(format!("Adding role: `{}`", rule.name));
    }

    for rule in &diff.to_remove {
        store
            .remove_label(&member.group_id, &member.user_id, &rule.key)
            .await
            .map_err(|e| {
                warn!("removing role {} failed: {e:#}", rule.name);
                ClearwayError::Sync {
                    rule: rule.name.clone(),
                    action: SyncAction::Remove,
                    reason: format!("{e:#}"),
                }
            })?;
        actions.push(format!("Removing role: `{}`", rule.name));
    }

    Ok(actions)
}

/// Bring `member`'s roles in line with `book` and stamp the identity.
///
/// `held` is the set of labels the member holds right now. On success
/// `identity.last_verified_at` is set to the current time. The exclusive
/// borrow of `identity` serializes syncs of one character value; callers
/// sharing identities across tasks should go through
/// [`crate::pipeline::ClearsPipeline`], which locks per character.
pub async fn synchronize_labels(
    identity: &mut Identity,
    rankings: &Rankings,
    held: &HashSet<LabelKey>,
    book: &RuleBook,
    store: &dyn MembershipStore,
    member: &MemberRef,
) -> Result<SyncReport> {
    let diff = compute_diff(identity, rankings, held, book);
    let actions = apply_diff(store, member, &diff).await?;
    identity.last_verified_at = Some(Utc::now());
    info!(
        "synchronized roles for {identity}: +{} -{}",
        diff.to_add.len(),
        diff.to_remove.len()
    );
    Ok(SyncReport { diff, actions })
}
