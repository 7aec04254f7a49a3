//! Membership store abstraction (roles held by a user in a guild).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::Mutex;

use crate::roles::LabelKey;

/// External store of role memberships, e.g. a chat platform's guild roles.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Grant `label` to `user_id` in `group_id`.
    async fn add_label(&self, group_id: &str, user_id: &str, label: &LabelKey) -> Result<()>;
    /// Revoke `label` from `user_id` in `group_id`.
    async fn remove_label(&self, group_id: &str, user_id: &str, label: &LabelKey) -> Result<()>;
    /// Labels currently held by `user_id` in `group_id`.
    async fn current_labels(&self, group_id: &str, user_id: &str) -> Result<HashSet<LabelKey>>;
}

/// A recorded membership change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Add(LabelKey),
    Remove(LabelKey),
}

/// In-process store. Backs dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    members: Mutex<HashMap<(String, String), BTreeSet<LabelKey>>>,
    history: Mutex<Vec<StoreCall>>,
    /// Labels whose add or remove is rejected.
    rejected: BTreeSet<LabelKey>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every add/remove of `label`, as a store lacking permissions
    /// for that role would.
    pub fn rejecting(mut self, label: impl Into<LabelKey>) -> Self {
        self.rejected.insert(label.into());
        self
    }

    /// Seed the labels a user already holds.
    pub async fn seed<I, S>(&self, group_id: &str, user_id: &str, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<LabelKey>,
    {
        let mut members = self.members.lock().await;
        members
            .entry((group_id.to_string(), user_id.to_string()))
            .or_default()
            .extend(labels.into_iter().map(Into::into));
    }

    /// Every successful add/remove, in call order.
    pub async fn history(&self) -> Vec<StoreCall> {
        self.history.lock().await.clone()
    }

    fn check(&self, label: &LabelKey) -> Result<()> {
        if self.rejected.contains(label) {
            return Err(anyhow!("missing permissions to manage `{label}`"));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn add_label(&self, group_id: &str, user_id: &str, label: &LabelKey) -> Result<()> {
        self.check(label)?;
        self.members
            .lock()
            .await
            .entry((group_id.to_string(), user_id.to_string()))
            .or_default()
            .insert(label.clone());
        self.history.lock().await.push(StoreCall::Add(label.clone()));
        Ok(())
    }

    async fn remove_label(&self, group_id: &str, user_id: &str, label: &LabelKey) -> Result<()> {
        self.check(label)?;
        if let Some(labels) = self
            .members
            .lock()
            .await
            .get_mut(&(group_id.to_string(), user_id.to_string()))
        {
            labels.remove(label);
        }
        self.history
            .lock()
            .await
            .push(StoreCall::Remove(label.clone()));
        Ok(())
    }

    async fn current_labels(&self, group_id: &str, user_id: &str) -> Result<HashSet<LabelKey>> {
        Ok(self
            .members
            .lock()
            .await
            .get(&(group_id.to_string(), user_id.to_string()))
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default())
    }
}
