//! Role rules and the context they are evaluated against.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::types::{EncounterKey, Identity, Ranking, Rankings};

/// Opaque role identifier in the membership store.
pub type LabelKey = String;

/// Predicate deciding whether a role should be held.
pub type Predicate = Arc<dyn Fn(&DecisionContext<'_>) -> bool + Send + Sync>;

/// What a rule sees: the character plus the rankings for one encounter
/// scope.
///
/// Rankings outside `encounters` are hidden, so a standard-tier rule can
/// never observe a top-tier clear and vice versa.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    identity: &'a Identity,
    rankings: &'a Rankings,
    encounters: &'a BTreeSet<EncounterKey>,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        identity: &'a Identity,
        rankings: &'a Rankings,
        encounters: &'a BTreeSet<EncounterKey>,
    ) -> Self {
        Self {
            identity,
            rankings,
            encounters,
        }
    }

    pub fn identity(&self) -> &'a Identity {
        self.identity
    }

    /// Encounter keys in scope for this pass.
    pub fn encounters(&self) -> &'a BTreeSet<EncounterKey> {
        self.encounters
    }

    /// Ranking for `key`, or `None` if absent or out of scope.
    pub fn ranking(&self, key: &str) -> Option<&'a Ranking> {
        let rankings: &'a Rankings = self.rankings;
        if !self.encounters.contains(key) {
            return None;
        }
        rankings.get(key)
    }

    /// All in-scope rankings, in encounter key order.
    pub fn rankings(&self) -> impl Iterator<Item = (&'a EncounterKey, &'a Ranking)> + 'a {
        let rankings: &'a Rankings = self.rankings;
        let encounters: &'a BTreeSet<EncounterKey> = self.encounters;
        encounters
            .iter()
            .filter_map(move |key| rankings.get(key).map(|r| (key, r)))
    }
}

/// A named role plus the predicate that decides membership.
///
/// Rules without a predicate are managed elsewhere and skipped by sync.
#[derive(Clone)]
pub struct RoleRule {
    pub name: String,
    pub key: LabelKey,
    predicate: Option<Predicate>,
}

impl RoleRule {
    pub fn new<F>(name: impl Into<String>, key: impl Into<LabelKey>, predicate: F) -> Self
    where
        F: Fn(&DecisionContext<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            key: key.into(),
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// A rule sync never touches.
    pub fn unmanaged(name: impl Into<String>, key: impl Into<LabelKey>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            predicate: None,
        }
    }

    pub fn is_managed(&self) -> bool {
        self.predicate.is_some()
    }

    /// `None` for unmanaged rules.
    pub fn evaluate(&self, ctx: &DecisionContext<'_>) -> Option<bool> {
        self.predicate.as_ref().map(|p| p(ctx))
    }
}

impl std::fmt::Debug for RoleRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRule")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("managed", &self.is_managed())
            .finish()
    }
}

impl PartialEq for RoleRule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.key == other.key
    }
}
