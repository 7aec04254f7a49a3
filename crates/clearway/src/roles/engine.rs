//! Evaluate rule passes and compute the minimal membership diff.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::rule::{DecisionContext, LabelKey, RoleRule};
use crate::types::{EncounterKey, Identity, Rankings};

/// An ordered rule collection evaluated against one encounter scope.
#[derive(Debug, Clone, Default)]
pub struct RulePass {
    pub rules: Vec<RoleRule>,
    pub encounters: BTreeSet<EncounterKey>,
}

impl RulePass {
    pub fn new(rules: Vec<RoleRule>, encounters: BTreeSet<EncounterKey>) -> Self {
        Self { rules, encounters }
    }
}

/// Standard rules and top-tier rules. Each pass only sees its own tier's
/// encounters, so top-tier clears never count toward standard roles.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    pub standard: RulePass,
    pub top_tier: RulePass,
}

impl RuleBook {
    pub fn passes(&self) -> [&RulePass; 2] {
        [&self.standard, &self.top_tier]
    }

    /// Every rule, standard first.
    pub fn rules(&self) -> impl Iterator<Item = &RoleRule> {
        self.standard.rules.iter().chain(self.top_tier.rules.iter())
    }
}

/// Roles to grant and revoke, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MembershipDiff {
    pub to_add: Vec<RoleRule>,
    pub to_remove: Vec<RoleRule>,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    pub fn add_names(&self) -> Vec<&str> {
        self.to_add.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn remove_names(&self) -> Vec<&str> {
        self.to_remove.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Compare desired roles against `held`.
///
/// A rule lands in `to_add` only if it applies and is not held, and in
/// `to_remove` only if it does not apply and is held. Unmanaged rules are
/// skipped. Re-running against the post-apply `held` set yields an empty
/// diff.
pub fn compute_diff(
    identity: &Identity,
    rankings: &Rankings,
    held: &HashSet<LabelKey>,
    book: &RuleBook,
) -> MembershipDiff {
    let mut diff = MembershipDiff::default();

    for pass in book.passes() {
        let ctx = DecisionContext::new(identity, rankings, &pass.encounters);
        for rule in &pass.rules {
            let Some(applies) = rule.evaluate(&ctx) else {
                continue;
            };
            let is_held = held.contains(&rule.key);
            debug!(rule = %rule.name, applies, is_held, "evaluated rule");
            match (applies, is_held) {
                (true, false) => diff.to_add.push(rule.clone()),
                (false, true) => diff.to_remove.push(rule.clone()),
                _ => {}
            }
        }
    }

    diff
}
