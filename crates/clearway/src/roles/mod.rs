//! Rule-driven role synchronization.
//!
//! Rules are data carrying an opaque predicate. [`engine::compute_diff`]
//! turns a rule book plus rankings into a minimal add/remove diff and
//! [`apply::synchronize_labels`] pushes it to a membership store.

pub mod apply;
pub mod engine;
pub mod rule;
pub mod rules;

pub use apply::{apply_diff, synchronize_labels, MemberRef, SyncReport};
pub use engine::{compute_diff, MembershipDiff, RuleBook, RulePass};
pub use rule::{DecisionContext, LabelKey, Predicate, RoleRule};
