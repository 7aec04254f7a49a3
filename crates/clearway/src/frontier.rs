//! Deduplicating breadth-first work queue of URLs.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use crate::error::{ClearwayError, Result};

#[derive(Debug, Default)]
struct FrontierState {
    pending: VecDeque<String>,
    visited: BTreeSet<String>,
}

/// URLs still to fetch plus URLs already fetched, behind one lock.
///
/// A URL is accepted by [`Frontier::enqueue`] only if it is neither pending
/// nor visited, so no page is ever fetched twice and link cycles terminate.
/// Scope one frontier to one crawl session.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a frontier holding a single seed URL.
    pub fn seeded(url: impl Into<String>) -> Self {
        let frontier = Self::new();
        frontier.enqueue(url);
        frontier
    }

    fn state(&self) -> MutexGuard<'_, FrontierState> {
        // A panic while holding the lock cannot leave the sets half-updated.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add `url` unless it is already pending or visited. Returns whether
    /// it was added.
    pub fn enqueue(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        let mut state = self.state();
        if state.visited.contains(&url) || state.pending.contains(&url) {
            return false;
        }
        state.pending.push_back(url);
        true
    }

    /// Pop the oldest pending URL.
    pub fn next(&self) -> Result<String> {
        self.state()
            .pending
            .pop_front()
            .ok_or(ClearwayError::EmptyFrontier)
    }

    /// Record `url` as fetched. Also drops it from pending if still queued.
    pub fn mark_visited(&self, url: impl Into<String>) {
        let url = url.into();
        let mut state = self.state();
        state.pending.retain(|p| p != &url);
        state.visited.insert(url);
    }

    pub fn is_empty(&self) -> bool {
        self.state().pending.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.state().visited.len()
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.state().visited.contains(url)
    }
}
