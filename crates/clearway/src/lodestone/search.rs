//! Resolve a character name and world to exactly one Lodestone id.
//!
//! Page 1 of the search is fetched first. If its pager reports more pages,
//! pages 2..=N are fetched concurrently, spawned at most once per session.
//! Fetch and parse errors are collected and reported together after every
//! page has finished.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::parse::{parse_search_page, LodestoneId};
use super::Lodestone;
use crate::error::{ClearwayError, Result};
use crate::http_client::{PoliteClient, Throttle};
use crate::types::Identity;

/// Most result pages one search session will fetch.
pub const MAX_SEARCH_PAGES: u32 = 20;

/// What one search crawl collected.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    pub matches: Vec<LodestoneId>,
    pub errors: Vec<String>,
    /// Number of pages fetched (successfully or not).
    pub pages_visited: usize,
}

/// State for one search crawl. Never reused across identities.
struct SearchSession {
    lodestone: Lodestone,
    throttle: Throttle,
    search_url: String,
    full_name: String,
    matches: Mutex<Vec<LodestoneId>>,
    errors: Mutex<Vec<String>>,
    pages_visited: AtomicUsize,
    spawned_children: AtomicBool,
}

impl SearchSession {
    fn page_url(&self, page: u32) -> String {
        format!("{}&page={page}", self.search_url)
    }

    /// Fetch and evaluate one results page. Returns child page URLs to
    /// spawn, which is non-empty at most once per session.
    async fn visit(self: Arc<Self>, url: String) -> Vec<String> {
        self.pages_visited.fetch_add(1, Ordering::SeqCst);
        let client = PoliteClient::new(&self.lodestone.http, &self.throttle);
        let body = match client.get(&url).await {
            Ok(resp) => resp.body,
            Err(e) => {
                warn!("search page fetch failed: {e:#}");
                self.errors.lock().await.push(format!("{e:#}"));
                return Vec::new();
            }
        };

        let page = parse_search_page(&body, &self.full_name);
        debug!(
            url = %url,
            matches = page.matches.len(),
            pager = ?page.pager,
            "parsed search page"
        );
        if !page.matches.is_empty() {
            self.matches.lock().await.extend(page.matches);
        }
        if !page.errors.is_empty() {
            self.errors.lock().await.extend(page.errors);
        }

        let Some(pager) = page.pager else {
            return Vec::new();
        };
        if pager.current_page != 1 || pager.total_pages <= 1 {
            return Vec::new();
        }
        if self.spawned_children.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }
        let last = if pager.total_pages > MAX_SEARCH_PAGES {
            warn!(
                "pager reports {} pages, crawling the first {MAX_SEARCH_PAGES}",
                pager.total_pages
            );
            self.errors.lock().await.push(format!(
                "Search reported {} pages; only the first {MAX_SEARCH_PAGES} were checked",
                pager.total_pages
            ));
            MAX_SEARCH_PAGES
        } else {
            pager.total_pages
        };
        (2..=last).map(|n| self.page_url(n)).collect()
    }
}

impl Lodestone {
    /// Crawl every search results page for `name` on `world`.
    ///
    /// Does not interpret the matches; see [`Lodestone::resolve_identity`].
    pub async fn search(&self, name: &str, world: &str) -> SearchOutcome {
        let search_url = self.search_url(name, world);
        let session = Arc::new(SearchSession {
            lodestone: self.clone(),
            throttle: self.new_throttle(),
            search_url: search_url.clone(),
            full_name: name.to_string(),
            matches: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            pages_visited: AtomicUsize::new(0),
            spawned_children: AtomicBool::new(false),
        });

        let mut tasks = JoinSet::new();
        tasks.spawn(Arc::clone(&session).visit(search_url));
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(children) => {
                    if !children.is_empty() {
                        debug!("spawning {} child search pages", children.len());
                    }
                    for url in children {
                        tasks.spawn(Arc::clone(&session).visit(url));
                    }
                }
                Err(e) => session
                    .errors
                    .lock()
                    .await
                    .push(format!("Could not spawn child page: {e}")),
            }
        }

        let matches = std::mem::take(&mut *session.matches.lock().await);
        let errors = std::mem::take(&mut *session.errors.lock().await);
        SearchOutcome {
            matches,
            errors,
            pages_visited: session.pages_visited.load(Ordering::SeqCst),
        }
    }

    /// Set `identity.lodestone_id` from a unique search match.
    ///
    /// A no-op returning the existing id when already resolved.
    pub async fn resolve_identity(&self, identity: &mut Identity) -> Result<LodestoneId> {
        if let Some(id) = identity.lodestone_id {
            return Ok(id);
        }
        info!("Lodestone ID not set for {identity}, checking the Lodestone...");

        let outcome = self.search(&identity.name(), &identity.world).await;
        if !outcome.errors.is_empty() {
            return Err(ClearwayError::Crawl(outcome.errors));
        }

        match outcome.matches.as_slice() {
            [] => Err(ClearwayError::NotFound {
                name: identity.name(),
                world: identity.world.clone(),
            }),
            [id] => {
                info!(
                    "resolved {identity} to Lodestone ID {id} ({} pages)",
                    outcome.pages_visited
                );
                identity.lodestone_id = Some(*id);
                Ok(*id)
            }
            many => Err(ClearwayError::Ambiguous {
                name: identity.name(),
                world: identity.world.clone(),
                count: many.len(),
            }),
        }
    }
}
