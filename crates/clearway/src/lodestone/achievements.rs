//! Breadth-first crawl of a character's achievement pages.

use tracing::{debug, info, warn};

use super::parse::{parse_achievement_page, AchievementEntry};
use super::Lodestone;
use crate::error::{ClearwayError, Result};
use crate::frontier::Frontier;
use crate::http_client::PoliteClient;
use crate::types::Identity;

/// Result of an achievement crawl.
#[derive(Debug, Clone, Default)]
pub struct AchievementCrawl {
    /// Entries in discovery order across all pages.
    pub achievements: Vec<AchievementEntry>,
    /// Pages fetched, in visit order.
    pub visited: Vec<String>,
}

impl Lodestone {
    /// Visit every achievement page reachable from the character's listing.
    ///
    /// Only links under the character's own URL prefix are followed. The
    /// first fetch failure aborts the whole crawl; unlike search, errors are
    /// not collected.
    pub async fn crawl_achievements(&self, identity: &Identity) -> Result<AchievementCrawl> {
        let id = identity
            .lodestone_id
            .ok_or_else(|| ClearwayError::Unresolved(identity.to_string()))?;
        let scope = self.character_url(id);
        let frontier = Frontier::seeded(self.achievements_url(id));
        let throttle = self.new_throttle();
        let client = PoliteClient::new(&self.http, &throttle);
        let mut crawl = AchievementCrawl::default();

        while !frontier.is_empty() {
            let url = frontier.next()?;
            let resp = match client.get(&url).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("achievement crawl for {identity} aborted at {url}: {e:#}");
                    return Err(ClearwayError::Crawl(vec![format!("{e:#}")]));
                }
            };
            frontier.mark_visited(url.clone());

            let page = parse_achievement_page(&resp.body, &url, &scope);
            let mut queued = 0;
            for link in page.links {
                if frontier.enqueue(link) {
                    queued += 1;
                }
            }
            debug!(
                url = %url,
                entries = page.entries.len(),
                queued,
                "parsed achievement page"
            );
            crawl.achievements.extend(page.entries);
            crawl.visited.push(url);
        }

        info!(
            "found {} achievements for {identity} across {} pages",
            crawl.achievements.len(),
            crawl.visited.len()
        );
        Ok(crawl)
    }
}
