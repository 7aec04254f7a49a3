//! Lodestone crawlers: character search, ownership check, achievements.
//!
//! Each public operation runs as its own crawl session with a private
//! throttle and private accumulators. Nothing is shared between sessions
//! except the underlying HTTP connection pool.

pub mod achievements;
pub mod parse;
pub mod profile;
pub mod search;

use std::time::Duration;

use crate::config::ClearwayConfig;
use crate::http_client::{HttpClient, Throttle};

pub use parse::{AchievementEntry, LodestoneId, PagerState};

/// Entry point for all Lodestone crawls.
#[derive(Clone)]
pub struct Lodestone {
    http: HttpClient,
    site_root: String,
    crawl_delay: Duration,
}

impl Lodestone {
    pub fn new(config: &ClearwayConfig) -> Self {
        Self::with_client(
            HttpClient::new(config.fetch_timeout()),
            config.site_root(),
            config.crawl_delay(),
        )
    }

    pub fn with_client(http: HttpClient, site_root: &str, crawl_delay: Duration) -> Self {
        Self {
            http,
            site_root: site_root.trim_end_matches('/').to_string(),
            crawl_delay,
        }
    }

    pub fn site_root(&self) -> &str {
        &self.site_root
    }

    /// Search URL for page 1. Later pages append `&page=N`.
    pub fn search_url(&self, name: &str, world: &str) -> String {
        let q: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        let w: String = url::form_urlencoded::byte_serialize(world.as_bytes()).collect();
        format!("{}/character/?q={q}&worldname={w}", self.site_root)
    }

    /// URL prefix every page belonging to one character shares.
    pub fn character_url(&self, id: LodestoneId) -> String {
        format!("{}/character/{id}/", self.site_root)
    }

    pub fn achievements_url(&self, id: LodestoneId) -> String {
        format!("{}achievement", self.character_url(id))
    }

    fn new_throttle(&self) -> Throttle {
        Throttle::new(self.crawl_delay)
    }
}
