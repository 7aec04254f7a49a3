//! Configuration loading and resolution.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClearwayError, Result};
use crate::types::{Encounter, Tier};

/// Default Lodestone root (NA region).
pub const DEFAULT_SITE_ROOT: &str = "https://na.finalfantasyxiv.com/lodestone";

/// Longest accepted refresh window (one year).
pub const MAX_REFRESH_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// A colour role for the best standard-tier parse.
///
/// A character holds the role with the highest `min_percent` its best
/// parse reaches, and none of the lower ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRole {
    pub name: String,
    pub min_percent: f64,
}

/// Runtime settings for crawls and role sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearwayConfig {
    /// Lodestone root, without trailing slash.
    pub site_root: String,
    /// Hard cutoff per fetch. Never retried.
    pub fetch_timeout_ms: u64,
    /// Minimum spacing between fetch starts within one crawl session.
    pub crawl_delay_ms: u64,
    /// A character verified more recently than this is not re-synced.
    pub refresh_window_secs: u64,
    /// Guild the roles live in.
    pub guild_id: String,
    pub encounters: Vec<Encounter>,
    /// Parse colour roles, in any order.
    pub parse_roles: Vec<ParseRole>,
    /// Worlds that get a role named after themselves.
    pub world_roles: Vec<String>,
}

impl Default for ClearwayConfig {
    fn default() -> Self {
        Self {
            site_root: DEFAULT_SITE_ROOT.to_string(),
            fetch_timeout_ms: 30_000,
            crawl_delay_ms: 3_000,
            refresh_window_secs: 300,
            guild_id: String::new(),
            encounters: Vec::new(),
            parse_roles: Vec::new(),
            world_roles: Vec::new(),
        }
    }
}

impl ClearwayConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make crawl URLs or rule keys ambiguous.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.site_root).is_err() {
            return Err(ClearwayError::Config(format!(
                "site_root is not a valid URL: {}",
                self.site_root
            )));
        }
        if self.refresh_window_secs > MAX_REFRESH_WINDOW_SECS {
            return Err(ClearwayError::Config(format!(
                "refresh_window_secs must be at most {MAX_REFRESH_WINDOW_SECS}, got {}",
                self.refresh_window_secs
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for encounter in &self.encounters {
            if encounter.ids.is_empty() {
                return Err(ClearwayError::Config(format!(
                    "encounter `{}` has no ids",
                    encounter.name
                )));
            }
            if !seen.insert(encounter.name.as_str()) {
                return Err(ClearwayError::Config(format!(
                    "duplicate encounter `{}`",
                    encounter.name
                )));
            }
        }
        let mut roles = std::collections::HashSet::new();
        for role in &self.parse_roles {
            if !(0.0..=100.0).contains(&role.min_percent) {
                return Err(ClearwayError::Config(format!(
                    "parse role `{}` needs a percentile between 0 and 100",
                    role.name
                )));
            }
            if !roles.insert(role.name.as_str()) {
                return Err(ClearwayError::Config(format!(
                    "duplicate parse role `{}`",
                    role.name
                )));
            }
        }
        Ok(())
    }

    /// Parse roles ordered by ascending threshold.
    pub fn parse_bands(&self) -> Vec<&ParseRole> {
        let mut bands: Vec<&ParseRole> = self.parse_roles.iter().collect();
        bands.sort_by(|a, b| a.min_percent.total_cmp(&b.min_percent));
        bands
    }

    pub fn site_root(&self) -> &str {
        self.site_root.trim_end_matches('/')
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }

    pub fn refresh_window(&self) -> chrono::Duration {
        let secs = self.refresh_window_secs.min(MAX_REFRESH_WINDOW_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    /// Encounters of the given tier, in configured order.
    pub fn encounters_in(&self, tier: Tier) -> impl Iterator<Item = &Encounter> {
        self.encounters.iter().filter(move |e| e.tier == tier)
    }
}

/// Resolve the config file path.
///
/// Order: explicit path, `CLEARWAY_CONFIG`, `./clearway.json`,
/// `~/.clearway/config.json`. Returns `None` when nothing exists.
pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    if let Ok(env_path) = std::env::var("CLEARWAY_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    let cwd_config = PathBuf::from("clearway.json");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    dirs::home_dir()
        .map(|home| home.join(".clearway").join("config.json"))
        .filter(|p| p.exists())
}

/// Load the resolved config, falling back to defaults when no file exists.
pub fn load_config(explicit: Option<&str>) -> Result<ClearwayConfig> {
    match resolve_config_path(explicit) {
        Some(path) => ClearwayConfig::load(&path),
        None => Ok(ClearwayConfig::default()),
    }
}
