//! Core data types: characters, encounters, and rankings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ClearwayError, Result};

/// A claimed in-game character.
///
/// Owned by the caller. The crawler fills in `lodestone_id` once and the
/// role sync stamps `last_verified_at` after a successful pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub world: String,
    pub first_name: String,
    pub last_name: String,
    pub lodestone_id: Option<u64>,
    pub last_verified_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Build an identity from raw user input, title-casing every part.
    pub fn new(world: &str, first_name: &str, last_name: &str) -> Result<Self> {
        let world = title_case(world.trim());
        let first_name = title_case(first_name.trim());
        let last_name = title_case(last_name.trim());
        if world.is_empty() || first_name.is_empty() || last_name.is_empty() {
            return Err(ClearwayError::InvalidIdentity);
        }
        Ok(Self {
            world,
            first_name,
            last_name,
            lodestone_id: None,
            last_verified_at: None,
        })
    }

    /// Full display name, e.g. `Jane Doe`.
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Stable key used to serialize work on one character.
    pub fn key(&self) -> String {
        format!("{}@{}", self.name().to_lowercase(), self.world.to_lowercase())
    }

    /// True when a sync finished within `window` of `now`.
    pub fn updated_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.last_verified_at
            .map(|at| now.signed_duration_since(at) < window)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.world)
    }
}

/// Upper-case the first letter of every word and lower-case the rest.
///
/// Apostrophes stay inside a word (`o'brien` → `O'brien`), hyphens start a
/// new one (`jean-luc` → `Jean-Luc`).
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for c in input.chars() {
        if c.is_alphanumeric() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            in_word = c == '\'' && in_word;
            out.push(c);
        }
    }
    out
}

/// Which difficulty tier an encounter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Standard,
    TopTier,
}

/// Encounter key used in ranking maps. Matches `Encounter::name`.
pub type EncounterKey = String;

/// A raid encounter as configured for a guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub name: String,
    /// Raid-log encounter ids that count as this encounter.
    pub ids: Vec<u32>,
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_tier")]
    pub tier: Tier,
}

fn default_difficulty() -> u32 {
    101
}

fn default_tier() -> Tier {
    Tier::Standard
}

/// One request to the rankings provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRequest {
    pub key: EncounterKey,
    pub encounter_ids: Vec<u32>,
    pub difficulty: u32,
}

impl From<&Encounter> for RankingRequest {
    fn from(e: &Encounter) -> Self {
        Self {
            key: e.name.clone(),
            encounter_ids: e.ids.clone(),
            difficulty: e.difficulty,
        }
    }
}

/// Ranking summary for one encounter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    #[serde(default)]
    pub total_kills: u32,
    /// Best historical percentile, if any kill was ranked.
    #[serde(default)]
    pub best_percent: Option<f64>,
}

impl Ranking {
    pub fn cleared(&self) -> bool {
        self.total_kills > 0
    }
}

/// Rankings keyed by encounter.
pub type Rankings = HashMap<EncounterKey, Ranking>;
