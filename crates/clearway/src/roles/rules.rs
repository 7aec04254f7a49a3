//! Ready-made rules for the common clear and parse roles.

use std::collections::BTreeSet;

use super::engine::{RuleBook, RulePass};
use super::rule::RoleRule;
use crate::config::ClearwayConfig;
use crate::types::{EncounterKey, Tier};

/// Role held while `encounter` is in scope and has at least one kill.
pub fn cleared(name: impl Into<String>, encounter: impl Into<EncounterKey>) -> RoleRule {
    let name = name.into();
    let encounter = encounter.into();
    RoleRule::new(name.clone(), name, move |ctx| {
        ctx.ranking(&encounter).is_some_and(|r| r.cleared())
    })
}

/// Role held while the best in-scope parse is at least `min_percent`.
pub fn best_parse_at_least(name: impl Into<String>, min_percent: f64) -> RoleRule {
    best_parse_in(name, min_percent, None)
}

/// Role held while the best in-scope parse is at least `min_percent` and,
/// when `below` is set, under it.
pub fn best_parse_in(name: impl Into<String>, min_percent: f64, below: Option<f64>) -> RoleRule {
    let name = name.into();
    RoleRule::new(name.clone(), name, move |ctx| {
        let best = ctx
            .rankings()
            .filter_map(|(_, r)| r.best_percent)
            .max_by(f64::total_cmp);
        best.is_some_and(|p| p >= min_percent && below.map_or(true, |b| p < b))
    })
}

/// Role held by characters on `world`.
pub fn on_world(world: impl Into<String>) -> RoleRule {
    let world = world.into();
    RoleRule::new(world.clone(), world.clone(), move |ctx| {
        ctx.identity().world.eq_ignore_ascii_case(&world)
    })
}

/// Name of the clear role for an encounter, e.g. `P1S-Cleared`.
pub fn cleared_role_name(encounter: &str) -> String {
    format!("{encounter}-Cleared")
}

/// Rule book for a guild config.
///
/// Each tier gets one clear role per encounter. The standard pass also gets
/// the parse colour bands and the world roles.
pub fn from_config(config: &ClearwayConfig) -> RuleBook {
    let pass = |tier: Tier| {
        let encounters: BTreeSet<EncounterKey> = config
            .encounters_in(tier)
            .map(|e| e.name.clone())
            .collect();
        let rules = config
            .encounters_in(tier)
            .map(|e| cleared(cleared_role_name(&e.name), e.name.clone()))
            .collect();
        RulePass::new(rules, encounters)
    };

    let mut standard = pass(Tier::Standard);
    let bands = config.parse_bands();
    for (i, band) in bands.iter().enumerate() {
        let below = bands.get(i + 1).map(|next| next.min_percent);
        standard
            .rules
            .push(best_parse_in(band.name.clone(), band.min_percent, below));
    }
    standard
        .rules
        .extend(config.world_roles.iter().map(|world| on_world(world.clone())));

    RuleBook {
        standard,
        top_tier: pass(Tier::TopTier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::rule::DecisionContext;
    use crate::config::ParseRole;
    use crate::types::{Encounter, Identity, Ranking, Rankings};

    fn rankings() -> Rankings {
        let mut r = Rankings::new();
        r.insert(
            "P1S".into(),
            Ranking {
                total_kills: 4,
                best_percent: Some(96.0),
            },
        );
        r.insert("P2S".into(), Ranking::default());
        r.insert(
            "UCoB".into(),
            Ranking {
                total_kills: 1,
                best_percent: Some(100.0),
            },
        );
        r
    }

    #[test]
    fn test_cleared_rule() {
        let identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
        let rankings = rankings();
        let scope: BTreeSet<EncounterKey> = ["P1S".to_string(), "P2S".to_string()].into();
        let ctx = DecisionContext::new(&identity, &rankings, &scope);

        assert_eq!(cleared("P1S-Cleared", "P1S").evaluate(&ctx), Some(true));
        assert_eq!(cleared("P2S-Cleared", "P2S").evaluate(&ctx), Some(false));
        assert_eq!(cleared("UCoB-Cleared", "UCoB").evaluate(&ctx), Some(false));
    }

    #[test]
    fn test_parse_rule_ignores_other_tier() {
        let identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
        let rankings = rankings();
        let scope: BTreeSet<EncounterKey> = ["P1S".to_string(), "P2S".to_string()].into();
        let ctx = DecisionContext::new(&identity, &rankings, &scope);

        assert_eq!(best_parse_at_least("Orange", 95.0).evaluate(&ctx), Some(true));
        assert_eq!(best_parse_at_least("Gold", 100.0).evaluate(&ctx), Some(false));
    }

    #[test]
    fn test_world_rule() {
        let identity = Identity::new("gaia", "Jane", "Doe").unwrap();
        let rankings = Rankings::new();
        let scope = BTreeSet::new();
        let ctx = DecisionContext::new(&identity, &rankings, &scope);
        assert_eq!(on_world("Gaia").evaluate(&ctx), Some(true));
        assert_eq!(on_world("Ixion").evaluate(&ctx), Some(false));
    }

    #[test]
    fn test_from_config_splits_tiers() {
        let config = ClearwayConfig {
            encounters: vec![
                Encounter {
                    name: "P1S".into(),
                    ids: vec![78],
                    difficulty: 101,
                    tier: Tier::Standard,
                },
                Encounter {
                    name: "UCoB".into(),
                    ids: vec![1060],
                    difficulty: 100,
                    tier: Tier::TopTier,
                },
            ],
            ..Default::default()
        };
        let book = from_config(&config);
        assert_eq!(book.standard.rules[0].name, "P1S-Cleared");
        assert!(book.standard.encounters.contains("P1S"));
        assert!(!book.standard.encounters.contains("UCoB"));
        assert_eq!(book.top_tier.rules[0].name, "UCoB-Cleared");
    }

    #[test]
    fn test_from_config_adds_parse_bands_and_worlds() {
        let config = ClearwayConfig {
            encounters: vec![
                Encounter {
                    name: "P1S".into(),
                    ids: vec![78],
                    difficulty: 101,
                    tier: Tier::Standard,
                },
                Encounter {
                    name: "UCoB".into(),
                    ids: vec![1060],
                    difficulty: 100,
                    tier: Tier::TopTier,
                },
            ],
            parse_roles: vec![
                ParseRole {
                    name: "Gold".into(),
                    min_percent: 100.0,
                },
                ParseRole {
                    name: "Orange".into(),
                    min_percent: 95.0,
                },
                ParseRole {
                    name: "Blue".into(),
                    min_percent: 50.0,
                },
            ],
            world_roles: vec!["Gaia".into(), "Ixion".into()],
            ..Default::default()
        };
        let book = from_config(&config);
        let identity = Identity::new("Gaia", "Jane", "Doe").unwrap();
        let rankings = rankings();
        let ctx = DecisionContext::new(&identity, &rankings, &book.standard.encounters);

        // P1S is 96: Orange only. The 100 on UCoB is out of scope.
        let held: Vec<&str> = book
            .standard
            .rules
            .iter()
            .filter(|rule| rule.evaluate(&ctx) == Some(true))
            .map(|rule| rule.name.as_str())
            .collect();
        assert_eq!(held, vec!["P1S-Cleared", "Orange", "Gaia"]);
        assert_eq!(book.top_tier.rules.len(), 1);
    }
}
