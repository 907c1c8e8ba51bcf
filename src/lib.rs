//! # skirmish - Deterministic RTS Unit Stat and Combat Engine
//!
//! Resolves unit stats from a game dataset and compares units in combat:
//! - **Deterministic** resolution (same selection and modifiers → same stats)
//! - **Data-driven** modifiers (technologies and abilities come from the dataset)
//! - **Phase-based** aggregation (additive before multiplicative, bonuses last)
//! - **Tier-aware** activation (tier 3 implies tiers 1 and 2)
//!
//! ## Core Concepts
//!
//! ### Resolution Pipeline
//!
//! ```text
//! [Catalog] → [Variation] → [StatBundle] → [CombatEntity] → [VersusResult]
//!                              ↑
//!             technologies, then abilities (tier-expanded)
//! ```
//!
//! 1. The **catalog** holds units, technologies and abilities, each with
//!    per-civilization, per-age variations
//! 2. Active modifiers are **tier-expanded** and their effects aggregated
//!    onto the unit's base stats
//! 3. The **combat evaluator** compares two resolved units one-on-one or
//!    at equal resource cost
//!
//! ## Example
//!
//! ```rust
//! use skirmish::*;
//!
//! let catalog = Catalog::from_json_str(r#"[
//!   { "id": "a", "type": "unit", "variations": [{ "id": "a-1", "age": 1, "hitpoints": 100,
//!       "costs": { "food": 50 },
//!       "weapons": [{ "type": "melee", "damage": 10, "speed": 1 }],
//!       "armor": [{ "type": "melee", "value": 0 }] }] },
//!   { "id": "b", "type": "unit", "variations": [{ "id": "b-1", "age": 1, "hitpoints": 100,
//!       "costs": { "food": 50 },
//!       "weapons": [{ "type": "melee", "damage": 5, "speed": 1 }],
//!       "armor": [{ "type": "melee", "value": 2 }] }] }
//! ]"#, &[]).unwrap();
//!
//! let resolver = StatResolver::new(&catalog, CombatConfig::default());
//! let none: &[&str] = &[];
//! let a = resolver.combat_entity(&Selection::new("a", "all", 1), none, none).unwrap();
//! let b = resolver.combat_entity(&Selection::new("b", "all", 1), none, none).unwrap();
//!
//! let result = resolver.compute_versus(&a, &b, None, None);
//! assert_eq!(result.attacker.hits_to_kill, Some(13));
//! assert_eq!(result.attacker.dps, Some(8.0));
//! assert_eq!(result.winner, Winner::Unit("a".into()));
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] / [`patch`] - Dataset loading and load-time corrections
//! - [`selector`] - Which units an effect applies to
//! - [`tiers`] / [`graph`] - Tier lines and their implied lower tiers
//! - [`aggregate`] - Applying effects to a stat bundle
//! - [`combat`] - One-on-one combat metrics
//! - [`equal_cost`] - Equal-investment army comparison
//! - [`availability`] - Which modifiers a unit can receive
//! - [`resolver`] - Pipeline entry points
//! - [`error`] - Error types

pub mod aggregate;
pub mod availability;
pub mod catalog;
pub mod combat;
pub mod config;
pub mod effect;
pub mod entity_id;
pub mod equal_cost;
pub mod error;
pub mod graph;
pub mod model;
pub mod patch;
pub mod resolver;
pub mod selector;
pub mod tiers;

// Re-export main types for convenience
pub use catalog::Catalog;
pub use config::{CombatConfig, ALL_CIVS};
pub use entity_id::EntityId;
pub use error::{CatalogError, Result};
pub use resolver::{ResolvedUnit, Selection, StatResolver};

// Re-export data model types
pub use effect::{ClassGroups, EffectKind, EffectOp, ModifierEffect, Property, Selector};
pub use model::{Costs, Entity, EntityKind, Variation, Weapon, WeaponKind};
pub use patch::{default_patches, CatalogPatch};

// Re-export evaluation types
pub use aggregate::{apply_effects, BonusDamage, StatBundle};
pub use availability::TechCategory;
pub use combat::{CombatEntity, EffectiveDamage, VersusMetrics, VersusResult, Winner};
pub use equal_cost::{CostMultipliers, EqualCostVersusResult};
