//! Resolution pipeline entry points.
//!
//! Provides [`StatResolver`], which ties the catalog, tier expansion, stat
//! aggregation and the combat evaluators together for a unit selection.

use crate::aggregate::{apply_effects, StatBundle};
use crate::catalog::Catalog;
use crate::combat::{self, CombatEntity, VersusResult};
use crate::config::CombatConfig;
use crate::effect::{ModifierEffect, Property};
use crate::equal_cost::{self, EqualCostVersusResult};
use crate::model::Variation;
use crate::selector::applies;
use crate::tiers::expand_active_tiers;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A unit picked for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub unit_id: String,
    pub civ: String,
    pub age: u8,
}

impl Selection {
    pub fn new(unit_id: impl Into<String>, civ: impl Into<String>, age: u8) -> Self {
        Self {
            unit_id: unit_id.into(),
            civ: civ.into(),
            age,
        }
    }
}

/// A unit with its active technologies and abilities applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUnit {
    pub stats: StatBundle,
    pub combat: CombatEntity,
}

impl ResolvedUnit {
    /// Versus debuffs this unit imposes on its opponents.
    pub fn debuffs(&self) -> &[ModifierEffect] {
        &self.combat.debuffs
    }
}

/// The main entry point: resolves selections against a catalog.
///
/// The resolver only borrows the catalog; it holds no state of its own
/// beyond the combat tunables, so the same selection always resolves to
/// the same unit.
///
/// # Examples
///
/// ```rust
/// use skirmish::{Catalog, CombatConfig, Selection, StatResolver};
///
/// let catalog = Catalog::from_json_str(r#"[
///   { "id": "maa", "type": "unit", "classes": ["infantry", "melee"], "variations": [
///     { "id": "maa-2", "baseId": "maa", "age": 2, "civs": ["en"], "hitpoints": 100,
///       "costs": { "food": 100, "gold": 20 },
///       "weapons": [{ "type": "melee", "damage": 8, "speed": 1.375 }],
///       "armor": [{ "type": "melee", "value": 3 }, { "type": "ranged", "value": 3 }] }
///   ] },
///   { "id": "melee-dmg-1", "type": "technology", "displayClasses": ["Melee Damage Technology 1/3"],
///     "variations": [{ "age": 2, "effects": [
///       { "property": "meleeAttack", "select": { "class": [["infantry", "melee"]] }, "value": 1 }
///     ] }] }
/// ]"#, &[]).unwrap();
///
/// let resolver = StatResolver::new(&catalog, CombatConfig::default());
/// let unit = resolver
///     .resolve_stats(&Selection::new("maa", "en", 2), &["melee-dmg-1"], &[] as &[&str])
///     .unwrap();
///
/// assert_eq!(unit.stats.melee_attack, 9.0);
/// assert_eq!(unit.combat.primary_weapon().unwrap().damage, 9.0);
/// ```
#[derive(Debug, Clone)]
pub struct StatResolver<'c> {
    catalog: &'c Catalog,
    config: CombatConfig,
}

impl<'c> StatResolver<'c> {
    pub fn new(catalog: &'c Catalog, config: CombatConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Resolve a selection with the given active modifiers.
    ///
    /// Technologies are applied to the base stats first, then abilities
    /// are applied to that result. Both lists are tier-expanded, so an
    /// active tier brings its lower tiers along.
    ///
    /// Returns `None` if the unit is unknown or has no variations.
    pub fn resolve_stats<T, A>(
        &self,
        selection: &Selection,
        active_tech_ids: &[T],
        active_ability_ids: &[A],
    ) -> Option<ResolvedUnit>
    where
        T: AsRef<str>,
        A: AsRef<str>,
    {
        let entity = self.catalog.get_entity_by_id(&selection.unit_id)?;
        let variation = self
            .catalog
            .get_variation(&selection.unit_id, &selection.civ, selection.age)?;
        let classes = if variation.classes.is_empty() {
            &entity.classes
        } else {
            &variation.classes
        };
        let unit_id = entity.id.as_str();

        let techs = expand_active_tiers(self.catalog, active_tech_ids, &selection.civ);
        let abilities = expand_active_tiers(self.catalog, active_ability_ids, &selection.civ);
        debug!(
            unit = unit_id,
            techs = techs.len(),
            abilities = abilities.len(),
            "resolving unit"
        );

        let base = StatBundle::from_variation(variation);
        let with_techs = apply_effects(&base, classes, &techs, unit_id);
        let stats = apply_effects(&with_techs, classes, &abilities, unit_id);

        let debuffs = carried_debuffs(techs.iter().chain(&abilities), unit_id, classes);
        let mut combat = CombatEntity::from_resolved(variation, &stats, debuffs);
        combat.id = unit_id.to_string();
        if combat.name.is_empty() {
            combat.name = entity.name.clone();
        }
        if combat.classes.is_empty() {
            combat.classes = classes.clone();
        }

        Some(ResolvedUnit { stats, combat })
    }

    /// The combat-ready view of a selection.
    pub fn combat_entity<T, A>(
        &self,
        selection: &Selection,
        active_tech_ids: &[T],
        active_ability_ids: &[A],
    ) -> Option<CombatEntity>
    where
        T: AsRef<str>,
        A: AsRef<str>,
    {
        self.resolve_stats(selection, active_tech_ids, active_ability_ids)
            .map(|unit| unit.combat)
    }

    /// One-on-one comparison. See [`combat::compute_versus`].
    pub fn compute_versus(
        &self,
        a: &CombatEntity,
        b: &CombatEntity,
        charge_a: Option<f64>,
        charge_b: Option<f64>,
    ) -> VersusResult {
        combat::compute_versus(a, b, charge_a, charge_b, &self.config)
    }

    /// Comparison at roughly equal resource investment. See
    /// [`equal_cost::compute_versus_at_equal_cost`].
    pub fn compute_versus_at_equal_cost(
        &self,
        a: &CombatEntity,
        b: &CombatEntity,
        charge_a: Option<f64>,
        charge_b: Option<f64>,
    ) -> EqualCostVersusResult {
        equal_cost::compute_versus_at_equal_cost(a, b, charge_a, charge_b, &self.config)
    }
}

fn carried_debuffs<'v>(
    variations: impl Iterator<Item = &'v &'v Variation>,
    unit_id: &str,
    classes: &[String],
) -> Vec<ModifierEffect> {
    variations
        .flat_map(|v| v.effects.iter())
        .filter(|e| e.property == Property::VersusOpponentDamageDebuff)
        .filter(|e| applies(e, unit_id, classes))
        .cloned()
        .collect()
}
