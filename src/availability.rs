//! Which technologies and abilities matter for a unit.
//!
//! These queries back the modifier pickers: they list the combat-relevant
//! modifiers a unit can actually receive for a civilization and age, and
//! sort technologies into display categories.

use crate::catalog::Catalog;
use crate::config::ALL_CIVS;
use crate::effect::{ModifierEffect, Property};
use crate::model::{Entity, EntityKind, Variation};
use crate::selector::applies;
use crate::tiers::entity_tier;
use std::collections::HashSet;
use std::fmt;

/// Target classes that mark an effect as economic or environmental.
const NON_COMBAT_TARGETS: [&str; 6] = ["hunt", "herdable", "wildlife", "gaia", "building", "economic"];

fn any_effect_applies(effects: &[ModifierEffect], unit_id: &str, classes: &[String]) -> bool {
    effects.iter().any(|e| applies(e, unit_id, classes))
}

/// Whether some variation of `tech` changes a combat stat.
pub fn is_combat_technology(tech: &Entity) -> bool {
    tech.variations
        .iter()
        .flat_map(|v| v.effects.iter())
        .any(|e| e.property.is_recognized())
}

fn is_combat_ability_effect(effect: &ModifierEffect) -> bool {
    if !effect.select.id.is_empty() {
        return true;
    }
    if !effect.property.is_recognized() {
        return false;
    }
    match &effect.target {
        Some(target) if !target.class.is_empty() => !target
            .class
            .flattened()
            .iter()
            .all(|class| NON_COMBAT_TARGETS.iter().any(|nc| class.contains(nc))),
        _ => true,
    }
}

/// Whether `ability` targets specific units or changes a combat stat
/// against something other than wildlife, buildings and the economy.
pub fn is_combat_ability(ability: &Entity) -> bool {
    ability.all_effects().any(is_combat_ability_effect)
}

fn variation_serves(variation: &Variation, civ: &str) -> bool {
    civ == ALL_CIVS || variation.civs.iter().any(|c| c == civ)
}

/// Combat technologies `civ` can research by `age` that affect the unit.
///
/// # Examples
///
/// ```rust
/// use skirmish::{availability::technologies_for_unit, Catalog};
///
/// let catalog = Catalog::from_json_str(r#"[
///   { "id": "bloomery", "type": "technology", "minAge": 1, "variations": [
///     { "age": 1, "civs": ["en"], "effects": [
///       { "property": "meleeAttack", "select": { "class": [["infantry", "melee"]] }, "value": 1 }
///     ] }
///   ] }
/// ]"#, &[]).unwrap();
/// let classes = vec!["infantry".to_string(), "melee".to_string()];
///
/// let techs = technologies_for_unit(&catalog, "spearman", &classes, "en", 2);
/// assert_eq!(techs.len(), 1);
/// assert!(technologies_for_unit(&catalog, "spearman", &classes, "fr", 2).is_empty());
/// ```
pub fn technologies_for_unit<'c>(
    catalog: &'c Catalog,
    unit_id: &str,
    unit_classes: &[String],
    civ: &str,
    age: u8,
) -> Vec<&'c Entity> {
    catalog
        .entities_of_kind(EntityKind::Technology)
        .filter(|tech| is_combat_technology(tech))
        .filter(|tech| tech.serves_civ(civ) && tech.min_age <= age)
        .filter(|tech| {
            tech.variations.iter().any(|v| {
                variation_serves(v, civ)
                    && v.age <= age
                    && any_effect_applies(&v.effects, unit_id, unit_classes)
            })
        })
        .collect()
}

/// Combat abilities available to the unit for `civ`.
///
/// A variation unlocked by a technology the unit already receives is
/// skipped, so the same bonus is not offered twice.
pub fn abilities_for_unit<'c>(
    catalog: &'c Catalog,
    unit_id: &str,
    unit_classes: &[String],
    civ: &str,
    age: u8,
) -> Vec<&'c Entity> {
    let unit_techs: HashSet<&str> = technologies_for_unit(catalog, unit_id, unit_classes, civ, age)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();

    catalog
        .entities_of_kind(EntityKind::Ability)
        .filter(|ability| is_combat_ability(ability))
        .filter(|ability| ability.serves_civ(civ))
        .filter(|ability| {
            if any_effect_applies(&ability.effects, unit_id, unit_classes) {
                return true;
            }
            ability.variations.iter().any(|v| {
                if !v.serves_civ(civ) {
                    return false;
                }
                if v.unlocking_technologies()
                    .iter()
                    .any(|tech| unit_techs.contains(tech))
                {
                    return false;
                }
                any_effect_applies(&v.effects, unit_id, unit_classes)
            })
        })
        .collect()
}

/// Stat family a technology improves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryStat {
    Hp,
    AttackMelee,
    AttackRanged,
    ArmorMelee,
    ArmorRanged,
    Speed,
}

impl CategoryStat {
    fn from_property(property: &Property) -> Option<Self> {
        match property {
            Property::Hitpoints => Some(CategoryStat::Hp),
            Property::MeleeAttack => Some(CategoryStat::AttackMelee),
            Property::RangedAttack => Some(CategoryStat::AttackRanged),
            Property::MeleeArmor => Some(CategoryStat::ArmorMelee),
            Property::RangedArmor => Some(CategoryStat::ArmorRanged),
            Property::MoveSpeed => Some(CategoryStat::Speed),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            CategoryStat::Hp => "HP",
            CategoryStat::AttackMelee => "Attack-Melee",
            CategoryStat::AttackRanged => "Attack-Ranged",
            CategoryStat::ArmorMelee => "Armor-Melee",
            CategoryStat::ArmorRanged => "Armor-Ranged",
            CategoryStat::Speed => "Speed",
        }
    }
}

/// Display grouping of a technology.
///
/// Unique technologies, and technologies outside any tier line, get the
/// `-Unique` flavour of their stat family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TechCategory {
    Stat { stat: CategoryStat, unique: bool },
    Other,
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TechCategory::Stat { stat, unique: false } => f.write_str(stat.label()),
            TechCategory::Stat { stat, unique: true } => write!(f, "{}-Unique", stat.label()),
            TechCategory::Other => f.write_str("Other"),
        }
    }
}

/// Categorize by the first effect of the first variation that names a
/// stat family.
///
/// ```rust
/// use skirmish::availability::categorize_technology;
/// use skirmish::model::Entity;
///
/// let tech: Entity = serde_json::from_str(r#"{
///   "id": "steeled-arrow", "type": "technology",
///   "displayClasses": ["Ranged Damage Technology 2/3"],
///   "variations": [{ "effects": [{ "property": "rangedAttack", "value": 1 }] }]
/// }"#).unwrap();
///
/// assert_eq!(categorize_technology(&tech).to_string(), "Attack-Ranged");
/// ```
pub fn categorize_technology(tech: &Entity) -> TechCategory {
    let unique = tech.unique || entity_tier(tech).is_none();
    tech.variations
        .first()
        .and_then(|v| {
            v.effects
                .iter()
                .find_map(|e| CategoryStat::from_property(&e.property))
        })
        .map(|stat| TechCategory::Stat { stat, unique })
        .unwrap_or(TechCategory::Other)
}
