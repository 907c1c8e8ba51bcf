//! Dataset types: entities and their civilization/age variations.
//!
//! These mirror the upstream export closely enough to deserialize it
//! directly. Fields the engine does not use are ignored on load.

use crate::effect::ModifierEffect;
use crate::entity_id::EntityId;
use serde::{Deserialize, Serialize};

fn default_age() -> u8 {
    1
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityKind {
    Unit,
    Technology,
    Ability,
    Other(String),
}

impl Default for EntityKind {
    fn default() -> Self {
        EntityKind::Unit
    }
}

impl From<String> for EntityKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "unit" => EntityKind::Unit,
            "technology" => EntityKind::Technology,
            "ability" => EntityKind::Ability,
            _ => EntityKind::Other(s),
        }
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Unit => "unit".to_string(),
            EntityKind::Technology => "technology".to_string(),
            EntityKind::Ability => "ability".to_string(),
            EntityKind::Other(s) => s,
        }
    }
}

/// Weapon damage type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WeaponKind {
    Melee,
    Ranged,
    Siege,
    Other(String),
}

impl Default for WeaponKind {
    fn default() -> Self {
        WeaponKind::Melee
    }
}

impl From<String> for WeaponKind {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "melee" => WeaponKind::Melee,
            "ranged" => WeaponKind::Ranged,
            "siege" => WeaponKind::Siege,
            _ => WeaponKind::Other(s),
        }
    }
}

impl From<WeaponKind> for String {
    fn from(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Melee => "melee".to_string(),
            WeaponKind::Ranged => "ranged".to_string(),
            WeaponKind::Siege => "siege".to_string(),
            WeaponKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponRange {
    pub min: f64,
    pub max: f64,
}

/// One weapon of a unit variation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weapon {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WeaponKind,
    pub damage: f64,
    /// Cooldown between attacks, in seconds.
    pub speed: f64,
    pub range: WeaponRange,
    /// Innate bonus damage against defender classes.
    pub modifiers: Vec<ModifierEffect>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Armor {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Movement {
    pub speed: f64,
}

/// Resource cost bundle.
///
/// `total`, `popcap` and `time` are informational; [`Costs::total_resources`]
/// is what combat metrics use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Costs {
    pub food: f64,
    pub wood: f64,
    pub stone: f64,
    pub gold: f64,
    pub vizier: f64,
    pub oliveoil: f64,
    pub silver: f64,
    pub total: f64,
    pub popcap: f64,
    pub time: f64,
}

impl Costs {
    /// Sum of spendable resources, civilization-specific ones included.
    pub fn total_resources(&self) -> f64 {
        self.food + self.wood + self.gold + self.stone + self.oliveoil + self.silver
    }
}

/// Concrete payload of an entity for one civilization/age combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Variation {
    pub id: String,
    pub base_id: String,
    pub name: String,
    #[serde(default = "default_age")]
    pub age: u8,
    pub civs: Vec<String>,
    pub classes: Vec<String>,
    pub display_classes: Vec<String>,
    pub costs: Costs,
    pub hitpoints: f64,
    pub weapons: Vec<Weapon>,
    pub armor: Vec<Armor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<Movement>,
    pub effects: Vec<ModifierEffect>,
    /// References such as `"technologies/camel-support"`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unlocked_by: Vec<serde_json::Value>,
}

impl Variation {
    /// Whether this variation is available to `civ` (`"all"` matches any).
    pub fn serves_civ(&self, civ: &str) -> bool {
        civ == crate::config::ALL_CIVS || self.civs.is_empty() || self.civs.iter().any(|c| c == civ)
    }

    pub fn primary_weapon(&self) -> Option<&Weapon> {
        self.weapons.first()
    }

    /// Armor value of the given type, 0 when absent.
    pub fn armor_value(&self, kind: &str) -> f64 {
        self.armor
            .iter()
            .find(|a| a.kind.eq_ignore_ascii_case(kind))
            .map(|a| a.value)
            .unwrap_or(0.0)
    }

    /// Ids of technologies this variation is unlocked by.
    pub fn unlocking_technologies(&self) -> Vec<&str> {
        self.unlocked_by
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(|s| s.strip_prefix("technologies/"))
            .filter_map(|s| s.rsplit('/').next())
            .collect()
    }
}

/// A unit, technology or ability definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub civs: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub display_classes: Vec<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default = "default_age")]
    pub min_age: u8,
    #[serde(default)]
    pub description: String,
    /// Entity-level effects; merged into every variation on load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<ModifierEffect>,
    #[serde(default)]
    pub variations: Vec<Variation>,
}

impl Entity {
    /// A bare entity with no variations, for building fixtures.
    pub fn new(id: &str, name: &str, kind: EntityKind) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.to_string(),
            kind,
            civs: Vec::new(),
            unique: false,
            display_classes: Vec::new(),
            classes: Vec::new(),
            min_age: 1,
            description: String::new(),
            effects: Vec::new(),
            variations: Vec::new(),
        }
    }

    /// The display-classification string used for tier detection.
    pub fn display_class(&self) -> Option<&str> {
        self.display_classes.first().map(String::as_str)
    }

    /// Whether `civ` has access to this entity (empty list is universal).
    pub fn serves_civ(&self, civ: &str) -> bool {
        civ == crate::config::ALL_CIVS || self.civs.is_empty() || self.civs.iter().any(|c| c == civ)
    }

    /// All effects, entity-level and per variation.
    pub fn all_effects(&self) -> impl Iterator<Item = &ModifierEffect> {
        self.effects
            .iter()
            .chain(self.variations.iter().flat_map(|v| v.effects.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_variation_deserializes() {
        let v: Variation = serde_json::from_str(
            r#"{
                "id": "spearman-2",
                "baseId": "spearman",
                "age": 2,
                "civs": ["en", "fr"],
                "hitpoints": 80,
                "costs": { "food": 60, "wood": 20, "total": 80, "popcap": 1, "time": 15 },
                "weapons": [{
                    "name": "Spear", "type": "melee", "damage": 7, "speed": 1.875,
                    "range": { "min": 0, "max": 0.295 },
                    "modifiers": [{
                        "property": "meleeAttack",
                        "target": { "class": [["cavalry"]] },
                        "effect": "change", "value": 17, "type": "passive"
                    }]
                }],
                "armor": [{ "type": "melee", "value": 0 }, { "type": "ranged", "value": 0 }],
                "movement": { "speed": 1.25 },
                "pbgid": 12345,
                "icon": "ignored"
            }"#,
        )
        .unwrap();
        assert_eq!(v.age, 2);
        assert_eq!(v.costs.total_resources(), 80.0);
        assert_eq!(v.primary_weapon().unwrap().kind, WeaponKind::Melee);
        assert_eq!(v.armor_value("Melee"), 0.0);
        assert!(v.serves_civ("en"));
        assert!(!v.serves_civ("ch"));
        assert!(v.serves_civ("all"));
    }

    #[test]
    fn test_total_resources_counts_civ_specific() {
        let costs = Costs {
            food: 50.0,
            gold: 40.0,
            oliveoil: 25.0,
            silver: 10.0,
            total: 999.0,
            ..Costs::default()
        };
        assert_eq!(costs.total_resources(), 125.0);
    }

    #[test]
    fn test_unlocking_technologies() {
        let v = Variation {
            unlocked_by: vec![
                serde_json::json!("technologies/camel-support"),
                serde_json::json!("buildings/stable"),
                serde_json::json!({ "odd": true }),
            ],
            ..Variation::default()
        };
        assert_eq!(v.unlocking_technologies(), vec!["camel-support"]);
    }

    #[test]
    fn test_entity_defaults() {
        let e: Entity = serde_json::from_str(r#"{ "id": "scout", "type": "unit" }"#).unwrap();
        assert_eq!(e.min_age, 1);
        assert!(e.serves_civ("mo"));
        assert!(e.display_class().is_none());
    }
}
