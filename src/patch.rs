//! Load-time dataset corrections.
//!
//! Patches run once, in order, against the raw JSON entities before they
//! are decoded. They are plain data so a caller can ship its own list next
//! to the dataset.

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

/// One correction applied to the raw dataset.
///
/// # Examples
///
/// ```rust
/// use skirmish::patch::CatalogPatch;
///
/// let patch: CatalogPatch = serde_json::from_str(r#"{
///     "op": "override",
///     "entityId": "spearman",
///     "path": "variations.0",
///     "value": { "hitpoints": 85 }
/// }"#).unwrap();
///
/// assert!(matches!(patch, CatalogPatch::Override { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CatalogPatch {
    /// Deep-merge `value` into the entity at `path`.
    #[serde(rename_all = "camelCase")]
    Override {
        entity_id: String,
        /// Dot-separated field path; numeric segments index arrays. Empty
        /// means the entity itself.
        #[serde(default)]
        path: String,
        value: Value,
        /// Skip silently when the entity is absent instead of failing.
        #[serde(default)]
        optional: bool,
    },
    /// Append a new entity.
    Insert { entity: Value },
}

impl CatalogPatch {
    /// Override the whole entity `entity_id` with `value`.
    pub fn override_entity(entity_id: &str, value: Value) -> Self {
        CatalogPatch::Override {
            entity_id: entity_id.to_string(),
            path: String::new(),
            value,
            optional: false,
        }
    }
}

/// Merge `patch` into `target`.
///
/// Objects merge key by key, recursively. Arrays, scalars and nulls in the
/// patch replace whatever was there.
///
/// ```rust
/// use skirmish::patch::deep_merge;
/// use serde_json::json;
///
/// let mut unit = json!({ "hitpoints": 80, "armor": [{ "type": "melee", "value": 1 }] });
/// deep_merge(&mut unit, &json!({ "armor": [] , "costs": { "food": 60 } }));
///
/// assert_eq!(unit, json!({ "hitpoints": 80, "armor": [], "costs": { "food": 60 } }));
/// ```
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                deep_merge(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

fn resolve_path<'v>(entity: &'v mut Value, entity_id: &str, path: &str) -> Result<&'v mut Value> {
    let mut current = entity;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        let path_error = || CatalogError::PatchPath {
            entity: entity_id.to_string(),
            path: path.to_string(),
        };
        current = match current {
            Value::Object(map) => map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| path_error())?;
                items.get_mut(index).ok_or_else(path_error)?
            }
            _ => return Err(path_error()),
        };
    }
    Ok(current)
}

fn entity_id_of(entity: &Value) -> Option<&str> {
    entity.get("id").and_then(Value::as_str)
}

/// Apply `patches` in order to a list of raw entities.
pub fn apply_patches(entities: &mut Vec<Value>, patches: &[CatalogPatch]) -> Result<()> {
    for patch in patches {
        match patch {
            CatalogPatch::Override {
                entity_id,
                path,
                value,
                optional,
            } => {
                let entity = entities
                    .iter_mut()
                    .find(|e| entity_id_of(e) == Some(entity_id.as_str()));
                let entity = match (entity, *optional) {
                    (Some(entity), _) => entity,
                    (None, true) => {
                        debug!(entity_id = %entity_id, "optional patch target absent");
                        continue;
                    }
                    (None, false) => return Err(CatalogError::PatchTarget(entity_id.clone())),
                };
                deep_merge(resolve_path(entity, entity_id, path)?, value);
                debug!(entity_id = %entity_id, path = %path, "applied override patch");
            }
            CatalogPatch::Insert { entity } => {
                debug!(entity_id = ?entity_id_of(entity), "inserted patched entity");
                entities.push(entity.clone());
            }
        }
    }
    Ok(())
}

/// Corrections shipped with the engine.
///
/// - Camel units carry a versus debuff cutting horse cavalry damage
///   against them to 80%.
/// - A synthetic `charge-attack` ability gives knights (and ghulams) +10
///   damage on the first hit of an engagement.
pub fn default_patches() -> Vec<CatalogPatch> {
    let camel_unease = json!({
        "effects": [{
            "property": "versusOpponentDamageDebuff",
            "select": {
                "id": [
                    "camel-archer",
                    "camel-rider",
                    "camel-lancer",
                    "desert-raider",
                    "atabeg",
                    "dervish",
                    "trade-caravan",
                    "camel"
                ],
                "class": [["cavalry", "horse"]]
            },
            "effect": "multiply",
            "value": 0.8,
            "type": "ability"
        }]
    });

    let charge_effect = json!({
        "property": "bonusDamage",
        "select": { "class": [["knight"], ["merc_ghulam"]] },
        "effect": "change",
        "value": 10,
        "type": "ability"
    });
    // Entity-level only: load copies it into the variation.
    let charge_attack = json!({
        "id": "charge-attack",
        "name": "Charge Attack",
        "type": "ability",
        "civs": [],
        "minAge": 1,
        "description": "Charge before attacking when unit is far enough",
        "effects": [charge_effect],
        "variations": [{
            "id": "charge-attack-1",
            "baseId": "charge-attack",
            "name": "Charge Attack",
            "age": 1,
            "civs": []
        }]
    });

    vec![
        CatalogPatch::Override {
            entity_id: "ability-camel-unease".to_string(),
            path: String::new(),
            value: camel_unease,
            optional: true,
        },
        CatalogPatch::Insert {
            entity: charge_attack,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<Value> {
        vec![
            json!({
                "id": "spearman",
                "type": "unit",
                "variations": [
                    { "id": "spearman-1", "hitpoints": 80, "costs": { "food": 60, "wood": 20 } },
                    { "id": "spearman-2", "hitpoints": 90 }
                ]
            }),
            json!({ "id": "ability-camel-unease", "type": "ability", "effects": [] }),
        ]
    }

    #[test]
    fn test_override_nested_path() {
        let mut entities = dataset();
        let patches = vec![CatalogPatch::Override {
            entity_id: "spearman".into(),
            path: "variations.0.costs".into(),
            value: json!({ "food": 50 }),
            optional: false,
        }];
        apply_patches(&mut entities, &patches).unwrap();
        assert_eq!(entities[0]["variations"][0]["costs"], json!({ "food": 50, "wood": 20 }));
        assert_eq!(entities[0]["variations"][1]["hitpoints"], json!(90));
    }

    #[test]
    fn test_missing_path_segments_are_created() {
        let mut entities = dataset();
        let patches = vec![CatalogPatch::Override {
            entity_id: "spearman".into(),
            path: "variations.1.movement".into(),
            value: json!({ "speed": 1.25 }),
            optional: false,
        }];
        apply_patches(&mut entities, &patches).unwrap();
        assert_eq!(entities[0]["variations"][1]["movement"]["speed"], json!(1.25));
    }

    #[test]
    fn test_unknown_target_is_an_error() {
        let mut entities = dataset();
        let patches = vec![CatalogPatch::override_entity("ghost", json!({}))];
        match apply_patches(&mut entities, &patches) {
            Err(CatalogError::PatchTarget(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected patch target error, got {:?}", other),
        }
    }

    #[test]
    fn test_path_through_scalar_is_an_error() {
        let mut entities = dataset();
        let patches = vec![CatalogPatch::Override {
            entity_id: "spearman".into(),
            path: "variations.0.hitpoints.max".into(),
            value: json!(1),
            optional: false,
        }];
        assert!(matches!(
            apply_patches(&mut entities, &patches),
            Err(CatalogError::PatchPath { .. })
        ));
    }

    #[test]
    fn test_array_index_out_of_range_is_an_error() {
        let mut entities = dataset();
        let patches = vec![CatalogPatch::Override {
            entity_id: "spearman".into(),
            path: "variations.7".into(),
            value: json!({}),
            optional: false,
        }];
        assert!(apply_patches(&mut entities, &patches).is_err());
    }

    #[test]
    fn test_default_patches_apply() {
        let mut entities = dataset();
        apply_patches(&mut entities, &default_patches()).unwrap();

        assert_eq!(entities.len(), 3);
        assert_eq!(
            entities[1]["effects"][0]["property"],
            json!("versusOpponentDamageDebuff")
        );
        assert_eq!(entities[2]["id"], json!("charge-attack"));
    }

    #[test]
    fn test_default_patches_tolerate_missing_camel_ability() {
        let mut entities = vec![json!({ "id": "spearman" })];
        apply_patches(&mut entities, &default_patches()).unwrap();
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_patch_list_deserializes() {
        let patches: Vec<CatalogPatch> = serde_json::from_str(
            r#"[
                { "op": "insert", "entity": { "id": "x" } },
                { "op": "override", "entityId": "x", "value": { "name": "X" }, "optional": true }
            ]"#,
        )
        .unwrap();
        assert_eq!(patches.len(), 2);
    }
}
