//! The immutable entity catalog.
//!
//! A [`Catalog`] is built once from the dataset (with patches applied) and
//! then only read. Every lookup the resolution pipeline performs goes
//! through it.

use crate::config::ALL_CIVS;
use crate::entity_id::EntityId;
use crate::error::{CatalogError, Result};
use crate::graph::TierGraph;
use crate::model::{Entity, EntityKind, Variation};
use crate::patch::{apply_patches, CatalogPatch};
use crate::tiers::build_tier_graph;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Highest age, used when an entity reports no ages at all.
const FINAL_AGE: u8 = 4;

/// Units, technologies and abilities, indexed by id.
///
/// # Examples
///
/// ```rust
/// use skirmish::Catalog;
///
/// let catalog = Catalog::from_json_str(r#"{
///   "__version__": "1",
///   "data": [
///     { "id": "spearman", "type": "unit", "variations": [
///         { "id": "spearman-1", "age": 1, "civs": ["en"], "hitpoints": 80 },
///         { "id": "spearman-2", "age": 2, "civs": ["en"], "hitpoints": 90 }
///     ] }
///   ]
/// }"#, &[]).unwrap();
///
/// let v = catalog.get_variation("spearman", "en", 2).unwrap();
/// assert_eq!(v.hitpoints, 90.0);
/// assert_eq!(catalog.get_available_ages("spearman", "en"), vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    tier_graph: TierGraph,
}

/// Pull the entity list out of any accepted dataset layout.
fn raw_entities(root: Value) -> Result<Vec<Value>> {
    match root {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data") {
                return match data {
                    Value::Array(items) => Ok(items),
                    _ => Err(CatalogError::Layout("`data` is not an array".to_string())),
                };
            }
            // Keyed by id; metadata entries such as `__note__` are skipped.
            Ok(map
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Object(mut entity) => {
                        entity
                            .entry("id".to_string())
                            .or_insert_with(|| Value::String(key));
                        Some(Value::Object(entity))
                    }
                    _ => None,
                })
                .collect())
        }
        other => Err(CatalogError::Layout(format!(
            "expected an array or object, found {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn variation_key(variation: &Variation) -> (String, u8) {
    let mut civs = variation.civs.clone();
    civs.sort();
    (civs.join(","), variation.age)
}

impl Catalog {
    /// Parse a dataset document, apply `patches`, and index the result.
    pub fn from_json_str(json: &str, patches: &[CatalogPatch]) -> Result<Self> {
        let root: Value = serde_json::from_str(json)?;
        let mut raw = raw_entities(root)?;
        apply_patches(&mut raw, patches)?;

        let entities = raw
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Entity>, _>>()?;
        Self::from_entities(entities)
    }

    /// Index already-decoded entities.
    ///
    /// Entity-level effects are appended to every variation, after the
    /// variation's own effects.
    pub fn from_entities(mut entities: Vec<Entity>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entities.len());

        for (position, entity) in entities.iter_mut().enumerate() {
            if index.insert(entity.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateEntity(entity.id.clone()));
            }

            let mut keys = HashSet::new();
            for variation in &entity.variations {
                let (civs, age) = variation_key(variation);
                if !keys.insert((civs.clone(), age)) {
                    return Err(CatalogError::DuplicateVariation {
                        entity: entity.id.clone(),
                        civs,
                        age,
                    });
                }
            }

            if !entity.effects.is_empty() {
                for variation in &mut entity.variations {
                    variation.effects.extend(entity.effects.iter().cloned());
                }
            }
        }

        let tier_graph = build_tier_graph(&entities);

        let count = |kind: EntityKind| entities.iter().filter(|e| e.kind == kind).count();
        info!(
            units = count(EntityKind::Unit),
            technologies = count(EntityKind::Technology),
            abilities = count(EntityKind::Ability),
            variations = entities.iter().map(|e| e.variations.len()).sum::<usize>(),
            tiered = tier_graph.node_count(),
            "catalog loaded"
        );

        Ok(Self {
            entities,
            index,
            tier_graph,
        })
    }

    pub fn get_entity_by_id(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Pick the variation of `id` for `civ` (or [`ALL_CIVS`]) and `age`.
    ///
    /// A variation serves `civ` when `civ` is the wildcard, its civilization
    /// list is empty, or the list contains `civ`. Lookup order:
    ///
    /// 1. the first variation serving `civ` at exactly `age`;
    /// 2. for units, the first variation of any civilization at `age`;
    /// 3. the first variation carrying any effects;
    /// 4. the first variation.
    ///
    /// Returns `None` only for unknown ids and entities without variations.
    pub fn get_variation(&self, id: &str, civ: &str, age: u8) -> Option<&Variation> {
        let entity = self.get_entity_by_id(id)?;
        let variations = &entity.variations;
        variations
            .iter()
            .find(|v| v.serves_civ(civ) && v.age == age)
            .or_else(|| {
                // A unit the civ cannot field keeps the stats of its age.
                if entity.kind == EntityKind::Unit {
                    variations.iter().find(|v| v.age == age)
                } else {
                    None
                }
            })
            .or_else(|| variations.iter().find(|v| !v.effects.is_empty()))
            .or_else(|| variations.first())
    }

    /// Sorted distinct ages `civ` can field `id` in.
    ///
    /// Falls back to every age of the entity when `civ` has none.
    pub fn get_available_ages(&self, id: &str, civ: &str) -> Vec<u8> {
        let entity = match self.get_entity_by_id(id) {
            Some(entity) => entity,
            None => return Vec::new(),
        };

        let collect = |filter: &dyn Fn(&Variation) -> bool| {
            let mut ages: Vec<u8> = entity
                .variations
                .iter()
                .filter(|v| filter(v))
                .map(|v| v.age)
                .collect();
            ages.sort_unstable();
            ages.dedup();
            ages
        };

        let ages = collect(&|v| civ == ALL_CIVS || v.civs.iter().any(|c| c == civ));
        if ages.is_empty() {
            collect(&|_| true)
        } else {
            ages
        }
    }

    /// The last available age, or the final age when there are none.
    pub fn max_age(&self, id: &str, civ: &str) -> u8 {
        self.get_available_ages(id, civ)
            .last()
            .copied()
            .unwrap_or(FINAL_AGE)
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn tier_graph(&self) -> &TierGraph {
        &self.tier_graph
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
