//! Tier chain resolution.
//!
//! Technologies and abilities that come in numbered tiers carry an `N/M`
//! marker in their first display class, e.g. `"Melee Damage Technology 2/3"`.
//! Activating tier `k` implies tiers `1..k`, which are applied first.

use crate::catalog::Catalog;
use crate::entity_id::EntityId;
use crate::graph::TierGraph;
use crate::model::{Entity, EntityKind, Variation};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Position of an entity inside its tier line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierInfo {
    pub tier: u32,
    pub max_tier: u32,
}

/// Identity of a tier line: entities sharing it replace one another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TierLine {
    pub kind: EntityKind,
    pub name: String,
    pub max_tier: u32,
}

fn digit_run(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count()
}

/// Find the first `N/M` marker in a display class.
///
/// # Examples
///
/// ```rust
/// use skirmish::tiers::tier_info;
///
/// let info = tier_info("Melee Damage Technology 2/3").unwrap();
/// assert_eq!((info.tier, info.max_tier), (2, 3));
/// assert!(tier_info("Unique Technology").is_none());
/// ```
pub fn tier_info(display_class: &str) -> Option<TierInfo> {
    let bytes = display_class.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let tier_len = digit_run(bytes, i);
        let slash = i + tier_len;
        if slash < bytes.len() && bytes[slash] == b'/' {
            let max_len = digit_run(bytes, slash + 1);
            if max_len > 0 {
                let tier = display_class[i..slash].parse().ok()?;
                let max_tier = display_class[slash + 1..slash + 1 + max_len].parse().ok()?;
                return Some(TierInfo { tier, max_tier });
            }
        }
        i = slash;
    }
    None
}

/// The display class with a trailing `N/M` marker removed, trimmed.
///
/// ```rust
/// use skirmish::tiers::base_line_name;
///
/// assert_eq!(base_line_name("Ranged Armor Technology 1/3 "), "Ranged Armor Technology");
/// assert_eq!(base_line_name("Siege Engineering"), "Siege Engineering");
/// ```
pub fn base_line_name(display_class: &str) -> &str {
    let trimmed = display_class.trim_end();
    let without_max = trimmed.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_max.len() == trimmed.len() {
        return display_class.trim();
    }
    let before_slash = match without_max.strip_suffix('/') {
        Some(rest) => rest,
        None => return display_class.trim(),
    };
    let without_tier = before_slash.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_tier.len() == before_slash.len() {
        return display_class.trim();
    }
    without_tier.trim()
}

/// Tier line and tier of an entity, if it is tiered.
pub fn entity_tier(entity: &Entity) -> Option<(TierLine, u32)> {
    let display = entity.display_class()?;
    let info = tier_info(display)?;
    Some((
        TierLine {
            kind: entity.kind.clone(),
            name: base_line_name(display).to_string(),
            max_tier: info.max_tier,
        },
        info.tier,
    ))
}

/// Index tier lines into a graph with an edge from each tier to the next
/// existing one.
///
/// When several entities claim the same tier of a line, the first in
/// catalog order stands for it as a lower tier.
pub(crate) fn build_tier_graph(entities: &[Entity]) -> TierGraph {
    let tiered: Vec<(&Entity, TierLine, u32)> = entities
        .iter()
        .filter_map(|e| entity_tier(e).map(|(line, tier)| (e, line, tier)))
        .collect();

    let mut representatives: HashMap<(TierLine, u32), EntityId> = HashMap::new();
    for (entity, line, tier) in &tiered {
        representatives
            .entry((line.clone(), *tier))
            .or_insert_with(|| entity.id.clone());
    }

    let mut graph = TierGraph::new();
    for (entity, line, tier) in &tiered {
        graph.add_node(entity.id.clone());
        let lower = (1..*tier)
            .rev()
            .find_map(|k| representatives.get(&(line.clone(), k)));
        if let Some(lower) = lower {
            if lower != &entity.id {
                graph.add_edge(lower.clone(), entity.id.clone());
            }
        }
    }

    graph
}

/// Every entity of the same tier line as `id`, lowest tier first.
///
/// A standalone entity yields just itself; an unknown id yields nothing.
pub fn same_line_tiers<'c>(catalog: &'c Catalog, id: &str) -> Vec<&'c Entity> {
    let entity = match catalog.get_entity_by_id(id) {
        Some(entity) => entity,
        None => return Vec::new(),
    };
    let (line, _) = match entity_tier(entity) {
        Some(found) => found,
        None => return vec![entity],
    };

    let mut members: Vec<(u32, &Entity)> = catalog
        .entities()
        .iter()
        .filter_map(|e| match entity_tier(e) {
            Some((other, tier)) if other == line => Some((tier, e)),
            _ => None,
        })
        .collect();
    members.sort_by_key(|(tier, _)| *tier);
    members.into_iter().map(|(_, e)| e).collect()
}

/// Variations to apply for a set of active modifiers, implied tiers first.
///
/// Ids are processed in the given order. For each one, the lower tiers of
/// its line are emitted before it, each looked up at its own minimum age;
/// the active entity is also looked up at its own minimum age. No entity is
/// emitted twice. Unknown ids are skipped.
///
/// # Examples
///
/// ```rust
/// use skirmish::{Catalog, tiers::expand_active_tiers};
///
/// let catalog = Catalog::from_json_str(r#"{ "data": [
///   { "id": "melee-1", "type": "technology", "displayClasses": ["Melee Damage 1/3"],
///     "variations": [{ "id": "melee-1-1", "age": 2 }] },
///   { "id": "melee-2", "type": "technology", "displayClasses": ["Melee Damage 2/3"],
///     "variations": [{ "id": "melee-2-1", "age": 3 }] },
///   { "id": "melee-3", "type": "technology", "displayClasses": ["Melee Damage 3/3"],
///     "variations": [{ "id": "melee-3-1", "age": 4 }] }
/// ] }"#, &[]).unwrap();
///
/// let order: Vec<&str> = expand_active_tiers(&catalog, ["melee-3"], "all")
///     .iter()
///     .map(|v| v.id.as_str())
///     .collect();
/// assert_eq!(order, ["melee-1-1", "melee-2-1", "melee-3-1"]);
/// ```
pub fn expand_active_tiers<'c, I, S>(catalog: &'c Catalog, ids: I, civ: &str) -> Vec<&'c Variation>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut emitted: HashSet<EntityId> = HashSet::new();
    let mut variations = Vec::new();

    for id in ids {
        let id = id.as_ref();
        let entity = match catalog.get_entity_by_id(id) {
            Some(entity) => entity,
            None => {
                debug!(id, "skipping unknown active modifier");
                continue;
            }
        };
        if emitted.contains(&entity.id) {
            continue;
        }

        let implied = catalog.tier_graph().implied_tiers(&entity.id);
        if !implied.is_empty() {
            debug!(id, implied = implied.len(), "expanding tier chain");
        }

        for lower_id in implied {
            if emitted.contains(&lower_id) {
                continue;
            }
            let lower = match catalog.get_entity_by_id(lower_id.as_str()) {
                Some(lower) => lower,
                None => continue,
            };
            if let Some(variation) = catalog.get_variation(lower_id.as_str(), civ, lower.min_age) {
                variations.push(variation);
                emitted.insert(lower_id);
            }
        }

        match catalog.get_variation(id, civ, entity.min_age) {
            Some(variation) => {
                variations.push(variation);
                emitted.insert(entity.id.clone());
            }
            None => warn!(id, civ, "active modifier has no variation"),
        }
    }

    variations
}

/// Toggle `id` in a user's active set, keeping one tier per line.
///
/// Deactivates `id` if it is active. Otherwise activates it and drops every
/// other tier of its line; lower tiers remain implied rather than active.
/// The input set is left untouched.
///
/// # Examples
///
/// ```rust
/// use skirmish::{Catalog, tiers::toggle_tier_selection};
/// use std::collections::BTreeSet;
///
/// let catalog = Catalog::from_json_str(r#"[
///   { "id": "armor-1", "type": "technology", "displayClasses": ["Armor 1/2"], "variations": [{}] },
///   { "id": "armor-2", "type": "technology", "displayClasses": ["Armor 2/2"], "variations": [{}] }
/// ]"#, &[]).unwrap();
///
/// let active = toggle_tier_selection(&catalog, &BTreeSet::new(), "armor-1");
/// let active = toggle_tier_selection(&catalog, &active, "armor-2");
/// assert_eq!(active.into_iter().collect::<Vec<_>>(), ["armor-2"]);
/// ```
pub fn toggle_tier_selection(
    catalog: &Catalog,
    active: &BTreeSet<String>,
    id: &str,
) -> BTreeSet<String> {
    let mut next = active.clone();
    if next.remove(id) {
        return next;
    }

    let line = catalog.get_entity_by_id(id).and_then(entity_tier);
    if let Some((line, _)) = line {
        next.retain(|other| {
            let same_line = catalog
                .get_entity_by_id(other)
                .and_then(entity_tier)
                .map_or(false, |(other_line, _)| other_line == line);
            !same_line
        });
    }
    next.insert(id.to_string());
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Variation;

    fn tech(id: &str, display: &str, min_age: u8, civs: &[&str]) -> Entity {
        let mut entity = Entity::new(id, id, EntityKind::Technology);
        entity.display_classes = vec![display.to_string()];
        entity.min_age = min_age;
        entity.variations = vec![Variation {
            id: format!("{}-{}", id, min_age),
            age: min_age,
            civs: civs.iter().map(|s| s.to_string()).collect(),
            ..Variation::default()
        }];
        entity
    }

    fn melee_line() -> Catalog {
        Catalog::from_entities(vec![
            tech("melee-3", "Melee Damage Technology 3/3", 4, &[]),
            tech("melee-1", "Melee Damage Technology 1/3", 2, &[]),
            tech("melee-2", "Melee Damage Technology 2/3", 3, &[]),
            tech("armor-1", "Melee Armor Technology 1/3", 2, &[]),
            tech("armor-2", "Melee Armor Technology 2/3", 3, &[]),
            tech("biology", "Unique Technology", 3, &["en"]),
        ])
        .unwrap()
    }

    fn ids(variations: &[&Variation]) -> Vec<String> {
        variations.iter().map(|v| v.id.clone()).collect()
    }

    #[test]
    fn test_tier_info_parsing() {
        assert_eq!(tier_info("Armor 1/3"), Some(TierInfo { tier: 1, max_tier: 3 }));
        assert_eq!(tier_info("Armor 12/15 extra"), Some(TierInfo { tier: 12, max_tier: 15 }));
        assert_eq!(tier_info("Armor 1 /3"), None);
        assert_eq!(tier_info("Armor /3"), None);
        assert_eq!(tier_info(""), None);
    }

    #[test]
    fn test_base_line_name_strips_trailing_marker_only() {
        assert_eq!(base_line_name("Melee Damage Technology 2/3"), "Melee Damage Technology");
        assert_eq!(base_line_name("Tier 1/2 Infantry"), "Tier 1/2 Infantry");
        assert_eq!(base_line_name("  Armor  3/3  "), "Armor");
    }

    #[test]
    fn test_tier_three_applies_one_two_three_in_order() {
        let catalog = melee_line();
        let variations = expand_active_tiers(&catalog, ["melee-3"], "en");
        assert_eq!(ids(&variations), vec!["melee-1-2", "melee-2-3", "melee-3-4"]);
    }

    #[test]
    fn test_standalone_returns_itself() {
        let catalog = melee_line();
        let variations = expand_active_tiers(&catalog, ["biology"], "en");
        assert_eq!(ids(&variations), vec!["biology-3"]);
    }

    #[test]
    fn test_each_entity_emitted_once() {
        let catalog = melee_line();
        let variations =
            expand_active_tiers(&catalog, ["melee-2", "melee-3", "armor-2", "melee-1"], "en");
        assert_eq!(
            ids(&variations),
            vec!["melee-1-2", "melee-2-3", "melee-3-4", "armor-1-2", "armor-2-3"]
        );
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let catalog = melee_line();
        assert!(expand_active_tiers(&catalog, ["nope"], "en").is_empty());
    }

    #[test]
    fn test_missing_tier_is_bridged() {
        let catalog = Catalog::from_entities(vec![
            tech("ranged-1", "Ranged 1/3", 2, &[]),
            tech("ranged-3", "Ranged 3/3", 4, &[]),
        ])
        .unwrap();
        let variations = expand_active_tiers(&catalog, ["ranged-3"], "all");
        assert_eq!(ids(&variations), vec!["ranged-1-2", "ranged-3-4"]);
    }

    #[test]
    fn test_lines_with_different_max_are_distinct() {
        let catalog = Catalog::from_entities(vec![
            tech("a-1", "Armor 1/2", 2, &[]),
            tech("b-1", "Armor 1/3", 2, &[]),
            tech("b-2", "Armor 2/3", 3, &[]),
        ])
        .unwrap();
        let variations = expand_active_tiers(&catalog, ["b-2"], "all");
        assert_eq!(ids(&variations), vec!["b-1-2", "b-2-3"]);
    }

    #[test]
    fn test_same_line_tiers_sorted() {
        let catalog = melee_line();
        let line: Vec<&str> = same_line_tiers(&catalog, "melee-2")
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(line, vec!["melee-1", "melee-2", "melee-3"]);
        assert_eq!(same_line_tiers(&catalog, "biology").len(), 1);
    }

    #[test]
    fn test_toggle_keeps_one_tier_per_line() {
        let catalog = melee_line();
        let active = BTreeSet::new();

        let active = toggle_tier_selection(&catalog, &active, "melee-1");
        let active = toggle_tier_selection(&catalog, &active, "armor-1");
        let active = toggle_tier_selection(&catalog, &active, "melee-3");
        let expected: BTreeSet<String> =
            ["armor-1", "melee-3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(active, expected);

        let active = toggle_tier_selection(&catalog, &active, "melee-3");
        assert_eq!(active.len(), 1);
        assert!(active.contains("armor-1"));
    }

    #[test]
    fn test_toggle_leaves_input_untouched() {
        let catalog = melee_line();
        let active: BTreeSet<String> = ["melee-1".to_string()].into_iter().collect();
        let next = toggle_tier_selection(&catalog, &active, "melee-2");
        assert!(active.contains("melee-1"));
        assert!(!next.contains("melee-1"));
    }
}
