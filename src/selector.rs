//! Modifier applicability.
//!
//! Decides whether an effect applies to a unit, and whether a class-group
//! predicate is satisfied by a class set. All comparisons are
//! case-insensitive and exact: composite class names such as
//! `war_elephant` are never split into tokens.

use crate::effect::{ClassGroups, ModifierEffect, Property, Selector};
use std::collections::BTreeSet;

fn has_class(classes: &[String], wanted: &str) -> bool {
    classes.iter().any(|c| c.eq_ignore_ascii_case(wanted))
}

impl ClassGroups {
    /// Whether any group has every one of its classes present in `classes`.
    ///
    /// An empty list of groups matches nothing. An empty group inside a
    /// non-empty list is vacuously satisfied.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use skirmish::effect::ClassGroups;
    ///
    /// let groups = ClassGroups::new(vec![
    ///     vec!["cavalry".into(), "melee".into()],
    ///     vec!["elephant".into()],
    /// ]);
    /// let knight = vec!["Cavalry".to_string(), "melee".to_string(), "heavy".to_string()];
    /// let archer = vec!["infantry".to_string(), "ranged".to_string()];
    ///
    /// assert!(groups.matches(&knight));
    /// assert!(!groups.matches(&archer));
    /// ```
    pub fn matches(&self, classes: &[String]) -> bool {
        self.0
            .iter()
            .any(|group| group.iter().all(|wanted| has_class(classes, wanted)))
    }

    /// Every class mentioned by any group, lower-cased.
    pub fn flattened(&self) -> BTreeSet<String> {
        self.0
            .iter()
            .flatten()
            .map(|c| c.to_ascii_lowercase())
            .collect()
    }
}

impl Selector {
    /// Whether `unit_id` is listed verbatim (ignoring case).
    pub fn matches_id(&self, unit_id: &str) -> bool {
        self.id.iter().any(|id| id.eq_ignore_ascii_case(unit_id))
    }

    /// Whether a listed id names one of the unit's classes.
    pub fn matches_id_as_class(&self, classes: &[String]) -> bool {
        self.id.iter().any(|id| has_class(classes, id))
    }

    /// Id match, class match, or id-as-class match.
    pub fn matches(&self, unit_id: &str, classes: &[String]) -> bool {
        self.matches_id(unit_id) || self.class.matches(classes) || self.matches_id_as_class(classes)
    }
}

/// Whether `effect` applies to the unit `unit_id` with `classes`.
///
/// For versus-debuff effects only the exact id rule is used: their class
/// groups describe the opponents the debuff targets, not the carrier.
///
/// # Examples
///
/// ```rust
/// use skirmish::effect::{ModifierEffect, Property, Selector};
/// use skirmish::selector::applies;
///
/// let archer_tech = ModifierEffect::change(
///     Property::RangedAttack,
///     Selector::by_ids(["archer"]),
///     1.0,
/// );
/// let classes = vec!["archer".to_string(), "ranged".to_string()];
///
/// // "archer" matches the unit id...
/// assert!(applies(&archer_tech, "archer", &[]));
/// // ...and also any unit tagged with the "archer" class.
/// assert!(applies(&archer_tech, "longbowman", &classes));
/// ```
pub fn applies(effect: &ModifierEffect, unit_id: &str, classes: &[String]) -> bool {
    if effect.property == Property::VersusOpponentDamageDebuff {
        return effect.select.matches_id(unit_id);
    }
    effect.select.matches(unit_id, classes)
}
