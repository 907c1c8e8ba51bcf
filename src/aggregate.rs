//! Stat aggregation.
//!
//! Folds the effects of resolved technology and ability variations into a
//! unit's base stats. Application is phased and the phase order is strict:
//! additive changes, then multipliers, then the special stats, then the
//! class-targeted bonus list, then the charge bonus.

use crate::effect::{ClassGroups, EffectKind, EffectOp, ModifierEffect, Property};
use crate::model::{Variation, WeaponKind};
use crate::selector::applies;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Conditional damage against defenders matching `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusDamage {
    pub property: Property,
    pub target: ClassGroups,
    pub value: f64,
}

impl BonusDamage {
    /// Build from a weapon modifier or bonus effect; `None` without a target.
    pub fn from_effect(effect: &ModifierEffect) -> Option<Self> {
        effect.target_classes().map(|target| BonusDamage {
            property: effect.property.clone(),
            target: target.clone(),
            value: effect.value,
        })
    }
}

/// Combat stats of one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatBundle {
    pub hitpoints: f64,
    pub melee_attack: f64,
    pub ranged_attack: f64,
    pub melee_armor: f64,
    pub ranged_armor: f64,
    pub move_speed: f64,
    /// Primary weapon cooldown, in seconds.
    pub attack_speed: f64,
    pub max_range: f64,
    pub bonus_damage: Vec<BonusDamage>,
    /// Extra damage on the first hit of an engagement.
    pub charge_bonus: f64,
}

impl StatBundle {
    /// Base stats of a unit variation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use skirmish::aggregate::StatBundle;
    /// use skirmish::model::Variation;
    ///
    /// let archer: Variation = serde_json::from_str(r#"{
    ///     "hitpoints": 70,
    ///     "weapons": [{ "type": "ranged", "damage": 5, "speed": 1.625,
    ///                   "range": { "min": 0, "max": 5 } }],
    ///     "armor": [{ "type": "ranged", "value": 0 }],
    ///     "movement": { "speed": 1.25 }
    /// }"#).unwrap();
    ///
    /// let stats = StatBundle::from_variation(&archer);
    /// assert_eq!(stats.ranged_attack, 5.0);
    /// assert_eq!(stats.melee_attack, 0.0);
    /// assert_eq!(stats.max_range, 5.0);
    /// ```
    pub fn from_variation(variation: &Variation) -> Self {
        let primary = variation.primary_weapon();
        // The primary weapon owns the stat it is written back to.
        let first_of = |kinds: &[WeaponKind]| {
            primary
                .into_iter()
                .chain(&variation.weapons)
                .find(|w| kinds.contains(&w.kind))
                .map(|w| w.damage)
        };

        StatBundle {
            hitpoints: variation.hitpoints,
            melee_attack: first_of(&[WeaponKind::Melee]).unwrap_or(0.0),
            ranged_attack: first_of(&[WeaponKind::Ranged, WeaponKind::Siege]).unwrap_or(0.0),
            melee_armor: variation.armor_value("melee"),
            ranged_armor: variation.armor_value("ranged"),
            move_speed: variation.movement.map(|m| m.speed).unwrap_or(0.0),
            attack_speed: primary.map(|w| w.speed).unwrap_or(0.0),
            max_range: primary.map(|w| w.range.max).unwrap_or(0.0),
            bonus_damage: primary
                .map(|w| w.modifiers.iter().filter_map(BonusDamage::from_effect).collect())
                .unwrap_or_default(),
            charge_bonus: 0.0,
        }
    }
}

/// Where an effect lands during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EffectPhase {
    /// Hitpoints, attack, armor and move speed.
    Ordinary,
    /// Attack speed and max range.
    Special,
    /// Class-targeted bonus damage.
    Bonus,
    Charge,
    /// Matched but does not change the bundle (versus debuffs, plain
    /// siege and gunpowder attack changes).
    Inert,
}

fn phase_of(effect: &ModifierEffect) -> EffectPhase {
    if effect.kind == EffectKind::Bonus && effect.property.is_attack() {
        return if effect.target_classes().is_some() {
            EffectPhase::Bonus
        } else {
            EffectPhase::Inert
        };
    }
    match effect.property {
        Property::Hitpoints
        | Property::MeleeAttack
        | Property::RangedAttack
        | Property::MeleeArmor
        | Property::RangedArmor
        | Property::MoveSpeed => EffectPhase::Ordinary,
        Property::AttackSpeed | Property::MaxRange => EffectPhase::Special,
        Property::BonusDamage => EffectPhase::Charge,
        _ => EffectPhase::Inert,
    }
}

fn stat_mut<'s>(stats: &'s mut StatBundle, property: &Property) -> Option<&'s mut f64> {
    match property {
        Property::Hitpoints => Some(&mut stats.hitpoints),
        Property::MeleeAttack => Some(&mut stats.melee_attack),
        Property::RangedAttack => Some(&mut stats.ranged_attack),
        Property::MeleeArmor => Some(&mut stats.melee_armor),
        Property::RangedArmor => Some(&mut stats.ranged_armor),
        Property::MoveSpeed => Some(&mut stats.move_speed),
        Property::AttackSpeed => Some(&mut stats.attack_speed),
        Property::MaxRange => Some(&mut stats.max_range),
        Property::BonusDamage => Some(&mut stats.charge_bonus),
        _ => None,
    }
}

fn is_applicable(effect: &ModifierEffect, unit_id: &str, unit_classes: &[String]) -> bool {
    if !effect.property.is_recognized() {
        trace!(property = effect.property.as_str(), "skipping unrecognized property");
        return false;
    }
    if !matches!(effect.effect, EffectOp::Change | EffectOp::Multiply) {
        trace!(op = ?effect.effect, "skipping unrecognized effect op");
        return false;
    }
    applies(effect, unit_id, unit_classes)
}

fn apply_bonus(bonuses: &mut Vec<BonusDamage>, effect: &ModifierEffect) {
    let target = match effect.target_classes() {
        Some(target) => target,
        None => return,
    };
    let wanted = target.flattened();

    match bonuses.iter_mut().find(|b| b.target.flattened() == wanted) {
        Some(existing) => match effect.effect {
            EffectOp::Change => existing.value += effect.value,
            EffectOp::Multiply => existing.value *= effect.value,
            EffectOp::Other(_) => {}
        },
        None if effect.effect == EffectOp::Change => bonuses.push(BonusDamage {
            property: effect.property.clone(),
            target: target.clone(),
            value: effect.value,
        }),
        // Nothing to scale.
        None => {}
    }
}

/// Apply the effects of `variations` to `base` for the unit `unit_id`.
///
/// Returns a new bundle; `base` and the variations are not modified.
///
/// # Examples
///
/// ```rust
/// use skirmish::aggregate::{apply_effects, StatBundle};
/// use skirmish::effect::{ModifierEffect, Property, Selector};
/// use skirmish::model::Variation;
///
/// let base = StatBundle { melee_attack: 5.0, ..StatBundle::default() };
/// let forge = Variation {
///     effects: vec![
///         ModifierEffect::multiply(Property::MeleeAttack, Selector::by_ids(["maa"]), 2.0),
///         ModifierEffect::change(Property::MeleeAttack, Selector::by_ids(["maa"]), 10.0),
///     ],
///     ..Variation::default()
/// };
///
/// let stats = apply_effects(&base, &[], &[&forge], "maa");
/// assert_eq!(stats.melee_attack, 30.0);
/// assert_eq!(base.melee_attack, 5.0);
/// ```
pub fn apply_effects(
    base: &StatBundle,
    unit_classes: &[String],
    variations: &[&Variation],
    unit_id: &str,
) -> StatBundle {
    let mut stats = base.clone();

    let matched: Vec<(&ModifierEffect, EffectPhase)> = variations
        .iter()
        .flat_map(|v| v.effects.iter())
        .filter(|e| is_applicable(e, unit_id, unit_classes))
        .map(|e| (e, phase_of(e)))
        .collect();

    let in_phase = |phase: EffectPhase, op: EffectOp| {
        matched
            .iter()
            .filter(move |(e, p)| *p == phase && e.effect == op)
            .map(|(e, _)| *e)
    };

    // Additive. Move speed changes are percentages.
    for effect in in_phase(EffectPhase::Ordinary, EffectOp::Change) {
        if let Some(stat) = stat_mut(&mut stats, &effect.property) {
            if effect.property == Property::MoveSpeed {
                *stat *= 1.0 + effect.value / 100.0;
            } else {
                *stat += effect.value;
            }
        }
    }

    for effect in in_phase(EffectPhase::Ordinary, EffectOp::Multiply) {
        if let Some(stat) = stat_mut(&mut stats, &effect.property) {
            *stat *= effect.value;
        }
    }

    let change_then_multiply = |stats: &mut StatBundle, phase: EffectPhase| {
        for effect in in_phase(phase, EffectOp::Change) {
            if let Some(stat) = stat_mut(stats, &effect.property) {
                *stat += effect.value;
            }
        }
        for effect in in_phase(phase, EffectOp::Multiply) {
            if let Some(stat) = stat_mut(stats, &effect.property) {
                *stat *= effect.value;
            }
        }
    };

    change_then_multiply(&mut stats, EffectPhase::Special);

    // Bonus effects apply in list order.
    for (effect, _) in matched.iter().filter(|(_, p)| *p == EffectPhase::Bonus) {
        apply_bonus(&mut stats.bonus_damage, effect);
    }

    change_then_multiply(&mut stats, EffectPhase::Charge);

    stats
}
