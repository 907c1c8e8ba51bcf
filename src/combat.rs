//! Combat evaluation.
//!
//! Turns two resolved units into per-hit damage, damage per second,
//! time-to-kill, and a winner. All numbers are steady-state averages of an
//! idealized duel: both units attack from the first instant, every hit
//! lands, and nobody moves.

use crate::aggregate::StatBundle;
use crate::config::CombatConfig;
use crate::effect::{EffectOp, ModifierEffect, Property, Selector};
use crate::model::{Costs, Variation, Weapon, WeaponKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A unit as the evaluator sees it.
///
/// The primary (first) weapon carries the resolved damage, cooldown, range
/// and bonus-damage modifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatEntity {
    pub id: String,
    pub name: String,
    pub hitpoints: f64,
    pub weapons: Vec<Weapon>,
    pub melee_armor: f64,
    pub ranged_armor: f64,
    pub costs: Costs,
    pub classes: Vec<String>,
    /// Active versus-debuff effects this unit carries.
    pub debuffs: Vec<ModifierEffect>,
    pub charge_bonus: f64,
}

impl CombatEntity {
    /// A unit straight from its dataset variation, without modifiers.
    pub fn from_variation(variation: &Variation) -> Self {
        let id = if variation.base_id.is_empty() {
            variation.id.clone()
        } else {
            variation.base_id.clone()
        };
        CombatEntity {
            id,
            name: variation.name.clone(),
            hitpoints: variation.hitpoints,
            weapons: variation.weapons.clone(),
            melee_armor: variation.armor_value("melee"),
            ranged_armor: variation.armor_value("ranged"),
            costs: variation.costs,
            classes: variation.classes.clone(),
            debuffs: Vec::new(),
            charge_bonus: 0.0,
        }
    }

    /// A unit whose primary weapon and defenses reflect `stats`.
    pub fn from_resolved(variation: &Variation, stats: &StatBundle, debuffs: Vec<ModifierEffect>) -> Self {
        let mut entity = Self::from_variation(variation);
        entity.hitpoints = stats.hitpoints;
        entity.melee_armor = stats.melee_armor;
        entity.ranged_armor = stats.ranged_armor;
        entity.debuffs = debuffs;
        entity.charge_bonus = stats.charge_bonus;

        if let Some(primary) = entity.weapons.first_mut() {
            match primary.kind {
                WeaponKind::Melee => primary.damage = stats.melee_attack,
                WeaponKind::Ranged | WeaponKind::Siege => primary.damage = stats.ranged_attack,
                WeaponKind::Other(_) => {}
            }
            primary.speed = stats.attack_speed;
            primary.range.max = stats.max_range;
            primary.modifiers = stats
                .bonus_damage
                .iter()
                .map(|b| {
                    ModifierEffect::bonus(
                        b.property.clone(),
                        Selector::default(),
                        b.target.clone(),
                        b.value,
                    )
                })
                .collect();
        }
        entity
    }

    pub fn primary_weapon(&self) -> Option<&Weapon> {
        self.weapons.first()
    }

    /// Resources spent on one unit.
    pub fn total_cost(&self) -> f64 {
        self.costs.total_resources()
    }

    /// Cooldown of the primary weapon, 0 without one.
    pub fn attack_speed(&self) -> f64 {
        self.primary_weapon().map(|w| w.speed).unwrap_or(0.0)
    }
}

/// Breakdown of one hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveDamage {
    /// Final damage, never below 1.
    pub value: f64,
    pub base: f64,
    pub bonus: f64,
    /// Charge damage included in this hit (0 unless first).
    pub charge: f64,
    pub armor_applied: f64,
    pub debuff_multiplier: f64,
}

impl EffectiveDamage {
    fn degenerate() -> Self {
        EffectiveDamage {
            value: 1.0,
            base: 0.0,
            bonus: 0.0,
            charge: 0.0,
            armor_applied: 0.0,
            debuff_multiplier: 1.0,
        }
    }
}

fn armor_against(attacker: &CombatEntity, weapon: &Weapon, defender: &CombatEntity, config: &CombatConfig) -> f64 {
    if weapon.kind == WeaponKind::Siege || config.is_siege(&attacker.classes) {
        return 0.0;
    }
    if weapon.kind == WeaponKind::Melee {
        return defender.melee_armor;
    }
    if config.is_gunpowder(&attacker.classes) {
        0.0
    } else {
        defender.ranged_armor
    }
}

/// Product of the defender's debuffs that target the attacker's classes.
fn debuff_multiplier(attacker: &CombatEntity, defender: &CombatEntity) -> f64 {
    defender
        .debuffs
        .iter()
        .filter(|d| d.property == Property::VersusOpponentDamageDebuff)
        .filter(|d| d.effect == EffectOp::Multiply)
        .filter(|d| d.select.class.matches(&attacker.classes))
        .map(|d| d.value)
        .product()
}

/// Damage of one hit from `attacker`'s primary weapon on `defender`.
///
/// # Examples
///
/// ```rust
/// use skirmish::combat::{compute_effective_damage, CombatEntity};
/// use skirmish::model::Weapon;
/// use skirmish::CombatConfig;
///
/// let attacker = CombatEntity {
///     weapons: vec![Weapon { damage: 10.0, speed: 1.0, ..Weapon::default() }],
///     ..CombatEntity::default()
/// };
/// let defender = CombatEntity { melee_armor: 15.0, ..CombatEntity::default() };
///
/// let hit = compute_effective_damage(&attacker, &defender, 0.0, false, &CombatConfig::default());
/// assert_eq!(hit.value, 1.0);
/// assert_eq!(hit.armor_applied, 15.0);
/// ```
pub fn compute_effective_damage(
    attacker: &CombatEntity,
    defender: &CombatEntity,
    charge_bonus: f64,
    is_first_hit: bool,
    config: &CombatConfig,
) -> EffectiveDamage {
    let weapon = match attacker.primary_weapon() {
        Some(weapon) => weapon,
        None => return EffectiveDamage::degenerate(),
    };

    let base = weapon.damage;
    let bonus: f64 = weapon
        .modifiers
        .iter()
        .filter_map(|m| m.target_classes().map(|target| (target, m.value)))
        .filter(|(target, _)| target.matches(&defender.classes))
        .map(|(_, value)| value)
        .sum();
    let charge = if is_first_hit { charge_bonus } else { 0.0 };
    let armor_applied = armor_against(attacker, weapon, defender, config);
    let debuff = debuff_multiplier(attacker, defender);

    let raw = (base + bonus + charge - armor_applied) * debuff;
    EffectiveDamage {
        value: raw.max(1.0),
        base,
        bonus,
        charge,
        armor_applied,
        debuff_multiplier: debuff,
    }
}

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Hits needed when the first hit deals `first` and every later one `normal`.
pub(crate) fn hits_with_opener(hitpoints: f64, first: f64, normal: f64) -> u64 {
    if first >= hitpoints {
        1
    } else {
        ((hitpoints - first) / normal).ceil() as u64 + 1
    }
}

/// One side of a duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersusMetrics {
    pub id: String,
    pub name: String,
    /// `None` when the attack speed is invalid.
    pub dps: Option<f64>,
    pub dps_per_cost: Option<f64>,
    pub hits_to_kill: Option<u64>,
    /// Seconds.
    pub time_to_kill: Option<f64>,
    pub effective_damage_per_hit: f64,
    pub bug_attack_speed: bool,
    /// The arithmetic behind the numbers, for display.
    pub formula: String,
}

pub(crate) fn damage_formula(hit: &EffectiveDamage) -> String {
    let sum = format!(
        "Base({}) + Bonus({}){} - Armor({})",
        hit.base,
        hit.bonus,
        if hit.charge != 0.0 {
            format!(" + Charge({})", hit.charge)
        } else {
            String::new()
        },
        hit.armor_applied
    );
    if hit.debuff_multiplier != 1.0 {
        format!("max(1, ({}) × Debuff({})) = {}", sum, hit.debuff_multiplier, hit.value)
    } else {
        format!("max(1, {}) = {}", sum, hit.value)
    }
}

/// Metrics for `attacker` killing one `defender`.
///
/// A positive `charge_bonus` boosts the first hit only. Reported DPS is
/// then the total damage dealt over the time to kill.
///
/// # Examples
///
/// ```rust
/// use skirmish::combat::{compute_metrics, CombatEntity};
/// use skirmish::model::Weapon;
/// use skirmish::CombatConfig;
///
/// let a = CombatEntity {
///     id: "a".into(),
///     hitpoints: 100.0,
///     weapons: vec![Weapon { damage: 10.0, speed: 1.0, ..Weapon::default() }],
///     ..CombatEntity::default()
/// };
/// let b = CombatEntity { id: "b".into(), hitpoints: 100.0, melee_armor: 2.0, ..CombatEntity::default() };
///
/// let m = compute_metrics(&a, &b, 0.0, &CombatConfig::default());
/// assert_eq!(m.effective_damage_per_hit, 8.0);
/// assert_eq!(m.hits_to_kill, Some(13));
/// assert_eq!(m.time_to_kill, Some(13.0));
/// assert_eq!(m.dps, Some(8.0));
/// ```
pub fn compute_metrics(
    attacker: &CombatEntity,
    defender: &CombatEntity,
    charge_bonus: f64,
    config: &CombatConfig,
) -> VersusMetrics {
    let normal = compute_effective_damage(attacker, defender, charge_bonus, false, config);
    let charged = charge_bonus > 0.0 && attacker.primary_weapon().is_some();
    let first = if charged {
        compute_effective_damage(attacker, defender, charge_bonus, true, config)
    } else {
        normal
    };

    let speed = attacker.attack_speed();
    let bug_attack_speed = speed <= 0.0;

    let mut formula = format!("Effective = {}", damage_formula(&normal));
    if charged {
        formula.push_str(&format!("; First hit = {}", damage_formula(&first)));
    }

    let (dps, hits_to_kill, time_to_kill, dps_per_cost) = if bug_attack_speed {
        warn!(attacker = %attacker.id, speed, "attack speed is not positive");
        (None, None, None, None)
    } else {
        let (hits, raw_dps) = if charged {
            let hits = hits_with_opener(defender.hitpoints, first.value, normal.value);
            let total = first.value + (hits - 1) as f64 * normal.value;
            formula.push_str(&format!(
                "; DPS = {} / ({} × {})",
                total, hits, speed
            ));
            (hits, total / (hits as f64 * speed))
        } else {
            formula.push_str(&format!("; DPS = {} / {}", normal.value, speed));
            (
                (defender.hitpoints / normal.value).ceil() as u64,
                normal.value / speed,
            )
        };
        let dps = round_to(raw_dps, 2);
        let cost = attacker.total_cost();
        let per_cost = if cost > 0.0 {
            Some(round_to(dps / cost, 2))
        } else {
            None
        };
        (
            Some(dps),
            Some(hits),
            Some(round_to(hits as f64 * speed, 1)),
            per_cost,
        )
    };

    VersusMetrics {
        id: attacker.id.clone(),
        name: attacker.name.clone(),
        dps,
        dps_per_cost,
        hits_to_kill,
        time_to_kill,
        effective_damage_per_hit: normal.value,
        bug_attack_speed,
        formula,
    }
}

/// Outcome of a duel: a draw or the id of the winning unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Winner {
    Draw,
    Unit(String),
}

impl From<String> for Winner {
    fn from(s: String) -> Self {
        if s == "draw" {
            Winner::Draw
        } else {
            Winner::Unit(s)
        }
    }
}

impl From<Winner> for String {
    fn from(w: Winner) -> Self {
        match w {
            Winner::Draw => "draw".to_string(),
            Winner::Unit(id) => id,
        }
    }
}

impl Winner {
    pub fn is_draw(&self) -> bool {
        matches!(self, Winner::Draw)
    }
}

/// Lower time-to-kill wins unless the two are within `tolerance` of the
/// larger one. A side without a time-to-kill forces a draw.
///
/// ```rust
/// use skirmish::combat::{decide_winner, Winner, VersusMetrics};
///
/// let metrics = |id: &str, ttk: f64| VersusMetrics {
///     id: id.into(),
///     name: id.into(),
///     dps: Some(1.0),
///     dps_per_cost: None,
///     hits_to_kill: Some(1),
///     time_to_kill: Some(ttk),
///     effective_damage_per_hit: 1.0,
///     bug_attack_speed: false,
///     formula: String::new(),
/// };
///
/// assert_eq!(decide_winner(&metrics("a", 10.0), &metrics("b", 10.4), 0.05), Winner::Draw);
/// assert_eq!(
///     decide_winner(&metrics("a", 10.0), &metrics("b", 10.6), 0.05),
///     Winner::Unit("a".into()),
/// );
/// ```
pub fn decide_winner(a: &VersusMetrics, b: &VersusMetrics, tolerance: f64) -> Winner {
    if a.bug_attack_speed || b.bug_attack_speed {
        return Winner::Draw;
    }
    let (ta, tb) = match (a.time_to_kill, b.time_to_kill) {
        (Some(ta), Some(tb)) => (ta, tb),
        _ => return Winner::Draw,
    };
    if (ta - tb).abs() <= ta.max(tb) * tolerance {
        Winner::Draw
    } else if ta < tb {
        Winner::Unit(a.id.clone())
    } else {
        Winner::Unit(b.id.clone())
    }
}

/// Both directions of a duel and its winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersusResult {
    /// `a` attacking `b`.
    pub attacker: VersusMetrics,
    /// `b` attacking `a`.
    pub defender: VersusMetrics,
    pub winner: Winner,
}

/// Evaluate `a` against `b` in both directions.
///
/// Charge arguments default to each unit's own resolved charge bonus.
pub fn compute_versus(
    a: &CombatEntity,
    b: &CombatEntity,
    charge_a: Option<f64>,
    charge_b: Option<f64>,
    config: &CombatConfig,
) -> VersusResult {
    let attacker = compute_metrics(a, b, charge_a.unwrap_or(a.charge_bonus), config);
    let defender = compute_metrics(b, a, charge_b.unwrap_or(b.charge_bonus), config);
    let winner = decide_winner(&attacker, &defender, config.draw_tolerance);
    VersusResult {
        attacker,
        defender,
        winner,
    }
}
