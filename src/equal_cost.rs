//! Cost-normalized engagements.
//!
//! Compares two units at roughly equal resource investment: `N` copies of
//! one against `M` copies of the other, with `N` and `M` picked so the two
//! armies cost about the same.

use crate::combat::{
    compute_effective_damage, damage_formula, hits_with_opener, round_to,
    CombatEntity, EffectiveDamage, VersusMetrics, Winner,
};
use crate::config::CombatConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Army sizes for a cost-equal engagement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostMultipliers {
    pub mult_a: u32,
    pub mult_b: u32,
    pub total_cost_a: f64,
    pub total_cost_b: f64,
}

impl CostMultipliers {
    fn identity(cost_a: f64, cost_b: f64) -> Self {
        CostMultipliers {
            mult_a: 1,
            mult_b: 1,
            total_cost_a: cost_a,
            total_cost_b: cost_b,
        }
    }
}

/// Smallest-difference integer army sizes whose totals are within the
/// configured tolerance of the larger total.
///
/// Each `mult_a` in `1..=max_multiplier` is tried against the floor and
/// ceiling of the ideal `mult_b`. Non-positive costs, or no pair within
/// tolerance, give one unit each.
///
/// # Examples
///
/// ```rust
/// use skirmish::equal_cost::calculate_equal_cost_multipliers;
/// use skirmish::CombatConfig;
///
/// let m = calculate_equal_cost_multipliers(100.0, 150.0, &CombatConfig::default());
/// assert_eq!((m.mult_a, m.mult_b), (3, 2));
/// assert_eq!(m.total_cost_a, m.total_cost_b);
/// ```
pub fn calculate_equal_cost_multipliers(cost_a: f64, cost_b: f64, config: &CombatConfig) -> CostMultipliers {
    if cost_a <= 0.0 || cost_b <= 0.0 {
        return CostMultipliers::identity(cost_a, cost_b);
    }

    let mut best = (1u32, 1u32);
    let mut best_diff = f64::INFINITY;

    for mult_a in 1..=config.max_multiplier {
        let total_a = mult_a as f64 * cost_a;
        let ideal_b = total_a / cost_b;
        for candidate in [ideal_b.floor(), ideal_b.ceil()] {
            if candidate < 1.0 {
                continue;
            }
            let total_b = candidate * cost_b;
            let diff = (total_a - total_b).abs();
            if diff <= total_a.max(total_b) * config.cost_tolerance && diff < best_diff {
                best_diff = diff;
                best = (mult_a, candidate as u32);
            }
        }
    }

    if best_diff.is_infinite() {
        debug!(cost_a, cost_b, "no multiplier pair within tolerance");
    }

    CostMultipliers {
        mult_a: best.0,
        mult_b: best.1,
        total_cost_a: best.0 as f64 * cost_a,
        total_cost_b: best.1 as f64 * cost_b,
    }
}

/// Damage one army deals per attack cycle.
#[derive(Debug, Clone, Copy)]
struct CycleDamage {
    normal: EffectiveDamage,
    first: EffectiveDamage,
    charged: bool,
    units: u32,
}

impl CycleDamage {
    fn new(
        attacker: &CombatEntity,
        defender: &CombatEntity,
        units: u32,
        charge_bonus: f64,
        config: &CombatConfig,
    ) -> Self {
        let normal = compute_effective_damage(attacker, defender, charge_bonus, false, config);
        let charged = charge_bonus > 0.0 && attacker.primary_weapon().is_some();
        let first = if charged {
            compute_effective_damage(attacker, defender, charge_bonus, true, config)
        } else {
            normal
        };
        CycleDamage {
            normal,
            first,
            charged,
            units,
        }
    }

    fn per_cycle(&self) -> f64 {
        self.normal.value * self.units as f64
    }

    /// The whole army charges together, once.
    fn first_cycle(&self) -> f64 {
        self.first.value * self.units as f64
    }

    fn cycles_to_destroy(&self, total_hitpoints: f64) -> u64 {
        if self.charged {
            hits_with_opener(total_hitpoints, self.first_cycle(), self.per_cycle())
        } else {
            (total_hitpoints / self.per_cycle()).ceil() as u64
        }
    }

    /// Total damage dealt over `cycles` attack cycles.
    fn dealt_over(&self, cycles: u64) -> f64 {
        if cycles == 0 {
            0.0
        } else {
            self.first_cycle() + (cycles - 1) as f64 * self.per_cycle()
        }
    }
}

/// Metrics for `attackers` copies of `attacker` against `defenders` copies
/// of `defender`.
///
/// Per-unit DPS is unchanged by army size; the reported DPS is the army's.
/// A charge bonus lands on the first cycle only, for every attacker.
pub fn compute_metrics_with_multiplier(
    attacker: &CombatEntity,
    defender: &CombatEntity,
    attackers: u32,
    defenders: u32,
    charge_bonus: f64,
    config: &CombatConfig,
) -> VersusMetrics {
    let cycle = CycleDamage::new(attacker, defender, attackers, charge_bonus, config);
    let speed = attacker.attack_speed();
    let bug_attack_speed = speed <= 0.0;

    let mut formula = format!(
        "{} × [Effective = {}] vs {} defenders",
        attackers,
        damage_formula(&cycle.normal),
        defenders
    );
    if cycle.charged {
        formula.push_str(&format!(
            "; First cycle = {} × [{}]",
            attackers,
            damage_formula(&cycle.first)
        ));
    }

    let (dps, hits_to_kill, time_to_kill, dps_per_cost) = if bug_attack_speed {
        warn!(attacker = %attacker.id, speed, "attack speed is not positive");
        (None, None, None, None)
    } else {
        let total_hitpoints = defender.hitpoints * defenders as f64;
        let hits = cycle.cycles_to_destroy(total_hitpoints);
        let raw_unit_dps = if cycle.charged && hits > 0 {
            cycle.dealt_over(hits) / (attackers as f64 * hits as f64 * speed)
        } else {
            cycle.normal.value / speed
        };
        formula.push_str(&format!(
            "; Total DPS = {} / {} × {}",
            cycle.normal.value, speed, attackers
        ));

        let unit_dps = round_to(raw_unit_dps, 2);
        let cost = attacker.total_cost();
        let per_cost = if cost > 0.0 {
            Some(round_to(unit_dps / cost, 2))
        } else {
            None
        };
        (
            Some(round_to(unit_dps * attackers as f64, 2)),
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
        effective_damage_per_hit: cycle.normal.value,
        bug_attack_speed,
        formula,
    }
}

/// A cost-equal engagement and its survivors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualCostVersusResult {
    pub attacker: VersusMetrics,
    pub defender: VersusMetrics,
    pub winner: Winner,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_hp_remaining: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_units_remaining: Option<u64>,
    /// Resource value of the winner's surviving units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_difference: Option<f64>,
    pub multipliers: CostMultipliers,
}

/// Hitpoints and whole units left on one side once it has destroyed the
/// other, having taken the opponent's fire for as many cycles.
fn survivors(
    unit_hitpoints: f64,
    units: u32,
    incoming: &CycleDamage,
    own_cycles: u64,
) -> (f64, u64) {
    let remaining = (unit_hitpoints * units as f64 - incoming.dealt_over(own_cycles)).max(0.0);
    let whole_units = if unit_hitpoints > 0.0 {
        (remaining / unit_hitpoints).floor() as u64
    } else {
        0
    };
    (remaining, whole_units)
}

/// Evaluate `a` against `b` with army sizes that equalize cost.
///
/// The side with strictly more whole units left wins; equal counts,
/// including none left on either side, are a draw. A side with an invalid
/// attack speed leaves both counts at zero.
///
/// # Examples
///
/// ```rust
/// use skirmish::combat::{CombatEntity, Winner};
/// use skirmish::equal_cost::compute_versus_at_equal_cost;
/// use skirmish::model::{Costs, Weapon};
/// use skirmish::CombatConfig;
///
/// let unit = |id: &str, hp: f64, damage: f64, food: f64| CombatEntity {
///     id: id.into(),
///     hitpoints: hp,
///     weapons: vec![Weapon { damage, speed: 1.0, ..Weapon::default() }],
///     costs: Costs { food, ..Costs::default() },
///     ..CombatEntity::default()
/// };
///
/// let result = compute_versus_at_equal_cost(
///     &unit("a", 100.0, 10.0, 100.0),
///     &unit("b", 100.0, 10.0, 200.0),
///     None,
///     None,
///     &CombatConfig::default(),
/// );
/// assert_eq!((result.multipliers.mult_a, result.multipliers.mult_b), (2, 1));
/// assert_eq!(result.winner, Winner::Unit("a".into()));
/// ```
pub fn compute_versus_at_equal_cost(
    a: &CombatEntity,
    b: &CombatEntity,
    charge_a: Option<f64>,
    charge_b: Option<f64>,
    config: &CombatConfig,
) -> EqualCostVersusResult {
    let charge_a = charge_a.unwrap_or(a.charge_bonus);
    let charge_b = charge_b.unwrap_or(b.charge_bonus);
    let multipliers = calculate_equal_cost_multipliers(a.total_cost(), b.total_cost(), config);
    let (mult_a, mult_b) = (multipliers.mult_a, multipliers.mult_b);

    let attacker = compute_metrics_with_multiplier(a, b, mult_a, mult_b, charge_a, config);
    let defender = compute_metrics_with_multiplier(b, a, mult_b, mult_a, charge_b, config);

    let ((hp_a, units_a), (hp_b, units_b)) = match (attacker.hits_to_kill, defender.hits_to_kill) {
        (Some(cycles_a), Some(cycles_b))
            if !attacker.bug_attack_speed && !defender.bug_attack_speed =>
        {
            let from_b = CycleDamage::new(b, a, mult_b, charge_b, config);
            let from_a = CycleDamage::new(a, b, mult_a, charge_a, config);
            (
                survivors(a.hitpoints, mult_a, &from_b, cycles_a),
                survivors(b.hitpoints, mult_b, &from_a, cycles_b),
            )
        }
        _ => ((0.0, 0), (0.0, 0)),
    };

    let outcome = if units_a > units_b {
        Some((a, hp_a, units_a, multipliers.total_cost_a / mult_a as f64))
    } else if units_b > units_a {
        Some((b, hp_b, units_b, multipliers.total_cost_b / mult_b as f64))
    } else {
        None
    };

    let mut result = EqualCostVersusResult {
        winner: Winner::Draw,
        winner_hp_remaining: None,
        winner_units_remaining: None,
        resource_difference: None,
        multipliers,
        attacker,
        defender,
    };
    if let Some((winner, hp, units, unit_cost)) = outcome {
        result.winner = Winner::Unit(winner.id.clone());
        result.winner_hp_remaining = Some(hp);
        result.winner_units_remaining = Some(units);
        result.resource_difference = Some(units as f64 * unit_cost);
    }
    debug!(
        winner = ?result.winner,
        units_a,
        units_b,
        "equal cost engagement evaluated"
    );
    result
}
