use proptest::prelude::*;
use skirmish::combat::{compute_effective_damage, compute_metrics, compute_versus, decide_winner};
use skirmish::equal_cost::{calculate_equal_cost_multipliers, compute_versus_at_equal_cost};
use skirmish::model::WeaponRange;
use skirmish::{
    Catalog, CombatConfig, CombatEntity, Costs, Selection, StatResolver, Weapon, WeaponKind, Winner,
};

fn unit(id: &str, hitpoints: f64, damage: f64, speed: f64, melee_armor: f64, food: f64) -> CombatEntity {
    CombatEntity {
        id: id.into(),
        name: id.to_uppercase(),
        hitpoints,
        weapons: vec![Weapon {
            name: "Blade".into(),
            kind: WeaponKind::Melee,
            damage,
            speed,
            range: WeaponRange { min: 0.0, max: 0.3 },
            modifiers: Vec::new(),
        }],
        melee_armor,
        ranged_armor: 0.0,
        costs: Costs {
            food,
            ..Costs::default()
        },
        classes: vec!["infantry".into(), "melee".into()],
        debuffs: Vec::new(),
        charge_bonus: 0.0,
    }
}

/// A deals 10 into 2 armor; B deals 5 into none. Both have 100 HP and
/// attack once per second.
#[test]
fn test_one_on_one_end_to_end() {
    let a = unit("a", 100.0, 10.0, 1.0, 0.0, 50.0);
    let b = unit("b", 100.0, 5.0, 1.0, 2.0, 50.0);

    let result = compute_versus(&a, &b, None, None, &CombatConfig::default());

    assert_eq!(result.attacker.effective_damage_per_hit, 8.0);
    assert_eq!(result.attacker.hits_to_kill, Some(13));
    assert_eq!(result.attacker.time_to_kill, Some(13.0));
    assert_eq!(result.attacker.dps, Some(8.0));
    assert_eq!(result.attacker.dps_per_cost, Some(0.16));
    assert_eq!(
        result.attacker.formula,
        "Effective = max(1, Base(10) + Bonus(0) - Armor(2)) = 8; DPS = 8 / 1"
    );

    assert_eq!(result.defender.hits_to_kill, Some(20));
    assert_eq!(result.defender.time_to_kill, Some(20.0));
    assert_eq!(result.winner, Winner::Unit("a".into()));
}

#[test]
fn test_winner_serializes_as_id_or_draw() {
    let a = unit("a", 100.0, 10.0, 1.0, 0.0, 50.0);
    let result = compute_versus(&a, &a, None, None, &CombatConfig::default());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["winner"], "draw");
    assert_eq!(json["attacker"]["hitsToKill"], 10);
}

#[test]
fn test_draw_tolerance_boundary() {
    let config = CombatConfig::default();
    let attacker = unit("a", 100.0, 10.0, 1.0, 0.0, 50.0);
    let defender = unit("b", 100.0, 10.0, 1.0, 0.0, 50.0);
    let mut fast = compute_metrics(&attacker, &defender, 0.0, &config);
    let mut slow = compute_metrics(&defender, &attacker, 0.0, &config);

    fast.time_to_kill = Some(10.0);
    slow.time_to_kill = Some(10.4);
    assert_eq!(decide_winner(&fast, &slow, config.draw_tolerance), Winner::Draw);

    slow.time_to_kill = Some(10.6);
    assert_eq!(
        decide_winner(&fast, &slow, config.draw_tolerance),
        Winner::Unit("a".into())
    );
}

#[test]
fn test_zero_attack_speed_forces_draw() {
    let config = CombatConfig::default();
    let broken = unit("broken", 100.0, 50.0, 0.0, 0.0, 50.0);
    let b = unit("b", 100.0, 1.0, 2.0, 0.0, 50.0);

    let result = compute_versus(&broken, &b, None, None, &config);
    assert!(result.attacker.bug_attack_speed);
    assert_eq!(result.attacker.dps, None);
    assert_eq!(result.attacker.time_to_kill, None);
    assert!(result.winner.is_draw());

    let equal = compute_versus_at_equal_cost(&broken, &b, None, None, &config);
    assert!(equal.winner.is_draw());
    assert_eq!(equal.winner_units_remaining, None);
}

#[test]
fn test_siege_ignores_armor_and_gunpowder_ignores_ranged_armor() {
    let config = CombatConfig::default();
    let mut defender = unit("wall", 1000.0, 0.0, 1.0, 50.0, 0.0);
    defender.ranged_armor = 50.0;

    let mut ram = unit("ram", 300.0, 40.0, 2.0, 0.0, 200.0);
    ram.classes = vec!["siege".into(), "ram".into()];
    assert_eq!(compute_effective_damage(&ram, &defender, 0.0, false, &config).value, 40.0);

    let mut handcannon = unit("hc", 130.0, 35.0, 2.0, 0.0, 120.0);
    handcannon.weapons[0].kind = WeaponKind::Ranged;
    handcannon.classes = vec!["infantry".into(), "ranged".into(), "gunpowder".into()];
    assert_eq!(
        compute_effective_damage(&handcannon, &defender, 0.0, false, &config).value,
        35.0
    );

    let mut archer = handcannon.clone();
    archer.classes = vec!["infantry".into(), "ranged".into()];
    assert_eq!(compute_effective_damage(&archer, &defender, 0.0, false, &config).value, 1.0);
}

#[test]
fn test_charge_counts_on_first_hit_only() {
    let config = CombatConfig::default();
    let knight = unit("knight", 230.0, 24.0, 1.5, 0.0, 240.0);
    let target = unit("target", 100.0, 1.0, 1.0, 4.0, 50.0);

    let metrics = compute_metrics(&knight, &target, 10.0, &config);
    // 30 then 20s: 30 + 20 + 20 + 20 = 90, a fifth hit is needed.
    assert_eq!(metrics.hits_to_kill, Some(5));
    assert_eq!(metrics.effective_damage_per_hit, 20.0);
    assert!(metrics.formula.contains("First hit = max(1, Base(24) + Bonus(0) + Charge(10) - Armor(4)) = 30"));
}

#[test]
fn test_equal_cost_winner_extras() {
    let config = CombatConfig::default();
    let a = unit("a", 100.0, 10.0, 1.0, 0.0, 100.0);
    let b = unit("b", 100.0, 10.0, 1.0, 0.0, 200.0);

    let result = compute_versus_at_equal_cost(&a, &b, None, None, &config);
    assert_eq!((result.multipliers.mult_a, result.multipliers.mult_b), (2, 1));
    assert_eq!(result.winner, Winner::Unit("a".into()));
    assert_eq!(result.winner_units_remaining, Some(1));
    assert_eq!(result.winner_hp_remaining, Some(150.0));
    assert_eq!(result.resource_difference, Some(100.0));
}

#[test]
fn test_resolved_units_at_equal_cost() {
    let catalog = Catalog::from_json_str(
        r#"[
          { "id": "spearman", "type": "unit", "variations": [
            { "id": "spearman-1", "age": 1, "hitpoints": 80, "classes": ["infantry", "melee", "light"],
              "costs": { "food": 60, "wood": 20 },
              "weapons": [{ "type": "melee", "damage": 7, "speed": 1.875,
                "modifiers": [{ "property": "meleeAttack", "target": { "class": [["cavalry"]] },
                                "effect": "change", "value": 17, "type": "passive" }] }],
              "armor": [{ "type": "melee", "value": 0 }, { "type": "ranged", "value": 0 }] }
          ] },
          { "id": "horseman", "type": "unit", "variations": [
            { "id": "horseman-2", "age": 2, "hitpoints": 125, "classes": ["cavalry", "light", "melee"],
              "costs": { "food": 100, "wood": 20 },
              "weapons": [{ "type": "melee", "damage": 9, "speed": 1.75 }],
              "armor": [{ "type": "melee", "value": 0 }, { "type": "ranged", "value": 2 }] }
          ] }
        ]"#,
        &[],
    )
    .unwrap();
    let resolver = StatResolver::new(&catalog, CombatConfig::default());
    let none: &[&str] = &[];
    let spear = resolver
        .combat_entity(&Selection::new("spearman", "all", 1), none, none)
        .unwrap();
    let horse = resolver
        .combat_entity(&Selection::new("horseman", "all", 2), none, none)
        .unwrap();

    let duel = resolver.compute_versus(&spear, &horse, None, None);
    assert_eq!(duel.attacker.effective_damage_per_hit, 24.0);
    assert_eq!(duel.winner, Winner::Unit("spearman".into()));

    let result = resolver.compute_versus_at_equal_cost(&spear, &horse, None, None);
    assert_eq!((result.multipliers.mult_a, result.multipliers.mult_b), (3, 2));
    assert_eq!(result.winner, Winner::Unit("spearman".into()));
}

const BONUS_DATASET: &str = r#"[
  { "id": "spearman", "type": "unit", "variations": [
    { "id": "spearman-1", "age": 1, "hitpoints": 80, "classes": ["infantry", "melee", "light"],
      "costs": { "food": 60, "wood": 20 },
      "weapons": [{ "type": "melee", "damage": 7, "speed": 1.875,
        "modifiers": [{ "property": "meleeAttack", "target": { "class": [["cavalry"]] },
                        "effect": "change", "value": 17, "type": "passive" }] }] }
  ] },
  { "id": "archer", "type": "unit", "variations": [
    { "id": "archer-1", "age": 1, "hitpoints": 70, "classes": ["infantry", "ranged", "light"],
      "costs": { "food": 30, "wood": 50 },
      "weapons": [{ "type": "ranged", "damage": 5, "speed": 1.625 }] }
  ] },
  { "id": "horseman", "type": "unit", "variations": [
    { "id": "horseman-1", "age": 1, "hitpoints": 125, "classes": ["cavalry", "light", "melee"],
      "costs": { "food": 100, "wood": 20 },
      "weapons": [{ "type": "melee", "damage": 9, "speed": 1.75 }] }
  ] },
  { "id": "maa", "type": "unit", "variations": [
    { "id": "maa-1", "age": 1, "hitpoints": 100, "classes": ["infantry", "melee", "heavy"],
      "costs": { "food": 100, "gold": 20 },
      "weapons": [{ "type": "melee", "damage": 5, "speed": 1.375 }] }
  ] },
  { "id": "bombard-ship", "type": "unit", "variations": [
    { "id": "bombard-ship-3", "age": 3, "civs": ["en"], "hitpoints": 1000,
      "classes": ["ship", "naval", "siege"],
      "costs": { "wood": 300, "gold": 200 },
      "weapons": [{ "type": "siege", "damage": 50, "speed": 3 },
                  { "type": "ranged", "damage": 10, "speed": 1 }] }
  ] },
  { "id": "spear-drills", "type": "technology", "variations": [{ "age": 1, "effects": [
    { "property": "meleeAttack", "select": { "id": ["spearman"] }, "target": { "class": [["cavalry"]] },
      "effect": "change", "value": 5, "type": "bonus" }
  ] }] },
  { "id": "bodkin-arrows", "type": "technology", "variations": [{ "age": 1, "effects": [
    { "property": "rangedAttack", "select": { "class": [["ranged"]] }, "target": { "class": [["cavalry"]] },
      "effect": "change", "value": 4, "type": "bonus" }
  ] }] }
]"#;

fn bonus_catalog() -> Catalog {
    Catalog::from_json_str(BONUS_DATASET, &[]).unwrap()
}

/// A technology bonus stacks onto the weapon's own bonus against cavalry
/// and does nothing against infantry.
#[test]
fn test_technology_bonus_augments_existing_entry() {
    let catalog = bonus_catalog();
    let resolver = StatResolver::new(&catalog, CombatConfig::default());
    let config = CombatConfig::default();
    let none: &[&str] = &[];

    let spear = resolver
        .combat_entity(&Selection::new("spearman", "en", 1), &["spear-drills"], none)
        .unwrap();
    let horse = resolver
        .combat_entity(&Selection::new("horseman", "en", 1), none, none)
        .unwrap();
    let maa = resolver
        .combat_entity(&Selection::new("maa", "en", 1), none, none)
        .unwrap();

    assert_eq!(spear.primary_weapon().unwrap().modifiers.len(), 1);

    let vs_cavalry = compute_effective_damage(&spear, &horse, 0.0, false, &config);
    assert_eq!(vs_cavalry.bonus, 22.0);
    assert_eq!(vs_cavalry.value, 29.0);

    let vs_infantry = compute_effective_damage(&spear, &maa, 0.0, false, &config);
    assert_eq!(vs_infantry.bonus, 0.0);
    assert_eq!(vs_infantry.value, 7.0);
}

/// A technology bonus on a unit without one adds a new entry.
#[test]
fn test_technology_bonus_creates_new_entry() {
    let catalog = bonus_catalog();
    let resolver = StatResolver::new(&catalog, CombatConfig::default());
    let config = CombatConfig::default();
    let none: &[&str] = &[];

    let plain = resolver
        .resolve_stats(&Selection::new("archer", "en", 1), none, none)
        .unwrap();
    assert!(plain.stats.bonus_damage.is_empty());

    let archer = resolver
        .resolve_stats(&Selection::new("archer", "en", 1), &["bodkin-arrows"], none)
        .unwrap();
    assert_eq!(archer.stats.bonus_damage.len(), 1);
    assert_eq!(archer.stats.ranged_attack, 5.0);

    let horse = resolver
        .combat_entity(&Selection::new("horseman", "en", 1), none, none)
        .unwrap();
    let maa = resolver
        .combat_entity(&Selection::new("maa", "en", 1), none, none)
        .unwrap();

    assert_eq!(
        compute_effective_damage(&archer.combat, &horse, 0.0, false, &config).value,
        9.0
    );
    assert_eq!(
        compute_effective_damage(&archer.combat, &maa, 0.0, false, &config).value,
        5.0
    );
}

/// A siege primary keeps its own damage when a weaker ranged weapon follows.
#[test]
fn test_siege_primary_keeps_damage_with_secondary_ranged() {
    let catalog = bonus_catalog();
    let resolver = StatResolver::new(&catalog, CombatConfig::default());
    let none: &[&str] = &[];

    let ship = resolver
        .resolve_stats(&Selection::new("bombard-ship", "en", 3), none, none)
        .unwrap();
    let primary = ship.combat.primary_weapon().unwrap();
    assert_eq!(primary.kind, WeaponKind::Siege);
    assert_eq!(primary.damage, 50.0);
    assert_eq!(ship.combat.weapons[1].damage, 10.0);
}

proptest! {
    /// A hit never does less than 1 damage.
    #[test]
    fn prop_damage_floor(
        damage in 0.0f64..100.0,
        armor in 0.0f64..200.0,
        charge in 0.0f64..30.0,
        first in any::<bool>(),
    ) {
        let attacker = unit("a", 100.0, damage, 1.0, 0.0, 50.0);
        let defender = unit("b", 100.0, 1.0, 1.0, armor, 50.0);
        let hit = compute_effective_damage(&attacker, &defender, charge, first, &CombatConfig::default());
        prop_assert!(hit.value >= 1.0);
    }

    /// Multipliers stay in range and either balance within tolerance or
    /// fall back to one unit each.
    #[test]
    fn prop_equal_cost_bound(cost_a in 1u32..2000, cost_b in 1u32..2000) {
        let config = CombatConfig::default();
        let m = calculate_equal_cost_multipliers(cost_a as f64, cost_b as f64, &config);

        prop_assert!((1..=config.max_multiplier).contains(&m.mult_a));
        prop_assert!(m.mult_b >= 1);
        prop_assert_eq!(m.total_cost_a, m.mult_a as f64 * cost_a as f64);
        prop_assert_eq!(m.total_cost_b, m.mult_b as f64 * cost_b as f64);

        let diff = (m.total_cost_a - m.total_cost_b).abs();
        let bound = m.total_cost_a.max(m.total_cost_b) * config.cost_tolerance;
        prop_assert!(diff <= bound + 1e-9 || (m.mult_a, m.mult_b) == (1, 1));
    }
}
