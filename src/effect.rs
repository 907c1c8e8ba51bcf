//! Modifier effect types.
//!
//! Technology and ability effects and innate weapon modifiers share one
//! shape, [`ModifierEffect`]. Technologies and abilities use `select` to
//! pick the units they modify; bonus effects and weapon modifiers use
//! `target` to pick the defenders they apply against.

use serde::{Deserialize, Deserializer, Serialize};

/// The stat an effect changes.
///
/// Anything the engine does not know is kept as [`Property::Other`] so
/// newer datasets still load; such effects are skipped during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Property {
    MeleeAttack,
    RangedAttack,
    SiegeAttack,
    GunpowderAttack,
    MeleeArmor,
    RangedArmor,
    Hitpoints,
    MoveSpeed,
    MaxRange,
    AttackSpeed,
    /// One-off extra damage on the first hit of an engagement (charge).
    BonusDamage,
    /// Multiplier on an opponent's damage against the carrier.
    VersusOpponentDamageDebuff,
    Other(String),
}

impl Property {
    /// Dataset spelling of this property.
    pub fn as_str(&self) -> &str {
        match self {
            Property::MeleeAttack => "meleeAttack",
            Property::RangedAttack => "rangedAttack",
            Property::SiegeAttack => "siegeAttack",
            Property::GunpowderAttack => "gunpowderAttack",
            Property::MeleeArmor => "meleeArmor",
            Property::RangedArmor => "rangedArmor",
            Property::Hitpoints => "hitpoints",
            Property::MoveSpeed => "moveSpeed",
            Property::MaxRange => "maxRange",
            Property::AttackSpeed => "attackSpeed",
            Property::BonusDamage => "bonusDamage",
            Property::VersusOpponentDamageDebuff => "versusOpponentDamageDebuff",
            Property::Other(s) => s,
        }
    }

    /// Whether the engine knows how to apply this property.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Property::Other(_))
    }

    /// Attack properties that may carry class-targeted bonus damage.
    pub fn is_attack(&self) -> bool {
        matches!(
            self,
            Property::MeleeAttack
                | Property::RangedAttack
                | Property::SiegeAttack
                | Property::GunpowderAttack
        )
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        match s.as_str() {
            "meleeAttack" => Property::MeleeAttack,
            "rangedAttack" => Property::RangedAttack,
            "siegeAttack" => Property::SiegeAttack,
            "gunpowderAttack" => Property::GunpowderAttack,
            "meleeArmor" => Property::MeleeArmor,
            "rangedArmor" => Property::RangedArmor,
            "hitpoints" => Property::Hitpoints,
            "moveSpeed" => Property::MoveSpeed,
            "maxRange" => Property::MaxRange,
            "attackSpeed" => Property::AttackSpeed,
            "bonusDamage" => Property::BonusDamage,
            "versusOpponentDamageDebuff" => Property::VersusOpponentDamageDebuff,
            _ => Property::Other(s),
        }
    }
}

impl From<Property> for String {
    fn from(p: Property) -> Self {
        p.as_str().to_string()
    }
}

/// How an effect combines with the current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectOp {
    /// Additive (percentage for move speed).
    Change,
    /// Multiplicative.
    Multiply,
    Other(String),
}

impl Default for EffectOp {
    fn default() -> Self {
        EffectOp::Change
    }
}

impl From<String> for EffectOp {
    fn from(s: String) -> Self {
        match s.as_str() {
            "change" => EffectOp::Change,
            "multiply" => EffectOp::Multiply,
            _ => EffectOp::Other(s),
        }
    }
}

impl From<EffectOp> for String {
    fn from(op: EffectOp) -> Self {
        match op {
            EffectOp::Change => "change".to_string(),
            EffectOp::Multiply => "multiply".to_string(),
            EffectOp::Other(s) => s,
        }
    }
}

/// The dataset `type` of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EffectKind {
    Passive,
    Ability,
    /// Conditional damage against defenders matching `target`.
    Bonus,
    Other(String),
}

impl Default for EffectKind {
    fn default() -> Self {
        EffectKind::Passive
    }
}

impl From<String> for EffectKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "passive" => EffectKind::Passive,
            "ability" => EffectKind::Ability,
            "bonus" => EffectKind::Bonus,
            _ => EffectKind::Other(s),
        }
    }
}

impl From<EffectKind> for String {
    fn from(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Passive => "passive".to_string(),
            EffectKind::Ability => "ability".to_string(),
            EffectKind::Bonus => "bonus".to_string(),
            EffectKind::Other(s) => s,
        }
    }
}

/// A list of class groups: AND inside a group, OR across groups.
///
/// The dataset writes this either as a list of groups
/// (`[["light", "infantry"], ["cavalry"]]`) or as one flat group
/// (`["light", "infantry"]`); both decode to the same value. In a list
/// mixing both forms each bare class is its own group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassGroups(pub Vec<Vec<String>>);

impl<'de> Deserialize<'de> for ClassGroups {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Entry {
            Group(Vec<String>),
            Class(String),
        }

        let entries = Vec::<Entry>::deserialize(deserializer)?;
        if entries.iter().any(|e| matches!(e, Entry::Group(_))) {
            // Mixed lists: a bare class is a group of one.
            let groups = entries
                .into_iter()
                .map(|e| match e {
                    Entry::Group(group) => group,
                    Entry::Class(class) => vec![class],
                })
                .collect();
            return Ok(ClassGroups(groups));
        }

        let group: Vec<String> = entries
            .into_iter()
            .filter_map(|e| match e {
                Entry::Class(class) => Some(class),
                Entry::Group(_) => None,
            })
            .collect();
        Ok(if group.is_empty() {
            ClassGroups(Vec::new())
        } else {
            ClassGroups(vec![group])
        })
    }
}

impl ClassGroups {
    pub fn new(groups: Vec<Vec<String>>) -> Self {
        Self(groups)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> &[Vec<String>] {
        &self.0
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for ClassGroups {
    /// A single AND-group.
    fn from(group: [S; N]) -> Self {
        ClassGroups(vec![group.into_iter().map(Into::into).collect()])
    }
}

/// Ids and class groups that pick units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selector {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub id: Vec<String>,
    #[serde(skip_serializing_if = "ClassGroups::is_empty")]
    pub class: ClassGroups,
}

impl Selector {
    pub fn by_ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            id: ids.into_iter().map(Into::into).collect(),
            class: ClassGroups::default(),
        }
    }

    pub fn by_classes(class: ClassGroups) -> Self {
        Self {
            id: Vec::new(),
            class,
        }
    }
}

/// One stat modification rule.
///
/// # Examples
///
/// ```rust
/// use skirmish::effect::{ModifierEffect, Property, EffectOp};
///
/// let effect: ModifierEffect = serde_json::from_str(r#"{
///     "property": "meleeAttack",
///     "select": { "class": [["infantry", "melee"]] },
///     "effect": "change",
///     "value": 1,
///     "type": "passive"
/// }"#).unwrap();
///
/// assert_eq!(effect.property, Property::MeleeAttack);
/// assert_eq!(effect.effect, EffectOp::Change);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierEffect {
    pub property: Property,
    #[serde(default)]
    pub select: Selector,
    #[serde(default)]
    pub effect: EffectOp,
    #[serde(default)]
    pub value: f64,
    #[serde(rename = "type", default)]
    pub kind: EffectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Selector>,
}

impl ModifierEffect {
    /// A passive `change` effect on `property` for units matching `select`.
    pub fn change(property: Property, select: Selector, value: f64) -> Self {
        Self {
            property,
            select,
            effect: EffectOp::Change,
            value,
            kind: EffectKind::Passive,
            target: None,
        }
    }

    /// A passive `multiply` effect on `property` for units matching `select`.
    pub fn multiply(property: Property, select: Selector, value: f64) -> Self {
        Self {
            effect: EffectOp::Multiply,
            ..Self::change(property, select, value)
        }
    }

    /// A bonus-damage rule against defenders matching `target`.
    pub fn bonus(property: Property, select: Selector, target: ClassGroups, value: f64) -> Self {
        Self {
            kind: EffectKind::Bonus,
            target: Some(Selector::by_classes(target)),
            ..Self::change(property, select, value)
        }
    }

    /// Class groups of the defender-side predicate, if any.
    pub fn target_classes(&self) -> Option<&ClassGroups> {
        self.target.as_ref().map(|t| &t.class).filter(|c| !c.is_empty())
    }
}
