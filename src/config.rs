//! Combat evaluation tunables.
//!
//! Every threshold the evaluator and the cost solver use lives here so a
//! caller can load them from a JSON document instead of recompiling.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Civilization literal meaning "any civilization".
pub const ALL_CIVS: &str = "all";

/// Tunables for combat evaluation and cost equalization.
///
/// Missing fields fall back to their defaults when deserialized.
///
/// # Examples
///
/// ```rust
/// use skirmish::CombatConfig;
///
/// let config = CombatConfig::from_json_str(r#"{ "drawTolerance": 0.1 }"#).unwrap();
/// assert_eq!(config.draw_tolerance, 0.1);
/// assert_eq!(config.max_multiplier, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatConfig {
    /// Relative TTK difference (of the larger TTK) still considered a draw.
    pub draw_tolerance: f64,
    /// Relative total-cost difference accepted by the cost solver.
    pub cost_tolerance: f64,
    /// Upper bound for each unit-count multiplier.
    pub max_multiplier: u32,
    /// Attacker classes whose attacks ignore armor entirely.
    pub siege_classes: Vec<String>,
    /// Attacker class that ignores ranged armor.
    pub gunpowder_class: String,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            draw_tolerance: 0.05,
            cost_tolerance: 0.10,
            max_multiplier: 50,
            siege_classes: [
                "siege",
                "siege_range",
                "siege_tower",
                "ram",
                "catapult",
                "trebuchet_counterweight",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            gunpowder_class: "gunpowder".to_string(),
        }
    }
}

impl CombatConfig {
    /// Parse a config document; absent keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether any of `classes` is a configured siege class.
    pub fn is_siege(&self, classes: &[String]) -> bool {
        classes.iter().any(|c| {
            self.siege_classes
                .iter()
                .any(|siege| siege.eq_ignore_ascii_case(c))
        })
    }

    /// Whether `classes` contains the gunpowder class.
    pub fn is_gunpowder(&self, classes: &[String]) -> bool {
        classes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.gunpowder_class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CombatConfig::default();
        assert_eq!(config.draw_tolerance, 0.05);
        assert_eq!(config.cost_tolerance, 0.10);
        assert_eq!(config.max_multiplier, 50);
        assert!(config.siege_classes.contains(&"ram".to_string()));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = CombatConfig::from_json_str(r#"{ "maxMultiplier": 10 }"#).unwrap();
        assert_eq!(config.max_multiplier, 10);
        assert_eq!(config.gunpowder_class, "gunpowder");
    }

    #[test]
    fn test_class_checks_are_case_insensitive() {
        let config = CombatConfig::default();
        assert!(config.is_siege(&["Catapult".to_string()]));
        assert!(!config.is_siege(&["infantry".to_string()]));
        assert!(config.is_gunpowder(&["GUNPOWDER".to_string()]));
        assert!(!config.is_gunpowder(&["gunpowder_cavalry".to_string()]));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(CombatConfig::from_json_str(r#"{ "maxMultiplier": "ten" }"#).is_err());
    }
}
