//! Catalog entity ids.
//!
//! Every unit, technology and ability is keyed by its dataset slug. The
//! same ids are stored in the catalog index, the tier graph and every
//! combat result, so they share one allocation.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Dataset slug of a catalog entity (`"spearman"`, `"melee-damage-2"`).
///
/// Compared exactly. Maps keyed by `EntityId` can be queried with a plain
/// `&str`.
///
/// ```rust
/// use std::collections::HashMap;
/// use skirmish::EntityId;
///
/// let mut hitpoints = HashMap::new();
/// hitpoints.insert(EntityId::new("spearman"), 80.0);
/// assert_eq!(hitpoints.get("spearman"), Some(&80.0));
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId(Arc<str>);

impl EntityId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0.to_string()
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
