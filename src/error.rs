//! Error types for catalog loading.
//!
//! Resolution and combat evaluation never fail; they degrade to absent
//! values instead. The only fallible step is turning a raw dataset (plus
//! its patch list and configuration) into an immutable [`Catalog`].
//!
//! [`Catalog`]: crate::catalog::Catalog

use crate::entity_id::EntityId;
use thiserror::Error;

/// Result type alias using [`CatalogError`].
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while loading a catalog.
///
/// # Examples
///
/// ```rust
/// use skirmish::{CatalogError, EntityId};
///
/// let err = CatalogError::DuplicateEntity(EntityId::new("spearman"));
/// assert_eq!(err.to_string(), "Duplicate entity id: spearman");
/// ```
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The dataset or a config document is not valid JSON for the schema.
    #[error("Malformed dataset: {0}")]
    Json(#[from] serde_json::Error),

    /// Two entities share the same id.
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(EntityId),

    /// Two variations of one entity share the same (civilizations, age) key.
    #[error("Duplicate variation for {entity}: civs [{civs}] age {age}")]
    DuplicateVariation {
        /// The entity carrying the colliding variations.
        entity: EntityId,
        /// The civilization list of the colliding key, comma separated.
        civs: String,
        /// The age of the colliding key.
        age: u8,
    },

    /// A patch names an entity that is not in the dataset.
    #[error("Patch target not found: {0}")]
    PatchTarget(String),

    /// A patch path walks through something that is not an object or array.
    #[error("Invalid patch path for {entity}: {path}")]
    PatchPath {
        /// The patched entity.
        entity: String,
        /// The offending dot-separated path.
        path: String,
    },

    /// The dataset document has none of the accepted top-level shapes.
    #[error("Unsupported dataset layout: {0}")]
    Layout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CatalogError::PatchTarget("ability-camel-unease".into());
        assert!(err.to_string().contains("ability-camel-unease"));
    }

    #[test]
    fn test_json_error_converts() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: CatalogError = bad.unwrap_err().into();
        assert!(err.to_string().starts_with("Malformed dataset"));
    }
}
