//! agstore Core - Triplet models, errors, and shared configuration
//!
//! This crate defines the pieces shared by every agstore backend:
//! - Triplet and relation-map models
//! - Relation type normalization
//! - Common error types
//! - Configuration management
//! - Logging setup

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, GraphStoreConfig, LogFormat, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for graph store operations
#[derive(Error, Debug)]
pub enum GraphError {
    /// Connecting to the graph engine failed. The cause is deliberately not kept.
    #[error("Could not connect to Postgres. Please ensure that the configuration is correct.")]
    Connection,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Operation not supported: {0}")]
    NotSupported(&'static str),

    #[error("Invalid query result: {0}")]
    InvalidResult(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ============================================================================
// Triplet Models
// ============================================================================

/// Normalize a relation into an edge type: spaces become underscores and the
/// whole thing is upper-cased.
///
/// ```
/// assert_eq!(agstore_core::normalize_relation("is friend"), "IS_FRIEND");
/// ```
pub fn normalize_relation(relation: &str) -> String {
    relation.replace(' ', "_").to_uppercase()
}

/// A (subject, relation, object) triplet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triplet {
    /// Subject node id
    pub subject: String,

    /// Normalized relation type
    pub relation: String,

    /// Object node id
    pub object: String,
}

impl Triplet {
    /// Create a new triplet, normalizing the relation type
    pub fn new(
        subject: impl Into<String>,
        relation: impl AsRef<str>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: normalize_relation(relation.as_ref()),
            object: object.into(),
        }
    }
}

impl std::fmt::Display for Triplet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})-[{}]->({})", self.subject, self.relation, self.object)
    }
}

/// One flattened hop: `[relation_type, node_id]`
pub type FlatRel = Vec<String>;

/// Subject id -> flattened hops reachable from it
pub type RelMap = HashMap<String, Vec<FlatRel>>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_relation() {
        assert_eq!(normalize_relation("is friend"), "IS_FRIEND");
        assert_eq!(normalize_relation("works at"), "WORKS_AT");
        assert_eq!(normalize_relation("KNOWS"), "KNOWS");
        assert_eq!(normalize_relation("a  b"), "A__B");
    }

    #[test]
    fn test_triplet_builder() {
        let triplet = Triplet::new("alice", "is friend", "bob");

        assert_eq!(triplet.subject, "alice");
        assert_eq!(triplet.relation, "IS_FRIEND");
        assert_eq!(triplet.object, "bob");
        assert_eq!(triplet.to_string(), "(alice)-[IS_FRIEND]->(bob)");
    }

    #[test]
    fn test_triplet_serde() {
        let triplet = Triplet::new("alice", "knows", "bob");
        let json = serde_json::to_value(&triplet).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"subject": "alice", "relation": "KNOWS", "object": "bob"})
        );
    }

    #[test]
    fn test_connection_error_has_no_source() {
        use std::error::Error;

        let err = GraphError::Connection;
        assert!(err.source().is_none());
        assert!(err.to_string().contains("Could not connect to Postgres"));
    }

    proptest! {
        #[test]
        fn normalized_relation_has_no_spaces(relation in "[a-zA-Z ]{0,24}") {
            let normalized = normalize_relation(&relation);
            prop_assert!(!normalized.contains(' '));
            prop_assert_eq!(normalized.len(), relation.len());
            prop_assert_eq!(normalize_relation(&normalized), normalized.clone());
        }
    }
}
