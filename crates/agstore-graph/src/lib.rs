//! agstore Graph - Triplet store over PostgreSQL + Apache AGE
//!
//! Exposes a small triplet-oriented API and translates each call into
//! openCypher statements run through a [`GraphClient`].

use agstore_core::{FlatRel, RelMap, Result};
use async_trait::async_trait;
use std::collections::HashMap;

pub mod agtype;
pub mod client;
pub mod cypher;
pub mod postgres_store;

pub use client::{AgRow, AgeClient, GraphClient};
pub use postgres_store::PostgresGraphStore;

/// Default hop depth for [`GraphStore::get_rel_map`]
pub const DEFAULT_REL_MAP_DEPTH: u32 = 2;

/// Default row cap for [`GraphStore::get_rel_map`]
pub const DEFAULT_REL_MAP_LIMIT: usize = 30;

/// Trait for triplet graph stores
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Outgoing `[relation, object]` pairs of a subject
    async fn get(&self, subject: &str) -> Result<Vec<FlatRel>>;

    /// Flattened multi-hop relations for each subject, at most `limit` rows overall
    async fn get_rel_map(&self, subjects: &[String], depth: u32, limit: usize) -> Result<RelMap>;

    /// [`GraphStore::get_rel_map`] with the default depth and limit
    async fn get_rel_map_default(&self, subjects: &[String]) -> Result<RelMap> {
        self.get_rel_map(subjects, DEFAULT_REL_MAP_DEPTH, DEFAULT_REL_MAP_LIMIT)
            .await
    }

    /// Add a triplet, creating nodes and edge as needed
    async fn upsert_triplet(&self, subject: &str, relation: &str, object: &str) -> Result<()>;

    /// Delete a triplet and any endpoint left without edges
    async fn delete(&self, subject: &str, relation: &str, object: &str) -> Result<()>;

    /// Delete a whole graph
    async fn delete_graph(&self, graph_name: &str) -> Result<()>;

    /// Get the schema of the graph store
    async fn get_schema(&self, refresh: bool) -> Result<String>;

    /// Run a raw statement
    async fn query(
        &self,
        query: &str,
        param_map: &HashMap<String, serde_json::Value>,
    ) -> Result<serde_json::Value>;
}
