//! Knowledge graph trait.
//!
//! A directed graph of entities and typed, weighted relations. Mutations
//! are full-object upserts; nothing is ever deleted. Implementations live
//! in nebulus-infra (e.g., `JsonGraphStore`).
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).

use nebulus_types::error::GraphError;
use nebulus_types::memory::{Entity, GraphStats, Relation};

/// Trait for the durable directed knowledge graph.
///
/// Implementations assume a single writer; concurrent mutation from
/// multiple processes can interleave snapshot rewrites and lose writes.
pub trait KnowledgeGraph: Send + Sync {
    /// Upsert a node keyed by `entity.id`. Re-adding an id overwrites its
    /// type and properties.
    fn add_entity(
        &self,
        entity: &Entity,
    ) -> impl std::future::Future<Output = Result<(), GraphError>> + Send;

    /// Upsert the directed edge `source -> target`. Missing endpoints are
    /// auto-created with type "Unknown".
    fn add_relation(
        &self,
        relation: &Relation,
    ) -> impl std::future::Future<Output = Result<(), GraphError>> + Send;

    /// Outgoing `(relation, neighbor_id)` pairs for `id`; empty for an
    /// unknown id, never an error.
    fn get_neighbors(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Vec<(String, String)>> + Send;

    /// Counts and the sorted set of distinct node types.
    fn get_stats(&self) -> impl std::future::Future<Output = GraphStats> + Send;
}
