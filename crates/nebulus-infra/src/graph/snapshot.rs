//! Directed knowledge graph with JSON file persistence.
//!
//! The whole graph lives in memory; every mutation rewrites the full
//! snapshot file. No incremental append -- durability and a
//! human-inspectable file over write throughput, which is acceptable at
//! small-to-moderate graph sizes and a known bottleneck for bulk import.
//!
//! Snapshot format: a node list (id, type, properties) and a link list
//! (source, target, relation, weight), pretty-printed JSON. Saving then
//! reloading reproduces an equivalent graph.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use nebulus_core::memory::graph::KnowledgeGraph;
use nebulus_types::error::GraphError;
use nebulus_types::memory::{Entity, GraphStats, Relation};

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    entity_type: String,
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
struct EdgeData {
    relation: String,
    weight: f64,
}

/// In-memory graph: nodes by id, outgoing edges by source then target.
/// One edge per (source, target) pair; re-adding overwrites it.
#[derive(Debug, Default)]
struct GraphData {
    nodes: BTreeMap<String, NodeData>,
    edges: BTreeMap<String, BTreeMap<String, EdgeData>>,
}

impl GraphData {
    fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }
}

/// On-disk snapshot document.
#[derive(Serialize, Deserialize)]
struct SnapshotDoc {
    nodes: Vec<NodeRecord>,
    links: Vec<LinkRecord>,
}

#[derive(Serialize, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    entity_type: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize)]
struct LinkRecord {
    source: String,
    target: String,
    relation: String,
    #[serde(default = "default_weight")]
    weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl From<&GraphData> for SnapshotDoc {
    fn from(data: &GraphData) -> Self {
        let nodes = data
            .nodes
            .iter()
            .map(|(id, node)| NodeRecord {
                id: id.clone(),
                entity_type: node.entity_type.clone(),
                properties: node.properties.clone(),
            })
            .collect();
        let links = data
            .edges
            .iter()
            .flat_map(|(source, targets)| {
                targets.iter().map(move |(target, edge)| LinkRecord {
                    source: source.clone(),
                    target: target.clone(),
                    relation: edge.relation.clone(),
                    weight: edge.weight,
                })
            })
            .collect();
        SnapshotDoc { nodes, links }
    }
}

impl From<SnapshotDoc> for GraphData {
    fn from(doc: SnapshotDoc) -> Self {
        let mut data = GraphData::default();
        for node in doc.nodes {
            data.nodes.insert(
                node.id,
                NodeData {
                    entity_type: node.entity_type,
                    properties: node.properties,
                },
            );
        }
        for link in doc.links {
            // Endpoints referenced only by links still become nodes.
            for endpoint in [&link.source, &link.target] {
                data.nodes.entry(endpoint.clone()).or_insert_with(|| NodeData {
                    entity_type: "Unknown".to_string(),
                    properties: BTreeMap::new(),
                });
            }
            data.edges.entry(link.source).or_default().insert(
                link.target,
                EdgeData {
                    relation: link.relation,
                    weight: link.weight,
                },
            );
        }
        data
    }
}

/// Durable directed knowledge graph, snapshot-persisted to one JSON file.
///
/// Assumes a single writer process; writes within a process are serialized
/// through the internal lock.
pub struct JsonGraphStore {
    path: PathBuf,
    state: RwLock<GraphData>,
}

impl JsonGraphStore {
    /// Open a graph store at `path`, creating parent directories.
    ///
    /// An existing snapshot is loaded; a corrupt or unreadable one is
    /// logged and replaced with an empty graph (accepted data-loss-on-
    /// corruption tradeoff). Only directory creation can fail here.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, GraphError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<SnapshotDoc>(&content) {
                Ok(doc) => {
                    let data = GraphData::from(doc);
                    tracing::info!(
                        path = %path.display(),
                        nodes = data.nodes.len(),
                        "Loaded graph snapshot"
                    );
                    data
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Corrupt graph snapshot; starting empty");
                    GraphData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No existing graph snapshot; starting empty");
                GraphData::default()
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to read graph snapshot; starting empty");
                GraphData::default()
            }
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Rewrite the full snapshot from the given state.
    async fn save(&self, data: &GraphData) -> Result<(), GraphError> {
        let doc = SnapshotDoc::from(data);
        let json = serde_json::to_string_pretty(&doc)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

impl KnowledgeGraph for JsonGraphStore {
    async fn add_entity(&self, entity: &Entity) -> Result<(), GraphError> {
        let mut data = self.state.write().await;
        data.nodes.insert(
            entity.id.clone(),
            NodeData {
                entity_type: entity.entity_type.clone(),
                properties: entity.properties.clone(),
            },
        );
        // In-memory state stays updated even when the write fails; the
        // caller decides how to degrade.
        self.save(&data).await
    }

    async fn add_relation(&self, relation: &Relation) -> Result<(), GraphError> {
        let mut data = self.state.write().await;
        for endpoint in [&relation.source, &relation.target] {
            if !data.nodes.contains_key(endpoint) {
                tracing::warn!(node_id = %endpoint, "Node does not exist; adding as generic entity");
                data.nodes.insert(
                    endpoint.clone(),
                    NodeData {
                        entity_type: "Unknown".to_string(),
                        properties: BTreeMap::new(),
                    },
                );
            }
        }
        data.edges
            .entry(relation.source.clone())
            .or_default()
            .insert(
                relation.target.clone(),
                EdgeData {
                    relation: relation.relation.clone(),
                    weight: relation.weight,
                },
            );
        self.save(&data).await
    }

    async fn get_neighbors(&self, id: &str) -> Vec<(String, String)> {
        let data = self.state.read().await;
        match data.edges.get(id) {
            Some(targets) => targets
                .iter()
                .map(|(target, edge)| (edge.relation.clone(), target.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    async fn get_stats(&self) -> GraphStats {
        let data = self.state.read().await;
        let mut entity_types: Vec<String> = data
            .nodes
            .values()
            .map(|node| node.entity_type.clone())
            .collect();
        entity_types.sort();
        entity_types.dedup();

        GraphStats {
            node_count: data.nodes.len(),
            edge_count: data.edge_count(),
            entity_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_in(dir: &TempDir) -> JsonGraphStore {
        JsonGraphStore::open(dir.path().join("graph.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_graph_stats() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        let stats = graph.get_stats().await;
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.edge_count, 0);
        assert!(stats.entity_types.is_empty());
    }

    #[tokio::test]
    async fn test_add_entity() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph.add_entity(&Entity::new("srv-1", "Server")).await.unwrap();

        let stats = graph.get_stats().await;
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.entity_types, vec!["Server".to_string()]);
    }

    #[tokio::test]
    async fn test_idempotent_add_entity() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        let entity = Entity::new("srv", "Server");

        graph.add_entity(&entity).await.unwrap();
        assert_eq!(graph.get_stats().await.node_count, 1);

        graph.add_entity(&entity).await.unwrap();
        assert_eq!(graph.get_stats().await.node_count, 1);
    }

    #[tokio::test]
    async fn test_re_adding_entity_overwrites_attributes() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph.add_entity(&Entity::new("srv", "Server")).await.unwrap();

        let mut updated = Entity::new("srv", "Database");
        updated
            .properties
            .insert("region".to_string(), "eu-west-1".to_string());
        graph.add_entity(&updated).await.unwrap();

        let stats = graph.get_stats().await;
        assert_eq!(stats.node_count, 1);
        assert_eq!(stats.entity_types, vec!["Database".to_string()]);
    }

    #[tokio::test]
    async fn test_add_relation() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph.add_entity(&Entity::new("a", "Server")).await.unwrap();
        graph.add_entity(&Entity::new("b", "Database")).await.unwrap();
        graph
            .add_relation(&Relation::new("a", "b", "CONNECTS_TO"))
            .await
            .unwrap();

        let stats = graph.get_stats().await;
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.node_count, 2);
    }

    #[tokio::test]
    async fn test_add_relation_auto_creates_nodes() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph
            .add_relation(&Relation::new("x", "y", "LINKS"))
            .await
            .unwrap();

        let stats = graph.get_stats().await;
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(stats.entity_types, vec!["Unknown".to_string()]);
    }

    #[tokio::test]
    async fn test_get_neighbors() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph.add_entity(&Entity::new("a", "T")).await.unwrap();
        graph.add_entity(&Entity::new("b", "T")).await.unwrap();
        graph.add_relation(&Relation::new("a", "b", "REL")).await.unwrap();

        let neighbors = graph.get_neighbors("a").await;
        assert_eq!(neighbors, vec![("REL".to_string(), "b".to_string())]);
        // Edges are directed; "b" has no outgoing edges.
        assert!(graph.get_neighbors("b").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_neighbors_unknown_node() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        assert!(graph.get_neighbors("nonexistent").await.is_empty());
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");

        let g1 = JsonGraphStore::open(&path).await.unwrap();
        g1.add_entity(&Entity::new("persistent", "Test")).await.unwrap();
        drop(g1);

        let g2 = JsonGraphStore::open(&path).await.unwrap();
        assert_eq!(g2.get_stats().await.node_count, 1);
    }

    #[tokio::test]
    async fn test_round_trip_preserves_attributes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");

        let g1 = JsonGraphStore::open(&path).await.unwrap();
        let mut entity = Entity::new("srv-1", "Server");
        entity
            .properties
            .insert("ip".to_string(), "10.0.0.1".to_string());
        g1.add_entity(&entity).await.unwrap();
        let mut relation = Relation::new("srv-1", "dc-1", "HOSTED_IN");
        relation.weight = 0.5;
        g1.add_relation(&relation).await.unwrap();
        drop(g1);

        let g2 = JsonGraphStore::open(&path).await.unwrap();
        let stats = g2.get_stats().await;
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(
            stats.entity_types,
            vec!["Server".to_string(), "Unknown".to_string()]
        );
        assert_eq!(
            g2.get_neighbors("srv-1").await,
            vec![("HOSTED_IN".to_string(), "dc-1".to_string())]
        );

        let data = g2.state.read().await;
        let node = &data.nodes["srv-1"];
        assert_eq!(node.properties["ip"], "10.0.0.1");
        assert_eq!(data.edges["srv-1"]["dc-1"].weight, 0.5);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");
        tokio::fs::write(&path, "{not json at all").await.unwrap();

        let graph = JsonGraphStore::open(&path).await.unwrap();
        assert_eq!(graph.get_stats().await.node_count, 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_human_inspectable_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graph.json");

        let graph = JsonGraphStore::open(&path).await.unwrap();
        graph.add_entity(&Entity::new("srv-1", "Server")).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        // Pretty-printed, with the node-link document shape.
        assert!(content.contains('\n'));
        let doc: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(doc["nodes"][0]["id"], "srv-1");
        assert_eq!(doc["nodes"][0]["type"], "Server");
        assert!(doc["links"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_re_adding_relation_overwrites_edge() {
        let dir = TempDir::new().unwrap();
        let graph = open_in(&dir).await;
        graph.add_relation(&Relation::new("a", "b", "OLD")).await.unwrap();
        graph.add_relation(&Relation::new("a", "b", "NEW")).await.unwrap();

        let stats = graph.get_stats().await;
        assert_eq!(stats.edge_count, 1);
        assert_eq!(
            graph.get_neighbors("a").await,
            vec![("NEW".to_string(), "b".to_string())]
        );
    }
}
