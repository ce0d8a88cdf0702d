//! Memory types for Nebulus.
//!
//! These types model the two halves of long-term memory: raw episodic
//! records awaiting consolidation (`MemoryItem`) and the structured
//! knowledge they consolidate into (`Entity`, `Relation`).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A node in the knowledge graph.
///
/// Entities are keyed by `id`; adding an entity with an existing id
/// overwrites its type and properties (upsert, not append).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (e.g., "prod-1", "Alice").
    pub id: String,
    /// Free-form category (e.g., "Server", "Person").
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Additional string-valued metadata.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    /// Create an entity with no properties.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            properties: BTreeMap::new(),
        }
    }
}

/// A directed, weighted edge between two entities.
///
/// Adding a relation whose source or target id is unknown auto-creates
/// that node with type "Unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    /// Edge label (e.g., "HAS_IP", "OWNED_BY").
    pub relation: String,
    /// Confidence or importance weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Relation {
    /// Create a relation with the default weight of 1.0.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            weight: default_weight(),
        }
    }
}

/// A primitive metadata value as accepted by the similarity store.
///
/// Similarity backends reject nested structures, so the restriction is
/// encoded in the type: only strings, numbers, and booleans exist.
/// Complex values must be flattened by the producer before storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Num(n)
    }
}

impl From<bool> for MetadataValue {
    fn from(b: bool) -> Self {
        MetadataValue::Bool(b)
    }
}

/// Metadata map stored alongside a document in the similarity store.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A raw episodic record with processing state.
///
/// Items are produced outside this subsystem (e.g., conversation logging)
/// and transition to `archived = true` exactly once, when the consolidator
/// has folded them into the knowledge graph. The transition is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    #[serde(default = "new_item_id")]
    pub id: String,
    /// The raw text content.
    pub content: String,
    /// Seconds since the Unix epoch.
    #[serde(default = "unix_now")]
    pub timestamp: f64,
    #[serde(default)]
    pub metadata: Metadata,
    /// Whether this item has been consolidated.
    #[serde(default)]
    pub archived: bool,
}

fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl MemoryItem {
    /// Create an unarchived item with a fresh id and the current timestamp.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: new_item_id(),
            content: content.into(),
            timestamp: unix_now(),
            metadata: Metadata::new(),
            archived: false,
        }
    }
}

/// A read-only snapshot of graph size and shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Distinct node types, sorted.
    pub entity_types: Vec<String>,
}

/// What to do with an item whose extraction call failed outright.
///
/// `Always` archives the item even though no facts were extracted,
/// discarding the retry opportunity. `SkipFailed`
/// leaves it unarchived so a later cycle picks it up again. Malformed (but
/// received) responses are archived under both policies, since retrying
/// would re-send the identical prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchivePolicy {
    #[default]
    Always,
    SkipFailed,
}

/// Outcome of one consolidation cycle.
///
/// `Display` renders the operator-facing summary; the individual counters
/// let callers and tests distinguish "N items with nothing extractable"
/// from "extraction broke for all N", which the summary alone cannot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    /// Items fetched, processed, and queued for archival.
    pub processed: usize,
    pub entities_added: usize,
    pub relations_added: usize,
    /// Responses that contained no parseable JSON object.
    pub malformed_responses: usize,
    /// Items whose extraction call failed at the transport level.
    pub failed_items: usize,
}

impl fmt::Display for ConsolidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.processed == 0 && self.failed_items == 0 {
            write!(f, "No new memories to consolidate.")
        } else {
            write!(
                f,
                "Processed {} memories, extracted {} entities and {} relations.",
                self.processed, self.entities_added, self.relations_added
            )
        }
    }
}
