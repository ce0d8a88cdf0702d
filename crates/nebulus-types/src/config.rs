//! Configuration for the memory subsystem.
//!
//! Loaded from `{data_dir}/memory.toml` by `nebulus-infra::config`; every
//! field has a serde default so a missing or partial file still yields a
//! usable configuration.

use serde::{Deserialize, Serialize};

use crate::memory::ArchivePolicy;

/// Configuration for the episodic store and consolidator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Similarity store collection holding episodic memories.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Model identifier passed to the extraction provider. Local
    /// OpenAI-compatible servers treat "default" as their loaded model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum unarchived items fetched per consolidation cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Whether items whose extraction call failed are archived anyway.
    #[serde(default)]
    pub archive_policy: ArchivePolicy,
}

fn default_collection() -> String {
    "ltm_episodic_memory".to_string()
}

fn default_model() -> String {
    "default".to_string()
}

fn default_batch_size() -> usize {
    20
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            model: default_model(),
            batch_size: default_batch_size(),
            archive_policy: ArchivePolicy::default(),
        }
    }
}
