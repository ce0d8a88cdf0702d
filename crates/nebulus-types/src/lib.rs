//! Shared domain types for the Nebulus long-term memory subsystem.
//!
//! Everything here is a plain value type: graph nodes and edges, episodic
//! records, configuration, and the error enums used across crate boundaries.
//! Behavior lives in `nebulus-core`; adapters live in `nebulus-infra`.

pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
