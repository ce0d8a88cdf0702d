//! Infrastructure adapters for the Nebulus memory subsystem.
//!
//! Implements the ports defined in `nebulus-core`: a JSON-snapshot
//! knowledge graph, similarity stores (ChromaDB over HTTP and an
//! in-memory stand-in), an OpenAI-compatible chat provider, and the
//! TOML configuration loader.

pub mod config;
pub mod graph;
pub mod llm;
pub mod vector;
