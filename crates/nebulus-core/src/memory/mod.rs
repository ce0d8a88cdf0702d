//! Memory consolidation pipeline for Nebulus.
//!
//! `episodic` wraps a [`similarity::SimilarityStore`] into the episodic
//! record layer, `extractor` parses untrusted LLM output into fact sets,
//! `graph` defines the knowledge graph port, and `consolidator` runs the
//! extract-merge-archive cycle across all of them.

pub mod consolidator;
pub mod episodic;
pub mod extractor;
pub mod graph;
pub mod similarity;
