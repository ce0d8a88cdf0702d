//! Core logic for the Nebulus long-term memory subsystem.
//!
//! Defines the capability traits (ports) that `nebulus-infra` implements --
//! the similarity store, the knowledge graph, and the LLM chat provider --
//! plus the consolidation pipeline that turns raw episodic records into
//! graph knowledge. This crate never depends on concrete infrastructure.

pub mod llm;
pub mod memory;
