//! Similarity store implementations.
//!
//! `chroma` talks to a ChromaDB server over HTTP; `memory` is an
//! in-process stand-in with deterministic ranking for tests and
//! single-machine setups without a vector server.

pub mod chroma;
pub mod memory;
