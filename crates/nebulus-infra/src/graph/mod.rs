//! JSON-snapshot knowledge graph store.

mod snapshot;

pub use snapshot::JsonGraphStore;
