//! Similarity store trait.
//!
//! Defines the named-collection abstraction the episodic layer is built on:
//! add documents with metadata, rank documents by similarity to a query,
//! fetch unconsolidated records, and update metadata in place. There is no
//! delete -- this subsystem never removes records.
//!
//! Uses RPITIT (native async fn in traits, Rust 2024 edition).
//! Implementations live in nebulus-infra (Chroma HTTP, in-memory).

use nebulus_types::error::StoreError;
use nebulus_types::memory::Metadata;

/// One stored record: id, document text, and primitive-valued metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRecord {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
}

/// Trait for similarity-searchable document storage.
///
/// Returned records must be independent copies: mutating a record obtained
/// from `get` or `get_unarchived` must never change what a later call
/// observes. Metadata values are primitive by construction (`MetadataValue`).
pub trait SimilarityStore: Send + Sync {
    /// Add documents. `ids`, `documents`, and `metadatas` are parallel slices.
    fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Return up to `limit` documents ranked by similarity to `text`.
    fn query(
        &self,
        text: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Return up to `limit` records whose metadata has `archived == false`.
    fn get_unarchived(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<SimilarityRecord>, StoreError>> + Send;

    /// Fetch records by id. Unknown ids are omitted, not an error.
    fn get(
        &self,
        ids: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<SimilarityRecord>, StoreError>> + Send;

    /// Replace the metadata of an existing record.
    fn update(
        &self,
        id: &str,
        metadata: Metadata,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
