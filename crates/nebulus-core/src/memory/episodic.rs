//! Episodic memory layer.
//!
//! Wraps a [`SimilarityStore`] into the record layer the consolidator works
//! against: raw memory text plus its processing state. The store is
//! best-effort from the caller's point of view -- backend failures are
//! logged and degrade to a no-op or an empty result, never an error.

use nebulus_types::memory::{MemoryItem, Metadata, MetadataValue};

use crate::memory::similarity::SimilarityStore;

/// Similarity-searchable storage of raw memory items.
pub struct EpisodicStore<S: SimilarityStore> {
    store: S,
}

impl<S: SimilarityStore> EpisodicStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a memory item.
    ///
    /// The item's content is stored as the document; `timestamp`,
    /// `archived`, and any caller-supplied metadata fields land in the
    /// record metadata. Backend failures are logged and swallowed.
    pub async fn add_memory(&self, item: &MemoryItem) {
        let mut metadata = Metadata::new();
        metadata.insert("timestamp".to_string(), MetadataValue::Num(item.timestamp));
        metadata.insert("archived".to_string(), MetadataValue::Bool(item.archived));
        metadata.extend(item.metadata.clone());

        if let Err(e) = self
            .store
            .add(
                std::slice::from_ref(&item.id),
                std::slice::from_ref(&item.content),
                std::slice::from_ref(&metadata),
            )
            .await
        {
            tracing::error!(item_id = %item.id, error = %e, "Failed to add memory item");
            return;
        }
        tracing::debug!(item_id = %item.id, "Added memory item to similarity store");
    }

    /// Semantic search over stored memories. Empty on backend failure.
    pub async fn query(&self, text: &str, limit: usize) -> Vec<String> {
        match self.store.query(text, limit).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::error!(error = %e, "Failed to query episodic memories");
                Vec::new()
            }
        }
    }

    /// Retrieve up to `limit` not-yet-consolidated items.
    ///
    /// Each returned item carries an independent copy of its metadata;
    /// mutating it never alters what a subsequent call observes. The
    /// `timestamp` and `archived` fields are lifted out of the metadata,
    /// the rest stays in `MemoryItem::metadata`.
    pub async fn get_unarchived(&self, limit: usize) -> Vec<MemoryItem> {
        let records = match self.store.get_unarchived(limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch unarchived memories");
                return Vec::new();
            }
        };

        records
            .into_iter()
            .map(|record| {
                let mut metadata = record.metadata.clone();
                let timestamp = metadata
                    .remove("timestamp")
                    .and_then(|v| v.as_f64())
                    .unwrap_or_else(nebulus_types::memory::unix_now);
                let archived = metadata
                    .remove("archived")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                MemoryItem {
                    id: record.id,
                    content: record.document,
                    timestamp,
                    metadata,
                    archived,
                }
            })
            .collect()
    }

    /// Mark the given items as consolidated.
    ///
    /// Read-modify-write per id, setting `archived = true` in the stored
    /// metadata. Not atomic across the batch: a failure partway through
    /// leaves the earlier subset archived (at-least-once). Failures are
    /// logged and the remaining ids are still attempted.
    pub async fn mark_archived(&self, ids: &[String]) {
        for id in ids {
            let record = match self.store.get(std::slice::from_ref(id)).await {
                Ok(mut records) => records.pop(),
                Err(e) => {
                    tracing::error!(item_id = %id, error = %e, "Failed to read memory for archival");
                    continue;
                }
            };
            let Some(record) = record else {
                tracing::warn!(item_id = %id, "Memory item missing during archival");
                continue;
            };

            let mut metadata = record.metadata;
            metadata.insert("archived".to_string(), MetadataValue::Bool(true));
            if let Err(e) = self.store.update(id, metadata).await {
                tracing::error!(item_id = %id, error = %e, "Failed to mark memory archived");
            }
        }
    }
}
