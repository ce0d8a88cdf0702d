//! In-memory similarity store.
//!
//! Ranks documents by distinct-token overlap with the query instead of
//! embedding distance. Deterministic, so tests can assert on ordering;
//! good enough for single-machine setups that do not run a vector server.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use nebulus_core::memory::similarity::{SimilarityRecord, SimilarityStore};
use nebulus_types::error::StoreError;
use nebulus_types::memory::Metadata;

#[derive(Debug, Clone)]
struct StoredDoc {
    document: String,
    metadata: Metadata,
    /// Insertion order, used as the ranking tie-breaker and scan order.
    seq: u64,
}

/// In-process [`SimilarityStore`] backed by a concurrent map.
///
/// Cheaply cloneable; clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemorySimilarityStore {
    docs: Arc<DashMap<String, StoredDoc>>,
    next_seq: Arc<AtomicU64>,
}

impl InMemorySimilarityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Records sorted by insertion order.
    fn scan(&self) -> Vec<(String, StoredDoc)> {
        let mut entries: Vec<(String, StoredDoc)> = self
            .docs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(_, doc)| doc.seq);
        entries
    }
}

impl SimilarityStore for InMemorySimilarityStore {
    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> Result<(), StoreError> {
        if ids.len() != documents.len() || ids.len() != metadatas.len() {
            return Err(StoreError::InvalidMetadata(
                "ids, documents, and metadatas must have equal lengths".to_string(),
            ));
        }
        for ((id, document), metadata) in ids.iter().zip(documents).zip(metadatas) {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            self.docs.insert(
                id.clone(),
                StoredDoc {
                    document: document.clone(),
                    metadata: metadata.clone(),
                    seq,
                },
            );
        }
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let query_tokens = Self::tokens(text);
        let mut scored: Vec<(usize, u64, String)> = self
            .scan()
            .into_iter()
            .filter_map(|(_, doc)| {
                let overlap = Self::tokens(&doc.document)
                    .intersection(&query_tokens)
                    .count();
                (overlap > 0).then_some((overlap, doc.seq, doc.document))
            })
            .collect();
        // Highest overlap first, oldest first on ties.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, _, document)| document)
            .collect())
    }

    async fn get_unarchived(&self, limit: usize) -> Result<Vec<SimilarityRecord>, StoreError> {
        Ok(self
            .scan()
            .into_iter()
            .filter(|(_, doc)| {
                doc.metadata.get("archived").and_then(|v| v.as_bool()) == Some(false)
            })
            .take(limit)
            .map(|(id, doc)| SimilarityRecord {
                id,
                document: doc.document,
                metadata: doc.metadata,
            })
            .collect())
    }

    async fn get(&self, ids: &[String]) -> Result<Vec<SimilarityRecord>, StoreError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.docs.get(id).map(|doc| SimilarityRecord {
                    id: id.clone(),
                    document: doc.document.clone(),
                    metadata: doc.metadata.clone(),
                })
            })
            .collect())
    }

    async fn update(&self, id: &str, metadata: Metadata) -> Result<(), StoreError> {
        match self.docs.get_mut(id) {
            Some(mut doc) => {
                doc.metadata = metadata;
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebulus_types::memory::MetadataValue;

    fn meta(archived: bool) -> Metadata {
        let mut m = Metadata::new();
        m.insert("archived".to_string(), MetadataValue::Bool(archived));
        m
    }

    async fn seeded() -> InMemorySimilarityStore {
        let store = InMemorySimilarityStore::new();
        store
            .add(
                &["a".to_string(), "b".to_string(), "c".to_string()],
                &[
                    "the prod server is down".to_string(),
                    "alice prefers the dark theme".to_string(),
                    "prod server moved to the new rack".to_string(),
                ],
                &[meta(false), meta(false), meta(true)],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_query_ranks_by_token_overlap() {
        let store = seeded().await;
        let docs = store.query("prod server rack", 10).await.unwrap();
        // "c" shares three tokens, "a" two, "b" none.
        assert_eq!(
            docs,
            vec![
                "prod server moved to the new rack".to_string(),
                "the prod server is down".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_respects_limit() {
        let store = seeded().await;
        let docs = store.query("prod server", 1).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_get_unarchived_filters_and_orders() {
        let store = seeded().await;
        let records = store.get_unarchived(10).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_get_unknown_ids_are_omitted() {
        let store = seeded().await;
        let records = store
            .get(&["ghost".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a");
    }

    #[tokio::test]
    async fn test_update_replaces_metadata() {
        let store = seeded().await;
        store.update("a", meta(true)).await.unwrap();
        let records = store.get_unarchived(10).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "b");
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_an_error() {
        let store = seeded().await;
        assert!(matches!(
            store.update("ghost", meta(true)).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_mismatched_lengths() {
        let store = InMemorySimilarityStore::new();
        let result = store
            .add(&["a".to_string()], &[], &[meta(false)])
            .await;
        assert!(matches!(result, Err(StoreError::InvalidMetadata(_))));
    }

    #[tokio::test]
    async fn test_returned_records_are_copies() {
        let store = seeded().await;
        let mut records = store.get_unarchived(10).await.unwrap();
        records[0]
            .metadata
            .insert("tampered".to_string(), MetadataValue::Bool(true));

        let fresh = store.get_unarchived(10).await.unwrap();
        assert!(!fresh[0].metadata.contains_key("tampered"));
    }
}
