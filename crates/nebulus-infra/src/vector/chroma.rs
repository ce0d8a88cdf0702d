//! ChromaDB-backed similarity store (HTTP mode).
//!
//! Talks to a ChromaDB server's REST API. Collection resolution happens
//! once at connect time (`get_or_create`); every operation then targets
//! the collection by id. Metadata stays primitive-typed on the wire
//! because [`nebulus_types::memory::MetadataValue`] cannot express
//! nesting.

use serde::{Deserialize, Serialize};

use nebulus_core::memory::similarity::{SimilarityRecord, SimilarityStore};
use nebulus_types::error::StoreError;
use nebulus_types::memory::Metadata;

/// ChromaDB HTTP adapter for the [`SimilarityStore`] port.
pub struct ChromaSimilarityStore {
    http: reqwest::Client,
    base_url: String,
    collection_id: String,
}

#[derive(Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    ids: &'a [String],
    documents: &'a [String],
    metadatas: &'a [Metadata],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_texts: [&'a str; 1],
    n_results: usize,
}

/// Query results come back one list per query text.
#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    documents: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct GetRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ids: Option<&'a [String]>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct GetResponse {
    ids: Vec<String>,
    #[serde(default)]
    documents: Vec<Option<String>>,
    #[serde(default)]
    metadatas: Vec<Option<Metadata>>,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    ids: [&'a str; 1],
    metadatas: [&'a Metadata; 1],
}

fn backend_err(e: reqwest::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Zip a get response into records, tolerating sparse columns.
fn records_from_get(resp: GetResponse) -> Vec<SimilarityRecord> {
    resp.ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| SimilarityRecord {
            id,
            document: resp
                .documents
                .get(i)
                .and_then(|d| d.clone())
                .unwrap_or_default(),
            metadata: resp
                .metadatas
                .get(i)
                .and_then(|m| m.clone())
                .unwrap_or_default(),
        })
        .collect()
}

impl ChromaSimilarityStore {
    /// Connect to a ChromaDB server and resolve (or create) the collection.
    pub async fn connect(base_url: &str, collection: &str) -> Result<Self, StoreError> {
        let http = reqwest::Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();

        let resp: CollectionResponse = http
            .post(format!("{base_url}/api/v1/collections"))
            .json(&CreateCollectionRequest {
                name: collection,
                get_or_create: true,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)?;

        tracing::debug!(collection, id = %resp.id, "Resolved Chroma collection");

        Ok(Self {
            http,
            base_url,
            collection_id: resp.id,
        })
    }

    fn collection_url(&self, op: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{op}",
            self.base_url, self.collection_id
        )
    }

    /// True when the server answers its heartbeat endpoint.
    pub async fn heartbeat(&self) -> bool {
        match self
            .http
            .get(format!("{}/api/v1/heartbeat", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn get_with(&self, request: &GetRequest<'_>) -> Result<Vec<SimilarityRecord>, StoreError> {
        let resp: GetResponse = self
            .http
            .post(self.collection_url("get"))
            .json(request)
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)?;
        Ok(records_from_get(resp))
    }
}

impl SimilarityStore for ChromaSimilarityStore {
    async fn add(
        &self,
        ids: &[String],
        documents: &[String],
        metadatas: &[Metadata],
    ) -> Result<(), StoreError> {
        self.http
            .post(self.collection_url("add"))
            .json(&AddRequest {
                ids,
                documents,
                metadatas,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?;
        Ok(())
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let resp: QueryResponse = self
            .http
            .post(self.collection_url("query"))
            .json(&QueryRequest {
                query_texts: [text],
                n_results: limit,
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?
            .json()
            .await
            .map_err(backend_err)?;

        Ok(resp.documents.into_iter().flatten().collect())
    }

    async fn get_unarchived(&self, limit: usize) -> Result<Vec<SimilarityRecord>, StoreError> {
        self.get_with(&GetRequest {
            ids: None,
            filter: Some(serde_json::json!({"archived": false})),
            limit: Some(limit),
        })
        .await
    }

    async fn get(&self, ids: &[String]) -> Result<Vec<SimilarityRecord>, StoreError> {
        self.get_with(&GetRequest {
            ids: Some(ids),
            filter: None,
            limit: None,
        })
        .await
    }

    async fn update(&self, id: &str, metadata: Metadata) -> Result<(), StoreError> {
        self.http
            .post(self.collection_url("update"))
            .json(&UpdateRequest {
                ids: [id],
                metadatas: [&metadata],
            })
            .send()
            .await
            .map_err(backend_err)?
            .error_for_status()
            .map_err(backend_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebulus_types::memory::MetadataValue;

    #[test]
    fn test_get_response_zips_into_records() {
        let json = r#"{
            "ids": ["m1", "m2"],
            "documents": ["first", null],
            "metadatas": [{"archived": false, "timestamp": 1.5}, null]
        }"#;
        let resp: GetResponse = serde_json::from_str(json).unwrap();
        let records = records_from_get(resp);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "m1");
        assert_eq!(records[0].document, "first");
        assert_eq!(records[0].metadata["archived"].as_bool(), Some(false));
        assert_eq!(records[1].document, "");
        assert!(records[1].metadata.is_empty());
    }

    #[test]
    fn test_query_response_flattens_per_query_lists() {
        let json = r#"{"documents": [["doc1", "doc2"]]}"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        let docs: Vec<String> = resp.documents.into_iter().flatten().collect();
        assert_eq!(docs, vec!["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_add_request_serializes_primitive_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("archived".to_string(), MetadataValue::Bool(false));
        metadata.insert("timestamp".to_string(), MetadataValue::Num(2.0));
        let ids = vec!["m1".to_string()];
        let documents = vec!["content".to_string()];
        let metadatas = vec![metadata];

        let payload = serde_json::to_value(AddRequest {
            ids: &ids,
            documents: &documents,
            metadatas: &metadatas,
        })
        .unwrap();

        assert_eq!(payload["metadatas"][0]["archived"], false);
        assert_eq!(payload["metadatas"][0]["timestamp"], 2.0);
    }

    #[test]
    fn test_get_request_omits_absent_fields() {
        let payload = serde_json::to_value(GetRequest {
            ids: None,
            filter: Some(serde_json::json!({"archived": false})),
            limit: Some(20),
        })
        .unwrap();

        assert!(payload.get("ids").is_none());
        assert_eq!(payload["where"]["archived"], false);
        assert_eq!(payload["limit"], 20);
    }
}
