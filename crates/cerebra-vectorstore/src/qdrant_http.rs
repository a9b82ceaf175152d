//! Qdrant REST implementation of `VectorStore`.
//!
//! A thin typed client over the HTTP API: collection management, point
//! upsert with bounded exponential-backoff retry, filtered similarity
//! queries (single vector or RRF fusion across prefetches), scroll,
//! count, and alias management.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{StoreError, VectorStore};
use crate::types::{
    AliasInfo, Filter, MatchValue, PointStruct, Prefetch, PrefetchQuery, QuerySpec, RecordPoint,
    ScoredPoint,
};

#[derive(Debug, Clone)]
pub struct QdrantHttpConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Retries for transient upsert failures.
    pub upsert_retries: u32,
}

impl Default for QdrantHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6333".to_string(),
            timeout: Duration::from_secs(30),
            upsert_retries: 3,
        }
    }
}

pub struct QdrantHttpStore {
    cfg: QdrantHttpConfig,
    client: Client,
}

impl QdrantHttpStore {
    pub fn new(cfg: QdrantHttpConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self { cfg, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    /// Unwrap Qdrant's `{status, result}` envelope, mapping HTTP failures
    /// onto the store error taxonomy.
    async fn take_result(resp: reqwest::Response, what: &str) -> Result<Value, StoreError> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(what.to_string()));
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(StoreError::Transient(format!("{what}: HTTP {status}")));
        }
        let body: Value = resp.json().await?;
        if !status.is_success() {
            return Err(StoreError::Unexpected(format!(
                "{what}: HTTP {status}: {}",
                body["status"]["error"].as_str().unwrap_or("unknown")
            )));
        }
        Ok(body["result"].clone())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let resp = self.client.get(self.url(&format!("collections/{name}"))).send().await?;
        Ok(resp.status().is_success())
    }
}

// ── Wire mapping ──────────────────────────────────────────────────────────────

fn filter_json(filter: &Filter) -> Value {
    let must: Vec<Value> = filter
        .must
        .iter()
        .map(|fm| match &fm.value {
            MatchValue::Value(v) => json!({"key": fm.key, "match": {"value": v}}),
            MatchValue::Any(vs) => json!({"key": fm.key, "match": {"any": vs}}),
        })
        .collect();
    json!({ "must": must })
}

fn point_json(point: &PointStruct) -> Result<Value, StoreError> {
    let vector = match &point.vectors {
        Some(v) => json!({
            "dense": v.dense,
            "sparse": {"indices": v.sparse.indices, "values": v.sparse.values},
        }),
        // Registry rows carry no vectors.
        None => json!({}),
    };
    Ok(json!({
        "id": point.id.to_string(),
        "vector": vector,
        "payload": serde_json::to_value(&point.payload)?,
    }))
}

fn prefetch_json(prefetch: &Prefetch) -> Value {
    let (query, using) = match &prefetch.query {
        PrefetchQuery::Dense(v) => (json!(v), "dense"),
        PrefetchQuery::Sparse(s) => (json!({"indices": s.indices, "values": s.values}), "sparse"),
    };
    json!({ "query": query, "using": using, "limit": prefetch.limit })
}

fn parse_scored_point(raw: &Value) -> Result<ScoredPoint, StoreError> {
    let id = raw["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::Unexpected(format!("bad point id: {}", raw["id"])))?;
    Ok(ScoredPoint {
        id,
        score: raw["score"].as_f64().unwrap_or(0.0) as f32,
        payload: serde_json::from_value(raw["payload"].clone())?,
    })
}

#[async_trait]
impl VectorStore for QdrantHttpStore {
    async fn create_collection(&self, name: &str, dense_dim: usize) -> Result<(), StoreError> {
        if self.collection_exists(name).await? {
            debug!(collection = name, "Collection already exists, skipping create");
            return Ok(());
        }
        let body = json!({
            "vectors": { "dense": { "size": dense_dim, "distance": "Cosine" } },
            "sparse_vectors": { "sparse": {} },
        });
        let resp = self
            .client
            .put(self.url(&format!("collections/{name}")))
            .json(&body)
            .send()
            .await?;
        Self::take_result(resp, name).await?;
        debug!(collection = name, dense_dim, "Collection created");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let resp = self
            .client
            .delete(self.url(&format!("collections/{name}")))
            .send()
            .await?;
        Self::take_result(resp, name).await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }
        let rows = points.iter().map(point_json).collect::<Result<Vec<_>, _>>()?;
        let body = json!({ "points": rows });

        let mut backoff = Duration::from_millis(250);
        let mut attempt = 0u32;
        loop {
            let result = async {
                let resp = self
                    .client
                    .put(self.url(&format!("collections/{collection}/points?wait=true")))
                    .json(&body)
                    .send()
                    .await?;
                Self::take_result(resp, collection).await
            }
            .await;

            match result {
                Ok(_) => return Ok(()),
                Err(e) if e.is_transient() && attempt < self.cfg.upsert_retries => {
                    attempt += 1;
                    warn!(
                        collection,
                        attempt,
                        error = %e,
                        "Transient upsert failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn query_points(
        &self,
        collection: &str,
        query: QuerySpec,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        let mut body = match &query {
            QuerySpec::Dense(v) => json!({ "query": v, "using": "dense" }),
            QuerySpec::Sparse(s) => json!({
                "query": {"indices": s.indices, "values": s.values},
                "using": "sparse",
            }),
            QuerySpec::Fusion { prefetches, fusion: crate::types::Fusion::Rrf } => json!({
                "prefetch": prefetches.iter().map(prefetch_json).collect::<Vec<_>>(),
                "query": { "fusion": "rrf" },
            }),
        };
        body["limit"] = json!(limit);
        body["with_payload"] = json!(true);
        if let Some(ref f) = filter {
            body["filter"] = filter_json(f);
        }

        let resp = self
            .client
            .post(self.url(&format!("collections/{collection}/points/query")))
            .json(&body)
            .send()
            .await?;
        let result = Self::take_result(resp, collection).await?;
        result["points"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .map(parse_scored_point)
            .collect()
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<RecordPoint>, StoreError> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
            "with_vector": false,
        });
        if let Some(ref f) = filter {
            body["filter"] = filter_json(f);
        }
        let resp = self
            .client
            .post(self.url(&format!("collections/{collection}/points/scroll")))
            .json(&body)
            .send()
            .await?;
        let result = Self::take_result(resp, collection).await?;
        result["points"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .map(|raw| {
                let id = raw["id"]
                    .as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .ok_or_else(|| {
                        StoreError::Unexpected(format!("bad point id: {}", raw["id"]))
                    })?;
                Ok(RecordPoint { id, payload: serde_json::from_value(raw["payload"].clone())? })
            })
            .collect()
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let resp = self
            .client
            .post(self.url(&format!("collections/{collection}/points/count")))
            .json(&json!({ "exact": true }))
            .send()
            .await?;
        let result = Self::take_result(resp, collection).await?;
        Ok(result["count"].as_u64().unwrap_or(0) as usize)
    }

    async fn create_alias(&self, collection: &str, alias: &str) -> Result<(), StoreError> {
        let body = json!({
            "actions": [{
                "create_alias": { "collection_name": collection, "alias_name": alias }
            }]
        });
        let resp = self
            .client
            .post(self.url("collections/aliases"))
            .json(&body)
            .send()
            .await?;
        Self::take_result(resp, collection).await?;
        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<AliasInfo>, StoreError> {
        let resp = self.client.get(self.url("aliases")).send().await?;
        let result = Self::take_result(resp, "aliases").await?;
        Ok(result["aliases"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|a| {
                Some(AliasInfo {
                    alias_name: a["alias_name"].as_str()?.to_string(),
                    collection_name: a["collection_name"].as_str()?.to_string(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerebra_common::SparseVector;
    use crate::types::{ChunkMetadata, ChunkPayload, NamedVectors, Payload};

    #[test]
    fn filter_json_serialises_value_and_any() {
        let f = Filter::must_match_any("metadata.pdf_id", vec!["a".into(), "b".into()])
            .and("metadata.brain_id", "b1");
        let v = filter_json(&f);
        assert_eq!(v["must"][0]["match"]["any"][1], "b");
        assert_eq!(v["must"][1]["match"]["value"], "b1");
    }

    #[test]
    fn registry_points_serialise_with_empty_vector() {
        let p = PointStruct {
            id: Uuid::new_v4(),
            vectors: None,
            payload: Payload::Registry(crate::types::RegistryEntry {
                file_name: "paper.pdf".into(),
                pdf_id: "p1".into(),
                brain_id: "b1".into(),
            }),
        };
        let v = point_json(&p).unwrap();
        assert_eq!(v["vector"], json!({}));
        assert_eq!(v["payload"]["file_name"], "paper.pdf");
    }

    #[test]
    fn content_points_carry_both_named_vectors() {
        let p = PointStruct {
            id: Uuid::new_v4(),
            vectors: Some(NamedVectors {
                dense: vec![0.1, 0.2],
                sparse: SparseVector { indices: vec![3, 7], values: vec![0.5, 0.4] },
            }),
            payload: Payload::Chunk(ChunkPayload {
                content: "text".into(),
                metadata: ChunkMetadata {
                    pdf_id: "p1".into(),
                    file_name: "f.pdf".into(),
                    brain_id: "b1".into(),
                    page_no: None,
                },
            }),
        };
        let v = point_json(&p).unwrap();
        assert_eq!(v["vector"]["dense"][1], 0.2);
        assert_eq!(v["vector"]["sparse"]["indices"][0], 3);
    }

    #[test]
    fn scored_point_parsing_rejects_bad_ids() {
        let raw = json!({"id": 42, "score": 0.5, "payload": {}});
        assert!(parse_scored_point(&raw).is_err());
    }
}
