//! In-memory `VectorStore` with the same observable semantics as the
//! remote store: named-vector scoring, conjunctive filters, deterministic
//! RRF fusion (k = 60, ties broken by the dense list's order), scroll,
//! count, and aliases.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use cerebra_common::SparseVector;
use cerebra_vectorstore::{
    AliasInfo, Filter, Fusion, PointStruct, Prefetch, PrefetchQuery, QuerySpec, RecordPoint,
    ScoredPoint, StoreError, VectorStore,
};

const RRF_K: f32 = 60.0;

#[derive(Default)]
struct Collection {
    dense_dim: usize,
    points: Vec<PointStruct>,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, Collection>,
    aliases: Vec<AliasInfo>,
}

#[derive(Default)]
pub struct InMemoryVectorStore {
    state: Mutex<State>,
    /// When set, plain sparse queries fail transiently. Lets tests stub a
    /// single failing retrieval branch without touching the others.
    fail_sparse_queries: AtomicBool,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_sparse_queries(&self, fail: bool) {
        self.fail_sparse_queries.store(fail, Ordering::SeqCst);
    }

    /// All points of a collection, for coherence assertions in tests.
    pub fn dump(&self, collection: &str) -> Vec<PointStruct> {
        let state = self.state.lock().unwrap();
        state.collections.get(collection).map(|c| c.points.clone()).unwrap_or_default()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut score = 0.0;
    let mut i = 0;
    let mut j = 0;
    while i < a.indices.len() && j < b.indices.len() {
        match a.indices[i].cmp(&b.indices[j]) {
            std::cmp::Ordering::Equal => {
                score += a.values[i] * b.values[j];
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    score
}

/// Rank a collection's points against one named vector. Zero-score docs
/// are dropped, like the remote store's sparse search.
fn rank(
    points: &[PointStruct],
    query: &PrefetchQuery,
    filter: Option<&Filter>,
    limit: usize,
) -> Vec<ScoredPoint> {
    let mut scored: Vec<ScoredPoint> = points
        .iter()
        .filter(|p| filter.map_or(true, |f| f.matches(&p.payload)))
        .filter_map(|p| {
            let vectors = p.vectors.as_ref()?;
            let score = match query {
                PrefetchQuery::Dense(q) => cosine(q, &vectors.dense),
                PrefetchQuery::Sparse(q) => sparse_dot(q, &vectors.sparse),
            };
            (score > 0.0).then(|| ScoredPoint { id: p.id, score, payload: p.payload.clone() })
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal).then(a.id.cmp(&b.id))
    });
    scored.truncate(limit);
    scored
}

/// Reciprocal rank fusion over the prefetched lists: each document scores
/// Σ 1/(k + rank_i) with 1-based ranks, ties broken by the dense list's
/// order (then id, so the result is a total order).
fn fuse_rrf(lists: &[(bool, Vec<ScoredPoint>)], limit: usize) -> Vec<ScoredPoint> {
    let mut fused: HashMap<uuid::Uuid, (f32, usize, ScoredPoint)> = HashMap::new();
    for (is_dense, list) in lists {
        for (rank0, point) in list.iter().enumerate() {
            let contribution = 1.0 / (RRF_K + (rank0 + 1) as f32);
            let entry = fused
                .entry(point.id)
                .or_insert_with(|| (0.0, usize::MAX, point.clone()));
            entry.0 += contribution;
            if *is_dense {
                entry.1 = rank0;
            }
        }
    }
    let mut out: Vec<(f32, usize, ScoredPoint)> = fused.into_values().collect();
    out.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
            .then(a.2.id.cmp(&b.2.id))
    });
    out.into_iter()
        .take(limit)
        .map(|(score, _, mut p)| {
            p.score = score;
            p
        })
        .collect()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dense_dim: usize) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Collection { dense_dim, points: Vec::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.collections.remove(name);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<PointStruct>) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let coll = state
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        for point in points {
            match coll.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => coll.points.push(point),
            }
        }
        Ok(())
    }

    async fn query_points(
        &self,
        collection: &str,
        query: QuerySpec,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, StoreError> {
        if matches!(query, QuerySpec::Sparse(_)) && self.fail_sparse_queries.load(Ordering::SeqCst)
        {
            return Err(StoreError::Transient("sparse query stubbed to fail".to_string()));
        }
        let state = self.state.lock().unwrap();
        let coll = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;

        Ok(match query {
            QuerySpec::Dense(q) => {
                rank(&coll.points, &PrefetchQuery::Dense(q), filter.as_ref(), limit)
            }
            QuerySpec::Sparse(q) => {
                rank(&coll.points, &PrefetchQuery::Sparse(q), filter.as_ref(), limit)
            }
            QuerySpec::Fusion { prefetches, fusion: Fusion::Rrf } => {
                let lists: Vec<(bool, Vec<ScoredPoint>)> = prefetches
                    .iter()
                    .map(|Prefetch { query, limit }| {
                        (
                            matches!(query, PrefetchQuery::Dense(_)),
                            rank(&coll.points, query, filter.as_ref(), *limit),
                        )
                    })
                    .collect();
                fuse_rrf(&lists, limit)
            }
        })
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<RecordPoint>, StoreError> {
        let state = self.state.lock().unwrap();
        let coll = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(coll
            .points
            .iter()
            .filter(|p| filter.as_ref().map_or(true, |f| f.matches(&p.payload)))
            .take(limit)
            .map(|p| RecordPoint { id: p.id, payload: p.payload.clone() })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let state = self.state.lock().unwrap();
        let coll = state
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(coll.points.len())
    }

    async fn create_alias(&self, collection: &str, alias: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if !state.collections.contains_key(collection) {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        state.aliases.push(AliasInfo {
            alias_name: alias.to_string(),
            collection_name: collection.to_string(),
        });
        Ok(())
    }

    async fn list_aliases(&self) -> Result<Vec<AliasInfo>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.aliases.clone())
    }
}
