//! The point, payload, filter, and query model shared by every store
//! implementation. Dict-shaped wire data is modelled as tagged sum types.

use cerebra_common::SparseVector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Points ────────────────────────────────────────────────────────────────────

/// The two named vectors every content point carries. A point missing
/// either vector is never written (the pipeline drops the chunk instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedVectors {
    pub dense: Vec<f32>,
    pub sparse: SparseVector,
}

/// Metadata attached to every chunk before upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub pdf_id: String,
    pub file_name: String,
    pub brain_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_no: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// One row of the registry collection: maps a file to its brain.
/// Registry points carry no vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub file_name: String,
    pub pdf_id: String,
    pub brain_id: String,
}

/// Payload of a stored point. Content collections hold chunks; the
/// registry collection holds file entries. The two shapes are disjoint,
/// so untagged (de)serialization is unambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Chunk(ChunkPayload),
    Registry(RegistryEntry),
}

impl Payload {
    /// Dotted-path field lookup used by filter evaluation
    /// (e.g. `metadata.pdf_id`, `brain_id`, `file_name`).
    pub fn field(&self, key: &str) -> Option<&str> {
        match (self, key) {
            (Payload::Chunk(c), "metadata.pdf_id") => Some(&c.metadata.pdf_id),
            (Payload::Chunk(c), "metadata.file_name") => Some(&c.metadata.file_name),
            (Payload::Chunk(c), "metadata.brain_id") => Some(&c.metadata.brain_id),
            (Payload::Registry(r), "pdf_id") => Some(&r.pdf_id),
            (Payload::Registry(r), "file_name") => Some(&r.file_name),
            (Payload::Registry(r), "brain_id") => Some(&r.brain_id),
            _ => None,
        }
    }

    pub fn as_chunk(&self) -> Option<&ChunkPayload> {
        match self {
            Payload::Chunk(c) => Some(c),
            Payload::Registry(_) => None,
        }
    }

    pub fn as_registry(&self) -> Option<&RegistryEntry> {
        match self {
            Payload::Registry(r) => Some(r),
            Payload::Chunk(_) => None,
        }
    }
}

/// A point to upsert. Registry rows have `vectors: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStruct {
    pub id: Uuid,
    pub vectors: Option<NamedVectors>,
    pub payload: Payload,
}

/// A point returned from a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub id: Uuid,
    pub score: f32,
    pub payload: Payload,
}

/// A point returned from a scroll (payload only, no vectors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPoint {
    pub id: Uuid,
    pub payload: Payload,
}

// ── Filters ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchValue {
    /// Exact match on one value.
    Value(String),
    /// Match any of the listed values (`pdf_id ∈ S` scoping).
    Any(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub key: String,
    pub value: MatchValue,
}

impl FieldMatch {
    pub fn matches(&self, payload: &Payload) -> bool {
        let Some(actual) = payload.field(&self.key) else {
            return false;
        };
        match &self.value {
            MatchValue::Value(v) => actual == v,
            MatchValue::Any(vs) => vs.iter().any(|v| actual == v),
        }
    }
}

/// A conjunction of field conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub must: Vec<FieldMatch>,
}

impl Filter {
    pub fn must_match(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            must: vec![FieldMatch { key: key.into(), value: MatchValue::Value(value.into()) }],
        }
    }

    pub fn must_match_any(key: impl Into<String>, values: Vec<String>) -> Self {
        Self { must: vec![FieldMatch { key: key.into(), value: MatchValue::Any(values) }] }
    }

    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.must.push(FieldMatch { key: key.into(), value: MatchValue::Value(value.into()) });
        self
    }

    pub fn matches(&self, payload: &Payload) -> bool {
        self.must.iter().all(|m| m.matches(payload))
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorName {
    Dense,
    Sparse,
}

impl VectorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorName::Dense => "dense",
            VectorName::Sparse => "sparse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrefetchQuery {
    Dense(Vec<f32>),
    Sparse(SparseVector),
}

impl PrefetchQuery {
    pub fn vector_name(&self) -> VectorName {
        match self {
            PrefetchQuery::Dense(_) => VectorName::Dense,
            PrefetchQuery::Sparse(_) => VectorName::Sparse,
        }
    }
}

/// One ranked list feeding a fusion query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefetch {
    pub query: PrefetchQuery,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fusion {
    Rrf,
}

/// What to search with: a single named vector, or server-side fusion of
/// several prefetched rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuerySpec {
    Dense(Vec<f32>),
    Sparse(SparseVector),
    Fusion { prefetches: Vec<Prefetch>, fusion: Fusion },
}

// ── Aliases ───────────────────────────────────────────────────────────────────

/// Maps a human brain name to the physical collection id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasInfo {
    pub alias_name: String,
    pub collection_name: String,
}
