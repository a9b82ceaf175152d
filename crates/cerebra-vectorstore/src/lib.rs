//! cerebra-vectorstore — Typed client contract over the remote vector DB.
//!
//! The store is a remote service; this crate owns the point/query/filter
//! model, the `VectorStore` capability trait every consumer programs
//! against, and the Qdrant REST implementation.

pub mod qdrant_http;
pub mod store;
pub mod types;

pub use qdrant_http::QdrantHttpStore;
pub use store::{StoreError, VectorStore};
pub use types::{
    AliasInfo, ChunkMetadata, ChunkPayload, FieldMatch, Filter, Fusion, MatchValue, NamedVectors,
    Payload, PointStruct, Prefetch, PrefetchQuery, QuerySpec, RecordPoint, RegistryEntry,
    ScoredPoint, VectorName,
};
