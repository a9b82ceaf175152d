//! cerebra-ingestion — PDF chunking, the brain/file catalog, and the
//! end-to-end ingestion pipeline.

pub mod catalog;
pub mod chunker;
pub mod pipeline;

pub use catalog::BrainCatalog;
pub use chunker::{ChunkError, Chunker, ChunkerConfig, LopdfChunker, PdfChunk};
pub use pipeline::{IngestFile, IngestReport, IngestionPipeline};
