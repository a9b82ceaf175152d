//! End-to-end ingestion pipeline.
//!
//! For each uploaded file:
//!   1. Registry dedup check: a name already in the brain is skipped
//!   2. Assign a fresh pdf_id
//!   3. Chunk the PDF
//!   4. Embed each chunk dense + sparse, independently per chunk
//!   5. Upsert the complete points into the brain's collection
//!   6. Register the file
//!
//! A chunk missing either embedding is dropped (never a partial point);
//! a file whose chunks all fail is reported as unsupported and not
//! registered. Errors abort the file, never the batch.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cerebra_common::Result;
use cerebra_providers::EmbeddingProvider;
use cerebra_vectorstore::{
    ChunkMetadata, ChunkPayload, NamedVectors, Payload, PointStruct, VectorStore,
};

use crate::catalog::BrainCatalog;
use crate::chunker::{ChunkError, Chunker, PdfChunk};

/// One uploaded file: name plus raw PDF bytes.
#[derive(Debug, Clone)]
pub struct IngestFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Batch outcome. `invalid_count` is the number of chunks dropped because
/// an embedding failed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestReport {
    pub success: bool,
    pub message: String,
    pub files_ingested: usize,
    pub files_duplicate: usize,
    pub files_unsupported: usize,
    pub chunks_indexed: usize,
    pub invalid_count: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

pub struct IngestionPipeline {
    catalog: Arc<BrainCatalog>,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
}

impl IngestionPipeline {
    pub fn new(
        catalog: Arc<BrainCatalog>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Arc<dyn Chunker>,
    ) -> Self {
        Self { catalog, store, embedder, chunker }
    }

    /// Ingest a batch of files into one brain. Idempotent per
    /// `(brain_id, file_name)`: re-uploads are counted as duplicates and
    /// produce no new points.
    #[instrument(skip(self, files), fields(n_files = files.len()))]
    pub async fn ingest(&self, brain_id: &str, files: Vec<IngestFile>) -> Result<IngestReport> {
        let t0 = std::time::Instant::now();
        let mut report = IngestReport {
            success: false,
            message: String::new(),
            files_ingested: 0,
            files_duplicate: 0,
            files_unsupported: 0,
            chunks_indexed: 0,
            invalid_count: 0,
            errors: Vec::new(),
            duration_ms: 0,
        };

        for file in &files {
            if self.catalog.check_file(brain_id, &file.file_name).await? {
                info!(file_name = %file.file_name, "File already in brain, skipping");
                report.files_duplicate += 1;
                continue;
            }

            match self.ingest_one(brain_id, file).await {
                Ok((chunks, invalid)) => {
                    report.files_ingested += 1;
                    report.chunks_indexed += chunks;
                    report.invalid_count += invalid;
                }
                Err(FileError::Unsupported(reason)) => {
                    warn!(file_name = %file.file_name, reason = %reason, "File content unsupported");
                    report.files_unsupported += 1;
                }
                Err(FileError::Failed(e)) => {
                    warn!(file_name = %file.file_name, error = %e, "File ingestion failed");
                    report.errors.push(format!("{}: {e}", file.file_name));
                }
            }
        }

        report.success =
            report.files_ingested > 0 || (!files.is_empty() && report.files_duplicate == files.len());
        report.message = if report.files_ingested > 0 {
            "Files processed successfully.".to_string()
        } else if report.files_duplicate == files.len() && !files.is_empty() {
            "All files already present.".to_string()
        } else if report.files_unsupported > 0 {
            "PDF content not supported for processing.".to_string()
        } else {
            "No chunks to index.".to_string()
        };

        report.duration_ms = t0.elapsed().as_millis() as u64;
        info!(
            brain_id,
            ingested = report.files_ingested,
            duplicates = report.files_duplicate,
            unsupported = report.files_unsupported,
            chunks = report.chunks_indexed,
            invalid = report.invalid_count,
            duration_ms = report.duration_ms,
            "Ingestion batch complete"
        );
        Ok(report)
    }

    /// Returns `(chunks_indexed, invalid_count)` for one file. The
    /// registry entry is written only after the upsert batch succeeds.
    async fn ingest_one(&self, brain_id: &str, file: &IngestFile) -> FileResult<(usize, usize)> {
        let pdf_id = Uuid::new_v4().to_string();

        let chunks = match self.chunker.chunk(&file.bytes) {
            Ok(chunks) => chunks,
            Err(ChunkError::Empty) => {
                return Err(FileError::Unsupported("no extractable text".to_string()))
            }
            Err(e) => return Err(FileError::Unsupported(e.to_string())),
        };
        info!(file_name = %file.file_name, n_chunks = chunks.len(), "File chunked");

        let (points, invalid) = self.embed_chunks(brain_id, &pdf_id, file, chunks).await;
        if points.is_empty() {
            return Err(FileError::Unsupported(format!("all {invalid} chunks failed embedding")));
        }

        let n_points = points.len();
        self.store
            .upsert(brain_id, points)
            .await
            .map_err(|e| FileError::Failed(e.into()))?;

        self.catalog
            .register_file(brain_id, &file.file_name, &pdf_id)
            .await
            .map_err(FileError::Failed)?;

        Ok((n_points, invalid))
    }

    /// Embed every chunk dense and sparse. Failures are isolated per
    /// chunk: a chunk missing either vector is dropped and counted, so no
    /// partial point ever reaches the store.
    async fn embed_chunks(
        &self,
        brain_id: &str,
        pdf_id: &str,
        file: &IngestFile,
        chunks: Vec<PdfChunk>,
    ) -> (Vec<PointStruct>, usize) {
        let mut points = Vec::with_capacity(chunks.len());
        let mut invalid = 0usize;

        for (i, chunk) in chunks.into_iter().enumerate() {
            let dense = match self.embedder.embed_dense(&chunk.content).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(chunk = i, error = %e, "Dense embedding failed, dropping chunk");
                    invalid += 1;
                    continue;
                }
            };
            let sparse = match self.embedder.embed_sparse(&chunk.content).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(chunk = i, error = %e, "Sparse embedding failed, dropping chunk");
                    invalid += 1;
                    continue;
                }
            };

            points.push(PointStruct {
                id: Uuid::new_v4(),
                vectors: Some(NamedVectors { dense, sparse }),
                payload: Payload::Chunk(ChunkPayload {
                    content: chunk.content,
                    metadata: ChunkMetadata {
                        pdf_id: pdf_id.to_string(),
                        file_name: file.file_name.clone(),
                        brain_id: brain_id.to_string(),
                        page_no: chunk.page_no,
                    },
                }),
            });
        }
        (points, invalid)
    }
}

enum FileError {
    /// Zero usable chunks; the file is skipped and not registered.
    Unsupported(String),
    /// Store or registry failure; the file is skipped, the batch continues.
    Failed(cerebra_common::CerebraError),
}

type FileResult<T> = std::result::Result<T, FileError>;
