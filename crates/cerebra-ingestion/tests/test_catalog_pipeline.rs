//! Catalog and pipeline behaviour against the in-memory store:
//! brain lifecycle, dedup, idempotent ingestion, registry coherence,
//! and per-chunk embedding fallibility.

use std::sync::Arc;

use cerebra_common::CerebraError;
use cerebra_ingestion::{BrainCatalog, IngestFile, IngestionPipeline};
use cerebra_test_utils::{FakeEmbeddings, InMemoryVectorStore, StaticChunker};
use cerebra_vectorstore::store::VectorStore;
use cerebra_vectorstore::Payload;

const DIM: usize = 48;

struct Harness {
    store: Arc<InMemoryVectorStore>,
    catalog: Arc<BrainCatalog>,
    pipeline: IngestionPipeline,
}

fn harness_with_embedder(embedder: FakeEmbeddings) -> Harness {
    let store = Arc::new(InMemoryVectorStore::new());
    let catalog = Arc::new(BrainCatalog::new(store.clone(), "data_registry".to_string(), DIM));
    let pipeline = IngestionPipeline::new(
        catalog.clone(),
        store.clone(),
        Arc::new(embedder),
        Arc::new(StaticChunker::new()),
    );
    Harness { store, catalog, pipeline }
}

fn harness() -> Harness {
    harness_with_embedder(FakeEmbeddings::new())
}

fn paper() -> IngestFile {
    IngestFile {
        file_name: "paper.pdf".to_string(),
        bytes: b"The capital of Atlantis is Orichalcum.\n\nAtlantis trades in orichalcum ore."
            .to_vec(),
    }
}

#[tokio::test]
async fn create_brain_rejects_taken_alias() {
    let h = harness();
    h.catalog.ensure_registry().await.unwrap();

    let brain_id = h.catalog.create_brain("alpha").await.unwrap();
    assert!(uuid::Uuid::parse_str(&brain_id).is_ok());

    let err = h.catalog.create_brain("alpha").await.unwrap_err();
    assert!(matches!(err, CerebraError::AlreadyExists(_)));

    let brains = h.catalog.list_brains().await.unwrap();
    assert_eq!(brains.len(), 1);
    assert_eq!(brains[0].brain_name, "alpha");
    assert_eq!(brains[0].brain_id, brain_id);
}

#[tokio::test]
async fn ingestion_is_idempotent_per_file_name() {
    let h = harness();
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();

    let first = h.pipeline.ingest(&brain_id, vec![paper()]).await.unwrap();
    assert!(first.success);
    assert_eq!(first.files_ingested, 1);
    assert_eq!(first.invalid_count, 0);

    let points_after_first = h.store.count(&brain_id).await.unwrap();
    let registry_after_first = h.store.count("data_registry").await.unwrap();
    assert!(points_after_first > 0);
    assert_eq!(registry_after_first, 1);

    let second = h.pipeline.ingest(&brain_id, vec![paper()]).await.unwrap();
    assert!(second.success);
    assert_eq!(second.files_ingested, 0);
    assert_eq!(second.files_duplicate, 1);

    // Same point and registry counts: the re-upload was a no-op.
    assert_eq!(h.store.count(&brain_id).await.unwrap(), points_after_first);
    assert_eq!(h.store.count("data_registry").await.unwrap(), registry_after_first);
}

#[tokio::test]
async fn registry_and_content_stay_coherent() {
    let h = harness();
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();
    h.pipeline
        .ingest(
            &brain_id,
            vec![
                paper(),
                IngestFile {
                    file_name: "laws.pdf".to_string(),
                    bytes: b"Atlantean law forbids bronze exports.".to_vec(),
                },
            ],
        )
        .await
        .unwrap();

    let files = h.catalog.list_files(&brain_id).await.unwrap();
    assert_eq!(files.len(), 2);

    let points = h.store.dump(&brain_id);
    for file in &files {
        // Every registry entry has at least one content point…
        assert!(points
            .iter()
            .any(|p| p.payload.field("metadata.pdf_id") == Some(file.file_id.as_str())));
    }
    for point in &points {
        // …and every content point maps back to a registry entry.
        let pdf_id = point.payload.field("metadata.pdf_id").unwrap();
        assert!(files.iter().any(|f| f.file_id == pdf_id));
        // No partial points.
        let vectors = point.vectors.as_ref().unwrap();
        assert!(!vectors.dense.is_empty());
        assert!(vectors.sparse.is_well_formed());
    }
}

#[tokio::test]
async fn failed_embeddings_drop_chunks_not_files() {
    let h = harness_with_embedder(FakeEmbeddings {
        fail_sparse_on: Some("ore".to_string()),
        ..FakeEmbeddings::default()
    });
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();

    let report = h.pipeline.ingest(&brain_id, vec![paper()]).await.unwrap();
    assert!(report.success);
    assert_eq!(report.invalid_count, 1);
    assert_eq!(report.chunks_indexed, 1);

    // The surviving point is complete; the failed chunk left nothing behind.
    let points = h.store.dump(&brain_id);
    assert_eq!(points.len(), 1);
    assert!(points[0].vectors.is_some());
}

#[tokio::test]
async fn fully_failed_file_is_unsupported_and_unregistered() {
    let h = harness_with_embedder(FakeEmbeddings {
        fail_dense_on: Some("Atlantis".to_string()),
        ..FakeEmbeddings::default()
    });
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();

    let report = h
        .pipeline
        .ingest(
            &brain_id,
            vec![IngestFile {
                file_name: "atlantis.pdf".to_string(),
                bytes: b"Atlantis, Atlantis, Atlantis.".to_vec(),
            }],
        )
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.files_unsupported, 1);
    assert_eq!(h.store.count("data_registry").await.unwrap(), 0);
    assert_eq!(h.store.count(&brain_id).await.unwrap(), 0);
}

#[tokio::test]
async fn list_files_deduplicates_by_name() {
    let h = harness();
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();

    // Two registry rows for the same name (e.g. after a concurrent upload)
    // collapse to one listing entry.
    h.catalog.register_file(&brain_id, "paper.pdf", "pdf-1").await.unwrap();
    h.catalog.register_file(&brain_id, "paper.pdf", "pdf-1").await.unwrap();
    h.catalog.register_file(&brain_id, "other.pdf", "pdf-2").await.unwrap();

    let files = h.catalog.list_files(&brain_id).await.unwrap();
    assert_eq!(files.len(), 2);

    // And files of other brains stay invisible.
    let other = h.catalog.create_brain("beta").await.unwrap();
    assert!(h.catalog.list_files(&other).await.unwrap().is_empty());
}

#[tokio::test]
async fn registry_rows_have_no_vectors() {
    let h = harness();
    h.catalog.ensure_registry().await.unwrap();
    let brain_id = h.catalog.create_brain("alpha").await.unwrap();
    h.catalog.register_file(&brain_id, "paper.pdf", "pdf-1").await.unwrap();

    let rows = h.store.dump("data_registry");
    assert_eq!(rows.len(), 1);
    assert!(rows[0].vectors.is_none());
    assert!(matches!(rows[0].payload, Payload::Registry(_)));
}
