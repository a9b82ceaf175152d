//! Brain and file catalog.
//!
//! One vector collection per brain (named by `brain_id`, addressed by the
//! human alias), plus one global registry collection keyed by
//! `(brain_id, file_name)` for listing and deduplication without scanning
//! content collections.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use cerebra_common::{BrainInfo, CerebraError, FileInfo, Result};
use cerebra_vectorstore::{Filter, Payload, PointStruct, RegistryEntry, VectorStore};

pub struct BrainCatalog {
    store: Arc<dyn VectorStore>,
    registry_collection: String,
    dense_dim: usize,
}

impl BrainCatalog {
    pub fn new(store: Arc<dyn VectorStore>, registry_collection: String, dense_dim: usize) -> Self {
        Self { store, registry_collection, dense_dim }
    }

    /// Create the registry collection if it does not exist. Called once at
    /// boot; safe to repeat.
    pub async fn ensure_registry(&self) -> Result<()> {
        self.store.create_collection(&self.registry_collection, self.dense_dim).await?;
        Ok(())
    }

    /// Create a brain: a content collection named by a fresh `brain_id`
    /// with named `dense`/`sparse` vectors, plus the alias
    /// `brain_name → brain_id`. Alias creation is retried once; if it
    /// still fails the collection is rolled back so no unaddressable
    /// collection is left behind.
    #[instrument(skip(self))]
    pub async fn create_brain(&self, brain_name: &str) -> Result<String> {
        let aliases = self.store.list_aliases().await?;
        if aliases.iter().any(|a| a.alias_name == brain_name) {
            return Err(CerebraError::AlreadyExists(format!("brain '{brain_name}'")));
        }

        let brain_id = Uuid::new_v4().to_string();
        self.store.create_collection(&brain_id, self.dense_dim).await?;

        if let Err(first) = self.store.create_alias(&brain_id, brain_name).await {
            warn!(brain_id = %brain_id, error = %first, "Alias creation failed, retrying once");
            if let Err(second) = self.store.create_alias(&brain_id, brain_name).await {
                if let Err(e) = self.store.delete_collection(&brain_id).await {
                    warn!(brain_id = %brain_id, error = %e, "Rollback delete failed");
                }
                return Err(CerebraError::Internal(format!(
                    "alias '{brain_name}' could not be created: {second}"
                )));
            }
        }

        info!(brain_id = %brain_id, brain_name, "Brain created");
        Ok(brain_id)
    }

    /// Enumerate brains from the alias table.
    pub async fn list_brains(&self) -> Result<Vec<BrainInfo>> {
        let aliases = self.store.list_aliases().await?;
        Ok(aliases
            .into_iter()
            .map(|a| BrainInfo { brain_name: a.alias_name, brain_id: a.collection_name })
            .collect())
    }

    /// List files registered for a brain, deduplicated by file name.
    pub async fn list_files(&self, brain_id: &str) -> Result<Vec<FileInfo>> {
        let limit = self.registry_page_size().await?;
        let rows = self
            .store
            .scroll(
                &self.registry_collection,
                Some(Filter::must_match("brain_id", brain_id)),
                limit,
            )
            .await?;

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for row in rows {
            if let Payload::Registry(entry) = row.payload {
                if seen.insert(entry.file_name.clone()) {
                    files.push(FileInfo { file_name: entry.file_name, file_id: entry.pdf_id });
                }
            }
        }
        info!(brain_id, n = files.len(), "Files listed from registry");
        Ok(files)
    }

    /// Exact-match dedup check for `(brain_id, file_name)`.
    pub async fn check_file(&self, brain_id: &str, file_name: &str) -> Result<bool> {
        let limit = self.registry_page_size().await?;
        let rows = self
            .store
            .scroll(
                &self.registry_collection,
                Some(Filter::must_match("file_name", file_name).and("brain_id", brain_id)),
                limit,
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Record an ingested file in the registry. Registry points carry no
    /// vectors, only the `(file_name, pdf_id, brain_id)` triple.
    pub async fn register_file(&self, brain_id: &str, file_name: &str, pdf_id: &str) -> Result<()> {
        let point = PointStruct {
            id: Uuid::new_v4(),
            vectors: None,
            payload: Payload::Registry(RegistryEntry {
                file_name: file_name.to_string(),
                pdf_id: pdf_id.to_string(),
                brain_id: brain_id.to_string(),
            }),
        };
        self.store.upsert(&self.registry_collection, vec![point]).await?;
        info!(brain_id, file_name, pdf_id, "Registry updated");
        Ok(())
    }

    /// Scroll pages are sized from the registry's point count, floored at
    /// one so an empty registry still issues a valid request.
    async fn registry_page_size(&self) -> Result<usize> {
        let count = self.store.count(&self.registry_collection).await?;
        Ok(count.max(1))
    }
}
