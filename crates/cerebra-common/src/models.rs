//! Wire models shared between the catalog, retrieval, and web layers.

use serde::{Deserialize, Serialize};

/// A brain is a tenant corpus: one vector collection, addressed externally
/// by its human alias and internally by its collection id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainInfo {
    pub brain_name: String,
    pub brain_id: String,
}

/// One ingested PDF inside a brain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_name: String,
    pub file_id: String,
}

/// A PDF selected for retrieval scoping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedPdf {
    pub file_id: String,
    #[serde(default)]
    pub file_name: String,
}

/// Body of every retrieval endpoint. An empty `selected_pdfs` means the
/// whole brain is searched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub selected_pdfs: Vec<SelectedPdf>,
}

impl QueryRequest {
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected_pdfs.iter().map(|p| p.file_id.clone()).collect()
    }
}

/// Term-id/weight pairs for lexical similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Indices strictly ascending, no duplicates, lengths matching.
    pub fn is_well_formed(&self) -> bool {
        self.indices.len() == self.values.len()
            && self.indices.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_request_defaults_to_no_filter() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "capital of Atlantis"}"#).unwrap();
        assert!(req.selected_pdfs.is_empty());
        assert!(req.selected_ids().is_empty());
    }

    #[test]
    fn sparse_vector_well_formedness() {
        let good = SparseVector { indices: vec![1, 5, 9], values: vec![0.1, 0.4, 0.2] };
        assert!(good.is_well_formed());

        let dup = SparseVector { indices: vec![1, 5, 5], values: vec![0.1, 0.4, 0.2] };
        assert!(!dup.is_well_formed());

        let ragged = SparseVector { indices: vec![1, 5], values: vec![0.1] };
        assert!(!ragged.is_well_formed());
    }
}
