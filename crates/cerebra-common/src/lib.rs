//! cerebra-common — Shared types, errors, and the API envelope used across all Cerebra crates.

pub mod envelope;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use envelope::ApiResponse;
pub use error::{CerebraError, Result};
pub use models::{BrainInfo, FileInfo, QueryRequest, SelectedPdf, SparseVector};
