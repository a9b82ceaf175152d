//! Axum router — maps all URL paths to handlers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    brains::{create_brain, list_brains},
    evaluate::{evaluate_file, evaluate_response},
    files::{list_files, upload_files},
    query::{all, dense, hybrid, hyde, sparse},
};
use crate::state::{AppState, SharedState};

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        // Catalog
        .route("/api/create-brain", post(create_brain))
        .route("/api/list-brains", get(list_brains))
        .route("/api/{brain_id}/upload", post(upload_files))
        .route("/api/{brain_id}/list-files", get(list_files))
        // Retrieval strategies
        .route("/api/{brain_id}/hybrid", post(hybrid))
        .route("/api/{brain_id}/sparse", post(sparse))
        .route("/api/{brain_id}/dense", post(dense))
        .route("/api/{brain_id}/hyde", post(hyde))
        .route("/api/{brain_id}/all", post(all))
        // Evaluation
        .route("/api/evaluate-file", post(evaluate_file))
        .route("/api/evaluate_response", post(evaluate_response))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
