//! Brain lifecycle endpoints.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use cerebra_common::{ApiResponse, BrainInfo};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct CreateBrainForm {
    pub brain_name: String,
}

#[derive(Debug, Serialize)]
pub struct BrainCreated {
    pub brain_id: String,
}

/// POST /api/create-brain
pub async fn create_brain(
    State(state): State<SharedState>,
    Form(form): Form<CreateBrainForm>,
) -> ApiResult<impl IntoResponse> {
    let brain_id = state.catalog.create_brain(&form.brain_name).await?;
    let body = ApiResponse::ok(
        201,
        format!("Brain {} created successfully.", form.brain_name),
        BrainCreated { brain_id },
    );
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /api/list-brains
pub async fn list_brains(State(state): State<SharedState>) -> ApiResult<impl IntoResponse> {
    let brains: Vec<BrainInfo> = state.catalog.list_brains().await?;
    if brains.is_empty() {
        let body = ApiResponse::<Vec<BrainInfo>>::failure(404, "Create a brain first.", None);
        return Ok((StatusCode::NOT_FOUND, Json(body)));
    }
    Ok((StatusCode::OK, Json(ApiResponse::ok(200, "Brains fetched successfully.", brains))))
}
