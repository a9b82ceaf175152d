//! Evaluation endpoints: single-response scoring and the XLSX batch
//! round-trip.

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use cerebra_common::{ApiResponse, CerebraError};

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub context: String,
    pub query: String,
    pub response: String,
    #[serde(default)]
    pub ground_truth: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateData {
    pub llm_eval: Option<String>,
    pub retriever_eval: Option<String>,
}

/// POST /api/evaluate_response
pub async fn evaluate_response(
    State(state): State<SharedState>,
    Json(req): Json<EvaluateRequest>,
) -> ApiResult<impl IntoResponse> {
    let scores = state
        .evaluator
        .evaluate(&req.context, &req.query, &req.response, req.ground_truth.as_deref())
        .await;
    let body = ApiResponse::ok(
        200,
        "Responses evaluated successfully.",
        EvaluateData { llm_eval: scores.llm, retriever_eval: scores.retriever },
    );
    Ok(Json(body))
}

/// POST /api/evaluate-file - upload an XLSX test set, download the
/// evaluated workbook.
pub async fn evaluate_file(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CerebraError::Invalid(format!("malformed multipart body: {e}")))?
    {
        if let Some(name) = field.file_name().map(str::to_string) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| CerebraError::Invalid(format!("unreadable upload: {e}")))?;
            upload = Some((name, bytes.to_vec()));
            break;
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| CerebraError::Invalid("no file in upload".to_string()))?;
    if !file_name.ends_with(".xlsx") {
        return Err(CerebraError::Invalid("only .xlsx files are supported".to_string()).into());
    }

    let brain_id = state.evaluation.brain_id.clone().ok_or_else(|| {
        CerebraError::Invalid("no evaluation brain configured (evaluation.brain_id)".to_string())
    })?;

    info!(file_name = %file_name, brain_id = %brain_id, "Batch evaluation started");
    let evaluated = state
        .batch
        .evaluate_batch(&brain_id, &state.evaluation.selected_pdfs, &bytes)
        .await?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"evaluated_test_set.xlsx\"",
            ),
        ],
        evaluated,
    ))
}
