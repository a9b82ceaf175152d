//! PDF upload and file listing endpoints.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use cerebra_common::{ApiResponse, CerebraError, FileInfo};
use cerebra_ingestion::{IngestFile, IngestReport};

use crate::error::ApiResult;
use crate::state::SharedState;

/// POST /api/{brain_id}/upload - multipart `files[]`.
pub async fn upload_files(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CerebraError::Invalid(format!("malformed multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| CerebraError::Invalid(format!("unreadable upload '{file_name}': {e}")))?;
        files.push(IngestFile { file_name, bytes: bytes.to_vec() });
    }

    info!(brain_id = %brain_id, n_files = files.len(), "Upload received");
    let report = state.pipeline.ingest(&brain_id, files).await?;
    let (status, body) = report_response(&report);
    Ok((status, Json(body)))
}

/// Map an ingestion report onto the response envelope: 201 when anything
/// was indexed, 200 when everything was a known duplicate, 422 when
/// content could not be processed, 404 when there was nothing to index.
fn report_response(report: &IngestReport) -> (StatusCode, ApiResponse<IngestReport>) {
    let status = if report.files_ingested > 0 {
        StatusCode::CREATED
    } else if report.success {
        StatusCode::OK
    } else if report.files_unsupported > 0 {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::NOT_FOUND
    };

    let body = if report.success {
        ApiResponse::ok(status.as_u16(), report.message.clone(), report.clone())
    } else {
        ApiResponse::failure(status.as_u16(), report.message.clone(), None)
    };
    (status, body)
}

/// GET /api/{brain_id}/list-files
pub async fn list_files(
    State(state): State<SharedState>,
    Path(brain_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let files: Vec<FileInfo> = state.catalog.list_files(&brain_id).await?;
    if files.is_empty() {
        let body = ApiResponse::<Vec<FileInfo>>::failure(
            404,
            "Please upload some PDFs in the selected brain.",
            None,
        );
        return Ok((StatusCode::NOT_FOUND, Json(body)));
    }
    Ok((StatusCode::OK, Json(ApiResponse::ok(200, "Files fetched successfully.", files))))
}
