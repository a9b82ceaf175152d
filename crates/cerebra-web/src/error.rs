//! Error-to-response mapping. Every failure keeps the JSON envelope;
//! stack traces go to the logs, never the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cerebra_common::{ApiResponse, CerebraError};

pub struct ApiError(pub CerebraError);

impl<E: Into<CerebraError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        tracing::error!(error = %err, "Request failed");
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body: ApiResponse<serde_json::Value> = (&err).into();
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
