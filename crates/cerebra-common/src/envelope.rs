//! The JSON envelope every API response is wrapped in.

use serde::{Deserialize, Serialize};

use crate::error::CerebraError;

/// Standard response envelope: `{success, status_code, message, data, detail}`.
/// Non-2xx responses keep the envelope with `success: false` and a `detail`
/// string; `data` is omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code,
            message: message.into(),
            data: Some(data),
            detail: None,
        }
    }

    pub fn ok_empty(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            success: true,
            status_code,
            message: message.into(),
            data: None,
            detail: None,
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            success: false,
            status_code,
            message: message.into(),
            data: None,
            detail,
        }
    }
}

impl<T> From<&CerebraError> for ApiResponse<T> {
    fn from(err: &CerebraError) -> Self {
        // Responses carry a short human message plus a technical detail;
        // stack traces stay in the logs.
        let message = match err {
            CerebraError::NotFound(_) => "Resource not found.",
            CerebraError::AlreadyExists(_) => "Resource already exists.",
            CerebraError::Unsupported(_) => "Content not supported for processing.",
            CerebraError::Invalid(_) => "Invalid request.",
            CerebraError::Transient(_) => "A dependency is temporarily unavailable.",
            _ => "An unexpected error occurred.",
        };
        ApiResponse::failure(err.status_code(), message, Some(err.to_string()))
    }
}
