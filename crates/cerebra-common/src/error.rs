use thiserror::Error;

#[derive(Debug, Error)]
pub enum CerebraError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Unsupported content: {0}")]
    Unsupported(String),

    #[error("Transient dependency failure: {0}")]
    Transient(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CerebraError {
    /// HTTP status the error maps to at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            CerebraError::NotFound(_) => 404,
            CerebraError::AlreadyExists(_) => 409,
            CerebraError::Unsupported(_) => 422,
            CerebraError::Invalid(_) => 400,
            CerebraError::Transient(_) => 503,
            CerebraError::Http(_) | CerebraError::Serialization(_) | CerebraError::Internal(_) => {
                500
            }
        }
    }

    /// Whether a caller may retry the operation unchanged.
    pub fn is_transient(&self) -> bool {
        match self {
            CerebraError::Transient(_) => true,
            CerebraError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CerebraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(CerebraError::NotFound("brain".into()).status_code(), 404);
        assert_eq!(CerebraError::AlreadyExists("alpha".into()).status_code(), 409);
        assert_eq!(CerebraError::Unsupported("empty pdf".into()).status_code(), 422);
        assert_eq!(CerebraError::Invalid("bad payload".into()).status_code(), 400);
        assert_eq!(CerebraError::Transient("qdrant 503".into()).status_code(), 503);
        assert_eq!(CerebraError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn only_transient_errors_are_retriable() {
        assert!(CerebraError::Transient("rate limit".into()).is_transient());
        assert!(!CerebraError::NotFound("x".into()).is_transient());
        assert!(!CerebraError::Internal("x".into()).is_transient());
    }
}
