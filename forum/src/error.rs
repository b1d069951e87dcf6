use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use forum_core::ForumError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API Result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API Error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ForumError> for ApiError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::Validation(msg) => ApiError::InvalidRequest(msg),
            ForumError::InvalidChoice(choice) => {
                ApiError::InvalidRequest(format!("Invalid vote '{choice}', expected 'up' or 'down'"))
            }
            ForumError::NotFound(what) => ApiError::NotFound(what),
            ForumError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            ForumError::Forbidden(msg) => ApiError::Forbidden(msg),
            ForumError::AlreadyExists(msg) => ApiError::InvalidRequest(msg),
            e @ ForumError::VersionConflict(_) => ApiError::Conflict(e.to_string()),
            ForumError::StoreUnavailable(msg) => ApiError::Unavailable(msg),
            ForumError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        ApiError::InvalidRequest(format!("Missing or invalid fields: {}", fields.join(", ")))
    }
}

/// Convert ApiError to HTTP response
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log
        if let ApiError::Internal(detail) = &self {
            error!(%detail, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status.as_u16()
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forum_errors_map_to_status() {
        let cases = [
            (ForumError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ForumError::InvalidChoice("sideways".into()), StatusCode::BAD_REQUEST),
            (ForumError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ForumError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ForumError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ForumError::AlreadyExists("x".into()), StatusCode::BAD_REQUEST),
            (ForumError::VersionConflict("x".into()), StatusCode::CONFLICT),
            (ForumError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ForumError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = ApiError::Internal("argon2 exploded".into());
        assert_eq!(err.to_string(), "Internal server error");
    }
}
