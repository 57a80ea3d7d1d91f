use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipeline::collaborators::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable kind, used as the `code` of the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Generation(_) => "GENERATION_ERROR",
            AppError::Rendering(_) => "RENDERING_ERROR",
            AppError::Delivery(_) => "DELIVERY_ERROR",
            AppError::Cancelled(_) => "CANCELLED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e.to_string())
    }
}

impl AppError {
    /// HTTP status plus the message that is safe to show a caller.
    /// Infrastructure details are logged here and replaced by a generic message.
    pub fn public_parts(&self) -> (StatusCode, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A persistence error occurred".to_string(),
                )
            }
            AppError::Cache(msg) => {
                tracing::error!("Cache error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A cache error occurred".to_string(),
                )
            }
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::Rendering(msg) => {
                tracing::error!("Rendering error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The document could not be rendered".to_string(),
                )
            }
            AppError::Delivery(msg) => {
                tracing::error!("Delivery error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "The document could not be delivered".to_string(),
                )
            }
            AppError::Cancelled(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.public_parts();

        let body = Json(json!({
            "error": {
                "code": self.kind(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("template abc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_generation_error_kind() {
        let err = AppError::from(GenerationError::EmptyOutput);
        assert_eq!(err.kind(), "GENERATION_ERROR");
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = AppError::Internal(anyhow::anyhow!("secret pool address"));
        let (status, message) = err.public_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("secret"));
    }

    #[test]
    fn test_cancelled_maps_to_conflict() {
        let err = AppError::Cancelled("job 7 was cancelled".to_string());
        assert_eq!(err.kind(), "CANCELLED");
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }
}
