use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::packing::optimizer::OptimizeError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Pack calculation failed: {0}")]
    Packing(#[from] OptimizeError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Packing(e) => {
                tracing::warn!("Pack calculation rejected: {e}");
                let (status, code) = match e {
                    OptimizeError::InvalidOrderAmount => {
                        (StatusCode::BAD_REQUEST, "INVALID_ORDER_AMOUNT")
                    }
                    OptimizeError::SearchSpaceTooLarge { .. } => {
                        (StatusCode::BAD_REQUEST, "ORDER_TOO_LARGE")
                    }
                    OptimizeError::NoPackSizes => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "NO_PACK_SIZES")
                    }
                    OptimizeError::InsufficientPackSizes => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_PACK_SIZES")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
