// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Delivery failure: {0}")]
    Delivery(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Duplicate key error")]
    DuplicateKey,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(e) => {
                tracing::error!("database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidOrExpired => {
                (StatusCode::BAD_REQUEST, "Invalid or expired code".to_string())
            }
            AppError::Delivery(e) => {
                tracing::error!("provider delivery failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to send verification message".to_string(),
                )
            }
            AppError::AuthError => (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized access".to_string()),
            AppError::InvalidObjectId(_) => {
                (StatusCode::BAD_REQUEST, "Invalid ID format".to_string())
            }
            AppError::DuplicateKey => (StatusCode::CONFLICT, "Duplicate entry".to_string()),
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
