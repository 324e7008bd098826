use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),
    #[error("OpenAI API key not configured for tenant: {0}")]
    CredentialNotConfigured(String),
    #[error("Stored API key could not be decrypted")]
    CredentialDecryption,
    #[error("AI provider error: {0}")]
    Provider(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::TenantNotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::CredentialNotConfigured(business_name) => (
                StatusCode::BAD_REQUEST,
                format!("OpenAI API key not configured for tenant: {}", business_name),
            ),
            // Key mismatch or corrupted ciphertext. This must stay loud and
            // must never be reported as "not configured".
            AppError::CredentialDecryption => {
                error!("Stored API key could not be decrypted; encryption key mismatch or corrupted ciphertext");
                (StatusCode::INTERNAL_SERVER_ERROR, "Credential decryption failed".to_string())
            }
            AppError::Provider(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
