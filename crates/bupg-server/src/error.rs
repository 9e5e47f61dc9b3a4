use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bupg_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Not found")]
    NotFound,

    #[error("Missing fields")]
    MissingFields,

    #[error("Missing file")]
    MissingFile,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServerError::NotFound,
            StoreError::Conflict(msg) => ServerError::Conflict(msg),
            StoreError::Invalid(msg) => ServerError::BadRequest(msg),
            other => ServerError::Storage(other),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized | ServerError::InvalidPassword => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::MissingFields | ServerError::MissingFile | ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            ServerError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ServerError::Upload(e) => {
                tracing::error!(error = %e, "Upload failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Upload failed".to_string())
            }
            ServerError::Internal(e) => {
                tracing::error!(error = %e, "Internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
