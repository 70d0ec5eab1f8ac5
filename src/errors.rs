use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

// --- Storage Layer Errors ---

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Database backend error: {0}")]
    BackendError(#[from] anyhow::Error),

    #[error("Stored item could not be parsed: {0}")]
    DataCorruption(String),
}

// --- Service Layer Errors ---

/// Outcomes of the vote/bid/create operations that the caller must handle.
/// Both the REST handlers and the realtime intent handler consume these.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Meme not found with ID: {0}")]
    MemeNotFound(Uuid),

    #[error("Bid too low: {offered} does not exceed current bid of {current}")]
    BidTooLow { offered: i64, current: i64 },

    #[error(transparent)]
    Repo(#[from] RepoError),
}

// --- Web Layer Error ---

#[derive(Error, Debug)]
pub enum AppError {
    // Input validation / request parsing errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid meme ID format: {0}")]
    InvalidUuid(#[from] uuid::Error),

    // Domain outcomes
    #[error("Meme not found with ID: {0}")]
    MemeNotFound(Uuid),
    #[error("Bid too low")]
    BidTooLow { offered: i64, current: i64 },
    #[error("Could not complete storage operation")]
    RepositoryError(#[source] RepoError),

    // Configuration / Startup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Initialization error: {0}")]
    InitError(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// --- Conversions between layers ---

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(msg) => AppError::InvalidInput(msg),
            ServiceError::MemeNotFound(id) => AppError::MemeNotFound(id),
            ServiceError::BidTooLow { offered, current } => {
                AppError::BidTooLow { offered, current }
            }
            ServiceError::Repo(e) => AppError::RepositoryError(e),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        AppError::RepositoryError(err)
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

// --- Axum Response Implementation ---

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidUuid(e) => {
                (StatusCode::BAD_REQUEST, format!("Invalid ID format: {}", e))
            }
            AppError::MemeNotFound(_) => (StatusCode::NOT_FOUND, "Meme not found".to_string()),
            AppError::BidTooLow { offered, current } => {
                tracing::debug!(offered, current, "Rejecting bid at or below current");
                (StatusCode::BAD_REQUEST, "Bid too low".to_string())
            }

            // 5xx Server Errors
            AppError::RepositoryError(e) => {
                tracing::error!(error.source = ?e, "Repository error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                )
            }
            AppError::ConfigError(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AppError::InitError(msg) => {
                tracing::error!("Initialization error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server initialization error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("I/O error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(serde_json::json!({ "error": error_message }));
        (status, body).into_response()
    }
}
