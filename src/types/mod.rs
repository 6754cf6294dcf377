use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

// ============= Job Types =============

/// Lifecycle of a submitted job.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Progress of a run.
///
/// `estimated_total` is the upfront guess shown before chunking happens;
/// `actual_total` is filled in once the text has been chunked and takes
/// precedence when computing the percentage.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub estimated_total: usize,
    pub actual_total: Option<usize>,
}

impl Progress {
    pub fn new(estimated_total: usize) -> Self {
        Self {
            completed: 0,
            estimated_total,
            actual_total: None,
        }
    }

    /// Completion percentage against the best known total.
    pub fn percent(&self) -> f64 {
        let total = self.actual_total.unwrap_or(self.estimated_total);
        if total == 0 {
            return 0.0;
        }
        self.completed as f64 / total as f64 * 100.0
    }
}

/// Outcome of a successful run.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct RunSummary {
    pub job_id: Uuid,
    pub chunks: usize,
    pub characters_in: usize,
    pub characters_out: usize,
    pub duration_ms: u64,
    #[schema(value_type = String)]
    pub artifact: PathBuf,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub characters: usize,
    pub sources: Vec<String>,
    pub estimated_chunks: usize,
    pub estimated_wait_secs: u64,
    pub progress: Progress,
    pub percent: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceStatusResponse {
    pub available: bool,
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Job currently being edited, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_job: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultResponse {
    pub lines: Vec<String>,
    pub characters: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// `txt` (default) or `docx`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Editing service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Editing service error: {0}")]
    ServiceError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::Cancelled(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ServiceError(_) => StatusCode::BAD_GATEWAY,
            AppError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ServiceUnavailable(msg)
            | AppError::ServiceError(msg)
            | AppError::Storage(msg)
            | AppError::Document(msg)
            | AppError::Cancelled(msg)
            | AppError::Internal(msg) => msg,
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
