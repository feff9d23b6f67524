use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::jobs::JobError;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchRequest {
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchCreated {
    pub id: String,
    pub status: ResearchStatus,
}

/// Polling view of a job.
///
/// `result` carries the summary when `status` is `completed` and the failure
/// description when it is `error`; it is empty otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct StatusResponse {
    pub id: String,
    pub status: ResearchStatus,
    pub result: String,
    pub sites: Vec<Site>,
}

/// Status tag reported to pollers. Unlike the internal job status this
/// includes `not_found`, because an unknown id is reported as data. Jobs are
/// running from the moment they are accepted, so there is no queued state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Running,
    Completed,
    Error,
    NotFound,
}

// ============= Discovery Types =============

/// A discovered source, identified by its URL.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct Site {
    pub title: String,
    pub url: String,
}

impl Site {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Server busy: {0}")]
    Busy(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::LLM(_) | AppError::Search(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Job(JobError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Job(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::LLM(msg)
            | AppError::Search(msg)
            | AppError::Internal(msg)
            | AppError::InvalidInput(msg)
            | AppError::Busy(msg)
            | AppError::Job(JobError::Validation(msg)) => msg,
            AppError::Job(err) => err.to_string(),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
