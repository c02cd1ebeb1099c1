//! Response bodies and error mapping
//!
//! Every response is JSON, errors included, so clients can always parse
//! what they get back.

use crate::database::Report;
use crate::error::AppError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{success: true, report}`
#[derive(Debug, Serialize)]
pub struct ReportEnvelope {
    pub success: bool,
    pub report: Report,
}

impl ReportEnvelope {
    pub fn ok(report: Report) -> Self {
        Self {
            success: true,
            report,
        }
    }
}

/// `{reports: [...]}`
#[derive(Debug, Serialize)]
pub struct ReportList {
    pub reports: Vec<Report>,
}

/// `{success: false, error, detail?}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// - Validation / upload failures: 400 Bad Request
    /// - Unknown report or photo: 404 Not Found
    /// - Storage and other internal failures: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::PayloadTooLarge { .. }
            | AppError::UnsupportedMediaType(_)
            | AppError::Upload(_) => StatusCode::BAD_REQUEST,
            AppError::ReportNotFound(_) | AppError::BlobNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Io(_) | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Validation(message) => ErrorBody::new(message.clone()),
            e if e.is_upload_error() => {
                tracing::warn!("Rejected photo upload: {}", e);
                ErrorBody::new("photo upload failed").with_detail(e.to_string())
            }
            AppError::ReportNotFound(_) => ErrorBody::new("report not found"),
            AppError::BlobNotFound(_) => ErrorBody::new("file not found"),
            e => {
                // Internal details stay in the log
                tracing::error!("Request failed: {}", e);
                ErrorBody::new("internal server error")
            }
        };

        (status, Json(body)).into_response()
    }
}
