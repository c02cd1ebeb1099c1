//! Photo serving

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::storage::content_type_for;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;

/// `GET /uploads/:filename` - the stored bytes, verbatim
pub async fn serve_upload(
    State(state): State<AppState>,
    filename: std::result::Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse> {
    let Path(filename) = filename.map_err(|rejection| {
        tracing::debug!("Rejected upload name: {}", rejection);
        AppError::BlobNotFound(rejection.body_text())
    })?;

    let data = state.reports_service.photo(&filename).await?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], data))
}
