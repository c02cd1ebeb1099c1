//! Report endpoints
//!
//! Thin translation between HTTP requests and `ReportService` calls.
//! Reports arrive either as multipart forms (with an optional photo) or as
//! JSON bodies carrying only the text fields.

use super::response::{ReportEnvelope, ReportList};
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::SubmitReport;
use crate::storage::PhotoUpload;
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::Json;
use serde::Deserialize;

/// JSON form of a report submission
#[derive(Debug, Deserialize)]
struct JsonSubmission {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    lat: Option<RawCoordinate>,
    #[serde(default)]
    lng: Option<RawCoordinate>,
}

/// Coordinates may be sent as numbers or as decimal strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawCoordinate {
    fn into_text(self) -> String {
        match self {
            RawCoordinate::Number(value) => value.to_string(),
            RawCoordinate::Text(text) => text,
        }
    }
}

impl From<JsonSubmission> for SubmitReport {
    fn from(body: JsonSubmission) -> Self {
        Self {
            description: body.description,
            lat: body.lat.map(RawCoordinate::into_text),
            lng: body.lng.map(RawCoordinate::into_text),
            photo: None,
        }
    }
}

/// `POST /api/report`
pub async fn submit_report(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ReportEnvelope>> {
    let submission = if is_json(&request) {
        let Json(body) = Json::<JsonSubmission>::from_request(request, &state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected JSON report body: {}", rejection);
                AppError::Validation("invalid JSON body".to_string())
            })?;
        SubmitReport::from(body)
    } else {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected report body: {}", rejection);
                AppError::Validation(
                    "request must be multipart/form-data or application/json".to_string(),
                )
            })?;
        read_submission(multipart).await?
    };

    let report = state.reports_service.submit(submission).await?;

    Ok(Json(ReportEnvelope::ok(report)))
}

/// `GET /api/reports`
pub async fn list_reports(State(state): State<AppState>) -> Json<ReportList> {
    Json(ReportList {
        reports: state.reports_service.list().await,
    })
}

/// `POST /api/report/:id/toggle`
pub async fn toggle_report(
    State(state): State<AppState>,
    id: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<ReportEnvelope>> {
    // An id that does not even decode cannot name a stored report
    let Path(id) = id.map_err(|rejection| {
        tracing::debug!("Rejected report id: {}", rejection);
        AppError::ReportNotFound(rejection.body_text())
    })?;

    let report = state.reports_service.toggle(&id).await?;
    Ok(Json(ReportEnvelope::ok(report)))
}

fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

/// Collect the form fields of a report submission. Unknown fields are
/// skipped; a second photo is an error.
async fn read_submission(mut multipart: Multipart) -> Result<SubmitReport> {
    let mut submission = SubmitReport::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "description" => submission.description = Some(read_text(field).await?),
            "lat" => submission.lat = Some(read_text(field).await?),
            "lng" => submission.lng = Some(read_text(field).await?),
            "photo" => {
                let photo = read_photo(field).await?;
                if photo.is_some() && submission.photo.is_some() {
                    return Err(AppError::Upload("only one photo may be attached".to_string()));
                }
                submission.photo = submission.photo.or(photo);
            }
            other => tracing::debug!("Ignoring form field: {:?}", other),
        }
    }

    Ok(submission)
}

async fn read_text(field: Field<'_>) -> Result<String> {
    field.text().await.map_err(multipart_error)
}

/// Buffer a photo field. A file input left empty arrives as a nameless,
/// zero-length part and counts as no photo.
async fn read_photo(mut field: Field<'_>) -> Result<Option<PhotoUpload>> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        data.extend_from_slice(&chunk);
    }

    if file_name.is_empty() && data.is_empty() {
        return Ok(None);
    }

    Ok(Some(PhotoUpload {
        file_name,
        content_type,
        data,
    }))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            limit: crate::config::MAX_UPLOAD_BYTES,
        }
    } else {
        AppError::Upload(err.body_text())
    }
}
