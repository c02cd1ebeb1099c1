//! HTTP boundary
//!
//! This module organizes the axum router into:
//! - `reports`: report submission, listing and toggling
//! - `uploads`: serving stored photos
//! - `response`: JSON envelopes and error-to-status mapping

pub mod reports;
pub mod response;
pub mod uploads;

use crate::app::AppState;
use crate::config::MAX_REQUEST_BODY_BYTES;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use response::ErrorBody;
use tower_http::cors::CorsLayer;

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/report",
            post(reports::submit_report).fallback(method_not_allowed),
        )
        .route(
            "/api/reports",
            get(reports::list_reports).fallback(method_not_allowed),
        )
        .route(
            "/api/report/:id/toggle",
            post(reports::toggle_report).fallback(method_not_allowed),
        )
        .route(
            "/uploads/:filename",
            get(uploads::serve_upload).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(disable_api_caching))
        // The report UI may be hosted on another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API responses always reflect current report state
async fn disable_api_caching(request: Request, next: Next) -> Response {
    let is_api = request.uri().path().starts_with("/api");
    let mut response = next.run(request).await;

    if is_api {
        let headers = response.headers_mut();
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }

    response
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("not found")))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("method not allowed")),
    )
}
