//! Reports service
//!
//! Business logic for report intake: validates submissions, stores photos,
//! assigns identity and hands records to the record store.
//! Integrates RecordStore and BlobStore.

use crate::config::MIN_DESCRIPTION_LEN;
use crate::database::{NewReport, RecordStore, Report};
use crate::error::{AppError, Result};
use crate::storage::{BlobRef, BlobStore, PhotoUpload};

/// A report submission as received from a client
#[derive(Debug, Clone, Default)]
pub struct SubmitReport {
    pub description: Option<String>,
    /// Raw latitude text; parsed leniently
    pub lat: Option<String>,
    /// Raw longitude text; parsed leniently
    pub lng: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// Service for managing reports
#[derive(Clone)]
pub struct ReportService {
    records: RecordStore,
    blob_store: BlobStore,
}

impl ReportService {
    pub fn new(records: RecordStore, blob_store: BlobStore) -> Self {
        Self {
            records,
            blob_store,
        }
    }

    /// Validate and persist a new report
    pub async fn submit(&self, req: SubmitReport) -> Result<Report> {
        let description = req
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if description.chars().count() < MIN_DESCRIPTION_LEN && req.photo.is_none() {
            return Err(AppError::Validation(
                "description or photo required".to_string(),
            ));
        }

        let blob = match &req.photo {
            Some(upload) => {
                tracing::info!(
                    "Storing photo: {} ({}, {} bytes)",
                    upload.file_name,
                    upload.content_type,
                    upload.data.len()
                );
                Some(self.blob_store.store(upload).await?)
            }
            None => None,
        };

        let (lat, lng) = parse_coordinates(req.lat.as_deref(), req.lng.as_deref());

        let report = Report::new(NewReport {
            description,
            lat,
            lng,
            photo: blob.as_ref().map(BlobRef::url),
        });

        match self.records.append(report).await {
            Ok(report) => {
                tracing::info!("Report created: {}", report.id);
                Ok(report)
            }
            Err(e) => {
                if let Some(blob) = &blob {
                    self.discard_orphan(blob).await;
                }
                Err(e)
            }
        }
    }

    /// List all reports, newest first
    pub async fn list(&self) -> Vec<Report> {
        self.records.load_all().await
    }

    /// Flip a report between resolved and pending
    pub async fn toggle(&self, id: &str) -> Result<Report> {
        let report = self
            .records
            .update_by_id(id, |r| r.resolved = !r.resolved)
            .await?;

        tracing::info!("Report {} marked resolved={}", report.id, report.resolved);

        Ok(report)
    }

    /// Raw bytes of a stored photo
    pub async fn photo(&self, filename: &str) -> Result<Vec<u8>> {
        self.blob_store.read(filename).await
    }

    /// Best-effort removal of a photo whose report was never persisted
    async fn discard_orphan(&self, blob: &BlobRef) {
        match self.blob_store.delete(blob.filename()).await {
            Ok(()) => tracing::warn!("Removed orphaned photo: {}", blob.filename()),
            Err(e) => tracing::error!(
                "Failed to remove orphaned photo {}: {}",
                blob.filename(),
                e
            ),
        }
    }
}

/// Parse a coordinate pair. Malformed, non-finite or out-of-range values are
/// dropped rather than rejected, and a lone coordinate is dropped with its
/// missing partner so stored reports are always either located or not.
fn parse_coordinates(lat: Option<&str>, lng: Option<&str>) -> (Option<f64>, Option<f64>) {
    let lat = parse_coordinate(lat, 90.0);
    let lng = parse_coordinate(lng, 180.0);

    match (lat, lng) {
        (Some(lat), Some(lng)) => (Some(lat), Some(lng)),
        (None, None) => (None, None),
        (lat, lng) => {
            tracing::debug!("Dropping unpaired coordinate (lat={:?}, lng={:?})", lat, lng);
            (None, None)
        }
    }
}

fn parse_coordinate(raw: Option<&str>, limit: f64) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= limit => Some(value),
        _ => {
            tracing::debug!("Ignoring malformed coordinate: {:?}", raw);
            None
        }
    }
}
