//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::ServerConfig;
use crate::database::RecordStore;
use crate::error::Result;
use crate::services::ReportService;
use crate::storage::BlobStore;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub reports_service: ReportService,
}

impl AppState {
    pub fn new(reports_service: ReportService) -> Self {
        Self { reports_service }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &ServerConfig) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    let records = RecordStore::new(config.records_path());
    records.initialize().await?;

    let blob_store = BlobStore::new(config.uploads_dir());
    blob_store.initialize().await?;

    let state = AppState::new(ReportService::new(records, blob_store));

    tracing::info!("Application initialized successfully");

    Ok(state)
}
