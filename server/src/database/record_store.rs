//! JSON-file record store
//!
//! Holds every report in a single JSON document, newest first. Reads load the
//! whole file; mutations load, modify and rewrite it. All mutations go
//! through one mutex shared by every clone of the store, so concurrent
//! requests cannot lose each other's updates.

use super::models::{Report, ReportsFile};
use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// What was found on disk
enum Snapshot {
    Missing,
    Corrupt(serde_json::Error),
    Loaded(ReportsFile),
}

/// Store for report records
#[derive(Clone)]
pub struct RecordStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create the record file with an empty collection if it does not exist
    pub async fn initialize(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let _guard = self.write_lock.lock().await;
        if !fs::try_exists(&self.path).await? {
            tracing::info!("Record file not found, creating {:?}", self.path);
            self.write(&ReportsFile::default()).await?;
        }

        tracing::info!("Record store initialized at: {:?}", self.path);
        Ok(())
    }

    /// All reports, newest first. A missing or unreadable file yields an
    /// empty list instead of an error.
    pub async fn load_all(&self) -> Vec<Report> {
        match self.snapshot().await {
            Ok(Snapshot::Loaded(file)) => file.reports,
            Ok(Snapshot::Missing) => {
                tracing::warn!("Record file {:?} is missing, serving no reports", self.path);
                Vec::new()
            }
            Ok(Snapshot::Corrupt(e)) => {
                tracing::warn!("Record file {:?} is corrupt ({}), serving no reports", self.path, e);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to read record file {:?}: {}", self.path, e);
                Vec::new()
            }
        }
    }

    /// Prepend a report and persist the collection.
    ///
    /// Returns the report as stored: its `created_at` is raised to the
    /// newest existing record's if the clock went backwards, keeping
    /// timestamps non-decreasing in append order.
    pub async fn append(&self, mut report: Report) -> Result<Report> {
        if !report.has_content() {
            return Err(AppError::Validation(
                "report has neither description nor photo".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut file = self.load_for_update().await?;

        if let Some(newest) = file.reports.first() {
            if report.created_at < newest.created_at {
                report.created_at = newest.created_at;
            }
        }

        file.reports.insert(0, report.clone());
        self.write(&file).await?;

        tracing::debug!("Appended report: {} ({} total)", report.id, file.reports.len());
        Ok(report)
    }

    /// Apply `mutator` to the report with the given id and persist the change
    pub async fn update_by_id<F>(&self, id: &str, mutator: F) -> Result<Report>
    where
        F: FnOnce(&mut Report),
    {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load_for_update().await?;

        let report = file
            .reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))?;

        mutator(report);
        let updated = report.clone();

        self.write(&file).await?;

        tracing::debug!("Updated report: {}", id);
        Ok(updated)
    }

    /// Path of the backing file
    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Snapshot::Missing),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<ReportsFile>(&content) {
            Ok(file) => Ok(Snapshot::Loaded(file)),
            Err(e) => Ok(Snapshot::Corrupt(e)),
        }
    }

    /// Load the collection for a mutation. Must be called with the write
    /// lock held. A corrupt file is moved aside rather than overwritten.
    async fn load_for_update(&self) -> Result<ReportsFile> {
        match self.snapshot().await? {
            Snapshot::Loaded(file) => Ok(file),
            Snapshot::Missing => Ok(ReportsFile::default()),
            Snapshot::Corrupt(e) => {
                let aside = self.corrupt_path();
                fs::rename(&self.path, &aside).await?;
                tracing::error!(
                    "Record file {:?} is corrupt ({}); moved to {:?} and starting empty",
                    self.path,
                    e,
                    aside
                );
                Ok(ReportsFile::default())
            }
        }
    }

    /// Serialize and replace the record file. Must be called with the write
    /// lock held.
    async fn write(&self, file: &ReportsFile) -> Result<()> {
        let content = serde_json::to_string_pretty(file)?;

        // Write to temp file first (atomic write)
        let temp_path = self.sibling(".tmp");
        let result: std::io::Result<()> = async {
            let mut out = fs::File::create(&temp_path).await?;
            out.write_all(content.as_bytes()).await?;
            out.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path).await;
            tracing::error!("Failed to write record file {:?}: {}", self.path, e);
            return Err(e.into());
        }

        Ok(())
    }

    fn corrupt_path(&self) -> PathBuf {
        self.sibling(&format!(".corrupt-{}", chrono::Utc::now().timestamp_millis()))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}
