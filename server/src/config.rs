//! Application configuration
//!
//! Central location for resource limits, validation boundaries and on-disk
//! layout, plus the runtime settings parsed from the command line and
//! environment.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

// ===== Upload Limits =====

/// Maximum accepted photo size in bytes (5 MiB)
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body cap for the report endpoint. Leaves headroom above
/// `MAX_UPLOAD_BYTES` for the multipart framing and text fields, so an
/// oversized photo still reaches the blob store and gets a typed rejection.
pub const MAX_REQUEST_BODY_BYTES: usize = MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Image formats accepted for photos, matched against both the declared
/// MIME type and the file extension
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["jpeg", "jpg", "png", "webp"];

/// Extension used when the uploaded file name has none
pub const DEFAULT_PHOTO_EXTENSION: &str = ".jpg";

/// Length of the random component in generated blob names
pub const BLOB_NAME_RANDOM_LEN: usize = 8;

// ===== Report Validation =====

/// Minimum trimmed description length (in characters) for a report
/// submitted without a photo
pub const MIN_DESCRIPTION_LEN: usize = 3;

// ===== Storage Layout =====

/// Backing file of the record store, relative to the data directory
pub const RECORDS_FILE_NAME: &str = "db.json";

/// Blob directory, relative to the data directory
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// URL prefix under which stored photos are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Runtime settings for the server binary
#[derive(Parser, Debug, Clone)]
#[command(name = "reportbox")]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "REPORTBOX_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the record file and the uploads directory
    #[arg(long, env = "REPORTBOX_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,
}

impl ServerConfig {
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_FILE_NAME)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(UPLOADS_DIR_NAME)
    }

    pub fn bind_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
