//! Photo blob storage
//!
//! Stores uploaded photos as individual files under a single upload root.
//! Each blob gets a name of the form `<unix-millis>-<random><ext>`: the
//! timestamp keeps names ordered, the random part keeps concurrent uploads
//! in the same millisecond apart and makes names unguessable.
//!
//! Example: "holiday.png" is stored at "uploads/1718000000000-aZ3kP9xQ.png"

use crate::config::{
    ALLOWED_IMAGE_TYPES, BLOB_NAME_RANDOM_LEN, DEFAULT_PHOTO_EXTENSION, MAX_UPLOAD_BYTES,
    UPLOADS_URL_PREFIX,
};
use crate::error::{AppError, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A photo received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// File name as sent by the client
    pub file_name: String,
    /// Declared MIME type
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Stable reference to a stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    filename: String,
}

impl BlobRef {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Public URL path the blob is served under, e.g. `/uploads/<name>`
    pub fn url(&self) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, self.filename)
    }

    /// Recover a reference from the URL form stored on a report
    #[cfg(test)]
    pub fn from_url(url: &str) -> Option<Self> {
        let filename = url.strip_prefix(UPLOADS_URL_PREFIX)?.strip_prefix('/')?;
        is_safe_filename(filename).then(|| Self {
            filename: filename.to_string(),
        })
    }
}

/// Directory-backed photo store
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a new blob store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the blob store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Validate and persist an upload, returning a reference to it.
    ///
    /// Size is checked before type, so an oversized file is rejected as too
    /// large whatever it claims to be. On failure nothing is left under the
    /// final name.
    pub async fn store(&self, upload: &PhotoUpload) -> Result<BlobRef> {
        if upload.data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge { limit: MAX_UPLOAD_BYTES });
        }

        if !is_allowed_image(&upload.content_type, &upload.file_name) {
            return Err(AppError::UnsupportedMediaType(format!(
                "{} ({})",
                upload.file_name, upload.content_type
            )));
        }

        let extension = extension_of(&upload.file_name)
            .unwrap_or_else(|| DEFAULT_PHOTO_EXTENSION.to_string());
        let filename = generate_filename(&extension);
        let path = self.root.join(&filename);

        // Write to temp file first (atomic write)
        let temp_path = self.root.join(format!(".{}.tmp", filename));
        if let Err(e) = write_synced(&temp_path, &upload.data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // Rename to final location
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(
            "Stored blob: {} ({} bytes, from {:?})",
            filename,
            upload.data.len(),
            upload.file_name
        );

        Ok(BlobRef { filename })
    }

    /// Read a blob's bytes, unchanged
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.path_for(filename)?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!("Read blob: {} ({} bytes)", filename, data.len());
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::BlobNotFound(filename.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists
    #[cfg(test)]
    pub async fn exists(&self, filename: &str) -> Result<bool> {
        match self.path_for(filename) {
            Ok(path) => Ok(fs::try_exists(path).await?),
            Err(_) => Ok(false),
        }
    }

    /// Delete a blob
    pub async fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_for(filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted blob: {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()), // Already deleted
            Err(e) => Err(e.into()),
        }
    }

    /// Get blob store root directory
    #[cfg(test)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob name to a path inside the root. Anything that could
    /// escape the root is treated as a missing blob.
    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(AppError::BlobNotFound(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}

/// MIME type to serve a stored blob with, derived from its extension
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some(".jpg") | Some(".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        Some(".webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}

/// Either the declared type or the extension has to name an allowed format
fn is_allowed_image(content_type: &str, file_name: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    let extension = extension_of(file_name).unwrap_or_default();

    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|&allowed| content_type.contains(allowed) || extension.contains(allowed))
}

/// Lower-cased extension with its leading dot, restricted to ASCII
/// alphanumerics so it is safe to splice into a file name
fn extension_of(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();

    if ext.is_empty() {
        None
    } else {
        Some(format!(".{}", ext))
    }
}

fn generate_filename(extension: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BLOB_NAME_RANDOM_LEN)
        .map(char::from)
        .collect();

    format!(
        "{}-{}{}",
        chrono::Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains(&['/', '\\', '\0'][..])
}
