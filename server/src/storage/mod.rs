//! Storage module
//!
//! Provides blob storage for uploaded photos.

pub mod blob_store;

pub use blob_store::{content_type_for, BlobRef, BlobStore, PhotoUpload};
