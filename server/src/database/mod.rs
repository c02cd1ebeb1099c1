//! Record persistence
//!
//! This module provides:
//! - Model definitions for reports and the on-disk record file
//! - The JSON-file record store with serialized mutations

pub mod models;
pub mod record_store;

pub use models::*;
pub use record_store::RecordStore;
