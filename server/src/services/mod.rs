//! Services module
//!
//! Business logic services that coordinate between the HTTP boundary and storage.

pub mod reports;

pub use reports::{ReportService, SubmitReport};
