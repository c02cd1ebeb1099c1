//! reportbox library
//!
//! Report intake service: accepts text/photo reports with optional
//! coordinates, lists them newest-first and toggles their resolved flag.
//! The binary in `main.rs` wires these modules into an HTTP server.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
