//! hyview - file metadata client for the Hydrus Client API
//!
//! Normalizes file records from the server into a stable model, caches basic
//! file records by id, and batches large lookups into concurrent chunks.

pub mod api;
pub mod cache;
pub mod config;
pub mod files;

pub use api::{ApiError, FileSelector, HydrusApi, HydrusClient};
pub use config::ClientConfig;
pub use files::{BasicFile, FilesService, FullFile};
