//! Hydrus Client API access

pub mod client;
pub mod errors;
pub mod types;

pub use client::{FileUrls, HydrusApi, HydrusClient};
pub use errors::ApiError;
pub use types::*;
