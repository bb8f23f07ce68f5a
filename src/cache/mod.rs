//! Metadata caching layer
//!
//! In-memory cache of basic file records keyed by file id.

pub mod metadata;

pub use metadata::MetadataCache;
