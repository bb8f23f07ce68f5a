//! File metadata: filetypes, categories, ratings, normalization and the
//! batched, cached lookups built on top of them.

pub mod category;
pub mod filetype;
pub mod normalize;
pub mod ratings;
pub mod service;

pub use category::{category, FileCategory};
pub use filetype::{filetype_for_mime, filetype_string, Filetype};
pub use normalize::{
    normalize_basic, normalize_full, BasicFile, FileServiceEntry, FileServices, FullFile,
    TagServiceState, TagStatus,
};
pub use ratings::{normalize_ratings, Rating};
pub use service::{FilesService, DEFAULT_CHUNK_SIZE};
