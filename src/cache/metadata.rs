//! Metadata Cache Implementation
//!
//! Basic file records keyed by file id. Entries live until [`MetadataCache::clear`];
//! there is no TTL and no size bound.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use tracing::{debug, trace};

use crate::files::BasicFile;

/// Read-through cache in front of the basic file lookups
pub struct MetadataCache {
    /// Basic file records by file id
    files: Cache<u64, BasicFile>,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
}

impl MetadataCache {
    pub fn new() -> Self {
        let files = Cache::builder().name("basic_file_cache").build();

        Self {
            files,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a cached basic file
    ///
    /// Updates hit/miss counters.
    pub fn get(&self, file_id: u64) -> Option<BasicFile> {
        match self.files.get(&file_id) {
            Some(file) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(file_id = file_id, "Cache HIT for basic file");
                Some(file)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!(file_id = file_id, "Cache MISS for basic file");
                None
            }
        }
    }

    /// Insert or overwrite a basic file
    pub fn insert(&self, file: BasicFile) {
        let file_id = file.file_id;
        self.files.insert(file_id, file);
        trace!(file_id = file_id, "Cached basic file");
    }

    /// Number of cached files
    pub fn len(&self) -> u64 {
        // entry_count lags behind inserts and invalidations until pending
        // maintenance has run
        self.files.run_pending_tasks();
        self.files.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached file and reset the counters
    pub fn clear(&self) {
        self.files.invalidate_all();
        self.files.run_pending_tasks();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Cleared basic file cache");
    }

    /// Get cache statistics
    ///
    /// Returns (hits, misses, hit_rate)
    pub fn stats(&self) -> (u64, u64, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        (hits, misses, hit_rate)
    }

    /// Log current cache metrics
    pub fn log_metrics(&self) {
        let (hits, misses, hit_rate) = self.stats();

        debug!(
            hits = hits,
            misses = misses,
            hit_rate = format!("{:.1}%", hit_rate),
            entries = self.len(),
            "Cache metrics"
        );
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{FileCategory, Filetype};

    fn create_test_file(file_id: u64) -> BasicFile {
        BasicFile {
            file_id,
            hash: format!("{:064x}", file_id),
            size: 1024,
            mime: "image/png".to_string(),
            ext: ".png".to_string(),
            width: Some(100),
            height: Some(100),
            duration: None,
            num_frames: None,
            num_words: None,
            has_audio: false,
            file_url: String::new(),
            thumbnail_url: String::new(),
            file_type: Filetype::ImagePng,
            file_category: FileCategory::Image,
            file_type_string: "png".to_string(),
            has_thumbnail: true,
        }
    }

    #[test]
    fn test_cache_hit_miss() {
        let cache = MetadataCache::new();

        // Initially miss
        assert!(cache.get(1).is_none());
        let (_, _, hit_rate) = cache.stats();
        assert_eq!(hit_rate, 0.0);

        // Insert and hit
        cache.insert(create_test_file(1));
        assert_eq!(cache.get(1), Some(create_test_file(1)));

        let (hits, misses, hit_rate) = cache.stats();
        assert_eq!(hits, 1);
        assert_eq!(misses, 1);
        assert!(hit_rate > 49.0 && hit_rate < 51.0); // ~50%
    }

    #[test]
    fn test_insert_overwrites() {
        let cache = MetadataCache::new();
        cache.insert(create_test_file(1));

        let mut updated = create_test_file(1);
        updated.size = 2048;
        cache.insert(updated.clone());

        assert_eq!(cache.get(1), Some(updated));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let cache = MetadataCache::new();

        cache.insert(create_test_file(1));
        cache.insert(create_test_file(2));
        assert_eq!(cache.len(), 2);

        cache.clear();

        assert!(cache.is_empty());
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());

        cache.insert(create_test_file(3));
        assert_eq!(cache.len(), 1);
    }
}
