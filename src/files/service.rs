//! Batched, cached file lookups
//!
//! Large id or hash lists are split into chunks that are fetched concurrently
//! and joined all-or-nothing. Results always come back in the caller's order;
//! files the server does not return are left out.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use super::normalize::{normalize_basic, normalize_full, BasicFile, FullFile};
use crate::api::{
    ApiError, ApiVersion, FileSelector, FileUrls, HydrusApi, MetadataOptions, RawFileRecord,
    ServiceDirectory,
};
use crate::cache::MetadataCache;

/// Ids or hashes per file_metadata request
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// File metadata access for the viewer
pub struct FilesService<A: HydrusApi> {
    api: Arc<A>,
    cache: MetadataCache,
    chunk_size: usize,
}

impl<A: HydrusApi> FilesService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self::with_chunk_size(api, DEFAULT_CHUNK_SIZE)
    }

    /// Create a service with a custom chunk size (clamped to at least 1)
    pub fn with_chunk_size(api: Arc<A>, chunk_size: usize) -> Self {
        Self {
            api,
            cache: MetadataCache::new(),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Fetch the selected files in concurrent chunks.
    ///
    /// Any failing chunk fails the whole call. Service directories from the
    /// chunks are merged.
    async fn fetch_chunked<K, F>(
        &self,
        keys: &[K],
        to_selector: F,
        options: MetadataOptions,
    ) -> Result<(Vec<RawFileRecord>, ServiceDirectory), ApiError>
    where
        K: Clone,
        F: Fn(Vec<K>) -> FileSelector,
    {
        let selectors: Vec<FileSelector> = keys
            .chunks(self.chunk_size)
            .map(|chunk| to_selector(chunk.to_vec()))
            .collect();

        debug!(
            files = keys.len(),
            chunks = selectors.len(),
            chunk_size = self.chunk_size,
            "Fetching file metadata in chunks"
        );

        let responses = try_join_all(
            selectors
                .iter()
                .map(|selector| self.api.fetch_metadata(selector, &options)),
        )
        .await?;

        let mut records = Vec::new();
        let mut services = ServiceDirectory::new();
        for response in responses {
            records.extend(response.metadata);
            services.merge(response.services);
        }
        Ok((records, services))
    }

    /// Basic files by id, served from the cache where possible
    pub async fn get_basic_files_by_id(&self, ids: &[u64]) -> Result<Vec<BasicFile>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut files = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        let mut seen = HashSet::new();
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.cache.get(id) {
                Some(file) => files.push(file),
                None => missing.push(id),
            }
        }

        let cached = files.len();
        if !missing.is_empty() {
            let (records, _) = self
                .fetch_chunked(&missing, FileSelector::FileIds, MetadataOptions::basic())
                .await?;
            for raw in &records {
                let Some(file) = normalize_basic(raw, self.api.as_ref()) else {
                    continue;
                };
                self.cache.insert(file.clone());
                files.push(file);
            }
        }

        debug!(
            requested = ids.len(),
            cached = cached,
            fetched = files.len() - cached,
            "Resolved basic files"
        );

        Ok(restore_order(files, ids, |file| file.file_id))
    }

    /// Basic files by hash; always fetched, never cached
    pub async fn get_basic_files_by_hash(
        &self,
        hashes: &[String],
    ) -> Result<Vec<BasicFile>, ApiError> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let hashes = normalize_hashes(hashes);
        let (records, _) = self
            .fetch_chunked(&hashes, FileSelector::Hashes, MetadataOptions::basic())
            .await?;
        let files: Vec<BasicFile> = records
            .iter()
            .filter_map(|raw| normalize_basic(raw, self.api.as_ref()))
            .collect();

        Ok(restore_order(files, &hashes, |file| file.hash.to_ascii_lowercase()))
    }

    /// Full file records by id; never cached
    pub async fn get_file_metadata(&self, ids: &[u64]) -> Result<Vec<FullFile>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut unique = ids.to_vec();
        let mut seen = HashSet::new();
        unique.retain(|id| seen.insert(*id));

        let (records, services) = self
            .fetch_chunked(&unique, FileSelector::FileIds, MetadataOptions::full())
            .await?;
        let files: Vec<FullFile> = records
            .iter()
            .filter_map(|raw| normalize_full(raw, &services, self.api.as_ref()))
            .collect();

        Ok(restore_order(files, ids, |file: &FullFile| file.basic.file_id))
    }

    pub async fn get_file_by_id(&self, id: u64) -> Result<Option<FullFile>, ApiError> {
        Ok(self.get_file_metadata(&[id]).await?.into_iter().next())
    }

    pub async fn get_file_by_hash(&self, hash: &str) -> Result<Option<FullFile>, ApiError> {
        let selector = FileSelector::Hashes(vec![hash.to_ascii_lowercase()]);
        let response = self
            .api
            .fetch_metadata(&selector, &MetadataOptions::full())
            .await?;
        Ok(response
            .metadata
            .first()
            .and_then(|raw| normalize_full(raw, &response.services, self.api.as_ref())))
    }

    /// Number of cached basic files
    pub fn files_cache_size(&self) -> u64 {
        self.cache.len()
    }

    pub fn clear_files_cache(&self) {
        self.cache.clear();
    }

    pub fn file_url(&self, hash: &str) -> String {
        self.api.file_url(hash)
    }

    pub fn thumbnail_url(&self, hash: &str) -> String {
        self.api.thumbnail_url(hash)
    }

    pub async fn fetch_file(&self, hash: &str) -> Result<Vec<u8>, ApiError> {
        self.api.fetch_file(hash).await
    }

    // Mutations never touch the cache.

    pub async fn delete_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        info!(count = selector.len(), "Deleting files");
        self.api.delete_files(selector).await
    }

    pub async fn undelete_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        info!(count = selector.len(), "Undeleting files");
        self.api.undelete_files(selector).await
    }

    pub async fn archive_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        info!(count = selector.len(), "Archiving files");
        self.api.archive_files(selector).await
    }

    pub async fn unarchive_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        info!(count = selector.len(), "Unarchiving files");
        self.api.unarchive_files(selector).await
    }

    pub async fn api_version(&self) -> Result<ApiVersion, ApiError> {
        self.api.api_version().await
    }
}

/// Lowercase and deduplicate hashes, keeping first occurrences
fn normalize_hashes(hashes: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    hashes
        .iter()
        .map(|hash| hash.to_ascii_lowercase())
        .filter(|hash| seen.insert(hash.clone()))
        .collect()
}

/// Sort items by the position of their key in `order`.
///
/// Items whose key is not in `order` are dropped, as are repeats of a key
/// already placed.
fn restore_order<T, K, F>(items: Vec<T>, order: &[K], key: F) -> Vec<T>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(order.len());
    for (index, k) in order.iter().enumerate() {
        positions.entry(k.clone()).or_insert(index);
    }

    let mut placed: Vec<(usize, T)> = Vec::with_capacity(items.len());
    let mut used = HashSet::new();
    for item in items {
        if let Some(&position) = positions.get(&key(&item)) {
            if used.insert(position) {
                placed.push((position, item));
            }
        }
    }
    placed.sort_by_key(|(position, _)| *position);
    placed.into_iter().map(|(_, item)| item).collect()
}
