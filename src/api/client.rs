//! Hydrus Client API client
//!
//! Authenticated access to the file metadata, file, thumbnail and file
//! mutation endpoints. The [`HydrusApi`] and [`FileUrls`] traits are the seam
//! the rest of the crate talks to.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::errors::ApiError;
use super::types::{ApiVersion, FileSelector, MetadataOptions, MetadataResponse};
use crate::config::ClientConfig;

/// Header carrying the access key on API requests
pub const ACCESS_KEY_HEADER: &str = "Hydrus-Client-API-Access-Key";

/// Builds URLs a viewer can load directly
pub trait FileUrls {
    fn file_url(&self, hash: &str) -> String;
    fn thumbnail_url(&self, hash: &str) -> String;
}

/// Operations the metadata layer needs from the remote API
#[async_trait]
pub trait HydrusApi: FileUrls + Send + Sync {
    /// Fetch file records for the selected files
    async fn fetch_metadata(
        &self,
        selector: &FileSelector,
        options: &MetadataOptions,
    ) -> Result<MetadataResponse, ApiError>;

    /// Download the full file content
    async fn fetch_file(&self, hash: &str) -> Result<Vec<u8>, ApiError>;

    async fn delete_files(&self, selector: &FileSelector) -> Result<(), ApiError>;

    async fn undelete_files(&self, selector: &FileSelector) -> Result<(), ApiError>;

    async fn archive_files(&self, selector: &FileSelector) -> Result<(), ApiError>;

    async fn unarchive_files(&self, selector: &FileSelector) -> Result<(), ApiError>;

    async fn api_version(&self) -> Result<ApiVersion, ApiError>;
}

/// HTTP client for a single Hydrus client API endpoint
#[derive(Clone)]
pub struct HydrusClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL without trailing slash
    api_url: String,
    /// Client API access key
    access_key: String,
}

impl HydrusClient {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_timeout(&config.api_url, &config.access_key, config.timeout)
    }

    /// Create a client for an API URL with an explicit request timeout
    pub fn with_timeout(
        api_url: &str,
        access_key: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
        })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client
            .get(format!("{}{}", self.api_url, path))
            .header(ACCESS_KEY_HEADER, &self.access_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client
            .post(format!("{}{}", self.api_url, path))
            .header(ACCESS_KEY_HEADER, &self.access_key)
    }

    /// Turn a non-success response into an ApiError
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// POST a file selector to one of the add_files endpoints
    async fn post_selector(&self, path: &str, selector: &FileSelector) -> Result<(), ApiError> {
        info!(endpoint = path, count = selector.len(), "Sending file mutation");
        let response = self.post(path).json(selector).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Build the query string for a file_metadata request
    fn metadata_query(
        selector: &FileSelector,
        options: &MetadataOptions,
    ) -> Result<Vec<(&'static str, String)>, ApiError> {
        let encode = |e: serde_json::Error| ApiError::Request(e.to_string());
        let mut query = match selector {
            FileSelector::FileIds(ids) => {
                vec![("file_ids", serde_json::to_string(ids).map_err(encode)?)]
            }
            FileSelector::Hashes(hashes) => {
                vec![("hashes", serde_json::to_string(hashes).map_err(encode)?)]
            }
        };

        let flags = [
            ("only_return_identifiers", options.only_return_identifiers),
            ("only_return_basic_information", options.only_return_basic_information),
            ("detailed_url_information", options.detailed_url_information),
            ("include_notes", options.include_notes),
        ];
        query.extend(
            flags
                .into_iter()
                .filter(|(_, enabled)| *enabled)
                .map(|(name, _)| (name, "true".to_string())),
        );
        query.push(("include_services_object", "true".to_string()));
        Ok(query)
    }

    fn hash_url(&self, endpoint: &str, hash: &str) -> String {
        format!(
            "{}{}?hash={}&{}={}",
            self.api_url,
            endpoint,
            urlencoding::encode(hash),
            ACCESS_KEY_HEADER,
            urlencoding::encode(&self.access_key)
        )
    }
}

impl FileUrls for HydrusClient {
    fn file_url(&self, hash: &str) -> String {
        self.hash_url("/get_files/file", hash)
    }

    fn thumbnail_url(&self, hash: &str) -> String {
        self.hash_url("/get_files/thumbnail", hash)
    }
}

#[async_trait]
impl HydrusApi for HydrusClient {
    async fn fetch_metadata(
        &self,
        selector: &FileSelector,
        options: &MetadataOptions,
    ) -> Result<MetadataResponse, ApiError> {
        let query = Self::metadata_query(selector, options)?;
        debug!(count = selector.len(), options = ?options, "Fetching file metadata");

        let response: MetadataResponse =
            Self::send_json(self.get("/get_files/file_metadata").query(&query)).await?;

        debug!(
            requested = selector.len(),
            returned = response.metadata.len(),
            services = response.services.len(),
            "Fetched file metadata"
        );
        Ok(response)
    }

    async fn fetch_file(&self, hash: &str) -> Result<Vec<u8>, ApiError> {
        debug!(hash = hash, "Downloading file");

        let response = self
            .get("/get_files/file")
            .query(&[("hash", hash)])
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;

        debug!(hash = hash, size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    async fn delete_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        self.post_selector("/add_files/delete_files", selector).await
    }

    async fn undelete_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        self.post_selector("/add_files/undelete_files", selector).await
    }

    async fn archive_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        self.post_selector("/add_files/archive_files", selector).await
    }

    async fn unarchive_files(&self, selector: &FileSelector) -> Result<(), ApiError> {
        self.post_selector("/add_files/unarchive_files", selector).await
    }

    async fn api_version(&self) -> Result<ApiVersion, ApiError> {
        Self::send_json(self.get("/api_version")).await
    }
}
