//! Client configuration from the environment

use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

use crate::files::DEFAULT_CHUNK_SIZE;

/// Default local client API address
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:45869";

/// HTTP client timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client API base URL
    pub api_url: String,
    /// Client API access key
    pub access_key: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Ids or hashes per file_metadata request
    pub chunk_size: usize,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_key: access_key.into(),
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read configuration from environment variables
    ///
    /// * `HYDRUS_API_URL` - base URL (default `http://127.0.0.1:45869`)
    /// * `HYDRUS_ACCESS_KEY` - access key (required)
    /// * `HYDRUS_TIMEOUT_SECS` - request timeout in seconds (default 30)
    /// * `HYDRUS_CHUNK_SIZE` - ids per metadata request (default 256)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("HYDRUS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let access_key = lookup("HYDRUS_ACCESS_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("Missing access key. Set the HYDRUS_ACCESS_KEY environment variable")?;

        let mut config = Self::new(api_url, access_key);

        if let Some(secs) = lookup("HYDRUS_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid HYDRUS_TIMEOUT_SECS: {}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(size) = lookup("HYDRUS_CHUNK_SIZE") {
            let size: usize = size
                .trim()
                .parse()
                .with_context(|| format!("Invalid HYDRUS_CHUNK_SIZE: {}", size))?;
            if size == 0 {
                return Err(anyhow!("HYDRUS_CHUNK_SIZE must be greater than zero"));
            }
            config.chunk_size = size;
        }

        Ok(config)
    }
}
