//! Client-side data manager for the dashboard backend.
//!
//! Caches boundary responses keyed by `(level, parentCode)` and reuses them
//! until the server-reported version token changes. The version is global to
//! the manager, not per file, so any backend data change invalidates every
//! cached level on the next fetch.
//!
//! Connectivity tracking distinguishes transport failures (server
//! unreachable) from application-level error responses: only the former flip
//! the connected flag, and the next successful request flips it back. No
//! retry or backoff is performed anywhere; retry is caller-triggered.

use std::{collections::HashMap, env};

use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connection(reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(reqwest::Error),

    #[error("server error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Deserialize, Clone, Debug)]
pub struct BoundaryResponse {
    pub success: bool,
    pub data: Value,
    pub version: String,
    pub metadata: BoundaryMetadata,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryMetadata {
    pub level: u8,
    pub parent_code: Option<String>,
    pub count: usize,
    pub source_file: String,
}

#[derive(Deserialize, Debug)]
pub struct StatusResponse {
    pub success: bool,
    pub dataset: String,
    pub status: bool,
}

#[derive(Deserialize, Debug)]
pub struct DownloadResponse {
    pub success: bool,
    pub dataset: String,
    pub message: String,
    pub results: Vec<FileResult>,
}

#[derive(Deserialize, Debug)]
pub struct FileResult {
    pub filename: String,
    pub status: String,
    pub hash: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ClearResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<DeleteResult>,
}

#[derive(Deserialize, Debug)]
pub struct DeleteResult {
    pub filename: String,
    pub deleted: bool,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: String,
}

#[derive(Debug)]
pub struct CacheStatus {
    pub entries: usize,
    pub keys: Vec<String>,
    pub server_version: Option<String>,
}

struct CacheEntry {
    data: Value,
    version: String,
}

fn cache_key(level: u8, parent_code: Option<&str>) -> String {
    match parent_code {
        Some(parent) => format!("{level}-{parent}"),
        None => level.to_string(),
    }
}

fn is_cache_valid(entry_version: &str, server_version: Option<&str>) -> bool {
    server_version == Some(entry_version)
}

pub struct DataManager {
    http: Client,
    base_url: String,
    boundaries: HashMap<String, CacheEntry>,
    server_version: Option<String>,
    connected: bool,
    connection_error: Option<String>,
}

impl DataManager {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            boundaries: HashMap::new(),
            server_version: None,
            connected: true,
            connection_error: None,
        }
    }

    /// Base URL from `API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        Self::new(env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()))
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn connection_error(&self) -> Option<&str> {
        self.connection_error.as_deref()
    }

    /// Boundary data for `(level, parent_code)`, served from the local cache
    /// when the stored version still matches the last known server version.
    pub async fn get_boundaries(
        &mut self,
        level: u8,
        parent_code: Option<&str>,
    ) -> Result<Value, ClientError> {
        let key = cache_key(level, parent_code);

        if let Some(entry) = self.boundaries.get(&key) {
            if is_cache_valid(&entry.version, self.server_version.as_deref()) {
                return Ok(entry.data.clone());
            }
        }

        let url = match parent_code {
            Some(parent) => format!("{}/api/boundaries/{level}/{parent}", self.base_url),
            None => format!("{}/api/boundaries/{level}", self.base_url),
        };

        let response: BoundaryResponse = self.request(Method::GET, &url).await?;

        self.server_version = Some(response.version.clone());
        self.boundaries.insert(
            key,
            CacheEntry {
                data: response.data.clone(),
                version: response.version,
            },
        );

        Ok(response.data)
    }

    pub async fn dataset_status(&mut self, dataset_key: &str) -> Result<bool, ClientError> {
        let url = format!("{}/api/data/status/{dataset_key}", self.base_url);
        let response: StatusResponse = self.request(Method::GET, &url).await?;
        Ok(response.status)
    }

    pub async fn download_dataset(
        &mut self,
        dataset_key: &str,
    ) -> Result<DownloadResponse, ClientError> {
        let url = format!("{}/api/data/download/{dataset_key}", self.base_url);
        self.request(Method::POST, &url).await
    }

    pub async fn clear_files(&mut self) -> Result<ClearResponse, ClientError> {
        let url = format!("{}/api/data/files", self.base_url);
        self.request(Method::DELETE, &url).await
    }

    pub fn clear_cache(&mut self) {
        self.boundaries.clear();
        self.server_version = None;
    }

    pub fn cache_status(&self) -> CacheStatus {
        let mut keys: Vec<String> = self.boundaries.keys().cloned().collect();
        keys.sort();

        CacheStatus {
            entries: self.boundaries.len(),
            keys,
            server_version: self.server_version.clone(),
        }
    }

    async fn request<T: DeserializeOwned>(
        &mut self,
        method: Method,
        url: &str,
    ) -> Result<T, ClientError> {
        let response = match self.http.request(method, url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Network error: {e}");
                self.connected = false;
                self.connection_error = Some(e.to_string());
                return Err(ClientError::Connection(e));
            }
        };

        // The server answered, even if with an error payload.
        self.connected = true;
        self.connection_error = None;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));

            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(ClientError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_composition() {
        assert_eq!(cache_key(0, None), "0");
        assert_eq!(cache_key(1, Some("US")), "1-US");
        assert_eq!(cache_key(2, Some("US-CA")), "2-US-CA");
    }

    #[test]
    fn cache_validity_requires_matching_version() {
        assert!(is_cache_valid("abc123", Some("abc123")));
        assert!(!is_cache_valid("abc123", Some("def456")));
        assert!(!is_cache_valid("abc123", None));
    }

    #[test]
    fn manager_starts_connected_and_empty() {
        let manager = DataManager::new(DEFAULT_API_URL);
        assert!(manager.is_connected());
        assert_eq!(manager.connection_error(), None);

        let status = manager.cache_status();
        assert_eq!(status.entries, 0);
        assert_eq!(status.server_version, None);
    }
}
