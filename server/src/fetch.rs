//! Dataset fetching: idempotent downloads into the data directory, existence
//! checks, and the clear-all operation.
//!
//! A file that already exists is never re-validated against its source;
//! re-downloading requires deleting it first. That is a policy decision for
//! this low-traffic local tool, not an oversight.

use std::io::{self, ErrorKind};

use serde::Serialize;
use tokio::fs;
use tracing::{error, info};

use super::{
    datasets::{Dataset, Download},
    state::AppState,
};

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    AlreadyExists,
    Downloaded,
    Error,
}

#[derive(Serialize, Debug)]
pub struct FileResult {
    pub filename: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct DeleteResult {
    pub filename: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn ensure_data_dir(state: &AppState) -> io::Result<()> {
    fs::create_dir_all(&state.config.data_dir).await
}

/// Fetch a single resource as text. Network failures and non-2xx responses
/// both surface as errors; there is no retry.
async fn fetch_text(state: &AppState, download: &Download) -> Result<String, String> {
    let response = state
        .http
        .get(&download.url)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    if !status.is_success() {
        return Err(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown")
        ));
    }

    response.text().await.map_err(|e| e.to_string())
}

async fn download_one(state: &AppState, dataset: &Dataset, download: &Download) -> FileResult {
    let filename = dataset.stored_filename(download);
    let path = state.config.data_dir.join(&filename);

    // Existence check only; the skip path just refreshes the hash.
    match fs::read(&path).await {
        Ok(data) => {
            let hash = state.cache.lock().unwrap().update_file_hash(&filename, &data);
            return FileResult {
                filename,
                status: FileStatus::AlreadyExists,
                hash: Some(hash),
                error: None,
            };
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            error!("Failed to read {}: {e}", path.display());
            return FileResult {
                filename,
                status: FileStatus::Error,
                hash: None,
                error: Some(e.to_string()),
            };
        }
    }

    info!("Downloading {} to {filename}", download.url);

    let data = match fetch_text(state, download).await {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to download {filename}: {e}");
            return FileResult {
                filename,
                status: FileStatus::Error,
                hash: None,
                error: Some(e),
            };
        }
    };

    if let Err(e) = fs::write(&path, &data).await {
        error!("Failed to write {}: {e}", path.display());
        return FileResult {
            filename,
            status: FileStatus::Error,
            hash: None,
            error: Some(e.to_string()),
        };
    }

    let hash = state
        .cache
        .lock()
        .unwrap()
        .update_file_hash(&filename, data.as_bytes());

    info!("Successfully downloaded {filename}");
    FileResult {
        filename,
        status: FileStatus::Downloaded,
        hash: Some(hash),
        error: None,
    }
}

/// Download every declared resource of `dataset`. A per-file failure never
/// aborts the siblings; the caller inspects the results for errors.
pub async fn download_dataset(state: &AppState, dataset: &Dataset) -> io::Result<Vec<FileResult>> {
    ensure_data_dir(state).await?;

    let mut results = Vec::with_capacity(dataset.downloads.len());
    for download in &dataset.downloads {
        results.push(download_one(state, dataset, download).await);
    }

    Ok(results)
}

/// Whether every declared file of `dataset` is present on disk.
pub async fn dataset_status(state: &AppState, dataset: &Dataset) -> io::Result<bool> {
    ensure_data_dir(state).await?;

    for download in &dataset.downloads {
        let path = state.config.data_dir.join(dataset.stored_filename(download));
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Delete every declared file of every known dataset and reset the content
/// cache. Missing files are reported, not treated as failures.
pub async fn clear_files(state: &AppState) -> Vec<DeleteResult> {
    let mut results = Vec::new();

    for dataset in state.registry.datasets() {
        for download in &dataset.downloads {
            let filename = dataset.stored_filename(download);
            let path = state.config.data_dir.join(&filename);

            let result = match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Deleted {filename}");
                    DeleteResult {
                        filename,
                        deleted: true,
                        error: None,
                    }
                }
                Err(e) if e.kind() == ErrorKind::NotFound => DeleteResult {
                    filename,
                    deleted: false,
                    error: Some("File not found".to_string()),
                },
                Err(e) => {
                    error!("Failed to delete {filename}: {e}");
                    DeleteResult {
                        filename,
                        deleted: false,
                        error: Some(e.to_string()),
                    }
                }
            };

            results.push(result);
        }
    }

    state.cache.lock().unwrap().clear();

    results
}
