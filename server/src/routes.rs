use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    boundaries::{self, BoundaryResponse},
    error::ApiError,
    fetch::{self, FileStatus},
    state::AppState,
};

/// Level arrives as a raw path segment so that non-numeric or out-of-range
/// values produce the validation error, not a framework rejection.
fn parse_level(raw: &str) -> Result<u8, ApiError> {
    raw.parse::<u8>()
        .ok()
        .filter(|level| *level <= 2)
        .ok_or(ApiError::InvalidLevel)
}

pub async fn boundaries_handler(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
) -> Result<Json<BoundaryResponse>, ApiError> {
    let level = parse_level(&level)?;
    let response = boundaries::get_boundaries(&state, level, None).await?;
    Ok(Json(response))
}

pub async fn boundaries_scoped_handler(
    State(state): State<Arc<AppState>>,
    Path((level, parent_code)): Path<(String, String)>,
) -> Result<Json<BoundaryResponse>, ApiError> {
    let level = parse_level(&level)?;
    let response = boundaries::get_boundaries(&state, level, Some(&parent_code)).await?;
    Ok(Json(response))
}

pub async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(dataset_key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    info!("Getting status for {dataset_key}");

    let dataset = state
        .registry
        .get(&dataset_key)
        .ok_or_else(|| ApiError::UnknownDataset(dataset_key.clone()))?;

    let status = fetch::dataset_status(&state, dataset).await.map_err(|e| {
        error!("Error checking data status: {e}");
        ApiError::internal("Failed to check data status", state.error_detail(&e))
    })?;

    Ok(Json(json!({
        "success": true,
        "dataset": dataset_key,
        "status": status,
    })))
}

pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    Path(dataset_key): Path<String>,
) -> Result<Response, ApiError> {
    info!("Starting {dataset_key} data download...");

    let dataset = state
        .registry
        .get(&dataset_key)
        .ok_or_else(|| ApiError::UnknownDataset(dataset_key.clone()))?;

    let results = fetch::download_dataset(&state, dataset).await.map_err(|e| {
        error!("Download error: {e}");
        ApiError::internal("Download failed", state.error_detail(&e))
    })?;

    let errored = results
        .iter()
        .filter(|r| r.status == FileStatus::Error)
        .count();

    if errored == 0 {
        Ok(Json(json!({
            "success": true,
            "dataset": dataset_key,
            "message": format!("Successfully processed {} files", results.len()),
            "results": results,
        }))
        .into_response())
    } else {
        // Partial failure keeps the per-file results visible.
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "dataset": dataset_key,
                "message": format!("Failed to download {errored} files"),
                "results": results,
            })),
        )
            .into_response())
    }
}

pub async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let results = fetch::clear_files(&state).await;

    Json(json!({
        "success": true,
        "message": "All files cleared",
        "results": results,
    }))
}
