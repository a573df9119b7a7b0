use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid level. Must be 0 (countries), 1 (states), or 2 (counties)")]
    InvalidLevel,

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Boundary data not available for level {0}. Please download the data first.")]
    DataUnavailable(u8),

    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    /// Internal error whose detail is only exposed in development mode.
    pub fn internal(message: impl Into<String>, detail: Option<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            detail,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidLevel | ApiError::UnknownDataset(_) => StatusCode::BAD_REQUEST,
            ApiError::DataUnavailable(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });

        if let ApiError::Internal {
            detail: Some(detail),
            ..
        } = &self
        {
            body["error"] = json!(detail);
        }

        (status, Json(body)).into_response()
    }
}
