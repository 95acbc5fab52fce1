//! Error types shared by the loader, the predictors and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

use crate::types::ErrorBody;

/// Failures while fetching or deserializing the model artifact.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to download {filename} from {repo_id}: {source}")]
    Download {
        repo_id: String,
        filename: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },

    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("unsupported artifact format {extension:?}; export the model to JSON (.json) or TorchScript (.pt)")]
    UnsupportedFormat { extension: String },

    #[error("model expects {got} features, service provides {expected}")]
    FeatureMismatch { got: usize, expected: usize },

    #[cfg(feature = "torch")]
    #[error("torch error: {0}")]
    Torch(#[from] tch::TchError),
}

/// Failures raised by a loaded predictor at inference time.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    FeatureLength { got: usize, expected: usize },

    #[error("inference failed: {0}")]
    Backend(String),
}

/// Errors surfaced to HTTP clients.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Prediction(#[from] PredictError),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, error = %self, "predict request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
