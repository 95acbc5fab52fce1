//! Resolve the model artifact (hub download or local file) and deserialize it.
//!
//! Everything here is blocking; call it from `spawn_blocking` inside the runtime.

use hf_hub::api::sync::{ApiBuilder, ApiError};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crate::{
    config::ServiceConfig,
    error::LoadError,
    model::{Predictor, RandomForestRegressor},
    types::{FEATURE_COUNT, FEATURE_NAMES},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    Hub {
        repo_id: String,
        filename: String,
        token: Option<String>,
    },
    Local(PathBuf),
}

impl ArtifactSource {
    pub fn from_config(cfg: &ServiceConfig) -> Self {
        match &cfg.model_path {
            Some(path) => ArtifactSource::Local(path.clone()),
            None => ArtifactSource::Hub {
                repo_id: cfg.repo_id.clone(),
                filename: cfg.model_file.clone(),
                token: cfg.hf_token.clone(),
            },
        }
    }

    /// Local path of the artifact, downloading into the hub cache if needed.
    pub fn fetch(&self) -> Result<PathBuf, LoadError> {
        match self {
            ArtifactSource::Local(path) => {
                if !path.is_file() {
                    return Err(LoadError::Io {
                        path: path.clone(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "artifact file not found",
                        ),
                    });
                }
                Ok(path.clone())
            }
            ArtifactSource::Hub {
                repo_id,
                filename,
                token,
            } => {
                let download_err = |source: ApiError| LoadError::Download {
                    repo_id: repo_id.clone(),
                    filename: filename.clone(),
                    source,
                };
                let api = ApiBuilder::new()
                    .with_token(token.clone())
                    .with_progress(false)
                    .build()
                    .map_err(download_err)?;
                api.model(repo_id.clone())
                    .get(filename)
                    .map_err(download_err)
            }
        }
    }
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactSource::Hub {
                repo_id, filename, ..
            } => write!(f, "hf://{repo_id}/{filename}"),
            ArtifactSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Deserialize an artifact already on disk, picking the backend by extension.
pub fn load_from_path(path: &Path) -> Result<Arc<dyn Predictor>, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let predictor: Arc<dyn Predictor> = match extension.as_str() {
        "json" => {
            let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Arc::new(RandomForestRegressor::from_json_slice(&bytes)?)
        }
        #[cfg(feature = "torch")]
        "pt" | "ts" => Arc::new(crate::model::TorchScriptRegressor::load(path, FEATURE_COUNT)?),
        _ => {
            return Err(LoadError::UnsupportedFormat {
                extension: extension.clone(),
            })
        }
    };

    check_schema(predictor.as_ref())?;
    Ok(predictor)
}

fn check_schema(predictor: &dyn Predictor) -> Result<(), LoadError> {
    if predictor.n_features() != FEATURE_COUNT {
        return Err(LoadError::FeatureMismatch {
            got: predictor.n_features(),
            expected: FEATURE_COUNT,
        });
    }
    if let Some(names) = predictor.feature_names() {
        if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(LoadError::InvalidModel(format!(
                "artifact feature order {names:?} does not match {FEATURE_NAMES:?}"
            )));
        }
    }
    Ok(())
}

/// Fetch and deserialize the configured model. Runs once per process.
pub fn load_model(cfg: &ServiceConfig) -> Result<Arc<dyn Predictor>, LoadError> {
    let source = ArtifactSource::from_config(cfg);
    let started = Instant::now();
    tracing::info!(%source, "loading model");

    let result = source.fetch().and_then(|path| {
        tracing::debug!(path = %path.display(), "artifact resolved");
        load_from_path(&path)
    });

    match &result {
        Ok(p) => tracing::info!(
            %source,
            kind = p.kind(),
            n_features = p.n_features(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model loaded"
        ),
        Err(e) => tracing::error!(%source, error = %e, "model load failed"),
    }
    result
}
