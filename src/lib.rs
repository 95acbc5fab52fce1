//! Bike demand prediction service.
//!
//! A pre-trained regression model is fetched once at startup (from the Hugging
//! Face hub or a local file) and served over HTTP: `GET /` for health and
//! `GET`/`POST /predict` for ten-feature demand predictions.

pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod server;
pub mod state;
pub mod types;

pub use config::{ServiceConfig, StartupPolicy};
pub use error::{LoadError, PredictError, ServiceError};
pub use model::Predictor;
pub use server::{router, serve};
pub use state::{AppState, ModelHandle};
pub use types::{FeatureVector, PredictionResponse, FEATURE_COUNT, FEATURE_NAMES};
