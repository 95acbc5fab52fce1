//! Inference backends.
//!
//! A predictor is loaded once at startup and then shared read-only across all
//! request handlers, so implementations must be `Send + Sync`.

pub mod forest;
#[cfg(feature = "torch")]
pub mod torch;

pub use forest::RandomForestRegressor;
#[cfg(feature = "torch")]
pub use torch::TorchScriptRegressor;

use crate::error::PredictError;

pub trait Predictor: Send + Sync {
    /// Map one ordered feature row to a scalar prediction.
    fn predict(&self, features: &[f64]) -> Result<f64, PredictError>;

    /// Input width the model was trained on.
    fn n_features(&self) -> usize;

    /// Column names recorded in the artifact, if it carries any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Short backend label for logs.
    fn kind(&self) -> &'static str;
}

pub(crate) fn check_len(features: &[f64], expected: usize) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::FeatureLength {
            got: features.len(),
            expected,
        });
    }
    Ok(())
}
