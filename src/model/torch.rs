use parking_lot::Mutex;
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use super::{check_len, Predictor};
use crate::error::{LoadError, PredictError};

/// TorchScript regression module taking a `[1, n_features]` float row.
pub struct TorchScriptRegressor {
    module: Mutex<CModule>,
    device: Device,
    n_features: usize,
}

impl TorchScriptRegressor {
    pub fn load(path: &Path, n_features: usize) -> Result<Self, LoadError> {
        let device = Device::Cpu;
        let module = CModule::load_on_device(path, device)?;

        // Probe output shape with a dummy forward; expect one scalar per row.
        let dummy = Tensor::zeros([1, n_features as i64], (Kind::Float, device));
        let out = tch::no_grad(|| module.forward_ts(&[dummy]))?;
        if out.numel() != 1 {
            return Err(LoadError::InvalidModel(format!(
                "TorchScript module returned shape {:?}, expected a single value",
                out.size()
            )));
        }

        Ok(Self {
            module: Mutex::new(module),
            device,
            n_features,
        })
    }
}

impl Predictor for TorchScriptRegressor {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictError> {
        check_len(features, self.n_features)?;

        let row: Vec<f32> = features.iter().map(|x| *x as f32).collect();
        let input = Tensor::from_slice(&row)
            .reshape([1, self.n_features as i64])
            .to_device(self.device);

        let module = self.module.lock();
        let out = tch::no_grad(|| module.forward_ts(&[input]))
            .map_err(|e| PredictError::Backend(e.to_string()))?;
        let flat = out.to_kind(Kind::Double).flatten(0, -1);
        if flat.numel() != 1 {
            return Err(PredictError::Backend(format!(
                "unexpected output shape: {:?}",
                out.size()
            )));
        }
        Ok(flat.double_value(&[0]))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "torchscript"
    }
}
