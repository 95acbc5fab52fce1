use parking_lot::RwLock;
use std::sync::Arc;

use crate::{error::ServiceError, model::Predictor, types::ModelStatus};

enum Lifecycle {
    Loading,
    Ready(Arc<dyn Predictor>),
    Failed(String),
}

/// Holds the process-wide predictor.
///
/// Moves out of `Loading` at most once; after that the state is frozen and the
/// predictor is only ever read.
pub struct ModelHandle {
    inner: RwLock<Lifecycle>,
}

impl ModelHandle {
    pub fn loading() -> Self {
        Self {
            inner: RwLock::new(Lifecycle::Loading),
        }
    }

    pub fn ready(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            inner: RwLock::new(Lifecycle::Ready(predictor)),
        }
    }

    /// Install the loaded predictor. Returns false if the state was already settled.
    pub fn mark_ready(&self, predictor: Arc<dyn Predictor>) -> bool {
        let mut guard = self.inner.write();
        if !matches!(*guard, Lifecycle::Loading) {
            return false;
        }
        *guard = Lifecycle::Ready(predictor);
        true
    }

    /// Record a load failure. Returns false if the state was already settled.
    pub fn mark_failed(&self, reason: impl Into<String>) -> bool {
        let mut guard = self.inner.write();
        if !matches!(*guard, Lifecycle::Loading) {
            return false;
        }
        *guard = Lifecycle::Failed(reason.into());
        true
    }

    pub fn status(&self) -> ModelStatus {
        match *self.inner.read() {
            Lifecycle::Loading => ModelStatus::Loading,
            Lifecycle::Ready(_) => ModelStatus::Ready,
            Lifecycle::Failed(_) => ModelStatus::Failed,
        }
    }

    pub fn predictor(&self) -> Result<Arc<dyn Predictor>, ServiceError> {
        match &*self.inner.read() {
            Lifecycle::Ready(p) => Ok(Arc::clone(p)),
            Lifecycle::Loading => Err(ServiceError::ModelUnavailable(
                "model is still loading".into(),
            )),
            Lifecycle::Failed(reason) => Err(ServiceError::ModelUnavailable(format!(
                "model failed to load: {reason}"
            ))),
        }
    }
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHandle>,
}

impl AppState {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self { model }
    }

    pub fn with_predictor(predictor: Arc<dyn Predictor>) -> Self {
        Self::new(Arc::new(ModelHandle::ready(predictor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PredictError;

    struct Constant(f64);

    impl Predictor for Constant {
        fn predict(&self, _features: &[f64]) -> Result<f64, PredictError> {
            Ok(self.0)
        }
        fn n_features(&self) -> usize {
            10
        }
        fn kind(&self) -> &'static str {
            "constant"
        }
    }

    #[test]
    fn loading_then_ready() {
        let handle = ModelHandle::loading();
        assert_eq!(handle.status(), ModelStatus::Loading);
        assert!(handle.predictor().is_err());

        assert!(handle.mark_ready(Arc::new(Constant(3.0))));
        assert_eq!(handle.status(), ModelStatus::Ready);
        let p = handle.predictor().unwrap();
        assert_eq!(p.predict(&[0.0; 10]).unwrap(), 3.0);
    }

    #[test]
    fn settled_state_never_changes() {
        let handle = ModelHandle::loading();
        assert!(handle.mark_failed("network down"));
        assert!(!handle.mark_ready(Arc::new(Constant(1.0))));
        assert!(!handle.mark_failed("again"));
        assert_eq!(handle.status(), ModelStatus::Failed);

        let err = handle.predictor().err().unwrap();
        assert!(err.to_string().contains("network down"), "{err}");

        let ready = ModelHandle::ready(Arc::new(Constant(1.0)));
        assert!(!ready.mark_failed("late"));
        assert_eq!(ready.status(), ModelStatus::Ready);
    }
}
