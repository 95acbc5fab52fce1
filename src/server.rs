use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::{ServiceConfig, StartupPolicy},
    error::ServiceError,
    loader,
    state::{AppState, ModelHandle},
    types::{FeatureVector, HealthResponse, ModelStatus, PredictionResponse},
};

// ---------- Router ----------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/predict", get(predict_query).post(predict_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------- Handlers ----------

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.model.status();
    let message = match status {
        ModelStatus::Ready => "Demand prediction API is running (model loaded)",
        ModelStatus::Loading => "Demand prediction API is running (model loading)",
        ModelStatus::Failed => "Demand prediction API is running (model not loaded)",
    };
    Json(HealthResponse {
        message: message.to_string(),
        status,
    })
}

async fn predict_query(
    State(state): State<AppState>,
    query: Result<Query<FeatureVector>, QueryRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Query(features) = query.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    run_prediction(&state, &features)
}

async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Json(features) = body.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;
    run_prediction(&state, &features)
}

fn run_prediction(
    state: &AppState,
    features: &FeatureVector,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let predictor = state.model.predictor()?;
    let row = features.to_array();
    let value = predictor.predict(&row)?;
    tracing::debug!(?row, value, "prediction");
    Ok(Json(PredictionResponse {
        predicted_demand: vec![value],
    }))
}

// ---------- Startup ----------

/// Build the shared state according to the startup policy.
///
/// `FailFast` returns the load error; `Degrade` returns immediately and
/// finishes loading in the background.
pub async fn init_state(cfg: &ServiceConfig) -> anyhow::Result<AppState> {
    match cfg.startup_policy {
        StartupPolicy::FailFast => {
            let load_cfg = cfg.clone();
            let predictor =
                tokio::task::spawn_blocking(move || loader::load_model(&load_cfg)).await??;
            Ok(AppState::with_predictor(predictor))
        }
        StartupPolicy::Degrade => {
            let handle = Arc::new(ModelHandle::loading());
            let bg = Arc::clone(&handle);
            let load_cfg = cfg.clone();
            tokio::spawn(async move {
                match tokio::task::spawn_blocking(move || loader::load_model(&load_cfg)).await {
                    Ok(Ok(predictor)) => {
                        bg.mark_ready(predictor);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("serving without a model; /predict will answer 503");
                        bg.mark_failed(e.to_string());
                    }
                    Err(join) => {
                        bg.mark_failed(format!("loader task aborted: {join}"));
                    }
                }
            });
            Ok(AppState::new(handle))
        }
    }
}

pub async fn serve(cfg: ServiceConfig) -> anyhow::Result<()> {
    let addr = cfg.bind_addr()?;
    let state = init_state(&cfg).await?;
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
