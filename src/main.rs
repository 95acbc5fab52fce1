use anyhow::Context;
use demand_server::{serve, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = ServiceConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        port = cfg.port,
        repo = %cfg.repo_id,
        file = %cfg.model_file,
        policy = ?cfg.startup_policy,
        token = cfg.hf_token.is_some(),
        "starting demand prediction service"
    );

    serve(cfg).await.context("server exited with error")
}
