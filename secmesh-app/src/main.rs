mod config;
mod serve;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use secmesh_gateway::Gateway;
use secmesh_modules::build_module;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = config::AppConfig::from_env()?;
    info!(modules = ?config.modules, timeout_ms = config.timeout_ms, "starting secmesh");

    let gateway = Gateway::new(&config.modules, build_module, config.timeout_ms);
    for record in gateway.registry().failed() {
        info!(
            module = %record.identifier,
            reason = record.failure_reason.as_deref().unwrap_or("unknown"),
            "module unavailable, continuing without it"
        );
    }

    serve::run(gateway).await
}
