use std::sync::Arc;

use anyhow::Context;
use lectern_core::llm::{LanguageModel, OpenAiClient};
use lectern_core::store::SqliteStore;
use lectern_core::{Config, Pipeline, RateGovernor};
use rmcp::ServiceExt;

mod logging;
mod resources;
mod server;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // The guard keeps the file writer alive until shutdown.
    let _log_guard = logging::init().context("failed to initialize logging")?;

    let config = Config::from_env();
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    tracing::info!(db_path = %config.db_path.display(), "initializing document store");
    let store = Arc::new(
        SqliteStore::open(&config.db_path)
            .with_context(|| format!("failed to open store at {}", config.db_path.display()))?,
    );

    let http = reqwest::Client::new();
    let model: Arc<dyn LanguageModel> =
        Arc::new(OpenAiClient::new(http.clone(), &config.openai_api_key));
    let governor = Arc::new(RateGovernor::new());
    let pipeline = Arc::new(Pipeline::new(config, store, model, governor));

    tracing::info!("starting lectern server on stdio");
    let service = server::LecternServer::new(pipeline, http)
        .serve(rmcp::transport::io::stdio())
        .await
        .context("failed to start MCP service")?;
    service.waiting().await.context("server terminated abnormally")?;

    tracing::info!("lectern server shut down");
    Ok(())
}
