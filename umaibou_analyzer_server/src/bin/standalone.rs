use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use umaibou_analyzer::config::AnalyzerConfig;
use umaibou_analyzer::pipeline::AnalysisPipeline;
use umaibou_analyzer_server::{ServerConfig, init_logging, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let analyzer_cfg = AnalyzerConfig::from_env().context("loading analyzer configuration")?;
    let server_cfg = ServerConfig::from_env().context("loading server configuration")?;
    info!(
        renderer = %analyzer_cfg.renderer_url,
        endpoint = %analyzer_cfg.inference.endpoint,
        model = %analyzer_cfg.inference.model,
        render_mode = ?analyzer_cfg.render_mode,
        "configuration loaded"
    );

    // One pooled client for the renderer and the model provider.
    let client = reqwest::Client::builder().build().context("building HTTP client")?;
    let pipeline = Arc::new(AnalysisPipeline::from_config(&analyzer_cfg, client));

    let (_addr, handle) = start_server(server_cfg, pipeline).await?;
    // Park until the server task exits.
    handle.await.ok();
    Ok(())
}
