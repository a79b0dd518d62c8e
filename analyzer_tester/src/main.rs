use anyhow::{Context, bail};
use std::env;
use std::path::Path;
use tracing::info;
use umaibou_analyzer::config::AnalyzerConfig;
use umaibou_analyzer::pipeline::{AnalysisPipeline, Upload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,reqwest=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Usage: analyzer_tester <model.usdz>");
        return Ok(());
    }
    let input_path = Path::new(&args[1]);

    let bytes = tokio::fs::read(input_path)
        .await
        .with_context(|| format!("reading {}", input_path.display()))?;
    let file_name = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    // --- 2. Pipeline Initialization ---
    let config = AnalyzerConfig::from_env().context("loading analyzer configuration")?;
    let client = reqwest::Client::builder().build().context("building HTTP client")?;
    let pipeline = AnalysisPipeline::from_config(&config, client);
    info!(file = %file_name, bytes = bytes.len(), mode = ?config.render_mode, "analyzing model");

    // --- 3. Analysis ---
    match pipeline.analyze(Some(Upload::new(file_name, bytes))).await {
        Ok(stats) => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Err(err) if err.is_client_error() => bail!("rejected at {} stage: {err}", err.stage()),
        Err(err) => bail!("failed at {} stage: {err}", err.stage()),
    }
}
