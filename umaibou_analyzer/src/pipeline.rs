// THEORY:
// The `pipeline` module is the top-level API for the analyzer. It sequences the
// stages for one uploaded model and maps the outcome to a single result:
//
//   upload checks → render every viewpoint → infer stats → validate → stats
//
// Key architectural principles:
// 1.  **Fail-fast**: Each stage runs once. The first failure ends the request,
//     and no partial or degraded stat sheet is ever returned.
// 2.  **Typed outcomes**: `AnalyzeError` keeps the four failure classes apart, so
//     callers can tell a bad upload or a rejected stat sheet (the client's
//     problem) from a render or inference failure (ours).
// 3.  **Explicit composition**: The renderer and the inference client are built
//     once from configuration and handed in. The pipeline holds no per-request
//     state, so one instance serves concurrent requests.

use crate::config::AnalyzerConfig;
use crate::core_modules::asset::Asset;
use crate::core_modules::render_orchestrator::render_all;
use crate::core_modules::validator::validate;
use std::fmt;
use tracing::{error, info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::asset::{InputError, Upload};
pub use crate::core_modules::inference::{InferenceError, OpenAiInference, StatInference};
pub use crate::core_modules::monster_stats::{ElementType, MonsterStats, StatField};
pub use crate::core_modules::render_orchestrator::{RenderMode, RenderedImages, ViewRenderError};
pub use crate::core_modules::renderer::{HttpRenderer, RenderError, Renderer};
pub use crate::core_modules::validator::ValidationError;
pub use crate::core_modules::viewpoint::{ViewKind, Viewpoint};

/// The stage a request failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Render,
    Inference,
    Validation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Upload => "upload",
            Stage::Render => "render",
            Stage::Inference => "inference",
            Stage::Validation => "validation",
        })
    }
}

/// Why an analysis produced no stat sheet.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Render(#[from] ViewRenderError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AnalyzeError {
    pub fn stage(&self) -> Stage {
        match self {
            AnalyzeError::Input(_) => Stage::Upload,
            AnalyzeError::Render(_) => Stage::Render,
            AnalyzeError::Inference(_) => Stage::Inference,
            AnalyzeError::Validation(_) => Stage::Validation,
        }
    }

    /// Bad uploads and rejected stat sheets are the caller's problem; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalyzeError::Input(_) | AnalyzeError::Validation(_))
    }
}

/// Runs uploads through render → infer → validate.
#[derive(Debug)]
pub struct AnalysisPipeline<R, I> {
    renderer: R,
    inference: I,
    render_mode: RenderMode,
}

impl<R: Renderer, I: StatInference> AnalysisPipeline<R, I> {
    pub fn new(renderer: R, inference: I) -> Self {
        Self {
            renderer,
            inference,
            render_mode: RenderMode::default(),
        }
    }

    pub fn with_render_mode(mut self, render_mode: RenderMode) -> Self {
        self.render_mode = render_mode;
        self
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn inference(&self) -> &I {
        &self.inference
    }

    /// Analyzes one upload. Every failure is logged with the file name and stage before it is returned.
    #[tracing::instrument(skip_all, fields(file_name = upload.as_ref().map_or("<none>", |u| u.file_name.as_str())))]
    pub async fn analyze(&self, upload: Option<Upload>) -> Result<MonsterStats, AnalyzeError> {
        let file_name = upload.as_ref().map(|u| u.file_name.clone()).unwrap_or_default();

        match self.run(upload).await {
            Ok(stats) => {
                info!(monster = %stats.name, "analysis complete");
                Ok(stats)
            }
            Err(err) => {
                let stage = err.stage();
                if err.is_client_error() {
                    warn!(%file_name, %stage, error = %err, "analysis rejected");
                } else {
                    error!(%file_name, %stage, error = %err, "analysis failed");
                }
                Err(err)
            }
        }
    }

    async fn run(&self, upload: Option<Upload>) -> Result<MonsterStats, AnalyzeError> {
        // Stage 0: Upload shape
        let asset = Asset::from_upload(upload)?;
        info!(bytes = asset.byte_len(), "processing USDZ file");

        // Stage 1: Render every viewpoint
        let images = render_all(&self.renderer, &asset, self.render_mode).await?;

        // Stage 2: Schema-constrained inference
        let stats = self.inference.infer(&images).await?;

        // Stage 3: Domain validation
        validate(&stats)?;
        Ok(stats)
    }
}

impl AnalysisPipeline<HttpRenderer, OpenAiInference> {
    /// Wires the HTTP-backed collaborators. `client` is shared by both and pooled across requests.
    pub fn from_config(config: &AnalyzerConfig, client: reqwest::Client) -> Self {
        AnalysisPipeline::new(
            HttpRenderer::new(client.clone(), &config.renderer_url),
            OpenAiInference::new(client, &config.inference),
        )
        .with_render_mode(config.render_mode)
    }
}
