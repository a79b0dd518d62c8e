// THEORY:
// The render orchestrator photographs an asset from every catalog viewpoint and
// hands back the images in catalog order. Inference needs all three views, so
// a partial set is worthless: the first failed call aborts the whole batch and
// nothing is retried.
//
// Key architectural principles:
// 1.  **Ordering**: `RenderedImages[i]` is always the image for `ViewKind::ALL[i]`.
//     The type always holds exactly `VIEW_COUNT` entries.
// 2.  **Fail-fast**: In sequential mode, the remaining views are never requested
//     after a failure. In parallel mode, `try_join_all` drops the still in-flight
//     calls as soon as one fails.
// 3.  **Shared asset**: Every call reads the same immutable `Asset` buffer; the
//     orchestrator never copies or mutates the payload.

use crate::core_modules::asset::Asset;
use crate::core_modules::renderer::{RenderError, Renderer};
use crate::core_modules::viewpoint::{VIEW_COUNT, ViewKind};
use bytes::Bytes;
use futures::future::try_join_all;
use std::str::FromStr;
use tracing::{debug, info};

/// How the viewpoint calls are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One round trip after another, in catalog order.
    #[default]
    Sequential,
    /// All calls in flight at once; results are reassembled in catalog order.
    Parallel,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(RenderMode::Sequential),
            "parallel" => Ok(RenderMode::Parallel),
            other => Err(format!("unknown render mode `{other}` (expected `sequential` or `parallel`)")),
        }
    }
}

/// A render failure, tagged with the view that caused it.
#[derive(Debug, thiserror::Error)]
#[error("rendering the {view} view failed: {source}")]
pub struct ViewRenderError {
    pub view: ViewKind,
    #[source]
    pub source: RenderError,
}

/// One image per catalog viewpoint, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedImages(Vec<Bytes>);

impl RenderedImages {
    /// Wraps images already in catalog order. `None` unless there is exactly one per view.
    pub fn from_ordered(images: Vec<Bytes>) -> Option<Self> {
        (images.len() == VIEW_COUNT).then_some(Self(images))
    }

    pub fn as_slice(&self) -> &[Bytes] {
        &self.0
    }
}

/// Renders `asset` from every catalog viewpoint.
#[tracing::instrument(skip_all, fields(file_name = asset.file_name(), mode = ?mode))]
pub async fn render_all<R: Renderer>(
    renderer: &R,
    asset: &Asset,
    mode: RenderMode,
) -> Result<RenderedImages, ViewRenderError> {
    let images = match mode {
        RenderMode::Sequential => {
            let mut images = Vec::with_capacity(VIEW_COUNT);
            for view in ViewKind::ALL {
                images.push(render_view(renderer, asset, view).await?);
            }
            images
        }
        RenderMode::Parallel => try_join_all(ViewKind::ALL.map(|view| render_view(renderer, asset, view))).await?,
    };

    info!(count = images.len(), "rendered all viewpoints");
    Ok(RenderedImages(images))
}

async fn render_view<R: Renderer>(renderer: &R, asset: &Asset, view: ViewKind) -> Result<Bytes, ViewRenderError> {
    debug!(%view, "requesting render");
    renderer
        .render(asset, view.viewpoint())
        .await
        .map_err(|source| ViewRenderError { view, source })
}
