// THEORY:
// The `Renderer` is the narrow seam to the external rendering service: one
// call, one viewpoint, one image. It knows nothing about how many views exist
// or what order they go in; that belongs to the render orchestrator.
//
// `HttpRenderer` speaks the service's protocol: a multipart POST to
// `{base}/render` carrying the whole USDZ payload plus the viewpoint JSON. The
// protocol has no batch form, so the asset is attached again on every call.

use crate::core_modules::asset::{Asset, USDZ_CONTENT_TYPE};
use crate::core_modules::viewpoint::Viewpoint;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use std::future::Future;
use tracing::debug;

const ASSET_PART: &str = "usdzFile";
const VIEWPOINT_PART: &str = "viewpointJson";

/// A failed render call.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("renderer returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to encode viewpoint: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Produces one image of `asset` as seen from `viewpoint`.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        asset: &Asset,
        viewpoint: &Viewpoint,
    ) -> impl Future<Output = Result<Bytes, RenderError>> + Send;
}

/// Client for the rendering service's `/render` endpoint.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    render_url: String,
}

impl HttpRenderer {
    /// `client` is shared process-wide; `base_url` is the service root without `/render`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            render_url: format!("{}/render", base_url.trim_end_matches('/')),
        }
    }

    pub fn render_url(&self) -> &str {
        &self.render_url
    }

    fn form(asset: &Asset, viewpoint: &Viewpoint) -> Result<Form, RenderError> {
        let asset_part = Part::stream_with_length(asset.bytes(), asset.byte_len() as u64)
            .file_name(asset.file_name().to_string())
            .mime_str(USDZ_CONTENT_TYPE)?;
        let viewpoint_part = Part::text(serde_json::to_string(viewpoint)?).mime_str("application/json")?;

        Ok(Form::new()
            .part(ASSET_PART, asset_part)
            .part(VIEWPOINT_PART, viewpoint_part))
    }
}

impl Renderer for HttpRenderer {
    async fn render(&self, asset: &Asset, viewpoint: &Viewpoint) -> Result<Bytes, RenderError> {
        let form = Self::form(asset, viewpoint)?;
        let response = self.client.post(&self.render_url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status { status, body });
        }

        let image = response.bytes().await?;
        debug!(bytes = image.len(), "render call succeeded");
        Ok(image)
    }
}
