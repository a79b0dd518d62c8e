// THEORY:
// The server crate is the thin HTTP shell around `AnalysisPipeline`. It owns
// three jobs and nothing else:
//
// 1.  **Extraction**: Pull the `usdzFile` part out of a multipart upload. A
//     request with no such part is passed on as "no upload" and the pipeline
//     rejects it like any other bad input.
// 2.  **Mapping**: Turn `AnalyzeError` into a status code. Input and validation
//     failures are 400s with the rule's message; render and inference failures
//     are 500s carrying the underlying message for diagnostics.
// 3.  **Serving**: Bind, apply the upload size limit and run the router.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use umaibou_analyzer::config::ConfigError;
use umaibou_analyzer::pipeline::{AnalysisPipeline, AnalyzeError, MonsterStats, Renderer, StatInference, Upload};

/// Upload route, plus the capitalised spelling older clients still post to.
pub const ANALYZE_ROUTES: [&str; 2] = ["/api/analyze", "/api/Analyze"];

/// Multipart field carrying the model file.
pub const UPLOAD_FIELD: &str = "usdzFile";

pub const BIND_VAR: &str = "UMAIBOU_BIND";
pub const MAX_UPLOAD_VAR: &str = "UMAIBOU_MAX_UPLOAD_MB";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_MAX_UPLOAD_MB: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Request bodies larger than this are refused with 413.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(bind) = lookup(BIND_VAR).filter(|v| !v.trim().is_empty()) {
            cfg.bind_addr = bind.trim().to_string();
        }
        if let Some(mb) = lookup(MAX_UPLOAD_VAR).filter(|v| !v.trim().is_empty()) {
            let mb: usize = mb.trim().parse().map_err(|e| ConfigError::Invalid {
                var: MAX_UPLOAD_VAR,
                reason: format!("{e}"),
            })?;
            cfg.max_upload_bytes = mb.checked_mul(1024 * 1024).ok_or_else(|| ConfigError::Invalid {
                var: MAX_UPLOAD_VAR,
                reason: format!("{mb} MiB does not fit in memory"),
            })?;
        }
        Ok(cfg)
    }
}

/// Body of every non-200 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub error_message: String,
}

impl AnalyzeResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: message.into(),
        }
    }
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Analyze(AnalyzeError),
    Multipart(MultipartError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Analyze(err) if err.is_client_error() => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Analyze(err) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal server error: {err}")),
            ApiError::Multipart(err) => {
                warn!(error = %err, "unreadable multipart body");
                (err.status(), err.body_text())
            }
        };
        (status, Json(AnalyzeResponse::failure(message))).into_response()
    }
}

pub struct AppState<R, I> {
    pipeline: Arc<AnalysisPipeline<R, I>>,
}

impl<R, I> Clone for AppState<R, I> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Builds the application router around a shared pipeline.
pub fn router<R, I>(pipeline: Arc<AnalysisPipeline<R, I>>, max_upload_bytes: usize) -> Router
where
    R: Renderer + 'static,
    I: StatInference + 'static,
{
    ANALYZE_ROUTES
        .into_iter()
        .fold(Router::new(), |router, path| router.route(path, post(analyze::<R, I>)))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(AppState { pipeline })
}

async fn analyze<R, I>(
    State(state): State<AppState<R, I>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MonsterStats>, ApiError>
where
    R: Renderer + 'static,
    I: StatInference + 'static,
{
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await.map_err(ApiError::Multipart)?,
        Err(rejection) => {
            debug!(%rejection, "request carried no multipart body");
            None
        }
    };

    let stats = state.pipeline.analyze(upload).await.map_err(ApiError::Analyze)?;
    Ok(Json(stats))
}

/// Returns the first `usdzFile` part, ignoring any other fields.
async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        return Ok(Some(Upload::new(file_name, bytes)));
    }
    Ok(None)
}

/// Binds `cfg.bind_addr` and serves the analyzer on a background task.
pub async fn start_server<R, I>(
    cfg: ServerConfig,
    pipeline: Arc<AnalysisPipeline<R, I>>,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)>
where
    R: Renderer + 'static,
    I: StatInference + 'static,
{
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    let addr = listener.local_addr()?;
    let app = router(pipeline, cfg.max_upload_bytes);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "server stopped");
        }
    });
    info!(%addr, max_upload_bytes = cfg.max_upload_bytes, "analyzer listening");
    Ok((addr, server))
}

/// Installs the `tracing` subscriber. `RUST_LOG` overrides the default `info` filter.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
