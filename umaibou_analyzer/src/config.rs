// THEORY:
// Configuration is read once at start-up from the environment and is immutable
// afterwards. Every request shares it, along with the pooled HTTP client built
// from it. Parsing goes through a lookup function so tests can feed a map
// instead of mutating the process environment.

use crate::core_modules::render_orchestrator::RenderMode;

pub const RENDERER_URL_VAR: &str = "RENDERER_API_URL";
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ENDPOINT_VAR: &str = "OPENAI_ENDPOINT";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const RENDER_MODE_VAR: &str = "UMAIBOU_RENDER_MODE";

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Connection details for the chat-completions provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceConfig {
    pub api_key: String,
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub endpoint: String,
    pub model: String,
}

/// Everything the pipeline needs to reach its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub renderer_url: String,
    pub inference: InferenceConfig,
    pub render_mode: RenderMode,
}

impl AnalyzerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Resolves the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let renderer_url = require(RENDERER_URL_VAR)?;
        if !(renderer_url.starts_with("http://") || renderer_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: RENDERER_URL_VAR,
                reason: format!("`{renderer_url}` is not an http(s) URL"),
            });
        }

        let render_mode = match get(RENDER_MODE_VAR) {
            Some(mode) => mode.parse().map_err(|reason| ConfigError::Invalid {
                var: RENDER_MODE_VAR,
                reason,
            })?,
            None => RenderMode::default(),
        };

        Ok(Self {
            renderer_url: renderer_url.trim_end_matches('/').to_string(),
            inference: InferenceConfig {
                api_key: require(API_KEY_VAR)?,
                endpoint: get(ENDPOINT_VAR)
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            render_mode,
        })
    }
}
