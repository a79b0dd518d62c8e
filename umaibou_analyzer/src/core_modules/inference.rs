// THEORY:
// The inference client turns the three rendered views into a stat sheet by
// asking a vision-capable chat model. Two things make the answer usable:
//
// 1.  **A fixed instruction**: The system prompt tells the model which image is
//     which view and how physical traits map onto stats. It is a constant, not
//     something a request can change.
// 2.  **Schema-constrained output**: The request carries a strict JSON schema
//     (`monster_stats`), so the reply is a single JSON object with exactly the
//     stat sheet's fields. The schema's numeric bounds are only hints to the
//     model; the validator still checks them.
//
// Any failure here (transport, HTTP status, refusal, unparseable JSON) is fatal
// for the request. Nothing is retried.

use crate::config::InferenceConfig;
use crate::core_modules::monster_stats::{ElementType, MonsterStats, STAT_MAX, STAT_MIN, StatField};
use crate::core_modules::render_orchestrator::RenderedImages;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Name of the response schema registered with the model.
pub const SCHEMA_NAME: &str = "monster_stats";

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Instruction sent ahead of the images on every request.
pub const SYSTEM_PROMPT: &str = "\
You will be given images of a snack food that has been carved into a shape.
The first image looks down on it obliquely from above, the second image is a straight side view, and the third image looks straight down from the top.
Guess what the silhouette represents and work out its parameters so it can be used as a monster in a game.
Every numeric field must be within the range 0-100.

## Fields
**name**
The name of the thing the images depict.

**hp**
Hit points. The larger the depicted thing is in real life, the higher its HP.

**speed**
Movement speed. The opposite of hp: the smaller the thing, the faster it moves.

**short_range_attack_power**
Melee attack power. The more solid and dense the thing is (metals, for example), the higher its melee attack power.

**long_range_attack_power**
Ranged attack power. The more elongated the shape, or the more pointed parts it has, the higher its ranged attack power.

**attack_range**
Attack reach. Decided by the size and spread of the sculpture. The wider it spreads out, the larger its attack range.

**attack_cooldown**
Attack cooldown. Decided by how intricate and heavy the sculpture is. Intricate, heavy sculptures have a longer cooldown (a larger value).

**attack_speed**
Attack speed. The more solid and dense the thing is, the lower its attack speed.

**defense_power**
Defense power. The more carefully crafted the sculpture is, the higher its defense power.

**type**
Elemental trait, judged from the colour of the snack. For example yellow is lightning, green is wind, red is fire and brown is earth.
";

/// Failures while asking the model for a stat sheet.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed completion response: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("model returned no content")]
    EmptyCompletion,
    #[error("model refused the request: {0}")]
    Refused(String),
    #[error("failed to deserialize monster stats: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Infers a stat sheet from the ordered views of one asset.
pub trait StatInference: Send + Sync {
    fn infer(&self, images: &RenderedImages) -> impl Future<Output = Result<MonsterStats, InferenceError>> + Send;
}

/// The strict JSON schema the model's reply must follow.
pub fn monster_stats_schema() -> Value {
    let mut properties = Map::new();
    properties.insert(
        "name".to_string(),
        json!({ "type": "string", "description": "Name of the thing the images depict" }),
    );
    for field in StatField::ALL {
        properties.insert(
            field.key().to_string(),
            json!({
                "type": "integer",
                "minimum": STAT_MIN,
                "maximum": STAT_MAX,
                "description": field.description(),
            }),
        );
    }
    properties.insert(
        "type".to_string(),
        json!({
            "type": "string",
            "enum": ElementType::ALL.map(ElementType::as_str),
            "description": "Elemental type",
        }),
    );

    let required: Vec<&str> = properties.keys().map(String::as_str).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Parses the model's JSON reply into a stat sheet.
pub fn parse_stats(content: &str) -> Result<MonsterStats, InferenceError> {
    serde_json::from_str(content).map_err(InferenceError::Deserialize)
}

/// Encodes an image as a `data:` URL, sniffing its format from the magic bytes.
pub fn image_data_url(image: &[u8]) -> String {
    let mime = image::guess_format(image)
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_IMAGE_MIME);
    format!("data:{mime};base64,{}", STANDARD.encode(image))
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum ChatMessage<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiInference {
    client: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for OpenAiInference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiInference")
            .field("completions_url", &self.completions_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiInference {
    pub fn new(client: reqwest::Client, config: &InferenceConfig) -> Self {
        Self {
            client,
            completions_url: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the request body: the fixed prompt, then one image part per view in catalog order.
    pub fn request(&self, images: &RenderedImages) -> ChatRequest<'_> {
        let parts = images
            .as_slice()
            .iter()
            .map(|image| ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image_data_url(image),
                },
            })
            .collect();

        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage::System { content: SYSTEM_PROMPT },
                ChatMessage::User { content: parts },
            ],
            response_format: ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME,
                    strict: true,
                    schema: monster_stats_schema(),
                },
            },
        }
    }
}

impl StatInference for OpenAiInference {
    async fn infer(&self, images: &RenderedImages) -> Result<MonsterStats, InferenceError> {
        let request = self.request(images);
        debug!(model = %self.model, images = images.as_slice().len(), "requesting stat inference");

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(InferenceError::Status { status, body });
        }

        let completion: ChatCompletion = serde_json::from_str(&body).map_err(InferenceError::Envelope)?;
        let content = completion_content(completion)?;
        parse_stats(&content)
    }
}

fn completion_content(completion: ChatCompletion) -> Result<String, InferenceError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or(InferenceError::EmptyCompletion)?;

    if let Some(refusal) = message.refusal {
        warn!(%refusal, "model refused to produce stats");
        return Err(InferenceError::Refused(refusal));
    }
    message
        .content
        .filter(|content| !content.trim().is_empty())
        .ok_or(InferenceError::EmptyCompletion)
}
