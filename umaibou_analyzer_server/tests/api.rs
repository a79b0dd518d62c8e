use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use umaibou_analyzer::core_modules::asset::Asset;
use umaibou_analyzer::pipeline::{
    AnalysisPipeline, InferenceError, MonsterStats, RenderError, RenderedImages, Renderer, StatInference, Viewpoint,
};
use umaibou_analyzer_server::{ServerConfig, start_server};

#[derive(Clone, Default)]
struct Counters {
    renders: Arc<AtomicUsize>,
    inferences: Arc<AtomicUsize>,
}

struct StubRenderer {
    counters: Counters,
    fail_on_call: Option<usize>,
}

impl Renderer for StubRenderer {
    async fn render(&self, _asset: &Asset, _viewpoint: &Viewpoint) -> Result<Bytes, RenderError> {
        let call = self.counters.renders.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(RenderError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: "renderer offline".to_string(),
            });
        }
        Ok(Bytes::from_static(b"\x89PNG\r\n\x1a\n"))
    }
}

struct StubInference {
    counters: Counters,
    reply: Value,
}

impl StatInference for StubInference {
    async fn infer(&self, images: &RenderedImages) -> Result<MonsterStats, InferenceError> {
        assert_eq!(images.as_slice().len(), 3);
        self.counters.inferences.fetch_add(1, Ordering::SeqCst);
        serde_json::from_value(self.reply.clone()).map_err(InferenceError::Deserialize)
    }
}

fn iron_stick() -> Value {
    json!({
        "name": "IronStick",
        "hp": 40,
        "speed": 70,
        "short_range_attack_power": 60,
        "long_range_attack_power": 80,
        "attack_range": 50,
        "attack_cooldown": 30,
        "attack_speed": 55,
        "defense_power": 45,
        "type": "brown"
    })
}

struct TestServer {
    base: String,
    counters: Counters,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(reply: Value, fail_on_call: Option<usize>) -> Self {
        Self::start_with_limit(reply, fail_on_call, ServerConfig::default().max_upload_bytes).await
    }

    async fn start_with_limit(reply: Value, fail_on_call: Option<usize>, max_upload_bytes: usize) -> Self {
        let counters = Counters::default();
        let pipeline = AnalysisPipeline::new(
            StubRenderer {
                counters: counters.clone(),
                fail_on_call,
            },
            StubInference {
                counters: counters.clone(),
                reply,
            },
        );
        let cfg = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            max_upload_bytes,
        };
        let (addr, _handle) = start_server(cfg, Arc::new(pipeline)).await.expect("start server");
        Self {
            base: format!("http://{addr}"),
            counters,
            client: reqwest::Client::new(),
        }
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> (StatusCode, Value) {
        let form = Form::new().part("usdzFile", Part::bytes(bytes).file_name(file_name.to_string()));
        let response = self
            .client
            .post(format!("{}/api/analyze", self.base))
            .multipart(form)
            .send()
            .await
            .expect("send");
        let status = response.status();
        (status, response.json().await.expect("json body"))
    }

    fn renders(&self) -> usize {
        self.counters.renders.load(Ordering::SeqCst)
    }

    fn inferences(&self) -> usize {
        self.counters.inferences.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn valid_upload_returns_stats_unchanged() {
    let server = TestServer::start(iron_stick(), None).await;

    let (status, body) = server.upload("IronStick.usdz", b"PK\x03\x04".to_vec()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, iron_stick());
    assert_eq!(server.renders(), 3);
    assert_eq!(server.inferences(), 1);
}

#[tokio::test]
async fn non_usdz_is_rejected_without_calling_collaborators() {
    let server = TestServer::start(iron_stick(), None).await;

    let (status, body) = server.upload("IronStick.obj", b"o cube".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "errorMessage": "File must be a USDZ file" }));
    assert_eq!(server.renders(), 0);
    assert_eq!(server.inferences(), 0);
}

#[tokio::test]
async fn out_of_range_stat_is_a_bad_request() {
    let mut reply = iron_stick();
    reply["hp"] = json!(120);
    let server = TestServer::start(reply, None).await;

    let (status, body) = server.upload("IronStick.usdz", b"PK\x03\x04".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "HP must be between 0 and 100");
}

#[tokio::test]
async fn render_failure_is_internal_and_skips_inference() {
    let server = TestServer::start(iron_stick(), Some(3)).await;

    let (status, body) = server.upload("IronStick.usdz", b"PK\x03\x04".to_vec()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    let message = body["errorMessage"].as_str().expect("message");
    assert!(message.starts_with("Internal server error: "), "{message}");
    assert!(message.contains("top view"), "{message}");
    assert!(message.contains("renderer offline"), "{message}");
    assert_eq!(server.renders(), 3);
    assert_eq!(server.inferences(), 0);
}

#[tokio::test]
async fn malformed_model_reply_is_internal() {
    let server = TestServer::start(json!({ "name": "IronStick" }), None).await;

    let (status, body) = server.upload("IronStick.usdz", b"PK\x03\x04".to_vec()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["errorMessage"].as_str().expect("message");
    assert!(message.contains("failed to deserialize monster stats"), "{message}");
}

#[tokio::test]
async fn empty_file_is_no_file() {
    let server = TestServer::start(iron_stick(), None).await;

    let (status, body) = server.upload("IronStick.usdz", Vec::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorMessage"], "No file uploaded");
    assert_eq!(server.renders(), 0);
}

#[tokio::test]
async fn missing_file_part_is_no_file() {
    let server = TestServer::start(iron_stick(), None).await;

    let form = Form::new().text("comment", "forgot the file");
    let response = server
        .client
        .post(format!("{}/api/analyze", server.base))
        .multipart(form)
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["errorMessage"], "No file uploaded");
}

#[tokio::test]
async fn non_multipart_request_is_no_file() {
    let server = TestServer::start(iron_stick(), None).await;

    let response = server
        .client
        .post(format!("{}/api/analyze", server.base))
        .json(&json!({ "file": "IronStick.usdz" }))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["errorMessage"], "No file uploaded");
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let server = TestServer::start_with_limit(iron_stick(), None, 1024).await;

    let (status, body) = server.upload("Huge.usdz", vec![7u8; 8 * 1024]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
    assert_eq!(server.renders(), 0);
}

#[tokio::test]
async fn health_check_answers() {
    let server = TestServer::start(iron_stick(), None).await;

    let response = server
        .client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("text"), "ok");
}

#[tokio::test]
async fn capitalised_route_is_served() {
    let server = TestServer::start(iron_stick(), None).await;

    let form = Form::new().part("usdzFile", Part::bytes(b"PK\x03\x04".to_vec()).file_name("IronStick.usdz"));
    let response = server
        .client
        .post(format!("{}/api/Analyze", server.base))
        .multipart(form)
        .send()
        .await
        .expect("send");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body, iron_stick());
}
