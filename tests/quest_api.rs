//! Integration tests for the quest REST API.
//!
//! Each test builds the real router and drives it in-process with
//! `tower::ServiceExt::oneshot`, exercising the JSON contract the chat shell
//! relies on.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use ai_starter_quest::config::QuestConfig;
use ai_starter_quest::error::LlmError;
use ai_starter_quest::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
use ai_starter_quest::quest::{
    QuestEngine, QuestRouteState, SessionStore, TutorClient, quest_routes,
};

/// Stub LLM provider that counts calls (no real API traffic).
struct StubLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompletionResponse {
            content: " Try naming the app that picks your next song. ".to_string(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
        })
    }
}

fn app_with(llm: Option<Arc<dyn LlmProvider>>) -> Router {
    let config = QuestConfig::default();
    let engine = Arc::new(QuestEngine::new(TutorClient::new(llm, &config), &config));
    quest_routes(QuestRouteState {
        engine,
        store: SessionStore::new(),
    })
}

fn offline_app() -> Router {
    app_with(None)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("invalid JSON from server")
    };
    (status, json)
}

async fn create_session(app: &Router) -> String {
    let (status, json) = call(app, Method::POST, "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn say(app: &Router, id: &str, content: &str) -> Value {
    let (status, json) = call(
        app,
        Method::POST,
        &format!("/api/sessions/{id}/messages"),
        Some(json!({ "content": content })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json
}

// ── Health & status ──────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_ok() {
    let (status, json) = call(&offline_app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "ai-starter-quest");
}

#[tokio::test]
async fn status_reflects_tutor_configuration() {
    let (_, offline) = call(&offline_app(), Method::GET, "/api/status", None).await;
    assert_eq!(offline["ai_ready"], false);
    assert!(offline["model"].is_null());

    let llm: Arc<dyn LlmProvider> = Arc::new(StubLlm {
        calls: AtomicUsize::new(0),
    });
    let (_, online) = call(&app_with(Some(llm)), Method::GET, "/api/status", None).await;
    assert_eq!(online["ai_ready"], true);
    assert_eq!(online["model"], "stub-model");
    assert_eq!(online["coaching_enabled"], false);
}

// ── Sessions ─────────────────────────────────────────────────────────

#[tokio::test]
async fn new_session_is_seeded_with_welcome() {
    let app = offline_app();
    let (status, json) = call(&app, Method::POST, "/api/sessions", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["stage"], "welcome");
    assert_eq!(json["module"], 0);
    assert_eq!(json["progress"], 0);
    assert_eq!(json["hints_available"], false);
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "assistant");
}

#[tokio::test]
async fn unknown_session_is_404() {
    let app = offline_app();
    let missing = "00000000-0000-0000-0000-000000000000";

    let (status, json) = call(&app, Method::GET, &format!("/api/sessions/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("not found"));

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/sessions/{missing}/messages"),
        Some(json!({ "content": "begin" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_walkthrough_reaches_report_card() {
    let app = offline_app();
    let id = create_session(&app).await;

    let turn = say(&app, &id, "begin").await;
    assert!(turn["reply"].as_str().unwrap().contains("Module 1"));
    assert_eq!(turn["session"]["stage"], "module1");
    assert_eq!(turn["session"]["badges"][0], "🏅 Concept Spark");

    say(&app, &id, "netflix recommendations").await;
    let turn = say(&app, &id, "B").await;
    assert_eq!(turn["session"]["quiz_correct"], 1);
    assert_eq!(turn["session"]["module"], 2);

    say(&app, &id, "continue").await;
    say(&app, &id, "Write 5 Instagram captions for a bakery, upbeat tone, bullet list").await;
    let turn = say(&app, &id, "b").await;
    assert_eq!(turn["session"]["module"], 3);
    assert_eq!(turn["session"]["progress"], 85);

    say(&app, &id, "continue").await;
    say(&app, &id, "1").await;
    let turn = say(&app, &id, "done").await;

    let reply = turn["reply"].as_str().unwrap();
    assert!(reply.contains("- Concepts: ★★★★★"));
    assert!(reply.contains("- Prompt Craft: ★★★★☆"));
    assert_eq!(turn["session"]["progress"], 100);
    assert_eq!(turn["session"]["stage"], "completed");
    assert_eq!(turn["session"]["module"], 3);
    assert_eq!(turn["session"]["badges"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn hint_uses_tutor_once_per_module() {
    let stub = Arc::new(StubLlm {
        calls: AtomicUsize::new(0),
    });
    let llm: Arc<dyn LlmProvider> = stub.clone();
    let app = app_with(Some(llm));
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}/hint");

    let (_, locked) = call(&app, Method::POST, &uri, None).await;
    assert!(locked["reply"].as_str().unwrap().contains("begin"));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    say(&app, &id, "begin").await;
    let (status, first) = call(&app, Method::POST, &uri, None).await;
    let (_, second) = call(&app, Method::POST, &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first["reply"],
        "**Hint:** Try naming the app that picks your next song."
    );
    assert_eq!(first["reply"], second["reply"]);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn email_validation_and_capture() {
    let app = offline_app();
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}/email");

    let (status, json) = call(&app, Method::POST, &uri, Some(json!({ "email": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].as_str().unwrap().contains("valid email"));

    let (status, _) = call(&app, Method::POST, &uri, Some(json!({ "email": "no-at-sign" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, snapshot) = call(&app, Method::GET, &format!("/api/sessions/{id}"), None).await;
    assert_eq!(snapshot["email_captured"], false);

    let (status, json) = call(
        &app,
        Method::POST,
        &uri,
        Some(json!({ "email": "learner@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["email_captured"], true);
}

#[tokio::test]
async fn reset_returns_to_welcome() {
    let app = offline_app();
    let id = create_session(&app).await;
    say(&app, &id, "begin").await;
    say(&app, &id, "youtube").await;

    let (status, json) = call(&app, Method::POST, &format!("/api/sessions/{id}/reset"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id);
    assert_eq!(json["stage"], "welcome");
    assert_eq!(json["progress"], 0);
    assert!(json["badges"].as_array().unwrap().is_empty());
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn delete_removes_session() {
    let app = offline_app();
    let id = create_session(&app).await;
    let uri = format!("/api/sessions/{id}");

    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
