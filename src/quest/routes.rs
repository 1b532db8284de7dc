//! REST endpoints the chat shell talks to.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::engine::QuestEngine;
use super::model::SessionSnapshot;
use super::store::SessionStore;
use crate::error::SessionError;

/// Shared state for quest routes.
#[derive(Clone)]
pub struct QuestRouteState {
    pub engine: Arc<QuestEngine>,
    pub store: Arc<SessionStore>,
}

#[derive(Debug, Deserialize)]
struct SendMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CaptureEmail {
    email: String,
}

/// Reply to one learner action plus the state to re-render.
#[derive(Debug, Serialize)]
struct TurnResponse {
    reply: String,
    session: SessionSnapshot,
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (status, Json(serde_json::json!({ "error": message.to_string() }))).into_response()
}

fn not_found(err: SessionError) -> Response {
    error_response(StatusCode::NOT_FOUND, err)
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ai-starter-quest"
    }))
}

/// GET /api/status
///
/// Tutor availability for the shell's sidebar.
async fn get_status(State(state): State<QuestRouteState>) -> impl IntoResponse {
    let tutor = state.engine.tutor();
    Json(serde_json::json!({
        "ai_ready": tutor.is_ready(),
        "model": tutor.model_name(),
        "coaching_enabled": state.engine.coaching_enabled(),
    }))
}

/// POST /api/sessions
async fn create_session(State(state): State<QuestRouteState>) -> impl IntoResponse {
    let (id, session) = state.store.create(state.engine.new_session()).await;
    let snapshot = SessionSnapshot::new(id, &*session.lock().await);
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/sessions/{id}
async fn get_session(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store.get(id).await {
        Ok(session) => Json(SessionSnapshot::new(id, &*session.lock().await)).into_response(),
        Err(e) => not_found(e),
    }
}

/// POST /api/sessions/{id}/messages
///
/// Runs one dialogue turn. The session stays locked until the turn,
/// including any tutor call, has finished.
async fn send_message(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessage>,
) -> Response {
    let session = match state.store.get(id).await {
        Ok(session) => session,
        Err(e) => return not_found(e),
    };
    let mut session = session.lock().await;
    let reply = state.engine.handle_input(&mut session, &body.content).await;
    Json(TurnResponse {
        reply,
        session: SessionSnapshot::new(id, &session),
    })
    .into_response()
}

/// POST /api/sessions/{id}/hint
async fn request_hint(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    let session = match state.store.get(id).await {
        Ok(session) => session,
        Err(e) => return not_found(e),
    };
    let mut session = session.lock().await;
    let reply = state.engine.hint(&mut session).await;
    Json(TurnResponse {
        reply,
        session: SessionSnapshot::new(id, &session),
    })
    .into_response()
}

/// POST /api/sessions/{id}/email
///
/// 422 with an inline error when the address is invalid.
async fn capture_email(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CaptureEmail>,
) -> Response {
    let session = match state.store.get(id).await {
        Ok(session) => session,
        Err(e) => return not_found(e),
    };
    let mut session = session.lock().await;
    match state.engine.capture_email(&mut session, &body.email) {
        Ok(()) => Json(SessionSnapshot::new(id, &session)).into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

/// POST /api/sessions/{id}/reset
async fn reset_session(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store.reset(id).await {
        Ok(session) => Json(SessionSnapshot::new(id, &*session.lock().await)).into_response(),
        Err(e) => not_found(e),
    }
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<QuestRouteState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.store.remove(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => not_found(e),
    }
}

/// Build the quest REST routes.
pub fn quest_routes(state: QuestRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(get_status))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/messages", post(send_message))
        .route("/api/sessions/{id}/hint", post(request_hint))
        .route("/api/sessions/{id}/email", post(capture_email))
        .route("/api/sessions/{id}/reset", post(reset_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
