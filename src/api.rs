//! Session API for external UIs: REST endpoints plus a WebSocket feed.
//!
//! The UI never mutates the session directly: reads come from snapshots,
//! and every change is routed through the [`SessionHandle`]. Ending a
//! session leaves the dialogue loop running, ready for the next start.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Language};
use crate::dialogue::{DialogueEvent, SessionHandle, SessionSnapshot, TurnOutcome};
use crate::error::{CatalogError, DialogueError};
use crate::session::Speaker;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct ApiState {
    pub session: SessionHandle,
    pub catalog: Arc<Catalog>,
}

/// Build the session REST + WebSocket routes.
pub fn session_routes(session: SessionHandle, catalog: Arc<Catalog>) -> Router {
    let state = ApiState { session, catalog };

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/api/forms", get(list_forms))
        .route("/api/session", get(get_session))
        .route("/api/session/start", post(start_session))
        .route("/api/session/transcript", post(post_transcript))
        .route("/api/session/language", post(post_language))
        .route("/api/session/end", post(end_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    SessionSync { session: SessionSnapshot },
    Transcript { speaker: Speaker, text: String },
    FieldUpdated { key: String, value: String },
    SchemeSwitched { form_id: String },
    /// The document itself is delivered by the host; clients only learn it exists.
    DocumentReady { form_id: String, size: usize },
    DocumentFailed { form_id: String, reason: String },
    VoiceUnavailable { reason: String },
    TurnResult { outcome: TurnOutcome },
    Error { message: String },
}

impl From<DialogueEvent> for WsMessage {
    fn from(event: DialogueEvent) -> Self {
        match event {
            DialogueEvent::Transcript { speaker, text } => Self::Transcript { speaker, text },
            DialogueEvent::FieldUpdated { key, value } => Self::FieldUpdated { key, value },
            DialogueEvent::SchemeSwitched { form_id } => Self::SchemeSwitched { form_id },
            DialogueEvent::DocumentReady { form_id, document } => Self::DocumentReady {
                form_id,
                size: document.len(),
            },
            DialogueEvent::DocumentFailed { form_id, reason } => {
                Self::DocumentFailed { form_id, reason }
            }
            DialogueEvent::VoiceUnavailable { reason } => Self::VoiceUnavailable { reason },
        }
    }
}

/// Actions a WebSocket client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientAction {
    Start {
        form: Option<String>,
        language: Option<String>,
    },
    Transcript { text: String },
    Language { language: String },
}

/// Body of `POST /api/session/start`. Without `form` the session starts in
/// triage; without `language` the current one is kept.
#[derive(Debug, Deserialize)]
struct StartBody {
    #[serde(default)]
    form: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptBody {
    text: String,
}

#[derive(Debug, Deserialize)]
struct LanguageBody {
    language: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn dialogue_error_response(e: DialogueError) -> Response {
    let status = match e {
        DialogueError::Catalog(CatalogError::UnknownForm(_)) => StatusCode::NOT_FOUND,
        DialogueError::NotStarted
        | DialogueError::Stopped
        | DialogueError::InvalidTransition { .. } => StatusCode::CONFLICT,
        DialogueError::Session(_) | DialogueError::Catalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "jan-sahayak"
    }))
}

// ── REST ────────────────────────────────────────────────────────────────

async fn list_forms(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.catalog.forms().to_vec())
}

async fn get_session(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.session.snapshot())
}

/// Resolve an optional language tag, defaulting to the session's language.
fn start_language(session: &SessionHandle, tag: Option<&str>) -> Result<Language, String> {
    match tag {
        Some(tag) => Language::from_tag(tag).ok_or_else(|| format!("Unsupported language: {tag}")),
        None => Ok(session.snapshot().language),
    }
}

async fn start_session(State(state): State<ApiState>, Json(body): Json<StartBody>) -> Response {
    let language = match start_language(&state.session, body.language.as_deref()) {
        Ok(language) => language,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    info!(form = body.form.as_deref().unwrap_or("-"), %language, "Session start requested via API");
    match state.session.start(body.form.as_deref(), language).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => dialogue_error_response(e),
    }
}

async fn post_transcript(
    State(state): State<ApiState>,
    Json(body): Json<TranscriptBody>,
) -> Response {
    debug!(chars = body.text.len(), "Typed transcript via API");
    match state.session.submit_transcript(&body.text).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => dialogue_error_response(e),
    }
}

async fn post_language(
    State(state): State<ApiState>,
    Json(body): Json<LanguageBody>,
) -> Response {
    let Some(language) = Language::from_tag(&body.language) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Unsupported language: {}", body.language),
        );
    };
    match state.session.switch_language(language).await {
        Ok(()) => Json(serde_json::json!({ "language": language })).into_response(),
        Err(e) => dialogue_error_response(e),
    }
}

async fn end_session(State(state): State<ApiState>) -> impl IntoResponse {
    info!("Session end requested via API");
    state.session.end().await;
    Json(serde_json::json!({ "status": "ended" }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> impl IntoResponse {
    info!("WebSocket client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.session))
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to encode WS message");
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, session: SessionHandle) {
    info!("WebSocket client connected");

    // Subscribe before the sync so nothing falls between the two.
    let mut rx = session.subscribe();

    let sync = WsMessage::SessionSync {
        session: session.snapshot(),
    };
    if !send_json(&mut socket, &sync).await {
        warn!("Failed to send initial sync, client disconnected");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_json(&mut socket, &WsMessage::from(event)).await {
                            debug!("Client disconnected during send");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind events");
                        let sync = WsMessage::SessionSync { session: session.snapshot() };
                        if !send_json(&mut socket, &sync).await {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!("Event channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_client_message(&text, &session).await {
                            if !send_json(&mut socket, &reply).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

async fn handle_client_message(text: &str, session: &SessionHandle) -> Option<WsMessage> {
    let action = match serde_json::from_str::<ClientAction>(text) {
        Ok(action) => action,
        Err(e) => {
            debug!(error = %e, text = text, "Unrecognized WS message from client");
            return None;
        }
    };

    match action {
        ClientAction::Start { form, language } => {
            let language = match start_language(session, language.as_deref()) {
                Ok(language) => language,
                Err(message) => return Some(WsMessage::Error { message }),
            };
            match session.start(form.as_deref(), language).await {
                Ok(snapshot) => Some(WsMessage::SessionSync { session: snapshot }),
                Err(e) => Some(WsMessage::Error {
                    message: e.to_string(),
                }),
            }
        }
        ClientAction::Transcript { text } => match session.submit_transcript(&text).await {
            Ok(outcome) => Some(WsMessage::TurnResult { outcome }),
            Err(e) => Some(WsMessage::Error {
                message: e.to_string(),
            }),
        },
        ClientAction::Language { language } => {
            let Some(language) = Language::from_tag(&language) else {
                return Some(WsMessage::Error {
                    message: format!("Unsupported language: {language}"),
                });
            };
            match session.switch_language(language).await {
                Ok(()) => None,
                Err(e) => Some(WsMessage::Error {
                    message: e.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_event_carries_size_only() {
        let msg = WsMessage::from(DialogueEvent::DocumentReady {
            form_id: "ujjwala".into(),
            document: vec![0; 42],
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "document_ready");
        assert_eq!(json["size"], 42);
        assert!(json.get("document").is_none());
    }

    #[test]
    fn client_actions_parse() {
        let action: ClientAction =
            serde_json::from_str(r#"{"type": "transcript", "text": "Rajesh"}"#).unwrap();
        assert!(matches!(action, ClientAction::Transcript { text } if text == "Rajesh"));

        let action: ClientAction =
            serde_json::from_str(r#"{"type": "language", "language": "gu"}"#).unwrap();
        assert!(matches!(action, ClientAction::Language { language } if language == "gu"));

        let action: ClientAction = serde_json::from_str(r#"{"type": "start"}"#).unwrap();
        assert!(matches!(
            action,
            ClientAction::Start {
                form: None,
                language: None
            }
        ));
    }

    #[test]
    fn transcript_event_keeps_speaker() {
        let msg = WsMessage::from(DialogueEvent::Transcript {
            speaker: Speaker::User,
            text: "hello".into(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "transcript");
        assert_eq!(json["speaker"], "user");
    }
}
