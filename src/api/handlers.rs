//! HTTP request handlers

use super::assets::{serve_index, serve_static};
use super::sse::sse_stream;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, SessionResponse, VersionResponse};
use super::AppState;
use crate::runtime::SseEvent;
use crate::session::Session;
use crate::state_machine::{TransitionError, TurnPhase};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "chatline_session";

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        // Session and transcript
        .route("/api/session", get(get_session))
        // One turn
        .route("/api/chat", post(send_chat))
        // Progressive rendering and phase changes
        .route("/api/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Sessions
// ============================================================

/// Resume the caller's session or start a new one, refreshing the cookie
async fn session_for(state: &AppState, jar: CookieJar) -> (Arc<Session>, CookieJar) {
    let requested = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let session = state.sessions.get_or_create(requested).await;

    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (session, jar.add(cookie))
}

async fn get_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SessionResponse>) {
    let (session, jar) = session_for(&state, jar).await;
    (
        jar,
        Json(SessionResponse {
            session_id: session.id,
            messages: session.messages(),
            busy: session.is_busy(),
        }),
    )
}

// ============================================================
// Turns
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ChatRequest>,
) -> Result<(CookieJar, Json<ChatResponse>), AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("Message text must not be empty".to_string()));
    }

    let (session, jar) = session_for(&state, jar).await;

    // Run detached so a dropped connection cannot abandon a turn half-way
    let runner = state.runner.clone();
    let turn_session = session.clone();
    let reply = tokio::spawn(async move { runner.run_turn(&turn_session, req.text).await })
        .await
        .map_err(|e| AppError::Internal(format!("Turn task failed: {e}")))?
        .map_err(|e| match e {
            TransitionError::TurnInProgress => AppError::Conflict(e.to_string()),
            TransitionError::InvalidTransition(_) => AppError::Internal(e.to_string()),
        })?;

    Ok((
        jar,
        Json(ChatResponse {
            message: reply,
            messages: session.messages(),
        }),
    ))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (session, jar) = session_for(&state, jar).await;

    // Subscribe before snapshotting so nothing falls between the two
    let broadcast_rx = session.subscribe();
    let phase = session
        .turn
        .try_lock()
        .map_or(TurnPhase::Generating, |turn| turn.phase());
    let init_event = SseEvent::Init {
        session_id: session.id,
        messages: session.messages(),
        phase,
    };

    (jar, sse_stream(init_event, broadcast_rx))
}

async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        model: state.runner.model_id().to_string(),
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
