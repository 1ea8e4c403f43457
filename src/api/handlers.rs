//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateSessionResponse, ErrorResponse, InputRequest, InputResponse, StatusResponse,
    StatusUpdate, SuccessResponse,
};
use super::AppState;
use crate::config::ServiceStatus;
use crate::runtime::{SseEvent, SubmitError};
use crate::state_machine::{Event, MenuOption, TransitionError};
use crate::store::SessionView;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/close", post(close_session))
        // User input
        .route("/api/sessions/:id/input", post(submit_input))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Service info
        .route("/api/status", get(get_status).post(set_status))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreateSessionResponse>) {
    let handle = state.sessions.create_session().await;
    tracing::info!(session_id = %handle.context.session_id, "Session created");
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: handle.context.session_id.clone(),
            view: handle.view(),
        }),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    Ok(Json(handle.view()))
}

async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.close(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// User Input
// ============================================================

fn input_event(req: InputRequest) -> Result<Event, AppError> {
    match (req.text, req.option) {
        (Some(text), None) => Ok(Event::UserText { text }),
        (None, Some(key)) => MenuOption::from_key(&key)
            .map(|option| Event::OptionSelected { option })
            .ok_or_else(|| AppError::BadRequest(format!("Unknown option: {key}"))),
        _ => Err(AppError::BadRequest(
            "Provide exactly one of `text` or `option`".to_string(),
        )),
    }
}

async fn submit_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InputRequest>,
) -> Result<(StatusCode, Json<InputResponse>), AppError> {
    let event = input_event(req)?;
    state.sessions.submit(&id, event).await?;
    Ok((StatusCode::ACCEPTED, Json(InputResponse { queued: true })))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (view, broadcast_rx) = state
        .sessions
        .subscribe(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;

    Ok(sse_stream(SseEvent::Init { view }, broadcast_rx))
}

// ============================================================
// Service Info
// ============================================================

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(status_response(&state).await)
}

/// Applies to sessions created afterwards
async fn set_status(
    State(state): State<AppState>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = ServiceStatus::parse(&req.status).ok_or_else(|| {
        AppError::BadRequest("Invalid status. Must be ONLINE or OFFLINE".to_string())
    })?;
    state.sessions.set_status(status);
    Ok(Json(status_response(&state).await))
}

async fn status_response(state: &AppState) -> StatusResponse {
    StatusResponse {
        status: state.sessions.status().as_str(),
        model: state.model.clone(),
        sessions: state.sessions.session_count().await,
        missing_credentials: state.missing_credentials.clone(),
    }
}

async fn get_version() -> &'static str {
    concat!("site-assistant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        let message = e.to_string();
        match e {
            SubmitError::NotFound => AppError::NotFound(message),
            SubmitError::Busy => AppError::Conflict(message),
            SubmitError::Rejected(TransitionError::Offline) => AppError::Unavailable(message),
            SubmitError::Rejected(_) => AppError::BadRequest(message),
            SubmitError::Closed => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
