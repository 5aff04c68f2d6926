//! HTTP front end exposing the same actions as the console shell.

use crate::assistant::ResearchAssistant;
use crate::error::AssistantError;
use crate::models::{FollowUp, FollowUpRequest, ResearchRequest, ResearchResponse, ResearchSession};
use crate::report::ReportFormat;
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

#[derive(Clone)]
struct AppState {
    assistant: Arc<Mutex<ResearchAssistant>>,
}

pub fn router(assistant: ResearchAssistant) -> Router {
    let state = AppState {
        assistant: Arc::new(Mutex::new(assistant)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/session", get(session))
        .route("/research", post(research))
        .route("/followup", post(followup))
        .route("/report/:format", get(report))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(assistant: ResearchAssistant, bind: &str) -> Result<()> {
    let app = router(assistant);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Research assistant listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        let status = match &err {
            AssistantError::NoActiveSession => StatusCode::CONFLICT,
            AssistantError::NothingToSummarize(_) | AssistantError::EmptyInput(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AssistantError::Llm(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn session(State(state): State<AppState>) -> Result<Json<ResearchSession>, ApiError> {
    let assistant = state.assistant.lock().await;
    match assistant.snapshot() {
        Some(session) if assistant.has_session() => Ok(Json(session)),
        _ => Err(ApiError {
            status: StatusCode::NOT_FOUND,
            message: AssistantError::NoActiveSession.to_string(),
        }),
    }
}

#[instrument(skip(state))]
async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let mut assistant = state.assistant.lock().await;
    let outcome = assistant.research(&req.topic).await?;
    Ok(Json(ResearchResponse::from(outcome)))
}

#[instrument(skip(state))]
async fn followup(
    State(state): State<AppState>,
    Json(req): Json<FollowUpRequest>,
) -> Result<Json<FollowUp>, ApiError> {
    let mut assistant = state.assistant.lock().await;
    let answer = assistant.ask(&req.question).await?;
    Ok(Json(answer))
}

async fn report(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> Result<Response, ApiError> {
    let format = ReportFormat::parse(&format).ok_or_else(|| ApiError {
        status: StatusCode::NOT_FOUND,
        message: format!("unknown report format {:?}", format),
    })?;

    let rendered = state.assistant.lock().await.export(format)?;
    let headers = [
        (header::CONTENT_TYPE, rendered.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", rendered.file_name()),
        ),
    ];
    Ok((headers, rendered.bytes).into_response())
}
