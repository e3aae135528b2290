use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tellerbot_schema::ChatRequest;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
}

/// The turn boundary. Whatever escapes the pipeline is logged for the
/// operator and collapsed to a generic 500 - no internal detail reaches
/// the caller.
async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    match state.orchestrator.run_turn(&request).await {
        Ok(record) => Json(record.into_response()).into_response(),
        Err(err) => {
            tracing::error!(
                thread_id = %request.thread_id,
                error = %err,
                "turn pipeline failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
