use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stelfly_assist::{ChatMessage, IntentOutcome};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/chat", post(chat_turn))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// Omitted on the first turn; the reply carries the assigned id.
    #[serde(default)]
    session_id: Option<String>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    message: String,
    /// Present when the turn touched the schedule.
    #[serde(skip_serializing_if = "Option::is_none")]
    booking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_fields: Vec<&'static str>,
}

async fn chat_turn(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let session = state.session(&session_id);

    // One turn at a time per session
    let mut guard = session.lock().await;
    let today = chrono::Local::now().date_naive();
    let reply = state
        .assistant
        .handle_turn(&mut guard, &req.messages, today)
        .await?;
    drop(guard);

    let (booking_id, status, missing_fields) = match reply.outcome {
        Some(IntentOutcome::Booked { booking_id, .. }) => (Some(booking_id), Some("booked"), vec![]),
        Some(IntentOutcome::DraftCreated { booking_id, missing }) => {
            (Some(booking_id), Some("draft_created"), missing)
        }
        Some(IntentOutcome::DraftUpdated { booking_id, missing }) => {
            (Some(booking_id), Some("draft_updated"), missing)
        }
        Some(IntentOutcome::DraftCompleted { booking_id, .. }) => {
            (Some(booking_id), Some("draft_completed"), vec![])
        }
        Some(IntentOutcome::Modified { booking_id }) => (Some(booking_id), Some("modified"), vec![]),
        Some(IntentOutcome::PendingCleared) => (None, Some("pending_cleared"), vec![]),
        None => (None, None, vec![]),
    };

    Ok(Json(ChatResponse {
        session_id,
        message: reply.message,
        booking_id,
        status,
        missing_fields,
    }))
}
