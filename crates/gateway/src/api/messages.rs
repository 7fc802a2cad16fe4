//! `POST /api/chats/:id/messages`: run one turn.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use cm_domain::mode::Mode;
use cm_pipeline::{TurnError, TurnRequest};

use super::api_error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageBody {
    pub content: String,
    /// Absent or `"auto"` means automatic mode detection.
    #[serde(default)]
    pub mode: Option<String>,
}

pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PostMessageBody>,
) -> Response {
    let explicit_mode = match body.mode.as_deref().map(Mode::parse_selection) {
        None => None,
        Some(Ok(mode)) => mode,
        Some(Err(e)) => return api_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let req = TurnRequest {
        conversation_id: id,
        message: body.content,
        explicit_mode,
    };

    match state.coordinator.handle_message(req).await {
        Ok(outcome) => Json(serde_json::json!({
            "user_message": outcome.user_turn,
            "assistant_message": outcome.assistant_turn,
            "mode": outcome.reply.mode,
            "generation": outcome.reply.generation,
            "topic": outcome.reply.topic,
            "context": outcome.reply.context,
            "conversation": outcome.conversation,
        }))
        .into_response(),
        Err(e) => turn_error(e),
    }
}

fn turn_error(e: TurnError) -> Response {
    match e {
        TurnError::EmptyMessage => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        TurnError::ConversationNotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        TurnError::Busy(_) => api_error(StatusCode::CONFLICT, e.to_string()),
        TurnError::Processing(_) => {
            tracing::error!(error = %e, "turn failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        TurnError::NotPersisted { ref reply, .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": e.to_string(),
                "reply": reply,
            })),
        )
            .into_response(),
    }
}
