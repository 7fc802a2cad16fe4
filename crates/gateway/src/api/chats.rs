//! Conversation CRUD and turn listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::api_error;
use crate::state::AppState;

fn storage_error(e: cm_domain::error::Error) -> Response {
    tracing::error!(error = %e, "conversation store failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn not_found(id: Uuid) -> Response {
    api_error(StatusCode::NOT_FOUND, format!("conversation {id} not found"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/chats
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_chats(State(state): State<AppState>) -> Response {
    match state.coordinator.store().list_conversations().await {
        Ok(conversations) => {
            let count = conversations.len();
            Json(serde_json::json!({
                "conversations": conversations,
                "count": count,
            }))
            .into_response()
        }
        Err(e) => storage_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/chats
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default, Deserialize)]
pub struct CreateChatBody {
    #[serde(default)]
    pub title: Option<String>,
}

/// The body is optional; an empty POST creates a "New Chat".
pub async fn create_chat(
    State(state): State<AppState>,
    body: Option<Json<CreateChatBody>>,
) -> Response {
    let title = body.and_then(|Json(b)| b.title);
    match state.coordinator.store().create_conversation(title).await {
        Ok(conversation) => (StatusCode::CREATED, Json(conversation)).into_response(),
        Err(e) => storage_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/chats/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.coordinator.store().get_conversation(id).await {
        Ok(Some(conversation)) => Json(conversation).into_response(),
        Ok(None) => not_found(id),
        Err(e) => storage_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /api/chats/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn delete_chat(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.coordinator.store().delete_conversation(id).await {
        Ok(true) => {
            state.coordinator.locks().forget(id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found(id),
        Err(e) => storage_error(e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/chats/:id/messages
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_messages(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let store = state.coordinator.store();
    match store.get_conversation(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(id),
        Err(e) => return storage_error(e),
    }
    match store.list_turns(id).await {
        Ok(turns) => {
            let count = turns.len();
            Json(serde_json::json!({
                "conversation_id": id,
                "messages": turns,
                "count": count,
            }))
            .into_response()
        }
        Err(e) => storage_error(e),
    }
}
