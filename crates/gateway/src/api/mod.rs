pub mod auth;
pub mod chats;
pub mod messages;
pub mod movies;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
///
/// `/health` is public; everything under `/api` sits behind the
/// bearer-token middleware.
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let protected = Router::new()
        // Conversations
        .route("/api/chats", get(chats::list_chats).post(chats::create_chat))
        .route(
            "/api/chats/:id",
            get(chats::get_chat).delete(chats::delete_chat),
        )
        // Turns
        .route(
            "/api/chats/:id/messages",
            get(chats::list_messages).post(messages::post_message),
        )
        // Reference data
        .route("/api/movies/:id", get(movies::movie_details))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /health
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "llm": state.llm_enabled,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
