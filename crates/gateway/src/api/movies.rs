//! `GET /api/movies/:id`: extended details straight from the movie source.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use cm_domain::error::Error;

use super::api_error;
use crate::state::AppState;

pub async fn movie_details(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.coordinator.sources().movies.movie_details(id).await {
        Ok(details) => Json(details).into_response(),
        Err(Error::NotFound(_)) => api_error(StatusCode::NOT_FOUND, format!("movie {id} not found")),
        // No credential configured: the adapter is unavailable, not broken.
        Err(e @ Error::Auth(_)) => api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        Err(e) => {
            tracing::warn!(movie_id = id, error = %e, "movie details failed");
            api_error(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}
