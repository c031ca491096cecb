use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use std::sync::Arc;

use super::error_response;
use crate::services::ShowRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shows", post(create_show))
}

// POST /api/shows
async fn create_show(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ShowRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !req.price.is_finite() || req.price < 0.0 {
        return Err((StatusCode::BAD_REQUEST, "price must be a non-negative number".to_string()));
    }

    let show = state
        .shows
        .schedule_show(req)
        .await
        .map_err(|e| error_response("create_show", e))?;

    Ok((StatusCode::CREATED, Json(show)))
}
