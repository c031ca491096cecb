use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use super::error_response;
use crate::services::HallRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/halls", post(create_hall))
        .route("/halls/{id}", put(update_hall))
        .route("/halls/{id}/seats", get(get_hall_seats))
}

// POST /api/halls
async fn create_hall(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HallRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hall = state
        .halls
        .create_hall(req)
        .await
        .map_err(|e| error_response("create_hall", e))?;

    Ok((StatusCode::CREATED, Json(hall)))
}

// PUT /api/halls/{id}
async fn update_hall(
    State(state): State<Arc<AppState>>,
    Path(hall_id): Path<i64>,
    Json(req): Json<HallRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let hall = state
        .halls
        .update_hall(hall_id, req)
        .await
        .map_err(|e| error_response("update_hall", e))?;

    Ok((StatusCode::OK, Json(hall)))
}

// GET /api/halls/{id}/seats
async fn get_hall_seats(
    State(state): State<Arc<AppState>>,
    Path(hall_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let seats = state
        .halls
        .hall_seats(hall_id)
        .await
        .map_err(|e| error_response("get_hall_seats", e))?;

    Ok((StatusCode::OK, Json(seats)))
}
