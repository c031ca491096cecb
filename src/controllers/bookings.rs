use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::error_response;
use crate::services::BookingRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings", get(get_show_bookings))
        .route("/shows/alternatives", get(find_alternatives))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
//
// When the show is missing or has no block left, answer 409 with the
// same-day alternatives instead.
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookingRequest>,
) -> Response {
    let err = match state.bookings.create_booking(&req).await {
        Ok(booking) => return (StatusCode::CREATED, Json(booking)).into_response(),
        Err(e) => e,
    };

    if !err.wants_alternatives() {
        return error_response("create_booking", err).into_response();
    }

    match state.bookings.find_alternative_shows(&req.time, req.num_seats).await {
        Ok(alternatives) if !alternatives.is_empty() => (
            StatusCode::CONFLICT,
            Json(json!({
                "message": "Could not book seats together for the requested show. Here are some alternatives for the same day:",
                "alternatives": alternatives,
            })),
        )
            .into_response(),
        Ok(_) => (
            StatusCode::CONFLICT,
            Json(json!({
                "message": "Could not book seats together for the requested show, and no same-day alternatives are available.",
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("alternative search after {:?} failed: {:?}", err, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Seats are unavailable and the alternative search failed".to_string(),
            )
                .into_response()
        }
    }
}

// GET /api/bookings?showId=
#[derive(Debug, Deserialize)]
struct ShowBookingsQuery {
    #[serde(rename = "showId")]
    show_id: i64,
}

async fn get_show_bookings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ShowBookingsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if params.show_id <= 0 {
        return Err((StatusCode::BAD_REQUEST, "showId must be > 0".to_string()));
    }

    let bookings = state
        .bookings
        .bookings_for_show(params.show_id)
        .await
        .map_err(|e| error_response("get_show_bookings", e))?;

    Ok((StatusCode::OK, Json(bookings)))
}

/* ---------- ALTERNATIVES ---------- */

// GET /api/shows/alternatives?time=&numSeats=
#[derive(Debug, Deserialize)]
struct AlternativesQuery {
    time: String,
    #[serde(rename = "numSeats")]
    num_seats: usize,
}

async fn find_alternatives(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlternativesQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let shows = state
        .bookings
        .find_alternative_shows(&params.time, params.num_seats)
        .await
        .map_err(|e| error_response("find_alternatives", e))?;

    Ok((StatusCode::OK, Json(shows)))
}
