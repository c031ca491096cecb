pub mod bookings;
pub mod halls;
pub mod shows;

use axum::{http::StatusCode, Router};
use std::sync::Arc;

use crate::error::BookingError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(bookings::routes())
        .merge(halls::routes())
        .merge(shows::routes())
}

/// Status and message for a failed operation. Storage details stay in the log.
pub(crate) fn error_response(context: &str, e: BookingError) -> (StatusCode, String) {
    let status = match &e {
        BookingError::InvalidTime(_) | BookingError::InvalidSeatCount { .. } => StatusCode::BAD_REQUEST,
        BookingError::InvalidHallLayout(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BookingError::ShowNotFound { .. }
        | BookingError::HallNotFound(_)
        | BookingError::MovieNotFound(_) => StatusCode::NOT_FOUND,
        BookingError::NoContiguousSeats
        | BookingError::SeatAlreadyBooked { .. }
        | BookingError::ShowOverlap { .. } => StatusCode::CONFLICT,
        BookingError::CommitTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::Storage(_) => {
            tracing::error!("{} storage error: {:?}", context, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal storage error".to_string());
        }
    };
    (status, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LayoutError, StoreError};
    use crate::models::SeatId;

    #[test]
    fn maps_errors_to_statuses() {
        let cases = [
            (BookingError::InvalidTime("x".into()), StatusCode::BAD_REQUEST),
            (
                BookingError::InvalidHallLayout(LayoutError::EmptyLayout),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (BookingError::HallNotFound(1), StatusCode::NOT_FOUND),
            (
                BookingError::SeatAlreadyBooked {
                    seat: SeatId::new(1, 1, 1),
                },
                StatusCode::CONFLICT,
            ),
            (
                BookingError::CommitTimeout(std::time::Duration::from_secs(1)),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error_response("test", error).0, status);
        }
    }

    #[test]
    fn storage_errors_are_not_leaked() {
        let error = BookingError::Storage(StoreError::Corrupt {
            table: "halls",
            detail: "secret detail".into(),
        });
        let (status, body) = error_response("test", error);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret"));
    }
}
