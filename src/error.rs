//! Error types shared by the allocator, the stores and the HTTP boundary.

use thiserror::Error;

use crate::models::SeatId;

/// A hall seat map that breaks the venue rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("seat map must declare at least one row")]
    EmptyLayout,

    #[error("row label {label:?} is not a positive integer")]
    InvalidRowLabel { label: String },

    #[error("row label {label:?} repeats row {row}")]
    DuplicateRowLabel { label: String, row: u32 },

    #[error("row {row} must have exactly {expected} column groups, found {found}")]
    WrongColumnGroupCount {
        row: u32,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column group {column} must have at least {min} seats, found {found}")]
    ColumnGroupTooSmall {
        row: u32,
        column: u32,
        min: u32,
        found: u32,
    },

    #[error("row {row}, column group {column} may have at most {max} seats, found {found}")]
    ColumnGroupTooLarge {
        row: u32,
        column: u32,
        max: u32,
        found: u32,
    },

    #[error("seat map may have at most {max} rows, found {found}")]
    TooManyRows { max: usize, found: usize },
}

/// Failures of the shared store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

/// Outcome of a single (show, seat) claim inside a transaction.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("seat {0} is already claimed for this show")]
    Duplicate(SeatId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid hall layout: {0}")]
    InvalidHallLayout(#[from] LayoutError),

    #[error("no show found for movie {movie_id} in hall {hall_id} at {time}")]
    ShowNotFound {
        movie_id: i64,
        hall_id: i64,
        time: String,
    },

    #[error("invalid time format: {0:?}")]
    InvalidTime(String),

    #[error("no contiguous seats available for the requested show")]
    NoContiguousSeats,

    #[error("seat {seat} is already booked")]
    SeatAlreadyBooked { seat: SeatId },

    #[error("party size must be between 1 and {max}, got {requested}")]
    InvalidSeatCount { requested: usize, max: usize },

    #[error("hall {0} not found")]
    HallNotFound(i64),

    #[error("movie {0} not found")]
    MovieNotFound(i64),

    #[error("show overlaps with existing show {existing} in the same hall")]
    ShowOverlap { existing: i64 },

    #[error("booking transaction did not finish within {0:?}")]
    CommitTimeout(std::time::Duration),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl BookingError {
    /// Primary-booking failures that the boundary answers with same-day
    /// alternatives instead of a plain error.
    pub fn wants_alternatives(&self) -> bool {
        matches!(
            self,
            BookingError::NoContiguousSeats | BookingError::ShowNotFound { .. }
        )
    }
}
