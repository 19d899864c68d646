//! Seat accounting shared by direct bookings and request approvals
//!
//! [`evaluate`] decides what happens to a ride when a passenger asks for a
//! number of seats. It performs no I/O; the repositories run it against a
//! row locked inside their transaction and apply the [`SeatOutcome`].

use common::error::DatabaseError;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Ride, RideStatus};

/// What to do with the ride once the seats are granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOutcome {
    /// Seats remain; store the new count
    Remaining(i32),
    /// No seats remain; archive the ride to history and delete it
    Exhausted,
}

/// Why a booking cannot go ahead
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BookingRejection {
    #[error("Passengers must be at least 1")]
    InvalidPassengers,

    #[error("You cannot book your own ride")]
    OwnRide,

    #[error("Ride is not available")]
    NotAvailable,

    #[error(
        "Not enough seats available. Only {available} seats are available for this ride."
    )]
    InsufficientSeats { available: i32, requested: i32 },
}

/// Reject a non-positive passenger count before touching the database
pub fn validate_passengers(passengers: i32) -> Result<(), BookingRejection> {
    if passengers < 1 {
        return Err(BookingRejection::InvalidPassengers);
    }
    Ok(())
}

/// Apply the seat rules to a ride for `passenger_id` asking for `passengers` seats
pub fn evaluate(
    ride: &Ride,
    passenger_id: Uuid,
    passengers: i32,
) -> Result<SeatOutcome, BookingRejection> {
    validate_passengers(passengers)?;

    if ride.driver_id == passenger_id {
        return Err(BookingRejection::OwnRide);
    }

    if ride.status != RideStatus::Available {
        return Err(BookingRejection::NotAvailable);
    }

    if passengers > ride.seats {
        return Err(BookingRejection::InsufficientSeats {
            available: ride.seats,
            requested: passengers,
        });
    }

    match ride.seats - passengers {
        0 => Ok(SeatOutcome::Exhausted),
        remaining => Ok(SeatOutcome::Remaining(remaining)),
    }
}

/// Failure of a transactional booking or request operation
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Rejected(#[from] BookingRejection),

    #[error("Request already handled")]
    AlreadyHandled,

    #[error("Only the ride's driver can handle this request")]
    NotDriver,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::Database(DatabaseError::Query(e))
    }
}
