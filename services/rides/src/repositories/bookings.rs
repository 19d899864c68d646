//! Booking repository: seat accounting inside a single transaction

use common::error::DatabaseResult;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{BOOKING_COLUMNS, RIDE_COLUMNS};
use crate::{
    booking::{self, BookingError, SeatOutcome},
    models::{Booking, BookingStatus, NewBooking, Passenger, Ride, RideStatus},
};

/// Load a ride and hold its row lock until the transaction ends
pub(crate) async fn lock_ride(conn: &mut PgConnection, id: Uuid) -> Result<Ride, BookingError> {
    sqlx::query_as::<_, Ride>(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?
    .ok_or(BookingError::NotFound("Ride"))
}

/// Store the remaining seats, or archive and delete an exhausted ride
pub(crate) async fn apply_outcome(
    conn: &mut PgConnection,
    ride: &Ride,
    outcome: SeatOutcome,
) -> Result<(), BookingError> {
    match outcome {
        SeatOutcome::Remaining(seats) => {
            sqlx::query("UPDATE rides SET seats = $2, updated_at = NOW() WHERE id = $1")
                .bind(ride.id)
                .bind(seats)
                .execute(&mut *conn)
                .await?;
        }
        SeatOutcome::Exhausted => {
            sqlx::query(
                r#"
                INSERT INTO ride_history
                    (ride_id, origin, destination, date, time, price, seats, driver_id,
                     driver_name, description, status, created_at, updated_at, completed_at)
                VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10, $11, $12, NOW())
                "#,
            )
            .bind(ride.id)
            .bind(&ride.origin)
            .bind(&ride.destination)
            .bind(ride.date)
            .bind(ride.time)
            .bind(ride.price)
            .bind(ride.driver_id)
            .bind(&ride.driver_name)
            .bind(&ride.description)
            .bind(RideStatus::Completed.as_str())
            .bind(ride.created_at)
            .bind(ride.updated_at)
            .execute(&mut *conn)
            .await?;

            sqlx::query("DELETE FROM rides WHERE id = $1")
                .bind(ride.id)
                .execute(&mut *conn)
                .await?;

            info!("Ride {} is full and moved to history", ride.id);
        }
    }

    Ok(())
}

/// Insert a confirmed booking
pub(crate) async fn insert_booking(
    conn: &mut PgConnection,
    booking: &NewBooking,
) -> Result<Booking, BookingError> {
    let booking = sqlx::query_as::<_, Booking>(&format!(
        r#"
        INSERT INTO bookings
            (ride_id, passenger_id, passenger_name, profile_pic, origin, destination, date,
             time, passengers, special_requests, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(booking.ride_id)
    .bind(booking.passenger.id)
    .bind(&booking.passenger.name)
    .bind(&booking.passenger.profile_pic)
    .bind(&booking.origin)
    .bind(&booking.destination)
    .bind(booking.date)
    .bind(booking.time)
    .bind(booking.passengers)
    .bind(&booking.special_requests)
    .bind(BookingStatus::Confirmed.as_str())
    .fetch_one(conn)
    .await?;

    Ok(booking)
}

/// Booking repository
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Book seats on a ride directly.
    ///
    /// Nothing is written when the ride is missing, the passenger drives it,
    /// it is not available, or it has too few seats.
    pub async fn book_ride(
        &self,
        ride_id: Uuid,
        passenger: Passenger,
        passengers: i32,
        special_requests: Option<String>,
    ) -> Result<Booking, BookingError> {
        let mut tx = self.pool.begin().await?;

        let ride = lock_ride(&mut *tx, ride_id).await?;
        let outcome = booking::evaluate(&ride, passenger.id, passengers)?;

        let new_booking = NewBooking::for_ride(&ride, passenger, passengers, special_requests);
        let booking = insert_booking(&mut *tx, &new_booking).await?;
        apply_outcome(&mut *tx, &ride, outcome).await?;

        tx.commit().await?;

        info!(
            "Passenger {} booked {} seats on ride {}",
            booking.passenger_id, booking.passengers, ride_id
        );
        Ok(booking)
    }

    /// Bookings made by a passenger, newest first
    pub async fn list_for_passenger(&self, passenger_id: Uuid) -> DatabaseResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE passenger_id = $1 ORDER BY created_at DESC"
        ))
        .bind(passenger_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }
}
