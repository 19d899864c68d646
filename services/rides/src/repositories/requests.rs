//! Ride request repository

use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    REQUEST_COLUMNS,
    bookings::{apply_outcome, insert_booking, lock_ride},
};
use crate::{
    booking::{self, BookingError},
    models::{NewBooking, NewRideRequest, Passenger, RequestStatus, RideRequest, RideRequestPayload},
};

/// Ride request repository
#[derive(Clone)]
pub struct RideRequestRepository {
    pool: PgPool,
}

impl RideRequestRepository {
    /// Create a new ride request repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending request for seats on a ride.
    ///
    /// The same rules as a direct booking apply at request time; seats are
    /// only taken once the driver approves.
    pub async fn create(
        &self,
        ride_id: Uuid,
        passenger: Passenger,
        payload: RideRequestPayload,
    ) -> Result<RideRequest, BookingError> {
        let mut tx = self.pool.begin().await?;

        let ride = lock_ride(&mut *tx, ride_id).await?;
        booking::evaluate(&ride, passenger.id, payload.passengers)?;

        let new_request = NewRideRequest::for_ride(&ride, passenger, payload);
        let request = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            INSERT INTO ride_requests
                (ride_id, driver_id, passenger_id, passenger_name, profile_pic, origin,
                 destination, date, time, passengers, special_requests, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(new_request.ride_id)
        .bind(new_request.driver_id)
        .bind(new_request.passenger.id)
        .bind(&new_request.passenger.name)
        .bind(&new_request.passenger.profile_pic)
        .bind(&new_request.origin)
        .bind(&new_request.destination)
        .bind(new_request.date)
        .bind(new_request.time)
        .bind(new_request.passengers)
        .bind(&new_request.special_requests)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Passenger {} requested {} seats on ride {}",
            request.passenger_id, request.passengers, ride_id
        );
        Ok(request)
    }

    /// Approve or reject a pending request as the ride's driver.
    ///
    /// Approval takes the seats with the booking rules and creates a
    /// confirmed booking in the same transaction.
    pub async fn handle(
        &self,
        request_id: Uuid,
        driver_id: Uuid,
        decision: RequestStatus,
    ) -> Result<RideRequest, BookingError> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, RideRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM ride_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(BookingError::NotFound("Request"))?;

        if request.driver_id != driver_id {
            return Err(BookingError::NotDriver);
        }

        if request.status != RequestStatus::Pending {
            return Err(BookingError::AlreadyHandled);
        }

        if decision == RequestStatus::Approved {
            let ride = lock_ride(&mut *tx, request.ride_id).await?;
            let outcome = booking::evaluate(&ride, request.passenger_id, request.passengers)?;

            insert_booking(&mut *tx, &NewBooking::for_request(&ride, &request)).await?;
            apply_outcome(&mut *tx, &ride, outcome).await?;
        }

        let request = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            UPDATE ride_requests SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request_id)
        .bind(decision.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Driver {} {} request {}", driver_id, decision, request_id);
        Ok(request)
    }

    /// Pending requests on the driver's rides, newest first
    pub async fn pending_for_driver(&self, driver_id: Uuid) -> DatabaseResult<Vec<RideRequest>> {
        let requests = sqlx::query_as::<_, RideRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM ride_requests
            WHERE driver_id = $1 AND status = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(driver_id)
        .bind(RequestStatus::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}
