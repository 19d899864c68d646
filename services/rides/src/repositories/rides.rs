//! Ride repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use super::RIDE_COLUMNS;
use crate::models::{NewRide, Ride, RideSearch, RideStatus, UpdateRide};

/// Number of rides returned by `GET /rides`
pub const RECENT_RIDES_LIMIT: i64 = 6;

/// Ride repository
#[derive(Clone)]
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    /// Create a new ride repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Post a new ride for a driver
    pub async fn create(
        &self,
        driver_id: Uuid,
        driver_name: &str,
        ride: &NewRide,
    ) -> DatabaseResult<Ride> {
        let ride = sqlx::query_as::<_, Ride>(&format!(
            r#"
            INSERT INTO rides
                (origin, destination, date, time, price, seats, driver_id, driver_name,
                 description, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(&ride.origin)
        .bind(&ride.destination)
        .bind(ride.date)
        .bind(ride.time)
        .bind(ride.price)
        .bind(ride.seats)
        .bind(driver_id)
        .bind(driver_name)
        .bind(&ride.description)
        .bind(RideStatus::Available.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Driver {} posted ride {}", driver_id, ride.id);
        Ok(ride)
    }

    /// Most recently posted rides, newest first
    pub async fn recent(&self, limit: i64) -> DatabaseResult<Vec<Ride>> {
        let rides = sqlx::query_as::<_, Ride>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rides)
    }

    /// Find a ride by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Ride>> {
        let ride = sqlx::query_as::<_, Ride>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    /// Apply a partial update, returning `None` if the ride does not exist
    pub async fn update(&self, id: Uuid, update: &UpdateRide) -> DatabaseResult<Option<Ride>> {
        let ride = sqlx::query_as::<_, Ride>(&format!(
            r#"
            UPDATE rides SET
                origin = COALESCE($2, origin),
                destination = COALESCE($3, destination),
                date = COALESCE($4, date),
                time = COALESCE($5, time),
                price = COALESCE($6, price),
                seats = COALESCE($7, seats),
                description = COALESCE($8, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RIDE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.origin)
        .bind(&update.destination)
        .bind(update.date)
        .bind(update.time)
        .bind(update.price)
        .bind(update.seats)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ride)
    }

    /// Delete a ride, returning whether a row was removed
    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rides on an exact route leaving on the search date or the day after.
    ///
    /// With a time, same-day rides must leave at or after it while next-day
    /// rides match at any time.
    pub async fn find(&self, search: &RideSearch) -> DatabaseResult<Vec<Ride>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE origin COLLATE \"C\" = "
        ));
        query.push_bind(search.origin.clone());
        query.push(" AND destination COLLATE \"C\" = ");
        query.push_bind(search.destination.clone());

        query.push(" AND date IN (");
        query.push_bind(search.date);
        query.push(", ");
        query.push_bind(search.next_date);
        query.push(")");

        if let Some(time) = search.time {
            query.push(" AND ((date = ");
            query.push_bind(search.date);
            query.push(" AND time >= ");
            query.push_bind(time);
            query.push(") OR date = ");
            query.push_bind(search.next_date);
            query.push(")");
        }

        if let Some(seats) = search.seats {
            query.push(" AND seats >= ");
            query.push_bind(seats);
        }

        if let Some(max_price) = search.max_price {
            query.push(" AND price <= ");
            query.push_bind(max_price);
        }

        query.push(" ORDER BY date, time");

        let rides = query
            .build_query_as::<Ride>()
            .fetch_all(&self.pool)
            .await?;

        info!(
            "Found {} rides from {} to {} around {}",
            rides.len(),
            search.origin,
            search.destination,
            search.date
        );
        Ok(rides)
    }
}
