//! Ride history repository

use common::error::DatabaseResult;
use sqlx::PgPool;
use uuid::Uuid;

use super::HISTORY_COLUMNS;
use crate::models::RideHistory;

/// Read access to archived rides; rows are only written by seat accounting
#[derive(Clone)]
pub struct RideHistoryRepository {
    pool: PgPool,
}

impl RideHistoryRepository {
    /// Create a new ride history repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A driver's archived rides, most recently completed first
    pub async fn list_for_driver(&self, driver_id: Uuid) -> DatabaseResult<Vec<RideHistory>> {
        let history = sqlx::query_as::<_, RideHistory>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM ride_history WHERE driver_id = $1 ORDER BY completed_at DESC"
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    /// Archived snapshots of one ride
    pub async fn find_by_ride(&self, ride_id: Uuid) -> DatabaseResult<Vec<RideHistory>> {
        let history = sqlx::query_as::<_, RideHistory>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM ride_history WHERE ride_id = $1"
        ))
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }
}
