use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{RideStatus, time_format};

/// Snapshot of a ride taken when its last seat was booked
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RideHistory {
    pub id: Uuid,
    pub ride_id: Uuid,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    pub price: f64,
    pub seats: i32,
    pub driver_id: Uuid,
    pub driver_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
