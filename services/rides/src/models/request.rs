use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Passenger, RequestStatus, Ride, time_format};

/// A passenger's ask to join a ride, pending the driver's decision
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RideRequest {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub passenger_name: String,
    pub profile_pic: String,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    pub passengers: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRequest {
    /// The requesting passenger as recorded on the request
    pub fn passenger(&self) -> Passenger {
        Passenger {
            id: self.passenger_id,
            name: self.passenger_name.clone(),
            profile_pic: self.profile_pic.clone(),
        }
    }
}

/// Body of `POST /rides/{id}/requests`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RideRequestPayload {
    pub passengers: i32,
    pub special_requests: Option<String>,
}

/// A pending request about to be inserted
#[derive(Debug, Clone)]
pub struct NewRideRequest {
    pub ride_id: Uuid,
    pub driver_id: Uuid,
    pub passenger: Passenger,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub passengers: i32,
    pub special_requests: Option<String>,
}

impl NewRideRequest {
    /// Ask for `passengers` seats on `ride`, copying its trip details and driver
    pub fn for_ride(ride: &Ride, passenger: Passenger, payload: RideRequestPayload) -> Self {
        Self {
            ride_id: ride.id,
            driver_id: ride.driver_id,
            passenger,
            origin: ride.origin.clone(),
            destination: ride.destination.clone(),
            date: ride.date,
            time: ride.time,
            passengers: payload.passengers,
            special_requests: payload.special_requests,
        }
    }
}

/// Body of `PUT /ride-requests/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct HandleRequestPayload {
    pub status: String,
}

impl HandleRequestPayload {
    /// The decision, which must be `approved` or `rejected`
    pub fn decision(&self) -> Result<RequestStatus, String> {
        match self.status.parse::<RequestStatus>() {
            Ok(status @ (RequestStatus::Approved | RequestStatus::Rejected)) => Ok(status),
            _ => Err("Invalid status".to_string()),
        }
    }
}
