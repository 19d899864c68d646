use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{BookingStatus, Ride, RideRequest, time_format};

/// A confirmed seat reservation; trip details are copied from the ride
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
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
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /rides/{id}/book`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub passengers: i32,
    pub special_requests: Option<String>,
}

/// The signed-in user taking the seats
#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub id: Uuid,
    pub name: String,
    pub profile_pic: String,
}

/// A booking about to be inserted
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub ride_id: Uuid,
    pub passenger: Passenger,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub passengers: i32,
    pub special_requests: Option<String>,
}

impl NewBooking {
    /// Book `passengers` seats on `ride`, copying its trip details
    pub fn for_ride(
        ride: &Ride,
        passenger: Passenger,
        passengers: i32,
        special_requests: Option<String>,
    ) -> Self {
        Self {
            ride_id: ride.id,
            passenger,
            origin: ride.origin.clone(),
            destination: ride.destination.clone(),
            date: ride.date,
            time: ride.time,
            passengers,
            special_requests,
        }
    }

    /// Book the seats of an approved request.
    ///
    /// Trip details come from the ride as it stands now, since the driver may
    /// have edited it after the request was made.
    pub fn for_request(ride: &Ride, request: &RideRequest) -> Self {
        Self::for_ride(
            ride,
            request.passenger(),
            request.passengers,
            request.special_requests.clone(),
        )
    }
}
