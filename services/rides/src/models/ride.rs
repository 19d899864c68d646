//! Ride models and search parameters

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{RideStatus, time_format};

/// A driver-posted trip offer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: Uuid,
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
}

/// Body of `POST /rides`; the driver comes from the bearer token
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub time: NaiveTime,
    pub price: f64,
    pub seats: i32,
    pub description: Option<String>,
}

impl NewRide {
    pub fn validate(&self) -> Result<(), String> {
        validate_endpoint("from", Some(&self.origin))?;
        validate_endpoint("to", Some(&self.destination))?;
        validate_price(Some(self.price))?;
        validate_seats(Some(self.seats))
    }
}

/// Body of `PUT /rides/{id}`; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRide {
    #[serde(rename = "from")]
    pub origin: Option<String>,
    #[serde(rename = "to")]
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "time_format::option")]
    pub time: Option<NaiveTime>,
    pub price: Option<f64>,
    pub seats: Option<i32>,
    pub description: Option<String>,
}

impl UpdateRide {
    pub fn validate(&self) -> Result<(), String> {
        validate_endpoint("from", self.origin.as_deref())?;
        validate_endpoint("to", self.destination.as_deref())?;
        validate_price(self.price)?;
        validate_seats(self.seats)
    }
}

fn validate_endpoint(field: &str, value: Option<&str>) -> Result<(), String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(format!("'{}' must not be empty", field)),
        _ => Ok(()),
    }
}

fn validate_price(price: Option<f64>) -> Result<(), String> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err("Price cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn validate_seats(seats: Option<i32>) -> Result<(), String> {
    match seats {
        Some(s) if s < 1 => Err("Seats must be at least 1".to_string()),
        _ => Ok(()),
    }
}

/// Raw query string of `GET /rides/find`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindRidesQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub seats: Option<String>,
    pub max_price: Option<String>,
}

/// Validated search criteria
#[derive(Debug, Clone, PartialEq)]
pub struct RideSearch {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub next_date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub seats: Option<i32>,
    pub max_price: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl TryFrom<FindRidesQuery> for RideSearch {
    type Error = String;

    fn try_from(query: FindRidesQuery) -> Result<Self, Self::Error> {
        let (Some(origin), Some(destination), Some(date)) = (
            non_empty(query.from),
            non_empty(query.to),
            non_empty(query.date),
        ) else {
            return Err("Missing from, to, or date parameter".to_string());
        };

        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| "Invalid date format".to_string())?;
        let next_date = date
            .succ_opt()
            .ok_or_else(|| "Invalid date format".to_string())?;

        let time = non_empty(query.time)
            .map(|t| time_format::parse_time(&t).ok_or_else(|| "Invalid time format".to_string()))
            .transpose()?;

        let seats = non_empty(query.seats)
            .map(|s| {
                let seats: i32 = s
                    .trim()
                    .parse()
                    .map_err(|_| "Invalid seats parameter".to_string())?;
                if seats < 1 {
                    return Err("Seats must be at least 1".to_string());
                }
                Ok(seats)
            })
            .transpose()?;

        let max_price = non_empty(query.max_price)
            .map(|p| {
                let max_price: f64 = p
                    .trim()
                    .parse()
                    .map_err(|_| "Invalid maxPrice parameter".to_string())?;
                if !max_price.is_finite() {
                    return Err("Invalid maxPrice parameter".to_string());
                }
                if max_price < 0.0 {
                    return Err("MaxPrice cannot be negative".to_string());
                }
                Ok(max_price)
            })
            .transpose()?;

        Ok(RideSearch {
            origin,
            destination,
            date,
            next_date,
            time,
            seats,
            max_price,
        })
    }
}
