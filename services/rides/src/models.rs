//! API models for request and response payloads
//!
//! Every payload is camelCase on the wire except the trip endpoints, which
//! are `from` and `to` (stored as `origin` and `destination`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod booking;
pub mod history;
pub mod request;
pub mod ride;
pub mod time_format;

pub use booking::{Booking, BookingPayload, NewBooking, Passenger};
pub use history::RideHistory;
pub use request::{HandleRequestPayload, NewRideRequest, RideRequest, RideRequestPayload};
pub use ride::{FindRidesQuery, NewRide, Ride, RideSearch, UpdateRide};

/// A status column held a value no variant maps to
#[derive(Debug, Error, PartialEq)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownStatus(other.to_string())),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownStatus;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }
    };
}

status_enum! {
    /// Lifecycle of a posted ride
    RideStatus {
        Available => "available",
        /// Never written: full rides move to history. Kept so rows stored
        /// with this status still decode.
        Booked => "booked",
        Completed => "completed",
    }
}

status_enum! {
    BookingStatus {
        Confirmed => "confirmed",
    }
}

status_enum! {
    /// A request is pending until its driver approves or rejects it
    RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}
