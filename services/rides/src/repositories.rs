//! Repositories for database operations

pub mod bookings;
pub mod history;
pub mod requests;
pub mod rides;

pub use bookings::BookingRepository;
pub use history::RideHistoryRepository;
pub use requests::RideRequestRepository;
pub use rides::RideRepository;

pub(crate) const RIDE_COLUMNS: &str = "id, origin, destination, date, time, price, seats, \
     driver_id, driver_name, description, status, created_at, updated_at";

pub(crate) const BOOKING_COLUMNS: &str = "id, ride_id, passenger_id, passenger_name, \
     profile_pic, origin, destination, date, time, passengers, special_requests, status, \
     created_at, updated_at";

pub(crate) const REQUEST_COLUMNS: &str = "id, ride_id, driver_id, passenger_id, \
     passenger_name, profile_pic, origin, destination, date, time, passengers, \
     special_requests, status, created_at, updated_at";

pub(crate) const HISTORY_COLUMNS: &str = "id, ride_id, origin, destination, date, time, \
     price, seats, driver_id, driver_name, description, status, created_at, updated_at, \
     completed_at";
