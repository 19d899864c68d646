//! Application state shared across handlers

use auth::jwt::JwtService;
use sqlx::PgPool;

use crate::{
    places::PlacesService,
    repositories::{
        BookingRepository, RideHistoryRepository, RideRepository, RideRequestRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ride_repository: RideRepository,
    pub booking_repository: BookingRepository,
    pub request_repository: RideRequestRepository,
    pub history_repository: RideHistoryRepository,
    pub places: PlacesService,
    pub jwt_service: JwtService,
}

impl AppState {
    /// Build the repositories over one pool
    pub fn new(db_pool: PgPool, jwt_service: JwtService, places: PlacesService) -> Self {
        Self {
            ride_repository: RideRepository::new(db_pool.clone()),
            booking_repository: BookingRepository::new(db_pool.clone()),
            request_repository: RideRequestRepository::new(db_pool.clone()),
            history_repository: RideHistoryRepository::new(db_pool),
            places,
            jwt_service,
        }
    }
}
