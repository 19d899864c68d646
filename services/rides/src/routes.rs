//! Ride service routes

use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    booking::validate_passengers,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{
        BookingPayload, FindRidesQuery, HandleRequestPayload, NewRide, Ride, RideRequestPayload,
        RideSearch, UpdateRide,
    },
    repositories::rides::RECENT_RIDES_LIMIT,
    state::AppState,
};

/// Query parameters for places autocomplete
#[derive(Debug, Deserialize)]
pub struct PlacesQuery {
    pub input: Option<String>,
}

/// Create the router for the ride endpoints
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/history", get(ride_history))
        .route("/rides/:id", put(update_ride).delete(delete_ride))
        .route("/rides/:id/book", post(book_ride))
        .route("/rides/:id/requests", post(create_ride_request))
        .route("/ride-requests/pending", get(pending_requests))
        .route("/ride-requests/:id", put(handle_ride_request))
        .route("/bookings", get(my_bookings))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/rides", get(recent_rides))
        .route("/rides/find", get(find_rides))
        .route("/rides/:id", get(get_ride))
        .route("/places-autocomplete", get(places_autocomplete))
        .merge(protected_routes)
        .with_state(state)
}

fn path_id(path: Result<Path<Uuid>, PathRejection>, what: &str) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::NotFound(format!("{} not found", what)))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// Load a ride the caller drives
async fn owned_ride(state: &AppState, id: Uuid, user: &AuthUser) -> ApiResult<Ride> {
    let ride = state
        .ride_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the driver can modify this ride".to_string(),
        ));
    }

    Ok(ride)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "ride-share"
    }))
}

/// The most recently posted rides
pub async fn recent_rides(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rides = state.ride_repository.recent(RECENT_RIDES_LIMIT).await?;
    Ok(Json(rides))
}

/// Search rides by route, date and optional filters
pub async fn find_rides(
    State(state): State<AppState>,
    Query(query): Query<FindRidesQuery>,
) -> ApiResult<impl IntoResponse> {
    let search = RideSearch::try_from(query).map_err(ApiError::BadRequest)?;
    let rides = state.ride_repository.find(&search).await?;
    Ok(Json(rides))
}

/// Get a ride by ID
pub async fn get_ride(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Ride")?;
    let ride = state
        .ride_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))?;

    Ok(Json(ride))
}

/// Post a ride as the signed-in driver
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<NewRide>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let ride = json_body(payload)?;
    ride.validate().map_err(ApiError::BadRequest)?;

    let ride = state
        .ride_repository
        .create(user.id, &user.name, &ride)
        .await?;

    Ok((StatusCode::CREATED, Json(ride)))
}

/// Update fields of one of the caller's rides
pub async fn update_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateRide>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Ride")?;
    let update = json_body(payload)?;
    update.validate().map_err(ApiError::BadRequest)?;

    owned_ride(&state, id, &user).await?;

    let ride = state
        .ride_repository
        .update(id, &update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))?;

    info!("Driver {} updated ride {}", user.id, id);
    Ok(Json(ride))
}

/// Delete one of the caller's rides
pub async fn delete_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Ride")?;
    owned_ride(&state, id, &user).await?;

    state.ride_repository.delete(id).await?;

    info!("Driver {} deleted ride {}", user.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// Book seats on a ride
pub async fn book_ride(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<BookingPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Ride")?;
    let payload = json_body(payload)?;
    validate_passengers(payload.passengers)?;

    let booking = state
        .booking_repository
        .book_ride(
            id,
            user.passenger(),
            payload.passengers,
            payload.special_requests,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Ask the driver for seats on a ride
pub async fn create_ride_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RideRequestPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Ride")?;
    let payload = json_body(payload)?;
    validate_passengers(payload.passengers)?;

    let request = state
        .request_repository
        .create(id, user.passenger(), payload)
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Pending requests on the caller's rides
pub async fn pending_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let requests = state.request_repository.pending_for_driver(user.id).await?;
    Ok(Json(requests))
}

/// Approve or reject a request on one of the caller's rides
pub async fn handle_ride_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<HandleRequestPayload>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = path_id(path, "Request")?;
    let decision = json_body(payload)?
        .decision()
        .map_err(ApiError::BadRequest)?;

    let request = state
        .request_repository
        .handle(id, user.id, decision)
        .await?;

    Ok(Json(request))
}

/// The caller's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.booking_repository.list_for_passenger(user.id).await?;
    Ok(Json(bookings))
}

/// The caller's rides that filled up
pub async fn ride_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let history = state.history_repository.list_for_driver(user.id).await?;
    Ok(Json(history))
}

/// Proxy Google Places autocomplete
pub async fn places_autocomplete(
    State(state): State<AppState>,
    Query(query): Query<PlacesQuery>,
) -> ApiResult<impl IntoResponse> {
    let input = query
        .input
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing input parameter".to_string()))?;

    let suggestions = state
        .places
        .autocomplete(&input)
        .await
        .map_err(|e| ApiError::Upstream(format!("Places autocomplete failed: {}", e)))?;

    Ok(Json(suggestions))
}
