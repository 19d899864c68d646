//! End-to-end booking flows against a real PostgreSQL
//!
//! Run with `DATABASE_URL` pointing at a disposable database and
//! `cargo test -- --ignored`.

mod support;

use auth::repositories::UserRepository;
use common::database::{DatabaseConfig, init_pool, run_migrations};
use rides::{models::RideStatus, repositories::RideHistoryRepository};
use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::PgPool;
use support::TestServer;
use uuid::Uuid;

async fn database() -> PgPool {
    let config = DatabaseConfig::from_env().expect("DATABASE_URL");
    let pool = init_pool(&config).await.expect("database");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// A route name no other test run shares
fn unique_place(name: &str) -> String {
    format!("{} {}", name, Uuid::new_v4().simple())
}

async fn post_ride(server: &TestServer, token: &str, body: Value) -> Value {
    let response = reqwest::Client::new()
        .post(server.url("/rides"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn bookings_on_ride(pool: &PgPool, ride_id: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE ride_id = $1")
        .bind(Uuid::parse_str(ride_id).unwrap())
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

async fn request_seats(server: &TestServer, token: &str, ride_id: &str, passengers: i32) -> Value {
    let response = reqwest::Client::new()
        .post(server.url(&format!("/rides/{}/requests", ride_id)))
        .bearer_auth(token)
        .json(&json!({ "passengers": passengers }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn decide(
    server: &TestServer,
    token: &str,
    request: &Value,
    status: &str,
) -> reqwest::Response {
    reqwest::Client::new()
        .put(server.url(&format!(
            "/ride-requests/{}",
            request["id"].as_str().unwrap()
        )))
        .bearer_auth(token)
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap()
}

async fn fetch_ride(server: &TestServer, ride_id: &str) -> reqwest::Response {
    reqwest::get(server.url(&format!("/rides/{}", ride_id)))
        .await
        .unwrap()
}

fn ride_body(from: &str, to: &str, date: &str, time: &str, seats: i32) -> Value {
    json!({
        "from": from,
        "to": to,
        "date": date,
        "time": time,
        "price": 15.5,
        "seats": seats
    })
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn overbooking_reports_the_deficit_and_keeps_seats() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let passenger = server.token_for(Uuid::new_v4(), "Pat");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Dallas", "2031-03-10", "09:00", 2),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let response = client
        .post(server.url(&format!("/rides/{}/book", ride_id)))
        .bearer_auth(&passenger)
        .json(&json!({ "passengers": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["available_seats"], 2);
    assert_eq!(body["requested_seats"], 3);
    assert_eq!(body["excess_seats"], 1);

    let ride: Value = reqwest::get(server.url(&format!("/rides/{}", ride_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ride["seats"], 2);
    assert_eq!(bookings_on_ride(&pool, ride_id).await, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn taking_the_last_seats_moves_the_ride_to_history() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let passenger = server.token_for(Uuid::new_v4(), "Pat");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Houston", "2031-03-10", "10:30", 3),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let first = client
        .post(server.url(&format!("/rides/{}/book", ride_id)))
        .bearer_auth(&passenger)
        .json(&json!({ "passengers": 1, "specialRequests": "Small dog" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let remaining = client
        .post(server.url(&format!("/rides/{}/book", ride_id)))
        .bearer_auth(&passenger)
        .json(&json!({ "passengers": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(remaining.status(), StatusCode::CREATED);

    let gone = reqwest::get(server.url(&format!("/rides/{}", ride_id)))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let history = RideHistoryRepository::new(pool.clone())
        .find_by_ride(Uuid::parse_str(ride_id).unwrap())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].seats, 0);
    assert_eq!(history[0].status, RideStatus::Completed);

    let history: Vec<Value> = client
        .get(server.url("/rides/history"))
        .bearer_auth(&driver)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history.iter().any(|h| h["rideId"] == ride_id));

    let bookings: Vec<Value> = client
        .get(server.url("/bookings"))
        .bearer_auth(&passenger)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bookings.len(), 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn drivers_cannot_book_their_own_ride() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let driver = server.token_for(Uuid::new_v4(), "Dana");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Waco", "2031-03-10", "07:15", 4),
    )
    .await;

    let ride_id = ride["id"].as_str().unwrap();

    let response = reqwest::Client::new()
        .post(server.url(&format!("/rides/{}/book", ride_id)))
        .bearer_auth(&driver)
        .json(&json!({ "passengers": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(bookings_on_ride(&pool, ride_id).await, 0);

    let ride: Value = fetch_ride(&server, ride_id).await.json().await.unwrap();
    assert_eq!(ride["seats"], 4);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn only_the_driver_edits_a_ride() {
    let server = TestServer::spawn_with_pool(database().await).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let stranger = server.token_for(Uuid::new_v4(), "Sam");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Marfa", "2031-03-10", "06:00", 2),
    )
    .await;
    let url = server.url(&format!("/rides/{}", ride["id"].as_str().unwrap()));

    let forbidden = client
        .put(&url)
        .bearer_auth(&stranger)
        .json(&json!({ "price": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated: Value = client
        .put(&url)
        .bearer_auth(&driver)
        .json(&json!({ "price": 30.0, "time": "06:45" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated["price"], 30.0);
    assert_eq!(updated["time"], "06:45");
    assert_eq!(updated["seats"], 2);

    let deleted = client.delete(&url).bearer_auth(&driver).send().await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = client.delete(&url).bearer_auth(&driver).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn a_request_is_handled_once() {
    let server = TestServer::spawn_with_pool(database().await).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let passenger = server.token_for(Uuid::new_v4(), "Pat");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "El Paso", "2031-03-10", "12:00", 3),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let request: Value = client
        .post(server.url(&format!("/rides/{}/requests", ride_id)))
        .bearer_auth(&passenger)
        .json(&json!({ "passengers": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(request["status"], "pending");
    let request_url = server.url(&format!("/ride-requests/{}", request["id"].as_str().unwrap()));

    let pending: Vec<Value> = client
        .get(server.url("/ride-requests/pending"))
        .bearer_auth(&driver)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.iter().any(|r| r["id"] == request["id"]));

    let not_driver = client
        .put(&request_url)
        .bearer_auth(&passenger)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(not_driver.status(), StatusCode::FORBIDDEN);

    let approved = client
        .put(&request_url)
        .bearer_auth(&driver)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);

    let again = client
        .put(&request_url)
        .bearer_auth(&driver)
        .json(&json!({ "status": "approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    let body: Value = again.json().await.unwrap();
    assert_eq!(body["error"], "Request already handled");

    let ride: Value = reqwest::get(server.url(&format!("/rides/{}", ride_id)))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ride["seats"], 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn approving_the_last_seats_moves_the_ride_to_history() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let passenger = server.token_for(Uuid::new_v4(), "Pat");
    let other = server.token_for(Uuid::new_v4(), "Sam");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Lubbock", "2031-03-10", "08:30", 2),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let full = request_seats(&server, &passenger, ride_id, 2).await;
    let single = request_seats(&server, &other, ride_id, 1).await;

    let rejected = decide(&server, &driver, &single, "rejected").await;
    assert_eq!(rejected.status(), StatusCode::OK);
    let rejected: Value = rejected.json().await.unwrap();
    assert_eq!(rejected["status"], "rejected");

    let ride: Value = fetch_ride(&server, ride_id).await.json().await.unwrap();
    assert_eq!(ride["seats"], 2);
    assert_eq!(bookings_on_ride(&pool, ride_id).await, 0);

    let approved = decide(&server, &driver, &full, "approved").await;
    assert_eq!(approved.status(), StatusCode::OK);
    let approved: Value = approved.json().await.unwrap();
    assert_eq!(approved["status"], "approved");

    assert_eq!(fetch_ride(&server, ride_id).await.status(), StatusCode::NOT_FOUND);

    let history = RideHistoryRepository::new(pool.clone())
        .find_by_ride(Uuid::parse_str(ride_id).unwrap())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].seats, 0);
    assert_eq!(history[0].status, RideStatus::Completed);

    let bookings: Vec<Value> = client
        .get(server.url("/bookings"))
        .bearer_auth(&passenger)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["status"], "confirmed");
    assert_eq!(bookings[0]["passengers"], 2);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn approval_fails_once_the_seats_are_gone() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let requester = server.token_for(Uuid::new_v4(), "Pat");
    let booker = server.token_for(Uuid::new_v4(), "Sam");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Abilene", "2031-03-10", "16:00", 3),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let request = request_seats(&server, &requester, ride_id, 3).await;

    let booked = reqwest::Client::new()
        .post(server.url(&format!("/rides/{}/book", ride_id)))
        .bearer_auth(&booker)
        .json(&json!({ "passengers": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(booked.status(), StatusCode::CREATED);

    let response = decide(&server, &driver, &request, "approved").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["available_seats"], 1);
    assert_eq!(body["requested_seats"], 3);
    assert_eq!(body["excess_seats"], 2);

    let ride: Value = fetch_ride(&server, ride_id).await.json().await.unwrap();
    assert_eq!(ride["seats"], 1);
    assert_eq!(bookings_on_ride(&pool, ride_id).await, 1);

    let (status,): (String,) = sqlx::query_as("SELECT status FROM ride_requests WHERE id = $1")
        .bind(Uuid::parse_str(request["id"].as_str().unwrap()).unwrap())
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "pending");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn approval_books_the_ride_as_edited() {
    let server = TestServer::spawn_with_pool(database().await).await;
    let client = reqwest::Client::new();
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let passenger = server.token_for(Uuid::new_v4(), "Pat");

    let ride = post_ride(
        &server,
        &driver,
        ride_body(&unique_place("Austin"), "Odessa", "2031-03-10", "09:00", 3),
    )
    .await;
    let ride_id = ride["id"].as_str().unwrap();

    let request = request_seats(&server, &passenger, ride_id, 1).await;

    let edited = client
        .put(server.url(&format!("/rides/{}", ride_id)))
        .bearer_auth(&driver)
        .json(&json!({ "date": "2031-03-11", "time": "14:30" }))
        .send()
        .await
        .unwrap();
    assert_eq!(edited.status(), StatusCode::OK);

    let approved = decide(&server, &driver, &request, "approved").await;
    assert_eq!(approved.status(), StatusCode::OK);

    let bookings: Vec<Value> = client
        .get(server.url("/bookings"))
        .bearer_auth(&passenger)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0]["date"], "2031-03-11");
    assert_eq!(bookings[0]["time"], "14:30");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn find_covers_the_requested_day_and_the_next() {
    let server = TestServer::spawn_with_pool(database().await).await;
    let driver = server.token_for(Uuid::new_v4(), "Dana");
    let from = unique_place("Round Rock");

    for (date, time) in [
        ("2031-03-10", "08:00"),
        ("2031-03-10", "18:00"),
        ("2031-03-11", "07:00"),
        ("2031-03-12", "09:00"),
    ] {
        post_ride(&server, &driver, ride_body(&from, "Temple", date, time, 2)).await;
    }

    let url = reqwest::Url::parse_with_params(
        &server.url("/rides/find"),
        &[
            ("from", from.as_str()),
            ("to", "Temple"),
            ("date", "2031-03-10"),
            ("time", "12:00"),
        ],
    )
    .unwrap();
    let rides: Vec<Value> = reqwest::get(url).await.unwrap().json().await.unwrap();

    let found: Vec<(&str, &str)> = rides
        .iter()
        .map(|r| (r["date"].as_str().unwrap(), r["time"].as_str().unwrap()))
        .collect();
    assert_eq!(found, vec![("2031-03-10", "18:00"), ("2031-03-11", "07:00")]);

    let case_sensitive = reqwest::Url::parse_with_params(
        &server.url("/rides/find"),
        &[
            ("from", from.to_lowercase().as_str()),
            ("to", "Temple"),
            ("date", "2031-03-10"),
        ],
    )
    .unwrap();
    let rides: Vec<Value> = reqwest::get(case_sensitive)
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(rides.is_empty());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn duplicate_signup_is_rejected() {
    let pool = database().await;
    let server = TestServer::spawn_with_pool(pool.clone()).await;
    let client = reqwest::Client::new();
    let email = format!("rider-{}@example.com", Uuid::new_v4().simple());

    let first = client
        .post(server.url("/auth/email/signup"))
        .json(&json!({ "email": email, "password": "secret123", "name": "Rider" }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body: Value = first.json().await.unwrap();
    assert!(body["token"].as_str().is_some());
    let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let stored = UserRepository::new(pool.clone())
        .find_by_id(user_id)
        .await
        .unwrap()
        .expect("user row");
    assert_eq!(stored.email, email);
    assert!(stored.password_hash.is_some());

    let second = client
        .post(server.url("/auth/email/signup"))
        .json(&json!({ "email": email.to_uppercase(), "password": "secret456", "name": "Rider" }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let login = client
        .post(server.url("/auth/email/login"))
        .json(&json!({ "email": email, "password": "secret123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
}
