#![allow(dead_code)]

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::MockServer;

use ticket_client::api_client::{AdminBooking, ApiClient, ApiEvent};
use ticket_client::config::CircuitBreakerConfig;
use ticket_client::database::Database;
use ticket_client::mirror::MirrorStore;
use ticket_client::session::{AuthUser, Credentials, Session};

pub const TOKEN: &str = "test-token";

pub async fn mirror() -> MirrorStore {
    let db = Database::in_memory().await.expect("in-memory database");
    db.run_migrations().await.expect("migrations");
    MirrorStore::new(db)
}

pub fn api(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5), &CircuitBreakerConfig::default()).expect("api client")
}

pub fn api_with_breaker(server: &MockServer, failure_threshold: u32) -> ApiClient {
    let breaker = CircuitBreakerConfig { failure_threshold, timeout_seconds: 60 };
    ApiClient::new(&server.uri(), Duration::from_secs(5), &breaker).expect("api client")
}

pub fn session(is_admin: bool) -> Session {
    Session::new(
        Credentials::bearer(TOKEN),
        AuthUser {
            id: "u-session".to_string(),
            name: Name().fake(),
            email: SafeEmail().fake(),
            phone: None,
            is_admin,
        },
    )
}

pub fn event_json(id: &str, total_seats: u32, booked_seats: &[u32]) -> Value {
    json!({
        "_id": id,
        "title": format!("Event {}", id),
        "description": "Live music",
        "date": "2025-09-01T19:00:00.000Z",
        "location": "Almaty Arena",
        "totalSeats": total_seats,
        "bookedSeats": booked_seats,
    })
}

pub fn api_event(id: &str, total_seats: u32, booked_seats: &[u32]) -> ApiEvent {
    serde_json::from_value(event_json(id, total_seats, booked_seats)).expect("event json")
}

pub fn user_json(id: &str) -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    json!({ "_id": id, "name": name, "email": email, "isAdmin": false })
}

/// Строка `GET /bookings/admin/all-tickets`; `None` даёт `null` вместо события или пользователя.
pub fn admin_booking_json(booking_id: &str, event_id: Option<&str>, user_id: Option<&str>, seats: &[u32]) -> Value {
    json!({
        "bookingId": booking_id,
        "ticketNumber": format!("T-{}", booking_id),
        "status": "confirmed",
        "seatNumbers": seats,
        "seatCategories": vec!["silver"; seats.len()],
        "qrCodes": seats.iter().map(|s| format!("qr-{}-{}", booking_id, s)).collect::<Vec<_>>(),
        "user": user_id.map(user_json),
        "event": event_id.map(|id| event_json(id, 100, seats)),
    })
}

pub fn admin_booking(booking_id: &str, event_id: Option<&str>, user_id: Option<&str>, seats: &[u32]) -> AdminBooking {
    serde_json::from_value(admin_booking_json(booking_id, event_id, user_id, seats)).expect("admin booking json")
}
