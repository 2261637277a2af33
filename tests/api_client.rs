mod common;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::event_json;
use ticket_client::api_client::{ApiError, CircuitState, CreateEventRequest, LoginRequest, RegisterRequest};
use ticket_client::error::ErrorKind;
use ticket_client::services::tickets::TicketValidator;
use ticket_client::session::Credentials;

#[tokio::test]
async fn event_list_accepts_both_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event_json("e1", 10, &[1])])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [event_json("e1", 10, &[]), event_json("e2", 5, &[1, 2, 3, 4, 5])]
        })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    let plain = api.get_events().await.unwrap();
    assert_eq!(plain.len(), 1);
    assert_eq!(plain[0].id, "e1");
    assert_eq!(plain[0].display_name(), Some("Event e1"));

    let wrapped = api.get_events().await.unwrap();
    assert_eq!(wrapped.len(), 2);
    assert!(wrapped[1].is_sold_out());
}

#[tokio::test]
async fn unknown_event_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Event not found" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events/soft-missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Event not found" })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    assert!(api.get_event("gone").await.unwrap().is_none());
    assert!(api.get_event("soft-missing").await.unwrap().is_none());
}

#[tokio::test]
async fn breaker_opens_after_repeated_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let api = common::api_with_breaker(&server, 2);
    for _ in 0..2 {
        let err = api.get_events().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
    }
    assert_eq!(api.circuit_state(), CircuitState::Open);

    let err = api.get_events().await.unwrap_err();
    assert!(matches!(err, ApiError::CircuitOpen));
    assert_eq!(err.kind(), ErrorKind::TransientNetwork);
}

#[tokio::test]
async fn client_errors_do_not_trip_breaker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookings/admin/all-tickets"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Admin only" })))
        .mount(&server)
        .await;

    let api = common::api_with_breaker(&server, 1);
    let err = api.all_tickets(&Credentials::bearer("user-token")).await.unwrap_err();

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Admin only");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(api.circuit_state(), CircuitState::Closed);
}

#[tokio::test]
async fn invalid_event_is_rejected_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let api = common::api(&server);
    let request = CreateEventRequest {
        title: "Gala".into(),
        description: String::new(),
        date: "2025-09-01".into(),
        total_seats: 0,
        image_url: None,
        location: "Hall A".into(),
    };

    let err = api.create_event(&Credentials::bearer(common::TOKEN), &request).await.unwrap_err();
    assert!(matches!(err, ApiError::Invalid(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn created_event_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "event": event_json("e5", 40, &[]) })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    let request = CreateEventRequest {
        title: "Event e5".into(),
        description: "Live music".into(),
        date: "2025-09-01T19:00:00.000Z".into(),
        total_seats: 40,
        image_url: None,
        location: "Almaty Arena".into(),
    };

    let event = api.create_event(&Credentials::bearer(common::TOKEN), &request).await.unwrap();
    assert_eq!(event.id, "e5");
    assert_eq!(event.seats_left(), 40);
}

#[tokio::test]
async fn user_tickets_fall_back_to_single_seat_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookings/events-with-seats/user/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 2,
            "events": [
                {
                    "_id": "e1", "title": "Gala", "totalSeats": 100, "bookedSeats": [3, 4],
                    "seatNumbers": [3, 4], "seatCategories": ["diamond", "diamond"], "qrCodes": ["q3", "q4"]
                },
                {
                    "_id": "e2", "title": "Opera", "totalSeats": 20, "bookedSeats": [9],
                    "seatNumbers": [], "seatCategories": [],
                    "seatNumber": 9, "seatCategory": "silver", "qrCode": "q9"
                }
            ]
        })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    let events = api.user_booked_events(&Credentials::bearer(common::TOKEN), "u1").await.unwrap();

    assert_eq!(events[0].my_seats(), vec![3, 4]);
    assert_eq!(events[0].my_qr_codes(), vec!["q3", "q4"]);
    assert_eq!(events[1].my_seats(), vec![9]);
    assert_eq!(events[1].my_categories(), vec!["silver"]);
    assert_eq!(events[1].my_qr_codes(), vec!["q9"]);
}

#[tokio::test]
async fn ticket_validation_sends_text_or_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bookings/validate"))
        .and(body_json(json!({ "qr": "TICKET-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true, "message": "Welcome" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bookings/validate"))
        .and(body_json(json!({ "qrImage": "data:image/png;base64,aGk=" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": false })))
        .expect(1)
        .mount(&server)
        .await;

    let validator = TicketValidator::new(common::api(&server));
    let credentials = Credentials::bearer(common::TOKEN);

    let by_text = validator.validate_text(&credentials, "  TICKET-42 ").await.unwrap();
    assert!(by_text.valid);
    assert_eq!(by_text.message.as_deref(), Some("Welcome"));

    let by_image = validator.validate_image(&credentials, b"hi", "image/png").await.unwrap();
    assert!(!by_image.valid);

    let empty = validator.validate_text(&credentials, "   ").await.unwrap();
    assert!(!empty.valid);
}

#[tokio::test]
async fn login_returns_session_with_server_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .and(body_json(json!({ "email": "admin@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "jwt-from-server",
            "user": { "_id": "u-admin", "name": "Admin", "email": "admin@example.com", "isAdmin": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = common::api(&server);
    let session = api
        .login(&LoginRequest { email: "admin@example.com".into(), password: "secret".into() })
        .await
        .unwrap();

    assert_eq!(session.credentials.token(), "jwt-from-server");
    assert_eq!(session.user.id, "u-admin");
    assert!(session.is_admin());
}

#[tokio::test]
async fn login_without_token_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Invalid credentials" })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    let err = api
        .login(&LoginRequest { email: "ann@example.com".into(), password: "wrong".into() })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Refused(ref m) if m == "Invalid credentials"));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn invalid_login_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = common::api(&server);
    let err = api
        .login(&LoginRequest { email: "not-an-email".into(), password: String::new() })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Invalid(_)));
}

#[tokio::test]
async fn register_checks_success_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users/register"))
        .and(body_json(json!({ "name": "Ann", "email": "ann@example.com", "password": "secret" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "success": true, "message": "User registered" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "User already exists" })))
        .mount(&server)
        .await;

    let api = common::api(&server);
    let request = RegisterRequest { name: "Ann".into(), email: "ann@example.com".into(), password: "secret".into() };
    api.register(&request).await.unwrap();

    let err = api.register(&request).await.unwrap_err();
    assert!(matches!(err, ApiError::Refused(ref m) if m == "User already exists"));
}
