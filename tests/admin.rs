mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::admin_booking_json;
use ticket_client::error::{AdminError, ErrorKind};
use ticket_client::models::{Booking, BookingAttributes};
use ticket_client::services::admin::{AdminView, DeleteOutcome, Freshness};

async fn mount_tickets(server: &MockServer, bookings: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/bookings/admin/all-tickets"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": bookings.as_array().map_or(0, |b| b.len()),
            "bookings": bookings,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn non_admin_session_is_refused() {
    let server = MockServer::start().await;
    let mirror = common::mirror().await;

    let err = AdminView::new(common::api(&server), mirror, common::session(false)).err().unwrap();
    assert!(matches!(err, AdminError::AccessDenied));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn selecting_event_clears_user() {
    let server = MockServer::start().await;
    let mut view = AdminView::new(common::api(&server), common::mirror().await, common::session(true)).unwrap();

    view.select_event(Some("e1"));
    view.select_user(Some("u1"));
    view.select_event(Some("e2"));

    assert_eq!(view.selected_event(), Some("e2"));
    assert_eq!(view.selected_user(), None);
    assert!(view.tickets().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_stays_local_when_remote_fails() {
    let server = MockServer::start().await;
    mount_tickets(&server, json!([admin_booking_json("b1", Some("e1"), Some("u1"), &[3])])).await;
    Mock::given(method("DELETE"))
        .and(path("/admin/booking/b1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "db down" })))
        .expect(1)
        .mount(&server)
        .await;

    let mirror = common::mirror().await;
    let mut view = AdminView::new(common::api(&server), mirror.clone(), common::session(true)).unwrap();
    view.refresh().await.unwrap();
    view.select_event(Some("e1"));
    view.select_user(Some("u1"));
    assert_eq!(view.tickets().await.unwrap().len(), 1);

    let outcome = view.delete_booking("b1").await.unwrap();
    match outcome {
        DeleteOutcome::LocalOnly(warning) => {
            assert_eq!(warning.booking_id, "b1");
            assert_eq!(warning.kind(), ErrorKind::PartialSync);
        }
        DeleteOutcome::Synced => panic!("remote delete should have failed"),
    }

    assert!(mirror.find::<Booking>("b1").await.unwrap().is_none());
    assert!(mirror.bookings_for("e1", "u1").await.unwrap().is_empty());
    assert!(view.tickets().await.unwrap().is_empty());
    assert!(view.events().await.unwrap().is_empty());

    let pending = mirror.pending_deletes().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].booking_id, "b1");
}

#[tokio::test]
async fn live_view_reads_remote_snapshot() {
    let server = MockServer::start().await;
    mount_tickets(
        &server,
        json!([
            admin_booking_json("b1", Some("e1"), Some("u1"), &[3]),
            admin_booking_json("b2", Some("e1"), Some("u1"), &[4]),
            admin_booking_json("b3", Some("e1"), None, &[5]),
            admin_booking_json("b4", None, Some("u1"), &[6]),
        ]),
    )
    .await;

    let mirror = common::mirror().await;
    let mut view = AdminView::new(common::api(&server), mirror.clone(), common::session(true)).unwrap();
    let outcome = view.refresh().await.unwrap();
    assert_eq!(outcome.freshness, Freshness::Live);
    assert_eq!(outcome.report.as_ref().unwrap().skipped_orphans, vec!["b4"]);

    // локальная правка не видна, пока есть свежий ответ сервера
    mirror
        .upsert::<Booking>("b1", &BookingAttributes { status: Some("edited-locally".into()), ..Default::default() })
        .await
        .unwrap();

    view.select_event(Some("e1"));
    let users: Vec<String> = view.users().await.unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(users, vec!["u1", "unknown-b3"]);

    view.select_user(Some("u1"));
    let tickets = view.tickets().await.unwrap();
    let ids: Vec<&str> = tickets.iter().map(|t| t.booking_id.as_str()).collect();
    assert_eq!(ids, vec!["b1", "b2"]);
    assert_eq!(tickets[0].status, "confirmed");
    assert_eq!(tickets[0].qr_codes, vec!["qr-b1-3"]);

    view.select_user(Some("unknown-b3"));
    assert_eq!(view.tickets().await.unwrap()[0].seat_numbers, vec![5]);
}

#[tokio::test]
async fn offline_refresh_falls_back_to_mirror() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bookings/admin/all-tickets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bookings": [admin_booking_json("b1", Some("e1"), Some("u1"), &[3])]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bookings/admin/all-tickets"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mirror = common::mirror().await;
    let mut view = AdminView::new(common::api(&server), mirror.clone(), common::session(true)).unwrap();
    assert_eq!(view.refresh().await.unwrap().freshness, Freshness::Live);

    mirror
        .upsert::<Booking>("b1", &BookingAttributes { status: Some("checked-in".into()), ..Default::default() })
        .await
        .unwrap();

    let outcome = view.refresh().await.unwrap();
    assert_eq!(outcome.freshness, Freshness::Stale);
    assert!(outcome.error.is_some());
    assert_eq!(view.freshness(), Freshness::Stale);

    view.select_event(Some("e1"));
    view.select_user(Some("u1"));
    let tickets = view.tickets().await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].status, "checked-in");
    assert_eq!(tickets[0].seat_numbers, vec![3]);
}

#[tokio::test]
async fn refresh_retries_pending_deletes() {
    let server = MockServer::start().await;
    mount_tickets(&server, json!([])).await;
    Mock::given(method("DELETE"))
        .and(path("/admin/booking/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/booking/b2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Booking not found" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/admin/booking/b3"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let mirror = common::mirror().await;
    for id in ["b1", "b2", "b3"] {
        mirror.mark_delete_pending(id, "timeout").await.unwrap();
    }

    let mut view = AdminView::new(common::api(&server), mirror.clone(), common::session(true)).unwrap();
    let outcome = view.refresh().await.unwrap();

    assert_eq!(outcome.deletes_synced, 2);
    assert_eq!(outcome.deletes_pending, 1);
    let pending = mirror.pending_deletes().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].booking_id, "b3");
    assert_eq!(pending[0].attempts, 2);
}

#[tokio::test]
async fn already_deleted_booking_counts_as_synced() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/booking/b7"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mirror = common::mirror().await;
    let mut view = AdminView::new(common::api(&server), mirror.clone(), common::session(true)).unwrap();

    assert_eq!(view.delete_booking("b7").await.unwrap(), DeleteOutcome::Synced);
    assert!(mirror.pending_deletes().await.unwrap().is_empty());
}
