//! Both calling conventions feeding 401s into the expiration coordinator.

use focusapp_api::{ApiClient, ApiError, ApiRequest, ClientConfig, install_expiration_interceptors};
use focusapp_core::environment::Clock;
use focusapp_core::expiration::{ExpirationConfig, SessionExpirationCoordinator};
use focusapp_core::storage::{ACCESS_KEY, REFRESH_KEY};
use focusapp_testing::{ManualClock, RecordingStorage, fixtures, test_clock};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    client: ApiClient,
    coordinator: Arc<SessionExpirationCoordinator>,
    storage: Arc<RecordingStorage>,
    clock: ManualClock,
    expirations: Arc<AtomicUsize>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let storage = Arc::new(RecordingStorage::with_session("A1", "R1", "alice"));
    let clock = ManualClock::new(test_clock().now());

    let config = ClientConfig::new(format!("{}/api/", server.uri())).unwrap();
    let client = ApiClient::new(config, storage.clone()).unwrap();

    let coordinator = SessionExpirationCoordinator::create(
        storage.clone(),
        Arc::new(clock.clone()),
        ExpirationConfig::default(),
    );
    let expirations = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&expirations);
    coordinator.set_expiration_callback(Arc::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(install_expiration_interceptors(&client, &coordinator));

    Harness {
        server,
        client,
        coordinator,
        storage,
        clock,
        expirations,
    }
}

async fn mount_unauthorized(server: &MockServer, route: &str) {
    Mock::given(path(route))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({ "detail": "Token expired" })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_returns_401_response_untouched_and_tears_down() {
    let h = harness().await;
    mount_unauthorized(&h.server, "/api/users/me/").await;

    let response = h
        .client
        .fetch(ApiRequest::get("users/me/").authenticated())
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Token expired");

    assert_eq!(h.expirations.load(Ordering::SeqCst), 1);
    assert_eq!(h.storage.value(ACCESS_KEY), None);
    assert_eq!(h.storage.value(REFRESH_KEY), None);
}

#[tokio::test]
async fn test_send_json_reraises_unauthorized() {
    let h = harness().await;
    mount_unauthorized(&h.server, "/api/notifications/").await;

    let result = h.client.notifications().await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
    assert_eq!(h.expirations.load(Ordering::SeqCst), 1);
    assert!(h.storage.entries().is_empty());
}

#[tokio::test]
async fn test_both_conventions_failing_together_tear_down_once() {
    let h = harness().await;
    mount_unauthorized(&h.server, "/api/users/me/").await;
    mount_unauthorized(&h.server, "/api/notifications/count/").await;
    mount_unauthorized(&h.server, "/api/notifications/").await;

    let (identity, count, list) = tokio::join!(
        h.client.current_user("A1"),
        h.client.unread_count(),
        h.client.notifications(),
    );

    assert!(identity.is_err());
    // 401 or MissingToken, depending on which request read storage first
    assert!(count.is_err());
    assert!(list.is_err());
    assert_eq!(h.expirations.load(Ordering::SeqCst), 1);
    assert_eq!(h.storage.access_removals(), 1);
}

#[tokio::test]
async fn test_second_401_within_window_is_suppressed() {
    let h = harness().await;
    mount_unauthorized(&h.server, "/api/users/me/").await;

    let _ = h.client.current_user("A1").await;
    h.clock.advance(Duration::from_millis(100));
    let _ = h.client.current_user("A1").await;

    assert_eq!(h.expirations.load(Ordering::SeqCst), 1);
    assert!(h.coordinator.is_processing());
}

#[tokio::test]
async fn test_non_unauthorized_errors_do_not_tear_down() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&h.server)
        .await;

    let list = h.client.notifications().await;
    let identity = h.client.current_user("A1").await;

    match list {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(identity, Err(ApiError::Status { status: 403, .. })));
    assert_eq!(h.expirations.load(Ordering::SeqCst), 0);
    assert_eq!(h.storage.value(ACCESS_KEY).as_deref(), Some("A1"));
}

#[tokio::test]
async fn test_installation_is_idempotent() {
    let h = harness().await;

    assert!(!install_expiration_interceptors(&h.client, &h.coordinator));
    assert!(!install_expiration_interceptors(&h.client.clone(), &h.coordinator));
    assert_eq!(h.client.error_interceptor_count(), 1);

    mount_unauthorized(&h.server, "/api/notifications/").await;
    let _ = h.client.notifications().await;
    assert_eq!(h.storage.access_removals(), 1);
}

#[tokio::test]
async fn test_successful_responses_pass_through() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::notification_list(&[1, 2], &[2])))
        .mount(&h.server)
        .await;

    let items = h.client.notifications().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(h.expirations.load(Ordering::SeqCst), 0);
    assert!(!h.coordinator.is_processing());
}
