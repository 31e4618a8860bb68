//! Request shapes of the backend endpoints.

use focusapp_api::{ApiClient, ApiError, ApiRequest, ClientConfig};
use focusapp_core::model::{Credentials, NewAccount, TokenPair, UserSummary};
use focusapp_core::storage::MemoryStorage;
use focusapp_core::storage::TokenStorage;
use focusapp_testing::fixtures;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_with_token(server: &MockServer, access: Option<&str>) -> ApiClient {
    let storage = Arc::new(MemoryStorage::new());
    if let Some(access) = access {
        storage.set("access", access).unwrap();
    }
    let config = ClientConfig::new(format!("{}/api", server.uri())).unwrap();
    ApiClient::new(config, storage).unwrap()
}

#[tokio::test]
async fn test_obtain_tokens_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/token/"))
        .and(body_json(json!({ "username": "alice", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::token_body("A1", "R1")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    let tokens = client
        .obtain_tokens(&Credentials::new("alice", "pw"))
        .await
        .unwrap();

    assert_eq!(tokens, TokenPair::new("A1", "R1"));
}

#[tokio::test]
async fn test_obtain_tokens_requires_both_tokens() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A1" })))
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    let result = client.obtain_tokens(&Credentials::new("alice", "pw")).await;

    assert!(matches!(result, Err(ApiError::Rejected { .. })));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(path("/api/users/token/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    let result = client.obtain_tokens(&Credentials::new("alice", "wrong")).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_current_user_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me/"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::identity_body(1, "alice")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    let me = client.current_user("A1").await.unwrap();

    assert_eq!(me, UserSummary::new(1, "alice"));
}

#[tokio::test]
async fn test_revoke_session_posts_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/logout/"))
        .and(header("Authorization", "Bearer A1"))
        .and(body_json(json!({ "refresh": "R1" })))
        .respond_with(ResponseTemplate::new(205))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    client
        .revoke_session(&TokenPair::new("A1", "R1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_register_account() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/register/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "id": 7, "username": "carol" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    let account = NewAccount {
        username: "carol".to_string(),
        email: "carol@example.com".to_string(),
        password: "s3cret!".to_string(),
        first_name: "Carol".to_string(),
        last_name: "Díaz".to_string(),
        date_of_birth: "1990-05-01".to_string(),
    };

    let created = client.register_account(&account).await.unwrap();
    assert_eq!(created.id, 7);
}

#[tokio::test]
async fn test_authenticated_request_reads_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/count/"))
        .and(header("Authorization", "Bearer STORED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::unread_count_body(4)))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, Some("STORED")).await;
    assert_eq!(client.unread_count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_authenticated_request_without_token_fails_locally() {
    let server = MockServer::start().await;
    Mock::given(path("/api/notifications/count/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with_token(&server, None).await;
    assert!(matches!(client.unread_count().await, Err(ApiError::MissingToken)));

    let raw = client
        .fetch(ApiRequest::get("notifications/count/").authenticated())
        .await;
    assert!(matches!(raw, Err(ApiError::MissingToken)));
}

#[tokio::test]
async fn test_mark_endpoints_use_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/notifications/mark-as-read/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::ack()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/notifications/mark-all-as-read/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::ack()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, Some("A1")).await;
    client.mark_notification_read(3).await.unwrap();
    client.mark_all_notifications_read().await.unwrap();
}

#[tokio::test]
async fn test_unsuccessful_list_is_empty() {
    let server = MockServer::start().await;
    Mock::given(path("/api/notifications/unread/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let client = client_with_token(&server, Some("A1")).await;
    assert!(client.unread_notifications().await.unwrap().is_empty());
}
