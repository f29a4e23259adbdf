//! HTTP platform client tests against a mock server

mod common;

use futures::StreamExt;
use mockito::{Matcher, Server};
use podex::adapters::platform::{
    HttpPlatformClient, MemorySessionStore, Method, PlatformApi, SessionStore,
};
use podex::config::{secret_string, PlatformConfig, PodexConfig};
use podex::core::export::ExportCoordinator;
use podex::domain::PodexError;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

fn platform_config(base_url: String) -> PlatformConfig {
    PlatformConfig {
        base_url,
        auth_type: "password".to_string(),
        client_id: "podex-test".to_string(),
        client_secret: secret_string("client-secret".to_string()),
        username: "jane@example.com".to_string(),
        password: secret_string("hunter2".to_string()),
        timeout_seconds: 5,
    }
}

const TOKEN_BODY: &str =
    r#"{"access_token": "tok-123", "refresh_token": "ref-456", "expires_in": 28800}"#;

async fn authenticated_client(
    server: &mut Server,
) -> (HttpPlatformClient, Arc<MemorySessionStore>) {
    let token = server
        .mock("POST", "/oauth/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "password".into()),
            Matcher::UrlEncoded("username".into(), "jane@example.com".into()),
            Matcher::UrlEncoded("password".into(), "hunter2".into()),
            Matcher::UrlEncoded("client_id".into(), "podex-test".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .create_async()
        .await;

    let sessions = Arc::new(MemorySessionStore::new());
    let client =
        HttpPlatformClient::new(platform_config(server.url()), sessions.clone()).unwrap();
    client.ensure_authenticated().await.unwrap();
    token.assert_async().await;
    (client, sessions)
}

#[tokio::test]
async fn test_password_flow_stores_session() {
    let mut server = Server::new_async().await;
    let (client, sessions) = authenticated_client(&mut server).await;

    assert!(client.is_authenticated());
    let credentials = sessions.get("password").unwrap();
    assert_eq!(credentials.expires_in, Some(28800));
    assert!(sessions.get("server").is_none());
}

#[tokio::test]
async fn test_stored_session_is_reused() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth/token")
        .expect(0)
        .create_async()
        .await;

    let sessions = Arc::new(MemorySessionStore::new());
    sessions.set(
        podex::adapters::platform::Credentials {
            access_token: secret_string("existing".to_string()),
            refresh_token: None,
            expires_in: None,
        },
        "password",
    );
    let client = HttpPlatformClient::new(platform_config(server.url()), sessions).unwrap();
    client.ensure_authenticated().await.unwrap();

    token.assert_async().await;
}

#[tokio::test]
async fn test_rejected_credentials() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/oauth/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant"}"#)
        .create_async()
        .await;

    let client = HttpPlatformClient::new(
        platform_config(server.url()),
        Arc::new(MemorySessionStore::new()),
    )
    .unwrap();
    let err = client.ensure_authenticated().await.unwrap_err();

    assert!(matches!(err, PodexError::Authentication(_)));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_get_sends_query_and_authorization() {
    let mut server = Server::new_async().await;
    let (client, _) = authenticated_client(&mut server).await;
    let tasks = server
        .mock("GET", "/task/")
        .match_header("authorization", "OAuth2 tok-123")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("org".into(), "7".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"task_id": 1}]"#)
        .create_async()
        .await;

    let body = client
        .request(
            Method::Get,
            "/task/",
            Some(json!({ "org": 7, "offset": 0, "limit": 100 })),
        )
        .await
        .unwrap();

    tasks.assert_async().await;
    assert_eq!(body, json!([{ "task_id": 1 }]));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mut server = Server::new_async().await;
    let (client, _) = authenticated_client(&mut server).await;
    let items = server
        .mock("POST", "/item/app/9/filter/")
        .match_body(Matcher::Json(json!({ "offset": 500, "limit": 500 })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"total": 501, "items": [{"item_id": 1}]}"#)
        .create_async()
        .await;

    let body = client
        .request(
            Method::Post,
            "/item/app/9/filter/",
            Some(json!({ "offset": 500, "limit": 500 })),
        )
        .await
        .unwrap();

    items.assert_async().await;
    assert_eq!(body["total"], 501);
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let mut server = Server::new_async().await;
    let (client, _) = authenticated_client(&mut server).await;
    let _orgs = server
        .mock("GET", "/org/")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let _contacts = server
        .mock("GET", "/contact/")
        .with_status(401)
        .with_body("expired")
        .create_async()
        .await;

    let err = client.request(Method::Get, "/org/", None).await.unwrap_err();
    assert_eq!(
        err,
        PodexError::Api {
            status: 500,
            message: "boom".to_string(),
        }
    );

    let err = client.request(Method::Get, "/contact/", None).await.unwrap_err();
    assert!(matches!(err, PodexError::Authentication(_)));
}

#[tokio::test]
async fn test_request_before_authentication_fails() {
    let server = Server::new_async().await;
    let client = HttpPlatformClient::new(
        platform_config(server.url()),
        Arc::new(MemorySessionStore::new()),
    )
    .unwrap();

    let err = client.request(Method::Get, "/org/", None).await.unwrap_err();
    assert!(matches!(err, PodexError::Authentication(_)));
}

#[tokio::test]
async fn test_download_appends_token_and_streams_body() {
    let mut server = Server::new_async().await;
    let (client, _) = authenticated_client(&mut server).await;
    let file = server
        .mock("GET", "/download/42")
        .match_query(Matcher::UrlEncoded("oauth_token".into(), "tok-123".into()))
        .with_status(200)
        .with_body("binary content")
        .create_async()
        .await;

    let link = format!("{}/download/42", server.url());
    let mut stream = client.open_download(&link).await.unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }

    file.assert_async().await;
    assert_eq!(body, b"binary content");
}

#[tokio::test]
async fn test_download_not_found_is_api_error() {
    let mut server = Server::new_async().await;
    let (client, _) = authenticated_client(&mut server).await;
    let _missing = server
        .mock("GET", "/download/404")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let link = format!("{}/download/404", server.url());
    let err = match client.open_download(&link).await {
        Ok(_) => panic!("download should fail"),
        Err(e) => e,
    };
    assert!(matches!(err, PodexError::Api { status: 404, .. }));
}

fn coordinator_config(base_url: String) -> PodexConfig {
    let mut config = common::config(Path::new("podio-export"));
    config.platform = platform_config(base_url);
    config
}

#[tokio::test]
async fn test_coordinator_reuses_stored_session() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth/token")
        .expect(0)
        .create_async()
        .await;

    let sessions = Arc::new(MemorySessionStore::new());
    sessions.set(
        podex::adapters::platform::Credentials {
            access_token: secret_string("existing".to_string()),
            refresh_token: None,
            expires_in: None,
        },
        "password",
    );
    let result = ExportCoordinator::with_sessions(coordinator_config(server.url()), sessions).await;

    assert!(result.is_ok());
    token.assert_async().await;
}

#[tokio::test]
async fn test_coordinator_authenticates_once_without_session() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TOKEN_BODY)
        .expect(1)
        .create_async()
        .await;

    let sessions = Arc::new(MemorySessionStore::new());
    let result =
        ExportCoordinator::with_sessions(coordinator_config(server.url()), sessions.clone()).await;

    assert!(result.is_ok());
    token.assert_async().await;
    assert!(sessions.get("password").is_some());
}
