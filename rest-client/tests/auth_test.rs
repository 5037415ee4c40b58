mod common;

use common::{TEST_ANON_KEY, TEST_TOKEN, TEST_USER_ID, TestApp};
use rest_client::RestClient;
use rest_client::config::ApiSettings;
use rest_client::models::{SignInCredentials, SignUpCredentials};
use rest_client::services::FileSessionStore;
use rest_client::services::session_store::{AUTH_TOKEN_KEY, SessionStore, USER_ID_KEY};
use secrecy::Secret;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

fn sign_in_credentials() -> SignInCredentials {
    SignInCredentials {
        email: "ada@example.com".to_string(),
        password: Secret::new("correct horse".to_string()),
    }
}

async fn mount_login(app: &TestApp, reply: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(&app.server)
        .await;
}

#[tokio::test]
async fn sign_in_persists_token_and_user_id() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .and(header("apikey", TEST_ANON_KEY))
        .and(body_json(json!({
            "p_email": "ada@example.com",
            "p_password": "correct horse"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": "T", "user_id": "U" })),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert!(response.error.is_none());
    let session = response.data.session.expect("session");
    assert_eq!(session.access_token, "T");
    assert_eq!(session.token_type, "bearer");
    assert_eq!(session.expires_in, 3600);
    assert_eq!(session.user.id, "U");
    assert_eq!(session.user.email, "ada@example.com");
    assert_eq!(session.user.aud, "authenticated");
    assert_eq!(response.data.user.expect("user").id, "U");

    assert_eq!(app.store.get(AUTH_TOKEN_KEY).await.as_deref(), Some("T"));
    assert_eq!(app.store.get(USER_ID_KEY).await.as_deref(), Some("U"));
}

#[tokio::test]
async fn sign_in_then_queries_carry_the_new_token() {
    let app = TestApp::spawn().await;
    mount_login(&app, json!({ "token": "T", "user_id": "U" })).await;

    Mock::given(method("GET"))
        .and(path("/profiles"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&app.server)
        .await;

    app.client.auth().sign_in_with_password(&sign_in_credentials()).await;
    let result = app.client.from("profiles").select("*").execute().await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn sign_in_without_token_fails_and_stores_nothing() {
    let app = TestApp::spawn().await;
    mount_login(&app, json!({ "user_id": "U" })).await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert_eq!(response.error.expect("error").message, "Login failed");
    assert!(response.data.user.is_none());
    assert!(response.data.session.is_none());
    assert!(app.store.get(AUTH_TOKEN_KEY).await.is_none());
    assert!(app.store.get(USER_ID_KEY).await.is_none());
}

#[tokio::test]
async fn sign_in_reports_backend_message() {
    let app = TestApp::spawn().await;
    mount_login(&app, json!({ "error": "Invalid email or password" })).await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert_eq!(
        response.error.expect("error").message,
        "Invalid email or password"
    );
}

#[tokio::test]
async fn sign_in_rejected_by_status_keeps_previous_session() {
    let app = TestApp::spawn().await.with_session().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT invalid" })),
        )
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert_eq!(response.error.expect("error").message, "JWT invalid");
    assert_eq!(app.store.get(AUTH_TOKEN_KEY).await.as_deref(), Some(TEST_TOKEN));
}

#[tokio::test]
async fn auth_routes_never_send_a_bearer() {
    let app = TestApp::spawn().await.with_session().await;

    Mock::given(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401))
        .expect(0)
        .mount(&app.server)
        .await;
    mount_login(&app, json!({ "token": "T2", "user_id": "U2" })).await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert!(response.error.is_none());
    assert_eq!(app.store.get(AUTH_TOKEN_KEY).await.as_deref(), Some("T2"));
}

#[tokio::test]
async fn sign_up_returns_user_without_session() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/register_user"))
        .and(body_json(json!({
            "user_email": "ada@example.com",
            "user_password": "correct horse",
            "full_name": "Ada Lovelace"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_id": "U" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let response = app
        .client
        .auth()
        .sign_up(&SignUpCredentials {
            email: "ada@example.com".to_string(),
            password: Secret::new("correct horse".to_string()),
            full_name: "Ada Lovelace".to_string(),
        })
        .await;

    assert!(response.error.is_none());
    assert!(response.data.session.is_none());
    let user = response.data.user.expect("user");
    assert_eq!(user.id, "U");
    assert_eq!(user.email, "ada@example.com");
    assert!(app.store.get(AUTH_TOKEN_KEY).await.is_none());
}

#[tokio::test]
async fn sign_up_failure_uses_backend_error() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/register_user"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Email already registered" })),
        )
        .mount(&app.server)
        .await;

    let response = app
        .client
        .auth()
        .sign_up(&SignUpCredentials {
            email: "ada@example.com".to_string(),
            password: Secret::new("pw".to_string()),
            full_name: "Ada".to_string(),
        })
        .await;

    assert_eq!(
        response.error.expect("error").message,
        "Email already registered"
    );
    assert!(response.data.user.is_none());
}

#[tokio::test]
async fn sign_out_clears_session() {
    let app = TestApp::spawn().await.with_session().await;

    let before = app.client.auth().get_session().await;
    assert_eq!(
        before.data.session.expect("session").access_token,
        TEST_TOKEN
    );

    let response = app.client.auth().sign_out().await;
    assert!(response.error.is_none());

    let after = app.client.auth().get_session().await;
    assert!(after.data.session.is_none());
    assert!(after.error.is_none());
}

#[tokio::test]
async fn sign_out_when_signed_out_still_succeeds() {
    let app = TestApp::spawn().await;
    assert!(app.client.auth().sign_out().await.error.is_none());
}

#[tokio::test]
async fn session_rehydrates_from_storage() {
    let app = TestApp::spawn().await.with_session().await;

    let session = app
        .client
        .auth()
        .get_session()
        .await
        .data
        .session
        .expect("session");

    assert_eq!(session.user.id, TEST_USER_ID);
    assert_eq!(session.user.email, "");
    assert_eq!(session.expires_in, 3600);
}

#[tokio::test]
async fn session_needs_both_keys() {
    let app = TestApp::spawn().await;
    app.store.set(AUTH_TOKEN_KEY, "orphan").await.unwrap();

    assert!(app.client.auth().get_session().await.data.session.is_none());
    assert!(app.client.auth().get_user().await.data.user.is_none());
}

#[tokio::test]
async fn get_user_reads_persisted_id() {
    let app = TestApp::spawn().await.with_session().await;

    let response = app.client.auth().get_user().await;

    assert!(response.error.is_none());
    assert_eq!(response.data.user.expect("user").id, TEST_USER_ID);
}

#[tokio::test]
async fn file_store_keeps_session_across_clients() {
    let app = TestApp::spawn().await;
    mount_login(&app, json!({ "token": "T", "user_id": "U" })).await;

    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("state").join("session.json");
    let settings = ApiSettings {
        url: app.server.uri(),
        anon_key: Secret::new(TEST_ANON_KEY.to_string()),
    };

    let first = RestClient::new(&settings, Arc::new(FileSessionStore::new(session_path.clone()))).unwrap();
    let response = first.auth().sign_in_with_password(&sign_in_credentials()).await;
    assert!(response.error.is_none());

    let second = RestClient::new(&settings, Arc::new(FileSessionStore::new(session_path.clone()))).unwrap();
    let session = second.auth().get_session().await.data.session.expect("session");
    assert_eq!(session.access_token, "T");
    assert_eq!(session.user.id, "U");

    second.auth().sign_out().await;
    assert!(first.auth().get_session().await.data.session.is_none());
}

#[tokio::test]
async fn sign_in_rejected_without_body_uses_fixed_message() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert_eq!(response.error.expect("error").message, "Login failed");
    assert!(response.data.session.is_none());
    assert!(app.store.get(AUTH_TOKEN_KEY).await.is_none());
}

#[tokio::test]
async fn sign_in_rejected_with_empty_object_uses_fixed_message() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({})))
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;
    assert_eq!(response.error.expect("error").message, "Login failed");
}

#[tokio::test]
async fn sign_in_error_text_wins_over_message() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "P0001",
            "error": "Invalid email or password"
        })))
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;
    assert_eq!(
        response.error.expect("error").message,
        "Invalid email or password"
    );
}

#[tokio::test]
async fn sign_up_rejected_without_body_uses_fixed_message() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/register_user"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&app.server)
        .await;

    let response = app
        .client
        .auth()
        .sign_up(&SignUpCredentials {
            email: "ada@example.com".to_string(),
            password: Secret::new("pw".to_string()),
            full_name: "Ada".to_string(),
        })
        .await;

    assert_eq!(response.error.expect("error").message, "Registration failed");
    assert!(response.data.user.is_none());
}

#[tokio::test]
async fn sign_in_rejected_by_status_ignores_token_in_body() {
    let app = TestApp::spawn().await;

    Mock::given(method("POST"))
        .and(path("/auth/rpc/login"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "token": "T", "user_id": "U", "error": "Account locked" })),
        )
        .mount(&app.server)
        .await;

    let response = app.client.auth().sign_in_with_password(&sign_in_credentials()).await;

    assert_eq!(response.error.expect("error").message, "Account locked");
    assert!(app.store.get(AUTH_TOKEN_KEY).await.is_none());
}

