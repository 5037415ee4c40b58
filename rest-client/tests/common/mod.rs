#![allow(dead_code)]

use rest_client::RestClient;
use rest_client::config::ApiSettings;
use rest_client::services::MemorySessionStore;
use rest_client::services::session_store::{AUTH_TOKEN_KEY, SessionStore, USER_ID_KEY};
use secrecy::Secret;
use std::sync::Arc;
use wiremock::MockServer;

pub const TEST_ANON_KEY: &str = "test-anon-key";
pub const TEST_TOKEN: &str = "test-token";
pub const TEST_USER_ID: &str = "6f1c2a52-0000-4000-8000-000000000001";

/// A client wired to a mock PostgREST backend with an in-memory session.
pub struct TestApp {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub client: RestClient,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemorySessionStore::new());

        let settings = ApiSettings {
            url: server.uri(),
            anon_key: Secret::new(TEST_ANON_KEY.to_string()),
        };
        let client = RestClient::new(&settings, store.clone()).expect("Failed to build client");

        Self {
            server,
            store,
            client,
        }
    }

    /// Seed the store as a previous sign-in would have.
    pub async fn with_session(self) -> Self {
        self.store.set(AUTH_TOKEN_KEY, TEST_TOKEN).await.unwrap();
        self.store.set(USER_ID_KEY, TEST_USER_ID).await.unwrap();
        self
    }

    /// Raw (still encoded) query strings of every request received so far.
    pub async fn received_queries(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.query().map(str::to_string))
            .collect()
    }

    pub async fn received_paths(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

/// A client whose backend refuses connections.
pub fn unreachable_client() -> RestClient {
    let settings = ApiSettings {
        url: "http://127.0.0.1:9".to_string(),
        anon_key: Secret::new(TEST_ANON_KEY.to_string()),
    };
    RestClient::new(&settings, Arc::new(MemorySessionStore::new())).expect("Failed to build client")
}

pub fn profile_row(id: &str, email: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "email": email,
        "full_name": "Test User",
        "phone": null,
        "avatar_url": null,
        "preferences": { "app_role": "app_user" },
        "loyalty_points": 0,
        "total_orders": 0,
        "total_spent": 0,
        "notification_preferences": { "sms": false, "push": true, "email": true },
        "created_at": "2024-05-01T12:00:00+00:00",
        "updated_at": "2024-05-01T12:00:00+00:00",
        "last_sync_at": null
    })
}
