use super::executor::{Executor, PreparedRequest, RawReply};
use super::session_store::{AUTH_TOKEN_KEY, SessionStore, USER_ID_KEY};
use crate::models::{
    AuthResponse, QueryResult, Session, SessionData, SessionResponse, SignInCredentials,
    SignOutResponse, SignUpCredentials, User, UserData, UserResponse,
};
use chrono::Utc;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use std::sync::Arc;

pub const REGISTER_ROUTE: &str = "auth/rpc/register_user";
pub const LOGIN_ROUTE: &str = "auth/rpc/login";

/// Registration, sign-in, sign-out, and session lookup against the
/// backend's auth RPCs. The session lives in the injected [`SessionStore`].
#[derive(Clone)]
pub struct AuthClient {
    executor: Arc<Executor>,
}

impl AuthClient {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }

    fn store(&self) -> &Arc<dyn SessionStore> {
        self.executor.session_store()
    }

    /// Register a user. Never signs in: the session is always `None`.
    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> AuthResponse {
        let request = PreparedRequest::anonymous(Method::POST, REGISTER_ROUTE).with_body(json!({
            "user_email": credentials.email,
            "user_password": credentials.password.expose_secret(),
            "full_name": credentials.full_name,
        }));
        let outcome = self.executor.exchange(&request).await;

        let Some(user_id) = result_field(&outcome, "user_id") else {
            let message = failure_message(&outcome, "Registration failed");
            tracing::info!(email = %credentials.email, error = %message, "Registration rejected");
            return AuthResponse::failure(message);
        };

        tracing::info!(user_id = %user_id, "User registered");
        AuthResponse::success(User::new(user_id, &credentials.email, Utc::now()), None)
    }

    /// Sign in and persist `authToken`/`userId` for later requests.
    pub async fn sign_in_with_password(&self, credentials: &SignInCredentials) -> AuthResponse {
        let request = PreparedRequest::anonymous(Method::POST, LOGIN_ROUTE).with_body(json!({
            "p_email": credentials.email,
            "p_password": credentials.password.expose_secret(),
        }));
        let outcome = self.executor.exchange(&request).await;

        let (Some(token), Some(user_id)) =
            (result_field(&outcome, "token"), result_field(&outcome, "user_id"))
        else {
            let message = failure_message(&outcome, "Login failed");
            tracing::info!(email = %credentials.email, error = %message, "Sign-in rejected");
            return AuthResponse::failure(message);
        };

        if let Err(e) = self.persist(&token, &user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to persist session");
            return AuthResponse::failure(format!("Failed to persist session: {}", e));
        }

        let now = Utc::now();
        let user = User::new(&user_id, &credentials.email, now);
        let session = Session::new(token, user.clone(), now);

        tracing::info!(user_id = %user_id, "User signed in");
        AuthResponse::success(user, Some(session))
    }

    async fn persist(&self, token: &str, user_id: &str) -> client_core::ClientResult<()> {
        let store = self.store();
        let written = match store.set(AUTH_TOKEN_KEY, token).await {
            Ok(()) => store.set(USER_ID_KEY, user_id).await,
            Err(e) => Err(e),
        };

        if written.is_err() {
            // Leave no half-written session behind.
            self.clear().await;
        }
        written
    }

    async fn clear(&self) {
        for key in [AUTH_TOKEN_KEY, USER_ID_KEY] {
            if let Err(e) = self.store().remove(key).await {
                tracing::warn!(key = key, error = %e, "Failed to clear session entry");
            }
        }
    }

    /// Forget the persisted session. Always succeeds.
    pub async fn sign_out(&self) -> SignOutResponse {
        self.clear().await;
        tracing::info!("User signed out");
        SignOutResponse { error: None }
    }

    /// Rebuild the session from storage; `None` when signed out.
    pub async fn get_session(&self) -> SessionResponse {
        let session = self.persisted().await.map(|(token, user_id)| {
            let now = Utc::now();
            Session::new(token, User::rehydrated(user_id, now), now)
        });

        SessionResponse {
            data: SessionData { session },
            error: None,
        }
    }

    pub async fn get_user(&self) -> UserResponse {
        let user = self
            .persisted()
            .await
            .map(|(_, user_id)| User::rehydrated(user_id, Utc::now()));

        UserResponse {
            data: UserData { user },
            error: None,
        }
    }

    async fn persisted(&self) -> Option<(String, String)> {
        let token = self.store().get(AUTH_TOKEN_KEY).await?;
        let user_id = self.store().get(USER_ID_KEY).await?;
        Some((token, user_id))
    }
}

/// Reply of an auth RPC, or the fault envelope when none arrived.
type Outcome = Result<RawReply, QueryResult<Value>>;

/// The reply object of an auth RPC; set-returning functions answer with a
/// one-element array.
fn reply_object(outcome: &Outcome) -> Option<&Value> {
    match outcome.as_ref().ok()?.body.as_ref()? {
        Value::Array(rows) => rows.first(),
        other => Some(other),
    }
}

/// A field of a successful (2xx) reply.
fn result_field(outcome: &Outcome, key: &str) -> Option<String> {
    if !outcome.as_ref().is_ok_and(|reply| reply.status.is_success()) {
        return None;
    }
    match reply_object(outcome)?.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The backend's `error` text, then its `message`, then `fallback`. The
/// HTTP status never supplies the text.
fn failure_message(outcome: &Outcome, fallback: &str) -> String {
    if let Err(fault) = outcome {
        return fault
            .error
            .as_ref()
            .map(|error| error.message.clone())
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string());
    }

    let text = |key: &str| {
        reply_object(outcome)
            .and_then(|reply| reply.get(key))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    };

    text("error")
        .or_else(|| text("message"))
        .unwrap_or_else(|| fallback.to_string())
}
