use super::response::ErrorInfo;
use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Audience stamped on every user returned by the auth helpers.
pub const AUDIENCE: &str = "authenticated";

pub const TOKEN_TYPE: &str = "bearer";

/// Lifetime granted to sessions created by sign-in or rehydrated from storage.
pub const SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub app_metadata: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Value>,
    pub aud: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            app_metadata: Value::Object(Map::new()),
            user_metadata: None,
            aud: AUDIENCE.to_string(),
            created_at: now,
        }
    }

    /// Rebuild a user from the persisted user id alone.
    ///
    /// Only `authToken` and `userId` are stored, so the email comes back
    /// empty and `created_at` is the rehydration time.
    pub fn rehydrated(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_metadata: Some(Value::Object(Map::new())),
            ..Self::new(id, "", now)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Unix timestamp, seconds.
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    pub fn new(access_token: impl Into<String>, user: User, now: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: TOKEN_TYPE.to_string(),
            expires_in: SESSION_TTL_SECS,
            expires_at: now.timestamp() + SESSION_TTL_SECS,
            user,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignUpCredentials {
    pub email: String,
    pub password: Secret<String>,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct SignInCredentials {
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthData {
    pub user: Option<User>,
    pub session: Option<Session>,
}

/// Envelope returned by sign-up and sign-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResponse {
    pub data: AuthData,
    pub error: Option<ErrorInfo>,
}

impl AuthResponse {
    pub fn success(user: User, session: Option<Session>) -> Self {
        Self {
            data: AuthData {
                user: Some(user),
                session,
            },
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: AuthData::default(),
            error: Some(ErrorInfo::new(message)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionData {
    pub session: Option<Session>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResponse {
    pub data: SessionData,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserData {
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub data: UserData,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignOutResponse {
    pub error: Option<ErrorInfo>,
}
