//! Request dispatch and response normalization.
//!
//! One [`PreparedRequest`] becomes exactly one HTTP call. Whatever happens on
//! the wire comes back as a [`QueryResult`]; nothing here returns `Err`.

use super::session_store::{AUTH_TOKEN_KEY, SessionStore};
use crate::models::{ErrorInfo, QueryResult};
use client_core::ClientError;
use client_core::observability::RequestTracing;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const APIKEY_HEADER: &str = "apikey";
pub const PREFER_HEADER: &str = "Prefer";
pub const RETURN_REPRESENTATION: &str = "return=representation";

/// A fully-resolved request, ready to send.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    /// Path and query relative to the base URL, without a leading `/`.
    pub endpoint: String,
    pub body: Option<Value>,
    /// Applied last, overriding defaults of the same name.
    pub headers: Vec<(String, String)>,
    /// Attach the persisted bearer token when one exists.
    pub with_session: bool,
}

impl PreparedRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: Vec::new(),
            with_session: true,
        }
    }

    /// A request that never carries the session token (the auth routes).
    pub fn anonymous(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            with_session: false,
            ..Self::new(method, endpoint)
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a backend reply, before envelope shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReply {
    pub status: StatusCode,
    /// Parsed JSON. A non-JSON error body is kept as a string; an empty body
    /// is `None`.
    pub body: Option<Value>,
}

impl RawReply {
    /// 2xx becomes `data` (JSON `null` counts as no data); anything else
    /// becomes an error carrying the body's message and the original status.
    pub fn into_result(self) -> QueryResult<Value> {
        if self.status.is_success() {
            return QueryResult::success(self.body.filter(|b| !b.is_null()), self.status);
        }

        let fallback = self.status.canonical_reason().unwrap_or("Request failed");
        QueryResult::failure(
            ErrorInfo::from_body(self.body.unwrap_or(Value::Null), fallback),
            self.status,
        )
    }
}

pub struct Executor {
    http: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    store: Arc<dyn SessionStore>,
}

impl Executor {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Secret<String>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            store,
        }
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Send one request and normalize the outcome into an envelope.
    pub async fn dispatch(&self, request: PreparedRequest) -> QueryResult<Value> {
        match self.exchange(&request).await {
            Ok(reply) => reply.into_result(),
            Err(fault) => fault,
        }
    }

    /// Send one request and hand back the status and body as received.
    ///
    /// `Err` carries the fault envelope for a request that produced no usable
    /// reply: rejected before sending, failed in transport, or a 2xx body that
    /// is not JSON.
    pub async fn exchange(&self, request: &PreparedRequest) -> Result<RawReply, QueryResult<Value>> {
        let headers = match self.build_headers(request).await {
            Ok(headers) => headers,
            Err(e) => {
                tracing::warn!(endpoint = %request.endpoint, error = %e, "Rejected request before dispatch");
                return Err(QueryResult::local_fault(e.to_string()));
            }
        };

        let url = self.url_for(&request.endpoint);
        let request_id = Uuid::new_v4().to_string();

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            request_id = %request_id,
            "Dispatching backend request"
        );

        let mut outbound = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers)
            .traced(&request_id);
        if let Some(body) = &request.body {
            outbound = outbound.json(body);
        }

        let response = outbound.send().await.map_err(|e| {
            tracing::warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                request_id = %request_id,
                error = %e,
                "Backend request failed"
            );
            QueryResult::transport_fault(e.to_string())
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QueryResult::transport_fault(e.to_string()))?;

        let body = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<Value>(&text) {
                Ok(body) => Some(body),
                Err(_) if !status.is_success() => Some(Value::String(text)),
                Err(e) => {
                    tracing::warn!(endpoint = %request.endpoint, status = %status, "Backend returned invalid JSON");
                    return Err(QueryResult::transport_fault(format!("Invalid JSON response: {}", e)));
                }
            }
        };

        if status.is_success() {
            tracing::debug!(endpoint = %request.endpoint, status = status.as_u16(), "Backend request succeeded");
        } else {
            tracing::warn!(
                method = %request.method,
                endpoint = %request.endpoint,
                status = status.as_u16(),
                "Backend returned an error status"
            );
        }

        Ok(RawReply { status, body })
    }

    async fn build_headers(&self, request: &PreparedRequest) -> Result<HeaderMap, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(APIKEY_HEADER, HeaderValue::from_str(self.api_key.expose_secret())?);

        if request.with_session
            && let Some(token) = self.store.get(AUTH_TOKEN_KEY).await
        {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in &request.headers {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }

        Ok(headers)
    }
}
