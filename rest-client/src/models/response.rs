//! Result envelope returned by every table, RPC, and auth call.
//!
//! Faults never escape as `Err`: transport failures, backend errors, and
//! row-shape violations all land in [`QueryResult::error`] so callers inspect
//! one value regardless of where the request failed.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error payload of an envelope.
///
/// Backend error bodies (PostgREST's `{code, details, hint, message}` or a
/// plain `{error}`) keep their extra fields in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Build from a parsed error body, using `fallback` when the body carries
    /// no usable message.
    pub fn from_body(body: Value, fallback: &str) -> Self {
        match body {
            Value::Object(mut fields) => {
                // `message` always moves out of `extra`, so it serializes once.
                let message = match fields.remove("message") {
                    Some(Value::String(text)) if !text.is_empty() => Some(text),
                    Some(Value::Null | Value::String(_)) | None => None,
                    Some(other) => Some(other.to_string()),
                };
                let message = message
                    .or_else(|| non_empty_str(&fields, "error"))
                    .unwrap_or_else(|| fallback.to_string());

                Self {
                    message,
                    extra: fields,
                }
            }
            Value::String(message) if !message.is_empty() => Self::new(message),
            Value::Null | Value::String(_) => Self::new(fallback),
            other => Self::new(other.to_string()),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.extra.get("code").and_then(Value::as_str)
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T = Value> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
    pub status: u16,
    pub status_text: String,
}

impl<T> QueryResult<T> {
    pub fn success(data: Option<T>, status: StatusCode) -> Self {
        Self {
            data,
            error: None,
            status: status.as_u16(),
            status_text: status_text(status),
        }
    }

    pub fn failure(error: ErrorInfo, status: StatusCode) -> Self {
        Self {
            data: None,
            error: Some(error),
            status: status.as_u16(),
            status_text: status_text(status),
        }
    }

    /// A request that never produced an HTTP response.
    pub fn transport_fault(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        Self::failure(ErrorInfo::new(message), StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// A request rejected locally before anything was sent.
    pub fn local_fault(message: impl Into<String>) -> Self {
        Self::failure(ErrorInfo::new(message), StatusCode::BAD_REQUEST)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Option<T>, ErrorInfo> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }
}

impl QueryResult<Value> {
    /// Decode `data` into a typed row or row set, keeping status and error.
    pub fn decode<T: DeserializeOwned>(self) -> QueryResult<T> {
        let QueryResult {
            data,
            error,
            status,
            status_text,
        } = self;

        match data.map(serde_json::from_value::<T>).transpose() {
            Ok(data) => QueryResult {
                data,
                error,
                status,
                status_text,
            },
            Err(e) => QueryResult {
                data: None,
                error: Some(ErrorInfo::new(format!("Failed to decode response: {}", e))),
                status,
                status_text,
            },
        }
    }
}

fn non_empty_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn postgrest_error_body_keeps_details() {
        let error = ErrorInfo::from_body(
            json!({
                "code": "23505",
                "details": "Key (email)=(a@b.c) already exists.",
                "hint": null,
                "message": "duplicate key value violates unique constraint"
            }),
            "Conflict",
        );

        assert_eq!(error.message, "duplicate key value violates unique constraint");
        assert_eq!(error.code(), Some("23505"));
        assert!(error.extra.contains_key("details"));
        assert!(!error.extra.contains_key("message"));
    }

    #[test]
    fn plain_error_field_becomes_message() {
        let error = ErrorInfo::from_body(json!({ "error": "Invalid credentials" }), "Unauthorized");
        assert_eq!(error.message, "Invalid credentials");
    }

    #[test]
    fn empty_body_uses_fallback() {
        assert_eq!(ErrorInfo::from_body(Value::Null, "Not Found").message, "Not Found");
        assert_eq!(ErrorInfo::from_body(json!({}), "Not Found").message, "Not Found");
        assert_eq!(
            ErrorInfo::from_body(json!("gateway down"), "Bad Gateway").message,
            "gateway down"
        );
    }

    #[test]
    fn non_string_message_is_not_duplicated() {
        let error = ErrorInfo::from_body(json!({ "message": 5, "code": "X" }), "Bad Request");
        assert_eq!(error.message, "5");
        assert!(!error.extra.contains_key("message"));

        let serialized = serde_json::to_string(&error).unwrap();
        assert_eq!(serialized.matches("\"message\"").count(), 1);
        assert_eq!(
            serde_json::from_str::<Value>(&serialized).unwrap(),
            json!({ "message": "5", "code": "X" })
        );
    }

    #[test]
    fn null_message_falls_through_to_error() {
        let error = ErrorInfo::from_body(json!({ "message": null, "error": "Denied" }), "Forbidden");
        assert_eq!(error.message, "Denied");
        assert!(!error.extra.contains_key("message"));
    }

    #[test]
    fn transport_fault_is_internal_server_error() {
        let result: QueryResult = QueryResult::transport_fault("connection refused");
        assert_eq!(result.status, 500);
        assert_eq!(result.status_text, "Internal Server Error");
        assert_eq!(result.error.unwrap().message, "connection refused");
        assert!(result.data.is_none());

        let result: QueryResult = QueryResult::transport_fault("");
        assert_eq!(result.error.unwrap().message, "Unknown error");
    }

    #[test]
    fn envelope_serializes_with_status_text_key() {
        let result = QueryResult::success(Some(json!([1])), StatusCode::OK);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({ "data": [1], "error": null, "status": 200, "statusText": "OK" })
        );
    }

    #[test]
    fn decode_failure_keeps_status() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Row {
            id: String,
        }

        let result = QueryResult::success(Some(json!({ "id": 7 })), StatusCode::OK).decode::<Row>();
        assert_eq!(result.status, 200);
        assert!(result.data.is_none());
        assert!(
            result
                .error
                .unwrap()
                .message
                .starts_with("Failed to decode response")
        );
    }
}
