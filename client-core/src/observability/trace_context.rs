//! Outbound W3C trace propagation (https://www.w3.org/TR/trace-context/).
//!
//! Backend calls carry the active span's `traceparent` (and `tracestate` when
//! non-empty) plus an `x-request-id`, so PostgREST-side logs can be joined
//! with ours.

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Trace identity of the span a request is sent from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceParent {
    pub trace_id: String,
    pub span_id: String,
    pub flags: u8,
    pub state: String,
}

impl TraceParent {
    /// `None` outside any OpenTelemetry-backed span.
    pub fn current() -> Option<Self> {
        let context = Span::current().context();
        let span = context.span();
        let span_context = span.span_context();

        if !span_context.is_valid() {
            return None;
        }

        Some(Self {
            trace_id: span_context.trace_id().to_string(),
            span_id: span_context.span_id().to_string(),
            flags: span_context.trace_flags().to_u8(),
            state: span_context.trace_state().header(),
        })
    }

    /// `00-<trace-id>-<span-id>-<flags>`
    pub fn header_value(&self) -> String {
        format!("00-{}-{}-{:02x}", self.trace_id, self.span_id, self.flags)
    }

    pub fn write_to(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.header_value()) {
            headers.insert(TRACEPARENT_HEADER, value);
        }
        if !self.state.is_empty()
            && let Ok(value) = HeaderValue::from_str(&self.state)
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }
}

/// Trace headers for one outbound call. An id that is not a valid header
/// value is dropped.
pub fn trace_headers(request_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(parent) = TraceParent::current() {
        parent.write_to(&mut headers);
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers
}

/// Attach trace headers to a reqwest request before it is sent.
pub trait RequestTracing {
    fn traced(self, request_id: &str) -> Self;
}

impl RequestTracing for reqwest::RequestBuilder {
    fn traced(self, request_id: &str) -> Self {
        self.headers(trace_headers(request_id))
    }
}
