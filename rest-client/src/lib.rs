//! rest-client: a PostgREST request translator.
//!
//! Chained builder calls become one PostgREST URL and one HTTP request;
//! responses come back as a `{data, error, status, statusText}` envelope.
//! Token sessions from the backend's auth RPCs are kept in an injected
//! [`SessionStore`](services::SessionStore).

pub mod client;
pub mod config;
pub mod models;
pub mod query;
pub mod services;

pub use client::{RestClient, TableHandle};
pub use models::{ErrorInfo, QueryResult};
pub use query::{Count, FilterBuilder, OrderOptions, RpcBuilder, SelectOptions, UpsertOptions};
