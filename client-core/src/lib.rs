//! client-core: Shared infrastructure for the PostgREST client workspace.
pub mod config;
pub mod error;
pub mod observability;

pub use error::{ClientError, ClientResult};

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tracing;
