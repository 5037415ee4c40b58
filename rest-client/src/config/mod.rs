use client_core::ClientError;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the PostgREST-compatible backend (e.g., http://localhost:3000).
    pub url: String,
    /// Anonymous key sent as `apikey` on every request.
    pub anon_key: Secret<String>,
}

impl ApiSettings {
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    /// File backing the persisted `authToken`/`userId` entries.
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    PathBuf::from(".restctl").join("session.json")
}

#[derive(Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// OTLP gRPC endpoint (e.g., http://tempo:4317). Tracing export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, ClientError> {
    let configuration_directory = client_core::config::configuration_directory("rest-client")?;
    client_core::config::load(&configuration_directory, "APP")
}
