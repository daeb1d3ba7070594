//! Realtime client configuration

use std::env;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use url::Url;

/// Configuration for the realtime connection, loaded from environment
/// variables
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, e.g. `wss://api.motorsouk.com`
    pub endpoint: String,

    /// Reconnect attempt cap before settling on Disconnected
    pub reconnect_max_attempts: u32,
    /// First backoff delay; successive delays grow exponentially
    pub reconnect_base_delay_ms: u64,
    /// Backoff ceiling
    pub reconnect_max_delay_ms: u64,
}

impl RealtimeConfig {
    /// Load configuration from environment variables.
    ///
    /// The WebSocket endpoint is derived from `API_BASE_URL` with its path
    /// suffix stripped and the scheme mapped to ws/wss, falling back to a
    /// local default when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = match env::var("API_BASE_URL") {
            Ok(base) => websocket_endpoint(&base)?,
            Err(_) => "ws://localhost:8000".to_string(),
        };

        Ok(Self {
            endpoint,
            reconnect_max_attempts: env::var("WS_RECONNECT_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
            reconnect_base_delay_ms: env::var("WS_RECONNECT_BASE_DELAY_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            reconnect_max_delay_ms: env::var("WS_RECONNECT_MAX_DELAY_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30000),
        })
    }

    /// Fresh backoff schedule for one reconnect cycle: exponential growth
    /// from the base delay, capped at the ceiling, jittered, bounded by the
    /// attempt cap.
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(self.reconnect_base_delay_ms)
            .max_delay(Duration::from_millis(self.reconnect_max_delay_ms))
            .map(jitter)
            .take(self.reconnect_max_attempts as usize)
    }
}

/// Derive the WebSocket endpoint from an API base URL: strip the path
/// suffix and map http(s) to ws(s).
pub fn websocket_endpoint(api_base: &str) -> Result<String, ConfigError> {
    let mut url =
        Url::parse(api_base).map_err(|e| ConfigError::InvalidBaseUrl(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| ConfigError::InvalidBaseUrl(api_base.to_string()))?;

    url.set_path("");
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string().trim_end_matches('/').to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}
