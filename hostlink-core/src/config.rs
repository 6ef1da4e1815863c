//! Bridge configuration.
//!
//! Defaults suit the stock local host service. Every knob can be
//! overridden from the environment, and the most common ones also from
//! the command line. Invalid environment values warn and fall back to
//! the default; nothing in this process is allowed to die over a tuning
//! knob.

use std::time::Duration;

use tracing::warn;

/// Default URL of the host's event-stream endpoint.
pub const DEFAULT_STREAM_URL: &str = "http://localhost:64543/sse";

/// Default host share root prepended to rewritten sandbox paths.
pub const DEFAULT_SHARE_ROOT: &str = r"\\wsl$\Ubuntu";

/// Runtime settings for the bridge.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// URL the event stream is fetched from; its origin also anchors
    /// submission POSTs.
    pub stream_url: String,
    /// Host share root used by path translation.
    pub share_root: String,
    /// Reply to unparseable stdin lines with a JSON-RPC parse error
    /// instead of dropping them silently.
    pub reply_parse_errors: bool,
    /// How long a submission waits for an endpoint announcement.
    pub endpoint_wait: Duration,
    /// How long a submission waits for its streamed response.
    pub response_timeout: Duration,
    /// Fixed pause between stream reconnection attempts.
    pub reconnect_delay: Duration,
    /// TCP connect timeout shared by the stream and submission calls.
    pub connect_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            stream_url: DEFAULT_STREAM_URL.to_string(),
            share_root: DEFAULT_SHARE_ROOT.to_string(),
            reply_parse_errors: false,
            endpoint_wait: Duration::from_secs(20),
            response_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl LinkConfig {
    /// Loads configuration from the environment.
    ///
    /// Recognized variables:
    /// - `HOSTLINK_SSE_URL` (default: `http://localhost:64543/sse`)
    /// - `HOSTLINK_SHARE_ROOT` (default: `\\wsl$\Ubuntu`)
    /// - `HOSTLINK_REPLY_PARSE_ERRORS` (default: false)
    /// - `HOSTLINK_ENDPOINT_WAIT_SECS` (default: 20)
    /// - `HOSTLINK_RESPONSE_TIMEOUT_SECS` (default: 30)
    /// - `HOSTLINK_RECONNECT_DELAY_SECS` (default: 2)
    /// - `HOSTLINK_CONNECT_TIMEOUT_SECS` (default: 10)
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();

        let stream_url = std::env::var("HOSTLINK_SSE_URL").unwrap_or(default.stream_url);
        let share_root = std::env::var("HOSTLINK_SHARE_ROOT").unwrap_or(default.share_root);

        let reply_parse_errors = std::env::var("HOSTLINK_REPLY_PARSE_ERRORS")
            .ok()
            .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
            .unwrap_or(default.reply_parse_errors);

        let endpoint_wait =
            parse_duration_env("HOSTLINK_ENDPOINT_WAIT_SECS", default.endpoint_wait);
        let response_timeout =
            parse_duration_env("HOSTLINK_RESPONSE_TIMEOUT_SECS", default.response_timeout);
        let reconnect_delay =
            parse_duration_env("HOSTLINK_RECONNECT_DELAY_SECS", default.reconnect_delay);
        let connect_timeout =
            parse_duration_env("HOSTLINK_CONNECT_TIMEOUT_SECS", default.connect_timeout);

        LinkConfig {
            stream_url,
            share_root,
            reply_parse_errors,
            endpoint_wait,
            response_timeout,
            reconnect_delay,
            connect_timeout,
        }
    }

    /// Returns a copy pointed at a different stream URL.
    #[must_use]
    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = url.into();
        self
    }
}

/// Parse a whole-seconds duration variable, warning on invalid values.
fn parse_duration_env(var_name: &str, default: Duration) -> Duration {
    match std::env::var(var_name) {
        Ok(value) => match value.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    var = var_name,
                    value = %value,
                    default_secs = default.as_secs(),
                    "invalid duration in environment, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
