//! Client configuration.

use std::time::Duration;

use weart_protocol::{TrackingType, DEFAULT_MAX_FRAME_LEN, DEFAULT_MIDDLEWARE_PORT};

/// Configuration for a middleware client.
///
/// The defaults match the standard local middleware deployment. The connect
/// and read timeouts are explicit (the original SDK relied on OS socket
/// defaults); the read timeout doubles as the cancellation poll interval of
/// the receive loop, so very large values make `stop()` sluggish.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    /// Middleware host. The middleware is expected to run on the same host.
    pub host: String,
    /// Middleware TCP port.
    pub port: u16,
    /// Tracking algorithm requested in the session handshake.
    pub tracking_type: TrackingType,
    /// Timeout for one connect attempt.
    pub connect_timeout: Duration,
    /// Blocking-read timeout; also the cancellation poll interval.
    pub read_timeout: Duration,
    /// Backoff after the first failed connect attempt.
    pub initial_backoff: Duration,
    /// Upper bound for the exponential backoff.
    pub max_backoff: Duration,
    /// Give up reconnecting after this many consecutive failures.
    /// `None` retries forever.
    pub max_connect_attempts: Option<u32>,
    /// Cap on a single wire record, in bytes.
    pub max_frame_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_MIDDLEWARE_PORT,
            tracking_type: TrackingType::default(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_millis(500),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            max_connect_attempts: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl ClientConfig {
    /// Set the middleware host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the middleware port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the tracking algorithm for the session handshake.
    pub fn with_tracking_type(mut self, tracking_type: TrackingType) -> Self {
        self.tracking_type = tracking_type;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout / cancellation poll interval.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the reconnect backoff range.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Bound the number of consecutive failed connect attempts.
    pub fn with_max_connect_attempts(mut self, attempts: u32) -> Self {
        self.max_connect_attempts = Some(attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_local_middleware() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 13031);
        assert_eq!(config.tracking_type, TrackingType::WeartHand);
        assert_eq!(config.max_connect_attempts, None);
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::default()
            .with_host("10.0.0.5")
            .with_port(4000)
            .with_max_connect_attempts(3);
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_connect_attempts, Some(3));
    }
}
