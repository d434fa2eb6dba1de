//! Relay configuration.

use std::time::Duration;

/// Default port shared by the HTTP endpoint and the WebSocket upgrade.
pub const DEFAULT_PORT: u16 = 9293;

/// Interval between "is a wallet connected yet" fallback polls while a
/// request waits for the slot to fill.
pub const DEFAULT_WAIT_POLL: Duration = Duration::from_secs(1);

/// Configuration for a [`Bridge`](crate::Bridge) instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Host the listener binds to.
    pub host: String,
    /// Port for the HTTP endpoint and WebSocket upgrade (0 = auto-assign).
    pub port: u16,
    /// Fallback poll interval while waiting for a wallet to connect. Waiters
    /// are woken eagerly when a connection is accepted; this only bounds how
    /// often the reminder log repeats.
    pub wait_poll: Duration,
    /// Optional deadline for an in-flight wallet request. `None` matches the
    /// original behavior of waiting indefinitely.
    pub request_timeout: Option<Duration>,
    /// When set, a wallet disconnect fails all pending requests and stops
    /// the listener instead of vacating the slot and awaiting a new tab.
    pub stop_on_disconnect: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            wait_poll: DEFAULT_WAIT_POLL,
            request_timeout: None,
            stop_on_disconnect: false,
        }
    }
}

impl BridgeConfig {
    /// URL a user should open to connect a wallet tab.
    pub fn browser_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_fixed_port() {
        let config = BridgeConfig::default();
        assert_eq!(config.port, 9293);
        assert_eq!(config.browser_url(), "http://127.0.0.1:9293");
        assert!(config.request_timeout.is_none());
        assert!(!config.stop_on_disconnect);
    }
}
