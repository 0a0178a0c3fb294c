// Shared transport configuration for building reqwest::Client instances.
//
// The relay device speaks plain HTTP on the local network, so there is no
// TLS story here -- only timeout and user-agent tuning. Kept as a struct so
// the session layer can thread its own timeouts through.

use std::time::Duration;

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            // Embedded relays answer on the LAN; anything slower than this
            // is indistinguishable from unplugged.
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("relay-tui/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
