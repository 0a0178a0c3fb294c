// ── Runtime connection configuration ──
//
// Describes *how* to connect to a relay device. Carries credential data
// and polling tuning, but never touches disk -- the persisted address
// lives in relay-config.

use std::time::Duration;

use secrecy::SecretString;

/// Basic Auth credential pair for the device.
///
/// The firmware ships with `admin`/`admin123`; both fields are
/// user-editable at login and never persisted.
#[derive(Debug, Clone)]
pub struct DeviceCredentials {
    pub username: String,
    pub password: SecretString,
}

impl Default for DeviceCredentials {
    fn default() -> Self {
        Self {
            username: "admin".into(),
            password: SecretString::from("admin123"),
        }
    }
}

/// Tuning for a device session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Status poll interval while authenticated. 0 disables polling
    /// (used by tests that drive refresh manually).
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
        }
    }
}
