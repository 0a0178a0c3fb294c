// ── Core error types ──
//
// User-facing errors from relay-core. These are NOT API-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<relay_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the session layer.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach device: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to a device")]
    Disconnected,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation not supported by this firmware: {operation}")]
    Unsupported { operation: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Device API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },
}

impl CoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<relay_api::Error> for CoreError {
    fn from(err: relay_api::Error) -> Self {
        match err {
            relay_api::Error::Authentication { .. } => CoreError::AuthenticationFailed {
                message: "invalid credentials".into(),
            },
            relay_api::Error::Transport(ref e) => CoreError::ConnectionFailed {
                reason: if e.is_timeout() {
                    "request timed out".into()
                } else if e.is_connect() {
                    "connection refused or host unreachable".into()
                } else {
                    e.to_string()
                },
            },
            relay_api::Error::InvalidUrl(e) => CoreError::Validation {
                message: format!("invalid device address: {e}"),
            },
            relay_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
                status: Some(status),
            },
            relay_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected device response: {message}"),
                status: None,
            },
            relay_api::Error::UnsupportedOperation(op) => CoreError::Unsupported {
                operation: op.to_string(),
            },
        }
    }
}
