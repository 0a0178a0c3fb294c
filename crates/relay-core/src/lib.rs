// relay-core: session and state layer between relay-api and the TUI.

pub mod config;
pub mod error;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DeviceCredentials, SessionConfig};
pub use error::CoreError;
pub use model::{DeviceStatus, MAX_TIME_SLOTS, RelayMode, TimeSlot, validate_slots};
pub use session::{ConnectionState, DeviceSession};
