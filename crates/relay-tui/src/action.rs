//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use relay_core::{ConnectionState, DeviceStatus, TimeSlot};

use crate::screen::ViewId;

/// Notification severity level.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A short status-bar notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    #[allow(dead_code)]
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchView(ViewId),

    // ── Session lifecycle ─────────────────────────────────────────
    /// Dispatched by the login screen. The app persists the address and
    /// drives the async connect.
    Connect {
        address: String,
        username: String,
        password: String,
    },
    /// Outcome of the connect probe, error already formatted for display.
    ConnectResult(Result<(), String>),
    Disconnect,

    // ── Data events (from the session bridge) ─────────────────────
    StatusUpdated(DeviceStatus),
    ConnectionChanged(ConnectionState),
    TimeSlotsUpdated(Arc<Vec<TimeSlot>>),

    // ── Device commands ───────────────────────────────────────────
    ToggleRelay,
    SaveTimeSlots(Vec<TimeSlot>),
    SaveResult(Result<(), String>),

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}
