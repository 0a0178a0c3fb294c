//! Session bridge — connects [`DeviceSession`] watches to TUI actions.
//!
//! Runs as a background task while the session is authenticated: performs
//! the one-time slot load, pushes initial snapshots, then forwards every
//! status, connection-state, and slot change as an [`Action`] through the
//! TUI's action channel. Cancelled on logout, so nothing is forwarded
//! while the login screen is showing.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use relay_core::DeviceSession;

use crate::action::{Action, Notification};

/// Forward session state into the action loop until cancelled.
pub async fn run_session_bridge(
    session: DeviceSession,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut status = session.status();
    let mut state = session.connection_state();
    let mut slots = session.time_slots();

    // Push the probe snapshot so the dashboard has data immediately.
    if let Some(s) = status.borrow_and_update().clone() {
        let _ = action_tx.send(Action::StatusUpdated(s));
    }
    let _ = action_tx.send(Action::ConnectionChanged(*state.borrow_and_update()));

    // One-time slot load for this connection.
    match session.load_time_slots().await {
        Ok(loaded) => {
            let _ = action_tx.send(Action::TimeSlotsUpdated(loaded));
            // Mark the watch as seen so the load isn't forwarded twice.
            let _ = slots.borrow_and_update();
        }
        Err(e) => {
            warn!(error = %e, "initial time-slot load failed");
            let _ = action_tx.send(Action::Notify(Notification::error(
                "Failed to load time slots",
            )));
        }
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = status.changed() => {
                if let Some(s) = status.borrow_and_update().clone() {
                    let _ = action_tx.send(Action::StatusUpdated(s));
                }
            }
            Ok(()) = state.changed() => {
                let _ = action_tx.send(Action::ConnectionChanged(*state.borrow_and_update()));
            }
            Ok(()) = slots.changed() => {
                let _ = action_tx.send(Action::TimeSlotsUpdated(slots.borrow_and_update().clone()));
            }
        }
    }

    debug!("session bridge shut down");
}
