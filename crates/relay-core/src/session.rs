// ── Device session ──
//
// Full lifecycle management for one relay device connection: credential
// probe, cancellable background status polling, relay toggling, and
// time-slot load/save. Observable state flows through watch channels;
// consumers (the TUI) subscribe and never touch the HTTP client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use relay_api::{DeviceClient, TransportConfig};

use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::{self, DeviceStatus, TimeSlot};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Still authenticated, but the last poll failed on a network error.
    /// The periodic poll keeps running and recovers the state on its own.
    Offline,
}

impl ConnectionState {
    /// Whether the session holds working credentials. Background polling
    /// only runs while this is true.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Connected | Self::Offline)
    }
}

// ── DeviceSession ────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. One session manages at most
/// one device connection at a time; `connect` after `disconnect` reuses
/// the same session with fresh state.
#[derive(Clone)]
pub struct DeviceSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    client: Mutex<Option<Arc<DeviceClient>>>,
    // Updated via send_replace only: snapshots must stay current even while
    // nobody subscribes (the TUI bridge attaches after the connect probe).
    state: watch::Sender<ConnectionState>,
    status: watch::Sender<Option<DeviceStatus>>,
    slots: watch::Sender<Arc<Vec<TimeSlot>>>,
    /// Cancels the poll task of the current connection. Torn down before
    /// a reconnect and on disconnect.
    cancel: Mutex<Option<CancellationToken>>,
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceSession {
    /// Create a session with the given tuning. Does NOT connect -- call
    /// [`connect()`](Self::connect) to probe credentials and start polling.
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (status, _) = watch::channel(None);
        let (slots, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            inner: Arc::new(SessionInner {
                config,
                client: Mutex::new(None),
                state,
                status,
                slots,
                cancel: Mutex::new(None),
                poll_handle: Mutex::new(None),
            }),
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the device at `address` with the given Basic Auth pair.
    ///
    /// A blank address fails with [`CoreError::Validation`] before any
    /// network traffic. Otherwise the address (scheme-defaulted to
    /// `http://`) is probed via the status endpoint: 401 fails with
    /// `AuthenticationFailed`, anything else non-success with
    /// `ConnectionFailed`. On success the probe result becomes the first
    /// status snapshot and the background poll task starts.
    pub async fn connect(
        &self,
        address: &str,
        username: &str,
        password: SecretString,
    ) -> Result<(), CoreError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CoreError::validation("device address must not be empty"));
        }

        let url = parse_device_address(address)?;

        // One connection at a time: a reconnect replaces the previous one
        // wholesale, poll task included.
        self.teardown_poll().await;
        *self.inner.client.lock().await = None;

        self.inner.state.send_replace(ConnectionState::Connecting);

        let transport = TransportConfig {
            timeout: self.inner.config.timeout,
        };
        let client = match DeviceClient::new(url, username, password, &transport) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                self.inner.state.send_replace(ConnectionState::Disconnected);
                return Err(e.into());
            }
        };

        // Credential probe doubles as the first status fetch.
        let probe = match client.status().await {
            Ok(status) => status,
            Err(e) => {
                self.inner.state.send_replace(ConnectionState::Disconnected);
                return Err(if e.is_auth() {
                    CoreError::AuthenticationFailed {
                        message: "invalid credentials".into(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        reason: "cannot reach device".into(),
                    }
                });
            }
        };

        *self.inner.client.lock().await = Some(client);
        self.inner.status.send_replace(Some(probe));
        self.inner.state.send_replace(ConnectionState::Connected);

        // Start the poll loop for this connection.
        if self.inner.config.poll_interval > Duration::ZERO {
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(poll_task(
                self.clone(),
                self.inner.config.poll_interval,
                cancel.clone(),
            ));
            *self.inner.cancel.lock().await = Some(cancel);
            *self.inner.poll_handle.lock().await = Some(handle);
        }

        info!("connected to relay device");
        Ok(())
    }

    /// Disconnect from the device.
    ///
    /// Cancels the poll task and drops the client. Purely local -- the
    /// device holds no session state, so there is nothing to log out of.
    pub async fn disconnect(&self) {
        self.teardown_poll().await;

        *self.inner.client.lock().await = None;
        self.inner.status.send_replace(None);
        self.inner.slots.send_replace(Arc::new(Vec::new()));
        self.inner.state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Cancel the current poll task and wait for it to finish.
    async fn teardown_poll(&self) {
        if let Some(cancel) = self.inner.cancel.lock().await.take() {
            cancel.cancel();
        }
        if let Some(handle) = self.inner.poll_handle.lock().await.take() {
            let _ = handle.await;
        }
    }

    // ── Status ───────────────────────────────────────────────────

    /// Fetch the current status from the device.
    ///
    /// No-op when not authenticated. On success the snapshot replaces the
    /// previous one wholesale and an `Offline` state recovers to
    /// `Connected`; on failure the previous snapshot is left untouched
    /// and a network-level failure flips the state to `Offline`.
    pub async fn refresh_status(&self) -> Result<(), CoreError> {
        let Some(client) = self.current_client().await else {
            return Ok(());
        };

        match client.status().await {
            Ok(status) => {
                self.inner.status.send_replace(Some(status));
                if *self.inner.state.borrow() == ConnectionState::Offline {
                    self.inner.state.send_replace(ConnectionState::Connected);
                }
                Ok(())
            }
            Err(e) => {
                // Stale status is better than no status; keep it.
                if e.is_transient() {
                    self.inner.state.send_replace(ConnectionState::Offline);
                }
                Err(e.into())
            }
        }
    }

    /// Flip the manual relay state.
    ///
    /// The toggle response is advisory and ignored; the displayed state is
    /// resynchronized by an unconditional follow-up refresh, whether the
    /// toggle request succeeded or not. No optimistic update.
    pub async fn toggle_relay(&self) -> Result<(), CoreError> {
        let Some(client) = self.current_client().await else {
            return Err(CoreError::Disconnected);
        };

        if let Err(e) = client.toggle().await {
            warn!(error = %e, "toggle request failed");
        }

        self.refresh_status().await
    }

    // ── Time slots ───────────────────────────────────────────────

    /// Load the configured time slots from the device.
    ///
    /// The current firmware exposes no schedule endpoint; that absence
    /// degrades to an empty list rather than an error, so the slot list
    /// renders its placeholder instead of crashing.
    pub async fn load_time_slots(&self) -> Result<Arc<Vec<TimeSlot>>, CoreError> {
        let Some(client) = self.current_client().await else {
            return Err(CoreError::Disconnected);
        };

        let slots = match client.list_slots().await {
            Ok(slots) => slots,
            Err(relay_api::Error::UnsupportedOperation(op)) => {
                debug!(operation = op, "schedule read unsupported, treating as empty");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let slots = Arc::new(slots);
        self.inner.slots.send_replace(Arc::clone(&slots));
        Ok(slots)
    }

    /// Replace the device's time slots with the given ordered set.
    ///
    /// Validates the firmware cap and "HH:MM" format first. Until the
    /// firmware ships a write endpoint, the save is local-only: the slot
    /// watch is updated and the call reports success.
    pub async fn save_time_slots(&self, slots: Vec<TimeSlot>) -> Result<(), CoreError> {
        model::validate_slots(&slots)?;

        let Some(client) = self.current_client().await else {
            return Err(CoreError::Disconnected);
        };

        match client.replace_slots(&slots).await {
            Ok(()) => {}
            Err(relay_api::Error::UnsupportedOperation(op)) => {
                debug!(operation = op, "schedule write unsupported, keeping local copy");
            }
            Err(e) => return Err(e.into()),
        }

        self.inner.slots.send_replace(Arc::new(slots));
        Ok(())
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to status snapshots.
    pub fn status(&self) -> watch::Receiver<Option<DeviceStatus>> {
        self.inner.status.subscribe()
    }

    /// Subscribe to the time-slot list.
    pub fn time_slots(&self) -> watch::Receiver<Arc<Vec<TimeSlot>>> {
        self.inner.slots.subscribe()
    }

    /// Current connection state snapshot.
    pub fn current_state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Current status snapshot, if any poll has succeeded.
    pub fn current_status(&self) -> Option<DeviceStatus> {
        self.inner.status.borrow().clone()
    }

    /// Current time-slot list snapshot.
    pub fn current_slots(&self) -> Arc<Vec<TimeSlot>> {
        Arc::clone(&self.inner.slots.borrow())
    }

    async fn current_client(&self) -> Option<Arc<DeviceClient>> {
        self.inner.client.lock().await.clone()
    }
}

// ── Background poll task ─────────────────────────────────────────

/// Periodically refresh the device status until cancelled.
///
/// Refreshes run serially inside this task, so a slow response delays the
/// next tick instead of overlapping it -- in-flight polls are naturally
/// coalesced and out-of-order completions cannot happen.
async fn poll_task(session: DeviceSession, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await; // consume the immediate first tick; connect already probed

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                // Poll failures stay in the log; the UI only sees the
                // Offline state flip, never an interruption.
                if let Err(e) = session.refresh_status().await {
                    warn!(error = %e, "status poll failed");
                }
            }
        }
    }

    debug!("poll task stopped");
}

// ── Helpers ──────────────────────────────────────────────────────

/// Parse a user-entered device address. A bare IP or hostname gets the
/// plain-HTTP scheme the device expects (`http://{ip}`).
fn parse_device_address(address: &str) -> Result<Url, CoreError> {
    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    candidate.parse().map_err(|e| CoreError::Validation {
        message: format!("invalid device address {address:?}: {e}"),
    })
}
