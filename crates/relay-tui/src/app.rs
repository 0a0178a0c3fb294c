//! Application core — event loop, view management, action dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use relay_core::{ConnectionState, DeviceSession};

use crate::action::{Action, Notification, NotificationLevel};
use crate::bridge::run_session_bridge;
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ViewId;
use crate::screens::{LoginPrefill, create_views};
use crate::theme;
use crate::tui::Tui;

/// How long a status-bar notification stays visible.
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Top-level application state and event loop.
pub struct App {
    /// Session shared with background connect/toggle/save tasks.
    session: DeviceSession,
    /// Current active view.
    active_view: ViewId,
    /// All view components, keyed by ViewId.
    views: HashMap<ViewId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Connection state mirror for the status bar.
    connection: ConnectionState,
    /// Current status-bar notification, if any.
    notification: Option<(Notification, Instant)>,
    /// Cancels the session bridge of the current connection.
    bridge_cancel: Option<CancellationToken>,
    /// Terminal size for responsive layout.
    terminal_size: (u16, u16),
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    /// Create a new App showing the login view, with the form prefilled
    /// from CLI flags and the saved config where available.
    pub fn new(session: DeviceSession, prefill: LoginPrefill) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let views: HashMap<ViewId, Box<dyn Component>> =
            create_views(prefill).into_iter().collect();

        Self {
            session,
            active_view: ViewId::Login,
            views,
            running: true,
            connection: ConnectionState::default(),
            notification: None,
            bridge_cancel: None,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
        }
    }

    /// Initialize all view components with the action sender.
    fn init_views(&mut self) -> Result<()> {
        for view in self.views.values_mut() {
            view.init(self.action_tx.clone())?;
        }
        if let Some(view) = self.views.get_mut(&self.active_view) {
            view.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_views()?;

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Ctrl+C always quits; everything else
    /// is delegated to the active view (login owns the text fields, so
    /// there is no global letter keybinding).
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if let Some(view) = self.views.get_mut(&self.active_view) {
            return view.handle_key_event(key);
        }

        Ok(None)
    }

    /// Process a single action — update app state and propagate to views.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(w, h) => {
                self.terminal_size = (*w, *h);
            }

            Action::Tick => {
                if let Some((_, since)) = &self.notification {
                    if since.elapsed() > NOTIFICATION_TTL {
                        self.notification = None;
                    }
                }
                // Active view animates (login throbber)
                self.forward_to_active(action)?;
            }

            Action::SwitchView(target) => {
                if *target != self.active_view {
                    debug!("switching view: {} → {}", self.active_view, target);
                    if let Some(view) = self.views.get_mut(&self.active_view) {
                        view.set_focused(false);
                    }
                    self.active_view = *target;
                    if let Some(view) = self.views.get_mut(&self.active_view) {
                        view.set_focused(true);
                    }
                }
            }

            Action::Connect {
                address,
                username,
                password,
            } => {
                self.start_connect(address, username, password);
            }

            Action::ConnectResult(result) => {
                if result.is_ok() {
                    self.start_bridge();
                    self.action_tx.send(Action::SwitchView(ViewId::Dashboard))?;
                }
                // Login clears its throbber and shows the error inline
                self.forward_to(ViewId::Login, action)?;
            }

            Action::Disconnect => {
                self.stop_bridge();
                self.connection = ConnectionState::Disconnected;
                self.notification = None;

                let session = self.session.clone();
                tokio::spawn(async move {
                    session.disconnect().await;
                });

                self.action_tx.send(Action::SwitchView(ViewId::Login))?;
            }

            Action::ToggleRelay => {
                let session = self.session.clone();
                tokio::spawn(async move {
                    // Errors surface through the forced follow-up refresh
                    // (state flips to Offline); nothing to pop up here.
                    if let Err(e) = session.toggle_relay().await {
                        warn!(error = %e, "relay toggle failed");
                    }
                });
            }

            Action::SaveTimeSlots(slots) => {
                let session = self.session.clone();
                let tx = self.action_tx.clone();
                let slots = slots.clone();
                tokio::spawn(async move {
                    let result = session.save_time_slots(slots).await;
                    let _ = tx.send(Action::SaveResult(result.map_err(|e| format!("{e}"))));
                });
            }

            Action::SaveResult(result) => {
                match result {
                    Ok(()) => {
                        self.notify(Notification::success("Time slots saved"));
                        self.action_tx.send(Action::SwitchView(ViewId::Dashboard))?;
                    }
                    Err(msg) => self.notify(Notification::error(msg.clone())),
                }
                self.forward_to(ViewId::Edit, action)?;
            }

            Action::ConnectionChanged(state) => {
                self.connection = *state;
                self.forward_to_all(action)?;
            }

            // Data events go to every view: the dashboard renders them and
            // the edit screen seeds its rows from the slot list.
            Action::StatusUpdated(_) | Action::TimeSlotsUpdated(_) => {
                self.forward_to_all(action)?;
            }

            Action::Notify(n) => {
                self.notify(n.clone());
            }

            // Render is handled in the main loop, not here
            Action::Render => {}
        }

        Ok(())
    }

    fn notify(&mut self, n: Notification) {
        self.notification = Some((n, Instant::now()));
    }

    fn forward_to_active(&mut self, action: &Action) -> Result<()> {
        self.forward_to(self.active_view, action)
    }

    fn forward_to(&mut self, id: ViewId, action: &Action) -> Result<()> {
        if let Some(view) = self.views.get_mut(&id) {
            if let Some(follow_up) = view.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    fn forward_to_all(&mut self, action: &Action) -> Result<()> {
        let ids: Vec<ViewId> = self.views.keys().copied().collect();
        for id in ids {
            self.forward_to(id, action)?;
        }
        Ok(())
    }

    /// Persist the address and kick off the async credential probe.
    ///
    /// The address is remembered as soon as the connect is dispatched, not
    /// after the probe: a failed attempt against a temporarily-down device
    /// should still prefill next time.
    fn start_connect(&mut self, address: &str, username: &str, password: &str) {
        if let Some(device_address) = address_to_persist(address) {
            let cfg = relay_config::Config {
                device_address: Some(device_address),
            };
            if let Err(e) = relay_config::save_config(&cfg) {
                warn!(error = %e, "failed to persist device address");
            }
        }

        let session = self.session.clone();
        let tx = self.action_tx.clone();
        let address = address.to_string();
        let username = username.to_string();
        let password = SecretString::from(password.to_string());

        tokio::spawn(async move {
            let result = session.connect(&address, &username, password).await;
            let _ = tx.send(Action::ConnectResult(result.map_err(|e| format!("{e}"))));
        });
    }

    /// Spawn the session bridge for a freshly authenticated connection.
    fn start_bridge(&mut self) {
        self.stop_bridge();
        let cancel = CancellationToken::new();
        tokio::spawn(run_session_bridge(
            self.session.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));
        self.bridge_cancel = Some(cancel);
    }

    fn stop_bridge(&mut self) {
        if let Some(cancel) = self.bridge_cancel.take() {
            cancel.cancel();
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [view content] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),    // View content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        if let Some(view) = self.views.get(&self.active_view) {
            view.render(frame, layout[0]);
        }

        self.render_status_bar(frame, layout[1]);
    }

    /// Render the bottom status bar with connection state and key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection_indicator = match self.connection {
            ConnectionState::Connected => {
                Span::styled("● connected", Style::default().fg(theme::SUCCESS_GREEN))
            }
            ConnectionState::Offline => {
                Span::styled("○ offline", Style::default().fg(theme::ERROR_RED))
            }
            ConnectionState::Connecting => Span::styled(
                "◐ connecting",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ),
            ConnectionState::Disconnected => {
                Span::styled("○ disconnected", Style::default().fg(theme::BORDER_GRAY))
            }
        };

        let mut spans = vec![Span::raw(" "), connection_indicator];
        match &self.notification {
            Some((n, _)) => {
                let color = match n.level {
                    NotificationLevel::Success => theme::SUCCESS_GREEN,
                    NotificationLevel::Error => theme::ERROR_RED,
                    NotificationLevel::Info => theme::DIM_WHITE,
                };
                spans.push(Span::styled(
                    format!(" │ {}", n.message),
                    Style::default().fg(color),
                ));
            }
            None => spans.extend(key_hints(self.active_view)),
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Key hints for the bottom bar, keys highlighted against their labels.
fn key_hints(view: ViewId) -> Vec<Span<'static>> {
    let pairs: &[(&str, &str)] = match view {
        ViewId::Login => &[("Tab", "field"), ("Enter", "connect"), ("Ctrl+C", "quit")],
        ViewId::Dashboard => &[
            ("t", "toggle"),
            ("e", "edit slots"),
            ("l", "logout"),
            ("q", "quit"),
        ],
        ViewId::Edit => &[
            ("↑/↓", "row"),
            ("Tab", "field"),
            ("+", "add"),
            ("-", "remove"),
            ("Enter", "save"),
            ("Esc", "back"),
        ],
    };

    let mut spans = Vec::with_capacity(pairs.len() * 2 + 1);
    spans.push(Span::styled(" │", theme::key_hint()));
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {key}"), theme::key_hint_key()));
        spans.push(Span::styled(format!(" {label} "), theme::key_hint()));
    }
    spans
}

/// Address value to remember for the next launch: exactly as typed,
/// skipped only when effectively blank.
fn address_to_persist(address: &str) -> Option<String> {
    if address.trim().is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_is_persisted_exactly_as_typed() {
        assert_eq!(
            address_to_persist(" 192.168.4.1 "),
            Some(" 192.168.4.1 ".to_string())
        );
        assert_eq!(address_to_persist("relay.local"), Some("relay.local".to_string()));
        assert_eq!(address_to_persist("   "), None);
        assert_eq!(address_to_persist(""), None);
    }

    #[test]
    fn every_view_highlights_its_hint_keys() {
        for view in [ViewId::Login, ViewId::Dashboard, ViewId::Edit] {
            let spans = key_hints(view);
            assert!(
                spans.iter().any(|s| s.style == theme::key_hint_key()),
                "{view} has no highlighted keys"
            );
        }
    }
}
