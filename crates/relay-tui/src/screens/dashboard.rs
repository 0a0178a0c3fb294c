//! Dashboard view — live device state and the configured time slots.
//!
//! Three badges across the top (device clock, relay state, mode) above the
//! time-slot list. Data arrives via the session bridge as `StatusUpdated`,
//! `ConnectionChanged`, and `TimeSlotsUpdated`; the badges always reflect
//! the last good snapshot, with the clock badge overridden to "Offline"
//! while the device is unreachable.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use relay_core::{ConnectionState, DeviceStatus, RelayMode, TimeSlot};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ViewId;
use crate::theme;

pub struct DashboardScreen {
    focused: bool,
    status: Option<DeviceStatus>,
    connection: ConnectionState,
    slots: Arc<Vec<TimeSlot>>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            status: None,
            connection: ConnectionState::default(),
            slots: Arc::new(Vec::new()),
        }
    }

    fn render_badge(frame: &mut Frame, area: Rect, text: &str, style: Style) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());

        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(
            Paragraph::new(Span::styled(text, style)).alignment(Alignment::Center),
            inner,
        );
    }

    fn render_slots(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Time Slots ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.slots.is_empty() {
            let y_offset = inner.height.saturating_sub(1) / 2;
            let centered = Rect {
                x: inner.x,
                y: inner.y + y_offset,
                width: inner.width,
                height: 1.min(inner.height),
            };
            frame.render_widget(
                Paragraph::new(Span::styled("No time slots configured", theme::key_hint()))
                    .alignment(Alignment::Center),
                centered,
            );
            return;
        }

        let lines: Vec<Line> = self
            .slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                Line::from(vec![
                    Span::styled(format!("  {:>2}. ", i + 1), theme::key_hint()),
                    Span::styled(slot.to_string(), theme::text()),
                ])
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for DashboardScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('t') => Some(Action::ToggleRelay),
            KeyCode::Char('e') => Some(Action::SwitchView(ViewId::Edit)),
            KeyCode::Char('l') => Some(Action::Disconnect),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StatusUpdated(status) => self.status = Some(status.clone()),
            Action::ConnectionChanged(state) => self.connection = *state,
            Action::TimeSlotsUpdated(slots) => self.slots = Arc::clone(slots),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([
            Constraint::Length(3), // badges
            Constraint::Min(3),    // slot list
        ])
        .split(area);

        let badges = Layout::horizontal([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[0]);

        let (time_text, time_style) = time_badge(self.status.as_ref(), self.connection);
        Self::render_badge(frame, badges[0], &time_text, time_style);

        let (relay_text, relay_style) = relay_badge(self.status.as_ref());
        Self::render_badge(frame, badges[1], relay_text, relay_style);

        let (mode_text, mode_style) = mode_badge(self.status.as_ref());
        Self::render_badge(frame, badges[2], mode_text, mode_style);

        self.render_slots(frame, rows[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "dashboard"
    }
}

// ── Badge helpers ───────────────────────────────────────────────────

/// Device clock badge. The `Offline` state overrides the clock text; the
/// last known time would otherwise read as current.
fn time_badge(status: Option<&DeviceStatus>, connection: ConnectionState) -> (String, Style) {
    if connection == ConnectionState::Offline {
        return ("Offline".into(), theme::badge_offline());
    }
    match status {
        Some(s) => (s.time.clone(), theme::badge_time()),
        None => ("--:--:--".into(), theme::key_hint()),
    }
}

fn relay_badge(status: Option<&DeviceStatus>) -> (&'static str, Style) {
    match status {
        Some(s) if s.relay => ("Relay: ON", theme::badge_on()),
        Some(_) => ("Relay: OFF", theme::badge_off()),
        None => ("Relay: --", theme::key_hint()),
    }
}

fn mode_badge(status: Option<&DeviceStatus>) -> (&'static str, Style) {
    match status.map(|s| s.mode) {
        Some(RelayMode::Auto) => ("Mode: AUTO", theme::badge_auto()),
        Some(RelayMode::Manual) => ("Mode: MANUAL", theme::badge_manual()),
        None => ("Mode: --", theme::key_hint()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn status(time: &str, relay: bool, mode: RelayMode) -> DeviceStatus {
        DeviceStatus {
            time: time.into(),
            relay,
            mode,
        }
    }

    #[test]
    fn energized_manual_status_renders_on_and_manual_badges() {
        let s = status("14:25:09", true, RelayMode::Manual);

        let (relay_text, relay_style) = relay_badge(Some(&s));
        assert_eq!(relay_text, "Relay: ON");
        assert_eq!(relay_style, theme::badge_on());

        let (mode_text, mode_style) = mode_badge(Some(&s));
        assert_eq!(mode_text, "Mode: MANUAL");
        assert_eq!(mode_style, theme::badge_manual());
    }

    #[test]
    fn deenergized_auto_status_renders_off_and_auto_badges() {
        let s = status("06:00:00", false, RelayMode::Auto);

        let (relay_text, relay_style) = relay_badge(Some(&s));
        assert_eq!(relay_text, "Relay: OFF");
        assert_eq!(relay_style, theme::badge_off());

        let (mode_text, mode_style) = mode_badge(Some(&s));
        assert_eq!(mode_text, "Mode: AUTO");
        assert_eq!(mode_style, theme::badge_auto());
    }

    #[test]
    fn offline_overrides_the_clock_badge() {
        let s = status("14:25:09", true, RelayMode::Manual);

        let (text, style) = time_badge(Some(&s), ConnectionState::Offline);
        assert_eq!(text, "Offline");
        assert_eq!(style, theme::badge_offline());

        // Back online, the clock shows again
        let (text, _) = time_badge(Some(&s), ConnectionState::Connected);
        assert_eq!(text, "14:25:09");
    }

    #[test]
    fn missing_status_renders_placeholders() {
        let (text, _) = time_badge(None, ConnectionState::Connected);
        assert_eq!(text, "--:--:--");
        assert_eq!(relay_badge(None).0, "Relay: --");
        assert_eq!(mode_badge(None).0, "Mode: --");
    }
}
