//! Login view — device address and Basic Auth credentials.
//!
//! The address is prefilled from the saved config; the credential fields
//! default to the device's factory pair and stay user-editable. Enter
//! dispatches [`Action::Connect`]; the result comes back asynchronously as
//! `ConnectResult`, rendered inline on failure.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use secrecy::ExposeSecret;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use relay_core::DeviceCredentials;

use crate::action::Action;
use crate::component::Component;
use crate::screens::LoginPrefill;
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Address,
    Username,
    Password,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Self::Address => Self::Username,
            Self::Username => Self::Password,
            Self::Password => Self::Address,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Address => Self::Password,
            Self::Username => Self::Address,
            Self::Password => Self::Username,
        }
    }
}

pub struct LoginScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    address: String,
    username: String,
    password: String,
    field: Field,
    connecting: bool,
    error: Option<String>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl LoginScreen {
    pub fn new(prefill: LoginPrefill) -> Self {
        let defaults = DeviceCredentials::default();
        Self {
            focused: false,
            action_tx: None,
            address: prefill.address.unwrap_or_default(),
            username: prefill.username.unwrap_or(defaults.username),
            password: prefill
                .password
                .unwrap_or_else(|| defaults.password.expose_secret().to_string()),
            field: Field::Address,
            connecting: false,
            error: None,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn active_input_mut(&mut self) -> &mut String {
        match self.field {
            Field::Address => &mut self.address,
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }

    fn submit(&mut self) {
        if self.connecting {
            return;
        }
        self.error = None;
        self.connecting = true;

        if let Some(tx) = &self.action_tx {
            let _ = tx.send(Action::Connect {
                address: self.address.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
            });
        }
    }

    // ── Rendering helpers ───────────────────────────────────────────

    fn render_centered_panel(&self, frame: &mut Frame, area: Rect) -> Rect {
        let panel_w = 52u16.min(area.width.saturating_sub(4));
        let panel_h = 18u16.min(area.height.saturating_sub(2));
        let x = (area.width.saturating_sub(panel_w)) / 2;
        let y = (area.height.saturating_sub(panel_h)) / 2;
        let panel = Rect::new(area.x + x, area.y + y, panel_w, panel_h);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            panel,
        );

        let block = Block::default()
            .title(Line::from(vec![
                Span::raw(" "),
                Span::styled("Relay Control Panel", theme::title_style()),
                Span::raw(" "),
            ]))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());

        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        inner
    }

    fn render_input_field(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        value: &str,
        active: bool,
        masked: bool,
    ) {
        if area.height < 3 {
            return;
        }

        let label_style = if active {
            Style::default().fg(theme::NEON_CYAN)
        } else {
            theme::text()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, label_style)),
            Rect::new(area.x, area.y, area.width, 1),
        );

        let display = if masked && !value.is_empty() {
            "\u{25CF}".repeat(value.chars().count())
        } else {
            value.to_string()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if active {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let block_area = Rect::new(area.x, area.y + 1, area.width, 3.min(area.height - 1));
        let inner = block.inner(block_area);
        frame.render_widget(block, block_area);

        let text = if active && !self.connecting {
            format!("{display}\u{2588}")
        } else {
            display
        };
        frame.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(theme::NEON_CYAN))),
            inner,
        );
    }
}

impl Component for LoginScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.connecting {
            // Inputs are frozen while the probe is in flight.
            return Ok(None);
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.field = self.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.field = self.field.prev(),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.error = None;
                self.active_input_mut().pop();
            }
            KeyCode::Char(c) => {
                self.error = None;
                self.active_input_mut().push(c);
            }
            _ => {}
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ConnectResult(result) => {
                self.connecting = false;
                match result {
                    Ok(()) => self.error = None,
                    Err(msg) => self.error = Some(msg.clone()),
                }
            }
            Action::Tick => {
                if self.connecting {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            area,
        );

        let inner = self.render_centered_panel(frame, area);

        let layout = Layout::vertical([
            Constraint::Length(4), // address
            Constraint::Length(4), // username
            Constraint::Length(4), // password
            Constraint::Length(1), // throbber / spacer
            Constraint::Length(1), // error
            Constraint::Min(0),
        ])
        .split(inner);

        self.render_input_field(
            frame,
            layout[0],
            "  Device address",
            &self.address,
            self.field == Field::Address,
            false,
        );
        self.render_input_field(
            frame,
            layout[1],
            "  Username",
            &self.username,
            self.field == Field::Username,
            false,
        );
        self.render_input_field(
            frame,
            layout[2],
            "  Password",
            &self.password,
            self.field == Field::Password,
            true,
        );

        if self.connecting {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label("  Connecting...")
                .style(Style::default().fg(theme::NEON_CYAN))
                .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
            frame.render_stateful_widget(throbber, layout[3], &mut self.throbber_state.clone());
        }

        if let Some(ref err) = self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("\u{2717} {err}"),
                    theme::error_text().add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
                layout[4],
            );
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "login"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_fields_prefill_factory_defaults() {
        let screen = LoginScreen::new(LoginPrefill {
            address: Some("192.168.4.1".into()),
            ..LoginPrefill::default()
        });
        assert_eq!(screen.address, "192.168.4.1");
        assert_eq!(screen.username, "admin");
        assert_eq!(screen.password, "admin123");
    }

    #[test]
    fn prefilled_credentials_override_factory_defaults() {
        let screen = LoginScreen::new(LoginPrefill {
            address: None,
            username: Some("operator".into()),
            password: Some("hunter2".into()),
        });
        assert_eq!(screen.address, "");
        assert_eq!(screen.username, "operator");
        assert_eq!(screen.password, "hunter2");
    }

    #[test]
    fn tab_cycles_through_all_fields() {
        assert_eq!(Field::Address.next(), Field::Username);
        assert_eq!(Field::Username.next(), Field::Password);
        assert_eq!(Field::Password.next(), Field::Address);
        assert_eq!(Field::Address.prev(), Field::Password);
    }

    #[test]
    fn failed_connect_shows_inline_error() {
        let mut screen = LoginScreen::new(LoginPrefill::default());
        screen.connecting = true;

        let _ = screen
            .update(&Action::ConnectResult(Err("invalid credentials".into())))
            .expect("update");

        assert!(!screen.connecting);
        assert_eq!(screen.error.as_deref(), Some("invalid credentials"));
    }
}
