//! Edit view — the time-slot editor.
//!
//! Rows are seeded from the current slot list and edited locally; nothing
//! touches the session until Enter collects every row in order and
//! dispatches the full replacement set. Adding past the device cap leaves
//! the rows untouched and raises a visible notice instead.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use relay_core::{MAX_TIME_SLOTS, TimeSlot};

use crate::action::Action;
use crate::component::Component;
use crate::screen::ViewId;
use crate::theme;

/// "HH:MM" is five characters; longer input can never validate.
const TIME_INPUT_MAX: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotField {
    Start,
    End,
}

#[derive(Debug, Clone, Default)]
struct SlotRow {
    start: String,
    end: String,
}

pub struct EditScreen {
    focused: bool,
    rows: Vec<SlotRow>,
    selected: usize,
    field: SlotField,
    notice: Option<String>,
}

impl EditScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            rows: Vec::new(),
            selected: 0,
            field: SlotField::Start,
            notice: None,
        }
    }

    fn add_row(&mut self) {
        if self.rows.len() >= MAX_TIME_SLOTS {
            self.notice = Some(format!("Maximum of {MAX_TIME_SLOTS} time slots reached"));
            return;
        }
        self.rows.push(SlotRow::default());
        self.selected = self.rows.len() - 1;
        self.field = SlotField::Start;
    }

    fn remove_row(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.rows.remove(self.selected);
        if self.selected >= self.rows.len() && self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn active_input_mut(&mut self) -> Option<&mut String> {
        let row = self.rows.get_mut(self.selected)?;
        Some(match self.field {
            SlotField::Start => &mut row.start,
            SlotField::End => &mut row.end,
        })
    }

    /// Collect every row, in display order, into the replacement set.
    fn collect_slots(&self) -> Vec<TimeSlot> {
        self.rows
            .iter()
            .map(|row| TimeSlot::new(row.start.trim(), row.end.trim()))
            .collect()
    }

    fn render_row(&self, frame: &mut Frame, area: Rect, index: usize, row: &SlotRow) {
        let selected = index == self.selected;

        let marker = if selected { "\u{25B8} " } else { "  " };
        let field_style = |field: SlotField| {
            if selected && self.field == field {
                Style::default().fg(theme::NEON_CYAN)
            } else {
                theme::text()
            }
        };
        let pad = |value: &str| {
            if value.is_empty() {
                "__:__".to_string()
            } else {
                value.to_string()
            }
        };

        let line = Line::from(vec![
            Span::styled(marker, theme::border_focused()),
            Span::styled(format!("{:>2}. ", index + 1), theme::key_hint()),
            Span::styled(pad(&row.start), field_style(SlotField::Start)),
            Span::styled(" - ", theme::key_hint()),
            Span::styled(pad(&row.end), field_style(SlotField::End)),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for EditScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::SwitchView(ViewId::Dashboard))),
            KeyCode::Enter => {
                self.notice = None;
                return Ok(Some(Action::SaveTimeSlots(self.collect_slots())));
            }

            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                if self.selected + 1 < self.rows.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.field = match self.field {
                    SlotField::Start => SlotField::End,
                    SlotField::End => SlotField::Start,
                };
            }

            KeyCode::Char('+') => {
                self.notice = None;
                self.add_row();
            }
            KeyCode::Char('-') => {
                self.notice = None;
                self.remove_row();
            }

            KeyCode::Backspace => {
                self.notice = None;
                if let Some(input) = self.active_input_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => {
                self.notice = None;
                if let Some(input) = self.active_input_mut() {
                    if input.len() < TIME_INPUT_MAX {
                        input.push(c);
                    }
                }
            }
            _ => {}
        }

        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::TimeSlotsUpdated(slots) => {
                self.rows = slots
                    .iter()
                    .map(|slot| SlotRow {
                        start: slot.start.clone(),
                        end: slot.end.clone(),
                    })
                    .collect();
                self.selected = self.selected.min(self.rows.len().saturating_sub(1));
            }
            Action::SaveResult(Err(msg)) => {
                self.notice = Some(msg.clone());
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Edit Time Slots ({}/{MAX_TIME_SLOTS}) ", self.rows.len()))
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

        let layout = Layout::vertical([
            Constraint::Min(1),    // rows
            Constraint::Length(1), // notice
        ])
        .split(inner);

        if self.rows.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No time slots. Press + to add one.",
                    theme::key_hint(),
                ))
                .alignment(Alignment::Center),
                layout[0],
            );
        } else {
            for (i, row) in self.rows.iter().enumerate() {
                let i_u16 = u16::try_from(i).unwrap_or(u16::MAX);
                if i_u16 >= layout[0].height {
                    break;
                }
                let row_area = Rect::new(layout[0].x, layout[0].y + i_u16, layout[0].width, 1);
                self.render_row(frame, row_area, i, row);
            }
        }

        if let Some(ref notice) = self.notice {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("\u{26A0} {notice}"), theme::error_text()))
                    .alignment(Alignment::Center),
                layout[1],
            );
        }
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "edit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn screen_with_rows(n: usize) -> EditScreen {
        let mut screen = EditScreen::new();
        for _ in 0..n {
            screen.add_row();
        }
        screen
    }

    #[test]
    fn add_beyond_cap_is_refused_with_notice() {
        let mut screen = screen_with_rows(MAX_TIME_SLOTS);
        assert_eq!(screen.rows.len(), MAX_TIME_SLOTS);
        assert!(screen.notice.is_none());

        screen.add_row();

        assert_eq!(screen.rows.len(), MAX_TIME_SLOTS, "cap must hold");
        assert_eq!(
            screen.notice.as_deref(),
            Some("Maximum of 14 time slots reached")
        );
    }

    #[test]
    fn remove_clamps_the_selection() {
        let mut screen = screen_with_rows(3);
        screen.selected = 2;

        screen.remove_row();

        assert_eq!(screen.rows.len(), 2);
        assert_eq!(screen.selected, 1);
    }

    #[test]
    fn collect_preserves_row_order() {
        let mut screen = EditScreen::new();
        screen.rows = vec![
            SlotRow {
                start: "06:30".into(),
                end: "08:00".into(),
            },
            SlotRow {
                start: "18:00".into(),
                end: "22:30".into(),
            },
        ];

        let slots = screen.collect_slots();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start, "06:30");
        assert_eq!(slots[1].end, "22:30");
    }

    #[test]
    fn slot_update_reseeds_rows() {
        let mut screen = screen_with_rows(1);
        let slots = Arc::new(vec![
            TimeSlot::new("07:00", "09:00"),
            TimeSlot::new("17:00", "21:00"),
        ]);

        let _ = screen
            .update(&Action::TimeSlotsUpdated(slots))
            .expect("update");

        assert_eq!(screen.rows.len(), 2);
        assert_eq!(screen.rows[1].start, "17:00");
    }
}
