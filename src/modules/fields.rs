//! Shared argument editor of form panels

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::U256;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::core::{Action, NotifyLevel};
use crate::domain::form::{coerce_value, CoerceError, Converter, FormState};
use crate::ui::widgets::Blockie;

/// Width of the blockie column next to the fields
const BLOCKIE_WIDTH: u16 = 9;

/// What an editing key resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The key was consumed; the action (if any) goes back to the app
    Handled(Action),
    /// Enter: the owner should submit
    Submit,
}

/// Field cursor and edit flag over a [`FormState`]
#[derive(Debug, Clone)]
pub struct FieldEditor {
    pub form: FormState,
    focus: usize,
    editing: bool,
}

impl FieldEditor {
    pub fn new(form: FormState) -> Self {
        Self {
            form,
            focus: 0,
            editing: false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Enter edit mode; returns false when there is nothing to edit
    pub fn begin(&mut self) -> bool {
        if self.form.field_count() == 0 {
            return false;
        }
        self.editing = true;
        self.focus = self.focus.min(self.form.field_count() - 1);
        true
    }

    pub fn end(&mut self) {
        self.editing = false;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditOutcome {
        let count = self.form.field_count();
        match key.code {
            KeyCode::Esc => {
                self.editing = false;
                EditOutcome::Handled(Action::CloseOverlay)
            }
            KeyCode::Enter => EditOutcome::Submit,
            KeyCode::Tab | KeyCode::Down if count > 0 => {
                self.focus = (self.focus + 1) % count;
                EditOutcome::Handled(Action::None)
            }
            KeyCode::BackTab | KeyCode::Up if count > 0 => {
                self.focus = (self.focus + count - 1) % count;
                EditOutcome::Handled(Action::None)
            }
            KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                EditOutcome::Handled(self.convert())
            }
            KeyCode::Backspace => {
                self.form.pop_char(self.focus);
                EditOutcome::Handled(Action::None)
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.form.push_char(self.focus, c);
                EditOutcome::Handled(Action::None)
            }
            _ => EditOutcome::Handled(Action::None),
        }
    }

    fn convert(&mut self) -> Action {
        let kind = self.form.field_kind(self.focus).unwrap_or_default().to_string();
        match self.form.convert_field(self.focus) {
            Ok(true) => Action::None,
            Ok(false) => Action::Notify(format!("no converter for {kind}"), NotifyLevel::Warn),
            Err(err) => Action::Notify(err.to_string(), NotifyLevel::Error),
        }
    }

    /// Coerce the arguments and the optional native value
    pub fn values(&self) -> Result<(Vec<DynSolValue>, Option<U256>), CoerceError> {
        let args = self.form.coerce()?;
        let value = match self.form.raw_value() {
            Some(raw) => match coerce_value(&DynSolType::Uint(256), raw)? {
                DynSolValue::Uint(value, _) => Some(value),
                _ => None,
            },
            None => None,
        };
        Ok((args, value))
    }

    pub fn clear(&mut self) {
        self.form.clear();
        self.focus = 0;
    }

    /// Rows the fields take when rendered
    pub fn height(&self) -> u16 {
        let rows = self.form.field_count() as u16;
        if self.blockie_address().is_some() {
            rows.max(4)
        } else {
            rows
        }
    }

    /// The address shown as a blockie: the focused field first, then any other
    fn blockie_address(&self) -> Option<&str> {
        let is_address = |index: usize| {
            self.form.field_kind(index) == Some("address") && self.form.field_value(index).len() == 42
        };
        if is_address(self.focus) {
            return Some(self.form.field_value(self.focus));
        }
        (0..self.form.field_count())
            .find(|index| is_address(*index))
            .map(|index| self.form.field_value(index))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let blockie = self.blockie_address().map(Blockie::new);
        let (fields_area, blockie_area) = if blockie.is_some() && area.width > BLOCKIE_WIDTH * 2 {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(BLOCKIE_WIDTH)])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        };

        let mut lines = Vec::with_capacity(self.form.field_count());
        for index in 0..self.form.field_count() {
            let active = focused && self.editing && index == self.focus;
            let marker = if active { "› " } else { "  " };
            let value = self.form.field_value(index);
            let mut spans = vec![Span::styled(
                marker,
                Style::default().fg(Color::Cyan),
            )];
            if value.is_empty() {
                spans.push(Span::styled(
                    self.form.field_placeholder(index),
                    Style::default().fg(Color::DarkGray),
                ));
            } else {
                spans.push(Span::raw(value.to_string()));
            }
            if active {
                spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
                if let Some(converter) = self.form.field_kind(index).and_then(Converter::for_kind) {
                    spans.push(Span::styled(
                        format!("  ^t {}", converter.label()),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            lines.push(Line::from(spans));
        }
        frame.render_widget(Paragraph::new(lines), fields_area);

        if let (Some(blockie), Some(blockie_area)) = (blockie, blockie_area) {
            let inner = Rect {
                x: blockie_area.x + 1,
                width: blockie_area.width.saturating_sub(1),
                ..blockie_area
            };
            frame.render_widget(&blockie, inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::ParamSpec;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(editor: &mut FieldEditor, text: &str) {
        for c in text.chars() {
            editor.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_focus_wraps_and_typing_targets_focus() {
        let form = FormState::new(
            "setFeeSharesOfValidator",
            vec![ParamSpec::new("shares", "uint256"), ParamSpec::new("val", "address")],
        );
        let mut editor = FieldEditor::new(form);
        assert!(editor.begin());
        type_text(&mut editor, "7");
        editor.handle_key(key(KeyCode::Tab));
        editor.handle_key(key(KeyCode::Tab));
        assert_eq!(editor.focus(), 0);
        editor.handle_key(key(KeyCode::BackTab));
        type_text(&mut editor, "0x1");
        assert_eq!(editor.form.raw_args(), vec!["7".to_string(), "0x1".to_string()]);
    }

    #[test]
    fn test_ctrl_t_converts_ether() {
        let form = FormState::new("f", vec![ParamSpec::new("amount", "uint256")]);
        let mut editor = FieldEditor::new(form);
        editor.begin();
        type_text(&mut editor, "1.5");
        let outcome = editor.handle_key(KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL));
        assert_eq!(outcome, EditOutcome::Handled(Action::None));
        assert_eq!(editor.form.field_value(0), "1500000000000000000");
    }

    #[test]
    fn test_escape_and_enter() {
        let mut editor = FieldEditor::new(FormState::new("f", vec![ParamSpec::new("", "bool")]));
        editor.begin();
        assert_eq!(editor.handle_key(key(KeyCode::Enter)), EditOutcome::Submit);
        assert_eq!(
            editor.handle_key(key(KeyCode::Esc)),
            EditOutcome::Handled(Action::CloseOverlay)
        );
        assert!(!editor.is_editing());
    }

    #[test]
    fn test_values_with_native_value() {
        let form = FormState::new("depositMargin", vec![]).with_value_field();
        let mut editor = FieldEditor::new(form);
        editor.begin();
        type_text(&mut editor, "42");
        let (args, value) = editor.values().unwrap();
        assert!(args.is_empty());
        assert_eq!(value, Some(U256::from(42u64)));
    }

    #[test]
    fn test_nothing_to_edit() {
        let mut editor = FieldEditor::new(FormState::new("redeemMargin", vec![]));
        assert!(!editor.begin());
        assert_eq!(editor.height(), 0);
    }
}
