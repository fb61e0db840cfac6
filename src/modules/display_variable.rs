//! Display variable - the live value of a zero-argument view function

use alloy_dyn_abi::DynSolValue;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::{panel_block, PanelStatus};
use crate::core::{Action, Context, Module, Submission};
use crate::domain::abi::FunctionDescriptor;
use crate::domain::display::{try_to_display, FormatHint};

pub struct DisplayVariable {
    function: FunctionDescriptor,
    hint: FormatHint,
    value: Option<String>,
    status: PanelStatus,
}

impl DisplayVariable {
    pub fn new(function: FunctionDescriptor, hint: FormatHint) -> Self {
        Self {
            function,
            hint,
            value: None,
            status: PanelStatus::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Start a query unless one is already in flight
    pub fn refresh(&mut self) -> Option<Submission> {
        if self.status.is_loading() {
            return None;
        }
        self.status = PanelStatus::Loading;
        Some(Submission::Read {
            function: self.function.name.clone(),
            args: Vec::new(),
        })
    }

    /// Failures keep whatever was displayed before
    pub fn apply_result(&mut self, outcome: Result<Vec<DynSolValue>, String>) {
        match outcome {
            Ok(values) => {
                self.value = Some(try_to_display(&values, self.hint));
                self.status = PanelStatus::Displayed;
            }
            Err(message) => {
                tracing::warn!(function = %self.function.name, "display query failed: {message}");
                self.status = PanelStatus::Error(message);
            }
        }
    }

    /// Forget any in-flight query (its answer belongs to an older session)
    pub fn reset(&mut self) {
        if self.status.is_loading() {
            self.status = PanelStatus::Idle;
        }
    }
}

impl Module for DisplayVariable {
    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') => match self.refresh() {
                Some(submission) => Action::Submit(submission),
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context, focused: bool) {
        let block = panel_block(&self.function.name, "view", focused);

        let value = match (&self.value, &self.status) {
            (Some(value), _) => Span::styled(value.clone(), Style::default().fg(Color::Green)),
            (None, PanelStatus::Error(_)) => Span::styled("-", Style::default().fg(Color::DarkGray)),
            (None, _) => Span::styled("loading…", Style::default().fg(Color::DarkGray)),
        };
        let mut spans = vec![value];
        if self.status.is_loading() {
            spans.push(Span::styled(
                format!(" {}", ctx.spinner()),
                Style::default().fg(Color::Yellow),
            ));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{ParamSpec, StateMutability};
    use alloy_primitives::U256;

    fn make_display() -> DisplayVariable {
        DisplayVariable::new(
            FunctionDescriptor::function(
                "getPoolpendingFee",
                vec![],
                vec![ParamSpec::new("", "uint256")],
                StateMutability::View,
            ),
            FormatHint::Auto,
        )
    }

    #[test]
    fn test_refresh_is_not_reentrant() {
        let mut display = make_display();
        assert!(display.refresh().is_some());
        assert!(display.refresh().is_none());
        display.apply_result(Ok(vec![DynSolValue::Uint(U256::from(7u64), 256)]));
        assert_eq!(display.value(), Some("7"));
        assert!(display.refresh().is_some());
    }

    #[test]
    fn test_failure_keeps_stale_value() {
        let mut display = make_display();
        display.refresh();
        display.apply_result(Ok(vec![DynSolValue::Uint(U256::from(7u64), 256)]));
        display.refresh();
        display.apply_result(Err("execution reverted".to_string()));
        assert_eq!(display.value(), Some("7"));
        assert!(matches!(display.status(), PanelStatus::Error(_)));
    }
}
