//! Function form - argument entry for parameterized calls and transactions

use alloy_dyn_abi::DynSolValue;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::fields::{EditOutcome, FieldEditor};
use super::{panel_block, PanelStatus, TxProgress};
use crate::core::{Action, Context, Module, NotifyLevel, Submission};
use crate::domain::abi::FunctionDescriptor;
use crate::domain::display::{try_to_display, FormatHint};
use crate::domain::form::FormState;

/// What submitting the form does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// `eth_call` at the block tag
    Read,
    /// Transaction from the session signer
    Write,
}

pub struct FunctionForm {
    function: FunctionDescriptor,
    intent: Intent,
    editor: FieldEditor,
    hint: FormatHint,
    status: PanelStatus,
    result: Option<String>,
}

impl FunctionForm {
    pub fn new(function: FunctionDescriptor, hint: FormatHint) -> Self {
        let intent = if function.state_mutability.is_read_only() {
            Intent::Read
        } else {
            Intent::Write
        };
        let mut form = FormState::new(function.name.clone(), function.inputs.clone());
        if function.is_payable() {
            form = form.with_value_field();
        }
        Self {
            function,
            intent,
            editor: FieldEditor::new(form),
            hint,
            status: PanelStatus::Idle,
            result: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    /// Enter on the selected panel: edit the fields, or submit straight away
    /// when there are none
    pub fn activate(&mut self, ctx: &Context) -> Action {
        if self.editor.begin() {
            Action::None
        } else {
            self.submit(ctx)
        }
    }

    pub fn submit(&mut self, ctx: &Context) -> Action {
        if self.status.is_loading() {
            return Action::Notify(
                format!("{} is still pending", self.function.name),
                NotifyLevel::Warn,
            );
        }
        if self.intent == Intent::Write && !ctx.can_sign {
            return Action::Notify(
                "no signer: pass --private-key or pick a node account with :account".to_string(),
                NotifyLevel::Error,
            );
        }

        let (args, value) = match self.editor.values() {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(function = %self.function.name, "invalid input: {err}");
                return Action::Notify(err.to_string(), NotifyLevel::Error);
            }
        };

        self.status = PanelStatus::Loading;
        self.editor.end();
        let function = self.function.name.clone();
        Action::Submit(match self.intent {
            Intent::Read => Submission::Read { function, args },
            Intent::Write => Submission::Write {
                function,
                args,
                value,
            },
        })
    }

    pub fn apply_result(&mut self, outcome: Result<Vec<DynSolValue>, String>) {
        match outcome {
            Ok(values) => {
                self.result = Some(try_to_display(&values, self.hint));
                self.status = PanelStatus::Displayed;
                self.editor.clear();
            }
            Err(message) => {
                tracing::warn!(function = %self.function.name, "call failed: {message}");
                self.status = PanelStatus::Error(message);
            }
        }
    }

    pub fn apply_tx(&mut self, progress: TxProgress) {
        match progress {
            TxProgress::Submitted(hash) => {
                self.result = Some(format!("submitted {hash}"));
            }
            TxProgress::Mined {
                success: true,
                block,
            } => {
                self.result = Some(match block {
                    Some(block) => format!("confirmed in block {block}"),
                    None => "confirmed".to_string(),
                });
                self.status = PanelStatus::Displayed;
                self.editor.clear();
            }
            TxProgress::Mined {
                success: false,
                block,
            } => {
                let message = match block {
                    Some(block) => format!("reverted in block {block}"),
                    None => "reverted".to_string(),
                };
                tracing::warn!(function = %self.function.name, "{message}");
                self.status = PanelStatus::Error(message);
            }
            TxProgress::Failed(message) => {
                tracing::warn!(function = %self.function.name, "transaction failed: {message}");
                self.status = PanelStatus::Error(message);
            }
        }
    }

    pub fn reset(&mut self) {
        if self.status.is_loading() {
            self.status = PanelStatus::Idle;
        }
    }

    pub fn height(&self) -> u16 {
        self.editor.height() + 3
    }
}

impl Module for FunctionForm {
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        if matches!(self.status, PanelStatus::Error(_)) {
            self.status = PanelStatus::Idle;
        }
        match self.editor.handle_key(key) {
            EditOutcome::Handled(action) => action,
            EditOutcome::Submit => self.submit(ctx),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context, focused: bool) {
        let tag = match (self.intent, self.function.is_payable()) {
            (Intent::Read, _) => "read",
            (Intent::Write, true) => "payable",
            (Intent::Write, false) => "write",
        };
        let block = panel_block(&self.function.name, tag, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.editor.height()), Constraint::Length(1)])
            .split(inner);
        self.editor.render(frame, chunks[0], focused);
        frame.render_widget(
            Paragraph::new(outcome_line(&self.status, self.result.as_deref(), ctx)),
            chunks[1],
        );
    }
}

/// The `→ result` line under a form
pub(super) fn outcome_line<'a>(status: &PanelStatus, result: Option<&str>, ctx: &Context) -> Line<'a> {
    let mut spans = vec![Span::styled("→ ", Style::default().fg(Color::DarkGray))];
    if let Some(result) = result {
        spans.push(Span::styled(result.to_string(), Style::default().fg(Color::Green)));
    }
    match status {
        PanelStatus::Loading => spans.push(Span::styled(
            format!(" {}", ctx.spinner()),
            Style::default().fg(Color::Yellow),
        )),
        PanelStatus::Error(message) => spans.push(Span::styled(
            format!(" ✗ {message}"),
            Style::default().fg(Color::Red),
        )),
        PanelStatus::Idle | PanelStatus::Displayed => {}
    }
    Line::from(spans)
}
