//! Compound form - one argument list fanned out over several view calls

use alloy_dyn_abi::DynSolValue;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::fields::{EditOutcome, FieldEditor};
use super::function_form::outcome_line;
use super::{panel_block, PanelStatus};
use crate::core::{Action, Context, Module, NotifyLevel, Submission};
use crate::domain::compound::CompoundRead;
use crate::domain::display::{format_value, FormatHint};
use crate::domain::form::FormState;

pub struct CompoundForm {
    read: CompoundRead,
    editor: FieldEditor,
    hint: FormatHint,
    status: PanelStatus,
    value: Option<String>,
}

impl CompoundForm {
    pub fn new(read: CompoundRead, hint: FormatHint) -> Self {
        let form = FormState::new(read.name.clone(), read.inputs.clone());
        Self {
            read,
            editor: FieldEditor::new(form),
            hint,
            status: PanelStatus::Idle,
            value: None,
        }
    }

    pub fn read(&self) -> &CompoundRead {
        &self.read
    }

    pub fn name(&self) -> &str {
        &self.read.name
    }

    pub fn status(&self) -> &PanelStatus {
        &self.status
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn editor(&self) -> &FieldEditor {
        &self.editor
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    pub fn activate(&mut self, ctx: &Context) -> Action {
        if self.editor.begin() {
            Action::None
        } else {
            self.submit(ctx)
        }
    }

    pub fn submit(&mut self, _ctx: &Context) -> Action {
        if self.status.is_loading() {
            return Action::Notify(format!("{} is still pending", self.read.name), NotifyLevel::Warn);
        }
        let args = match self.editor.form.coerce() {
            Ok(args) => args,
            Err(err) => {
                tracing::warn!(compound = %self.read.name, "invalid input: {err}");
                return Action::Notify(err.to_string(), NotifyLevel::Error);
            }
        };
        self.status = PanelStatus::Loading;
        self.editor.end();
        Action::Submit(Submission::Compound { args })
    }

    /// A failed run leaves the previous value in place
    pub fn apply_result(&mut self, outcome: Result<DynSolValue, String>) {
        match outcome {
            Ok(value) => {
                self.value = Some(format_value(&value, self.hint));
                self.status = PanelStatus::Displayed;
                self.editor.clear();
            }
            Err(message) => {
                tracing::warn!(compound = %self.read.name, "compound read failed: {message}");
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

impl Module for CompoundForm {
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
        let block = panel_block(&self.read.name, self.read.transform.name(), focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(self.editor.height()), Constraint::Length(1)])
            .split(inner);
        self.editor.render(frame, chunks[0], focused);
        frame.render_widget(
            Paragraph::new(outcome_line(&self.status, self.value.as_deref(), ctx)),
            chunks[1],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::ParamSpec;
    use crate::domain::compound::Transform;
    use alloy_primitives::U256;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn rewards_form() -> CompoundForm {
        CompoundForm::new(
            CompoundRead {
                name: "Rewards Amount".to_string(),
                inputs: vec![ParamSpec::new("miner_address", "address")],
                calls: vec![
                    "getPoolSelfBallots".to_string(),
                    "getPoolaccRewardPerShare".to_string(),
                    "getPoolSelfBallotsRewardsDebt".to_string(),
                ],
                transform: Transform::by_name("pending_rewards").unwrap(),
            },
            FormatHint::Auto,
        )
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut ctx = Context::default();
        let mut form = rewards_form();
        form.activate(&ctx);
        for c in "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".chars() {
            form.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), &mut ctx);
        }
        assert!(matches!(
            form.submit(&ctx),
            Action::Submit(Submission::Compound { .. })
        ));
        form.apply_result(Ok(DynSolValue::Uint(U256::from(1500u64), 256)));
        assert_eq!(form.value(), Some("1500"));
        // Success cleared the input
        assert!(form.editor().form.coerce().is_err());

        form.activate(&ctx);
        for c in "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".chars() {
            form.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), &mut ctx);
        }
        assert!(matches!(
            form.submit(&ctx),
            Action::Submit(Submission::Compound { .. })
        ));
        assert!(form.status().is_loading());
        form.apply_result(Err("call 1 (getPoolaccRewardPerShare) failed".to_string()));
        assert_eq!(form.value(), Some("1500"));
        assert!(matches!(form.status(), PanelStatus::Error(_)));
    }

    #[test]
    fn test_no_double_submit_while_loading() {
        let ctx = Context::default();
        let mut form = rewards_form();
        // An empty address fails coercion; fill it first
        let mut editing_ctx = Context::default();
        form.activate(&ctx);
        for c in "0x0000000000000000000000000000000000000001".chars() {
            form.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE), &mut editing_ctx);
        }
        form.submit(&ctx);
        assert!(matches!(form.submit(&ctx), Action::Notify(_, NotifyLevel::Warn)));
    }
}
