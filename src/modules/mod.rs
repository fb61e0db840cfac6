//! Contract panels
//!
//! Every function a page shows becomes one panel, chosen from the shape of its
//! descriptor:
//! - display: zero-argument view/pure function, queried automatically
//! - form: any other function, called or sent on submit
//! - compound: several view calls combined by a transform

pub mod compound_form;
pub mod display_variable;
pub mod fields;
pub mod function_form;

use alloy_dyn_abi::DynSolValue;
use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

pub use compound_form::CompoundForm;
pub use display_variable::DisplayVariable;
pub use function_form::{FunctionForm, Intent};

use crate::config::Config;
use crate::core::{Action, Context, Module, Submission};
use crate::domain::abi::{displayed_functions, ContractDescriptor, FunctionDescriptor};
use crate::domain::compound::{CompoundRead, Transform};
use crate::domain::display::FormatHint;

/// Lifecycle of a panel request: idle → loading → displayed | error → idle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    Idle,
    Loading,
    Displayed,
    Error(String),
}

impl PanelStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelStatus::Loading)
    }
}

/// Progress of a transaction sent from a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxProgress {
    Submitted(String),
    Mined { success: bool, block: Option<u64> },
    Failed(String),
}

pub enum Panel {
    Display(DisplayVariable),
    Form(FunctionForm),
    Compound(CompoundForm),
}

impl Panel {
    pub fn from_function(function: &FunctionDescriptor, hint: FormatHint) -> Self {
        if function.is_queryable() {
            Panel::Display(DisplayVariable::new(function.clone(), hint))
        } else {
            Panel::Form(FunctionForm::new(function.clone(), hint))
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Panel::Display(panel) => panel.name(),
            Panel::Form(panel) => panel.name(),
            Panel::Compound(panel) => panel.name(),
        }
    }

    pub fn status(&self) -> &PanelStatus {
        match self {
            Panel::Display(panel) => panel.status(),
            Panel::Form(panel) => panel.status(),
            Panel::Compound(panel) => panel.status(),
        }
    }

    pub fn is_editing(&self) -> bool {
        match self {
            Panel::Display(_) => false,
            Panel::Form(panel) => panel.is_editing(),
            Panel::Compound(panel) => panel.is_editing(),
        }
    }

    /// Last shown value or result, if any
    pub fn output(&self) -> Option<&str> {
        match self {
            Panel::Display(panel) => panel.value(),
            Panel::Form(panel) => panel.result(),
            Panel::Compound(panel) => panel.value(),
        }
    }

    /// Enter in normal mode
    pub fn activate(&mut self, ctx: &Context) -> Action {
        match self {
            Panel::Display(panel) => panel
                .refresh()
                .map(Action::Submit)
                .unwrap_or(Action::None),
            Panel::Form(panel) => panel.activate(ctx),
            Panel::Compound(panel) => panel.activate(ctx),
        }
    }

    /// Re-query a display panel; other panels only run on submit
    pub fn refresh(&mut self) -> Option<Submission> {
        match self {
            Panel::Display(panel) => panel.refresh(),
            Panel::Form(_) | Panel::Compound(_) => None,
        }
    }

    pub fn apply_read(&mut self, outcome: Result<Vec<DynSolValue>, String>) {
        match self {
            Panel::Display(panel) => panel.apply_result(outcome),
            Panel::Form(panel) => panel.apply_result(outcome),
            Panel::Compound(panel) => {
                tracing::debug!(compound = %panel.name(), "ignoring plain read result");
            }
        }
    }

    pub fn apply_compound(&mut self, outcome: Result<DynSolValue, String>) {
        if let Panel::Compound(panel) = self {
            panel.apply_result(outcome);
        }
    }

    pub fn apply_tx(&mut self, progress: TxProgress) {
        if let Panel::Form(panel) = self {
            panel.apply_tx(progress);
        }
    }

    /// Give up on a request that never reached the worker
    pub fn abort(&mut self, message: String) {
        match self {
            Panel::Display(panel) => panel.apply_result(Err(message)),
            Panel::Form(panel) => panel.apply_result(Err(message)),
            Panel::Compound(panel) => panel.apply_result(Err(message)),
        }
    }

    /// Drop in-flight state whose answer will never be applied
    pub fn reset(&mut self) {
        match self {
            Panel::Display(panel) => panel.reset(),
            Panel::Form(panel) => panel.reset(),
            Panel::Compound(panel) => panel.reset(),
        }
    }

    /// Rows needed to draw the panel, borders included
    pub fn height(&self) -> u16 {
        match self {
            Panel::Display(_) => 3,
            Panel::Form(panel) => panel.height(),
            Panel::Compound(panel) => panel.height(),
        }
    }
}

impl Module for Panel {
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match self {
            Panel::Display(panel) => panel.handle_key(key, ctx),
            Panel::Form(panel) => panel.handle_key(key, ctx),
            Panel::Compound(panel) => panel.handle_key(key, ctx),
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context, focused: bool) {
        match self {
            Panel::Display(panel) => panel.render(frame, area, ctx, focused),
            Panel::Form(panel) => panel.render(frame, area, ctx, focused),
            Panel::Compound(panel) => panel.render(frame, area, ctx, focused),
        }
    }
}

/// Panels of one page: the allowed functions in ABI order, then the page's
/// compound reads
pub fn build_panels(contract: Option<&ContractDescriptor>, page: &str, config: &Config) -> Vec<Panel> {
    let Some(contract) = contract else {
        return Vec::new();
    };
    let show = config.page(page).map(|p| p.show.as_slice());

    let mut panels: Vec<Panel> = displayed_functions(Some(contract), show)
        .into_iter()
        .map(|function| Panel::from_function(function, config.format_for(&function.name)))
        .collect();

    for compound in config.compound_for(page) {
        let transform = match Transform::by_name(&compound.transform) {
            Ok(transform) => transform,
            Err(err) => {
                tracing::warn!(compound = %compound.name, "skipping compound read: {err}");
                continue;
            }
        };
        if let Some(missing) = compound.calls.iter().find(|name| contract.function(name).is_none()) {
            tracing::warn!(compound = %compound.name, "{} has no function {missing}", contract.name);
        }
        let read = CompoundRead {
            name: compound.name.clone(),
            inputs: compound.inputs.clone(),
            calls: compound.calls.clone(),
            transform,
        };
        panels.push(Panel::Compound(CompoundForm::new(
            read,
            config.format_for(&compound.name),
        )));
    }

    panels
}

/// Bordered block of a panel, highlighted when focused
pub(crate) fn panel_block<'a>(title: &'a str, tag: &'a str, focused: bool) -> Block<'a> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::from(vec![
            Span::raw(format!(" {title} ")),
            Span::styled(format!("[{tag}] "), Style::default().fg(Color::DarkGray)),
        ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{DescriptorSource, ItemKind, ParamSpec, StateMutability};
    use std::path::PathBuf;

    fn validators() -> ContractDescriptor {
        let val = ParamSpec::new("_val", "address");
        let uint = ParamSpec::new("", "uint256");
        ContractDescriptor {
            name: "Validators".to_string(),
            address: "0x000000000000000000000000000000000000f333".to_string(),
            chain_id: 321,
            functions: vec![
                FunctionDescriptor::function(
                    "getPoolSelfBallots",
                    vec![val.clone()],
                    vec![uint.clone()],
                    StateMutability::View,
                ),
                FunctionDescriptor::function("depositMargin", vec![val.clone()], vec![], StateMutability::Payable),
                FunctionDescriptor::function("redeemMargin", vec![val.clone(), uint.clone()], vec![], StateMutability::NonPayable),
                FunctionDescriptor {
                    kind: ItemKind::Event,
                    name: "withdrawMargin".to_string(),
                    inputs: vec![],
                    outputs: vec![],
                    state_mutability: StateMutability::NonPayable,
                },
                FunctionDescriptor::function("getPoolpendingFee", vec![], vec![uint.clone()], StateMutability::View),
                FunctionDescriptor::function(
                    "getPoolaccRewardPerShare",
                    vec![val.clone()],
                    vec![uint.clone()],
                    StateMutability::View,
                ),
                FunctionDescriptor::function(
                    "getPoolSelfBallotsRewardsDebt",
                    vec![val],
                    vec![uint],
                    StateMutability::View,
                ),
            ],
            source: DescriptorSource::External(PathBuf::from("Validators.json")),
        }
    }

    #[test]
    fn test_margin_page_panels() {
        let contract = validators();
        let panels = build_panels(Some(&contract), "margin", &Config::default());
        let titles: Vec<&str> = panels.iter().map(Panel::title).collect();
        // The event named like an allowed function is not a panel
        assert_eq!(titles, vec!["getPoolSelfBallots", "depositMargin", "redeemMargin"]);
        assert!(panels.iter().all(|p| matches!(p, Panel::Form(_))));
    }

    #[test]
    fn test_zero_arg_view_becomes_display() {
        let contract = validators();
        let panels = build_panels(Some(&contract), "fee", &Config::default());
        assert_eq!(panels.len(), 1);
        assert!(matches!(panels[0], Panel::Display(_)));
        assert_eq!(panels[0].height(), 3);
    }

    #[test]
    fn test_rewards_page_has_compound() {
        let contract = validators();
        let panels = build_panels(Some(&contract), "rewards", &Config::default());
        assert!(matches!(panels.last(), Some(Panel::Compound(_))));
        assert_eq!(panels.last().map(Panel::title), Some("Rewards Amount"));
    }

    #[test]
    fn test_no_contract_no_panels() {
        assert!(build_panels(None, "margin", &Config::default()).is_empty());
        let contract = validators();
        assert!(build_panels(Some(&contract), "unknown", &Config::default()).is_empty());
    }

    #[test]
    fn test_reset_clears_loading() {
        let contract = validators();
        let mut panels = build_panels(Some(&contract), "fee", &Config::default());
        assert!(panels[0].refresh().is_some());
        assert!(panels[0].status().is_loading());
        panels[0].reset();
        assert_eq!(panels[0].status(), &PanelStatus::Idle);
    }
}
