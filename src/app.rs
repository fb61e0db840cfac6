//! Application state of the dashboard
//!
//! The app never talks to the network. Everything that needs the node is
//! queued as a [`RuntimeCommand`] in the outbox and drained by the main loop;
//! answers come back through [`App::apply_event`].

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use alloy_primitives::U256;
use chrono::{DateTime, Local};

use crate::config::{self, Config, NetworkConfig};
use crate::core::{Action, Command, Context, Module, NotifyLevel, Submission};
use crate::domain::abi::ContractDescriptor;
use crate::domain::form::format_ether;
use crate::domain::BlockTag;
use crate::infrastructure::abi::{ExternalContract, ScanRequest};
use crate::infrastructure::ethereum::{ProviderConfig, Session, SignerConfig};
use crate::infrastructure::runtime::{Epoch, PanelId, RuntimeCommand, RuntimeEvent};
use crate::modules::{build_panels, Panel, TxProgress};

const ACTIVITY_LIMIT: usize = 100;
const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

/// One line of the activity log
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub text: String,
    pub level: StatusLevel,
}

/// A panel of the current page with the id its requests are tagged with
pub struct PanelSlot {
    pub id: PanelId,
    pub panel: Panel,
}

/// Where the contract lookup stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractState {
    /// Not connected, or the lookup has not answered yet
    Pending,
    /// Found and code present at its address
    Deployed,
    /// No deployment for the chain, or no code at the address
    NotDeployed,
}

/// Startup choices from the command line
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub network: Option<String>,
    pub endpoint: Option<ProviderConfig>,
    pub signer: Option<SignerConfig>,
    pub block: Option<BlockTag>,
    pub deployments: Vec<PathBuf>,
}

pub struct App {
    /// Shared context for modules
    pub ctx: Context,
    pub config: Config,
    pub network_index: usize,
    pub endpoint_override: Option<ProviderConfig>,
    pub signer: SignerConfig,
    pub extra_roots: Vec<PathBuf>,
    pub epoch: Epoch,
    pub endpoint: Option<String>,
    pub session: Option<Session>,
    pub contract: Option<ContractDescriptor>,
    pub contract_state: ContractState,
    pub page_index: usize,
    pub panels: Vec<PanelSlot>,
    pub selected: usize,
    pub gas_price: Option<u128>,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub activity: VecDeque<ActivityEntry>,
    pub settings_open: bool,
    pub help_open: bool,
    pub should_quit: bool,
    next_panel_id: PanelId,
    outbox: Vec<RuntimeCommand>,
}

impl App {
    pub fn new(config: Config, options: AppOptions) -> Self {
        let network_name = options.network.unwrap_or_else(|| config.network.clone());
        let network_index = match config.network_index(&network_name) {
            Some(index) => index,
            None => {
                tracing::warn!("unknown network '{network_name}', using the first configured");
                0
            }
        };
        let block = options.block.unwrap_or(config.block);
        let gas_price = config.gas_price_wei();

        let mut app = Self {
            ctx: Context {
                block,
                ..Context::new()
            },
            config,
            network_index,
            endpoint_override: options.endpoint,
            signer: options.signer.unwrap_or(SignerConfig::ReadOnly),
            extra_roots: options.deployments,
            epoch: 0,
            endpoint: None,
            session: None,
            contract: None,
            contract_state: ContractState::Pending,
            page_index: 0,
            panels: Vec::new(),
            selected: 0,
            gas_price,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            activity: VecDeque::new(),
            settings_open: false,
            help_open: false,
            should_quit: false,
            next_panel_id: 0,
            outbox: Vec::new(),
        };
        app.connect();
        app
    }

    pub fn network(&self) -> Option<&NetworkConfig> {
        self.config.networks.get(self.network_index)
    }

    pub fn page_name(&self) -> Option<&str> {
        self.config.pages.get(self.page_index).map(|page| page.name.as_str())
    }

    pub fn block(&self) -> BlockTag {
        self.ctx.block
    }

    /// Drain the commands queued for the worker
    pub fn take_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn log_activity(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.activity.push_front(ActivityEntry {
            at: Local::now(),
            text: text.into(),
            level,
        });
        self.activity.truncate(ACTIVITY_LIMIT);
    }

    pub fn on_tick(&mut self) {
        self.ctx.tick = self.ctx.tick.wrapping_add(1);
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// Keep the module context in step with the session
    pub fn sync_context(&mut self) {
        self.ctx.account = self
            .session
            .as_ref()
            .and_then(|session| session.address)
            .map(|address| address.to_checksum(None));
        self.ctx.can_sign = self.session.as_ref().is_some_and(Session::can_sign);
    }

    /// Whether the selected panel captures keys
    pub fn is_editing(&self) -> bool {
        self.panels
            .get(self.selected)
            .is_some_and(|slot| slot.panel.is_editing())
    }

    // Session

    /// Endpoint of the selected network: the override, else ws, rpc, ipc
    pub fn endpoint_config(&self) -> Option<ProviderConfig> {
        if let Some(endpoint) = &self.endpoint_override {
            return Some(endpoint.clone());
        }
        let network = self.network()?;
        [&network.ws, &network.rpc, &network.ipc]
            .into_iter()
            .flatten()
            .map(|endpoint| endpoint.trim())
            .find(|endpoint| !endpoint.is_empty())
            .map(ProviderConfig::parse)
    }

    pub fn scan_request(&self) -> ScanRequest {
        let mut roots = self.extra_roots.clone();
        roots.extend(
            self.config
                .deployments
                .iter()
                .filter_map(|root| config::expand_path(root)),
        );
        let external = self
            .config
            .contracts
            .iter()
            .filter_map(|entry| {
                Some(ExternalContract {
                    chain_id: entry.chain_id,
                    name: entry.name.clone(),
                    address: entry.address.clone(),
                    abi: config::expand_path(&entry.abi)?,
                })
            })
            .collect();
        let (network, chain_id) = self
            .network()
            .map(|network| (network.name.clone(), network.chain_id))
            .unwrap_or_default();
        ScanRequest {
            roots,
            chain_id,
            network,
            contract: self.config.contract.clone(),
            external,
        }
    }

    /// Start a new session on the selected network
    pub fn connect(&mut self) {
        let Some(endpoint) = self.endpoint_config() else {
            // The previous chain's session must not outlive the switch
            self.disconnect();
            self.set_status("Network has no endpoint configured", StatusLevel::Error);
            return;
        };
        self.begin_epoch();
        self.session = None;
        self.endpoint = Some(endpoint.display());
        self.set_contract(None, ContractState::Pending);
        tracing::info!(endpoint = %endpoint.display(), epoch = self.epoch, "connecting");
        self.set_status(format!("Connecting to {}…", endpoint.display()), StatusLevel::Info);
        self.outbox.push(RuntimeCommand::Connect {
            epoch: self.epoch,
            endpoint,
            signer: self.signer.clone(),
            scan: self.scan_request(),
            block: self.ctx.block,
        });
    }

    pub fn disconnect(&mut self) {
        self.begin_epoch();
        self.session = None;
        self.endpoint = None;
        self.set_contract(None, ContractState::Pending);
        self.outbox.push(RuntimeCommand::Disconnect { epoch: self.epoch });
        self.set_status("Disconnected", StatusLevel::Info);
    }

    pub fn switch_network(&mut self, index: usize) {
        if index >= self.config.networks.len() {
            return;
        }
        self.network_index = index;
        self.endpoint_override = None;
        self.connect();
    }

    pub fn cycle_network(&mut self, forward: bool) {
        let len = self.config.networks.len();
        if len == 0 {
            self.set_status("No networks configured", StatusLevel::Warn);
            return;
        }
        let next = if forward {
            (self.network_index + 1) % len
        } else {
            (self.network_index + len - 1) % len
        };
        self.switch_network(next);
    }

    /// Reads observe `block` from now on; writes are unaffected
    pub fn set_block(&mut self, block: BlockTag) {
        self.ctx.block = block;
        if self.session.is_some() {
            self.begin_epoch();
            for slot in &mut self.panels {
                slot.panel.reset();
            }
            self.outbox.push(RuntimeCommand::SetBlock {
                epoch: self.epoch,
                block,
            });
            self.refresh_displays();
        } else if self.endpoint.is_some() {
            // A connect is in flight with the old tag; restart it with the new one
            self.connect();
        }
        self.set_status(format!("Reading at block {block}"), StatusLevel::Info);
    }

    pub fn reload_config(&mut self) {
        let config = config::load();
        self.network_index = config
            .networks
            .get(self.network_index)
            .and_then(|current| config.network_index(&current.name))
            .or_else(|| config.network_index(&config.network))
            .unwrap_or(0);
        self.gas_price = config.gas_price_wei();
        self.config = config;
        self.page_index = self.page_index.min(self.config.pages.len().saturating_sub(1));
        self.connect();
        self.set_status("Reloaded config", StatusLevel::Info);
    }

    fn begin_epoch(&mut self) {
        self.epoch += 1;
    }

    // Pages and panels

    fn set_contract(&mut self, contract: Option<ContractDescriptor>, state: ContractState) {
        self.contract = contract;
        self.contract_state = state;
        self.rebuild_panels();
    }

    fn rebuild_panels(&mut self) {
        self.panels.clear();
        self.selected = 0;
        if self.contract_state != ContractState::Deployed {
            return;
        }
        let Some(page) = self.page_name().map(str::to_string) else {
            return;
        };
        let panels = build_panels(self.contract.as_ref(), &page, &self.config);
        for panel in panels {
            let id = self.next_panel_id;
            self.next_panel_id += 1;
            self.panels.push(PanelSlot { id, panel });
        }
        self.refresh_displays();
    }

    pub fn select_page(&mut self, index: usize) {
        if index >= self.config.pages.len() || index == self.page_index {
            return;
        }
        self.page_index = index;
        self.rebuild_panels();
    }

    pub fn cycle_page(&mut self, forward: bool) {
        let len = self.config.pages.len();
        if len == 0 {
            return;
        }
        let next = if forward {
            (self.page_index + 1) % len
        } else {
            (self.page_index + len - 1) % len
        };
        self.select_page(next);
    }

    pub fn move_selection(&mut self, down: bool) {
        if self.panels.is_empty() {
            return;
        }
        let len = self.panels.len();
        self.selected = if down {
            (self.selected + 1).min(len - 1)
        } else {
            self.selected.saturating_sub(1)
        };
    }

    /// Query every display panel that is not already waiting
    pub fn refresh_displays(&mut self) {
        let epoch = self.epoch;
        for slot in &mut self.panels {
            if let Some(Submission::Read { function, args }) = slot.panel.refresh() {
                self.outbox.push(RuntimeCommand::Read {
                    epoch,
                    panel: slot.id,
                    function,
                    args,
                });
            }
        }
    }

    /// Enter on the selected panel
    pub fn activate_selected(&mut self) {
        let Some(slot) = self.panels.get_mut(self.selected) else {
            return;
        };
        let action = slot.panel.activate(&self.ctx);
        self.apply_action(action);
    }

    /// Keys while the selected panel is editing
    pub fn handle_panel_key(&mut self, key: crossterm::event::KeyEvent) {
        let Some(slot) = self.panels.get_mut(self.selected) else {
            return;
        };
        let action = slot.panel.handle_key(key, &mut self.ctx);
        self.apply_action(action);
    }

    /// Text `y` copies: the selected panel's output, else the contract address
    pub fn copy_target(&self) -> Option<String> {
        self.panels
            .get(self.selected)
            .and_then(|slot| slot.panel.output())
            .map(str::to_string)
            .or_else(|| self.contract.as_ref().map(|contract| contract.address.clone()))
    }

    /// Turn a panel submission into a worker command
    fn submit(&mut self, submission: Submission) {
        let Some(slot) = self.panels.get_mut(self.selected) else {
            return;
        };
        let (epoch, panel) = (self.epoch, slot.id);
        if self.session.is_none() {
            slot.panel.abort("not connected".to_string());
            self.set_status("Not connected", StatusLevel::Error);
            return;
        }
        let command = match submission {
            Submission::Read { function, args } => {
                tracing::debug!(%function, "read submitted");
                RuntimeCommand::Read {
                    epoch,
                    panel,
                    function,
                    args,
                }
            }
            Submission::Write {
                function,
                args,
                value,
            } => {
                tracing::info!(%function, "transaction requested");
                self.log_activity(format!("{function}: sending"), StatusLevel::Info);
                RuntimeCommand::Write {
                    epoch,
                    panel,
                    function,
                    args,
                    value,
                    gas_price: self.gas_price,
                }
            }
            Submission::Compound { args } => {
                let Panel::Compound(form) = &slot.panel else {
                    return;
                };
                RuntimeCommand::Compound {
                    epoch,
                    panel,
                    read: form.read().clone(),
                    args,
                }
            }
        };
        self.outbox.push(command);
    }

    fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels
            .iter_mut()
            .find(|slot| slot.id == id)
            .map(|slot| &mut slot.panel)
    }

    // Worker events

    pub fn apply_event(&mut self, event: RuntimeEvent) {
        let epoch = event.epoch();
        let current = epoch.map_or(true, |epoch| epoch == self.epoch);
        match event {
            // Transactions went out regardless of what changed since; their
            // outcome is always logged and reaches the form if it still exists
            RuntimeEvent::TxSubmitted {
                panel,
                function,
                hash,
                ..
            } => {
                self.log_activity(format!("{function}: submitted {hash}"), StatusLevel::Info);
                if let Some(panel) = self.panel_mut(panel) {
                    panel.apply_tx(TxProgress::Submitted(hash));
                }
            }
            RuntimeEvent::TxMined {
                panel,
                function,
                hash,
                outcome,
                ..
            } => {
                let block = outcome
                    .block_number
                    .map(|n| format!(" in block {n}"))
                    .unwrap_or_default();
                if outcome.success {
                    self.log_activity(format!("{function}: confirmed{block} ({hash})"), StatusLevel::Info);
                    self.set_status(format!("{function} confirmed"), StatusLevel::Info);
                } else {
                    self.log_activity(format!("{function}: reverted{block} ({hash})"), StatusLevel::Error);
                    self.set_status(format!("{function} reverted"), StatusLevel::Error);
                }
                if let Some(panel) = self.panel_mut(panel) {
                    panel.apply_tx(TxProgress::Mined {
                        success: outcome.success,
                        block: outcome.block_number,
                    });
                }
                if outcome.success && current {
                    self.refresh_displays();
                }
            }
            RuntimeEvent::TxFailed {
                panel,
                function,
                message,
                ..
            } => {
                self.log_activity(format!("{function}: {message}"), StatusLevel::Error);
                self.set_status(format!("{function} failed"), StatusLevel::Error);
                if let Some(panel) = self.panel_mut(panel) {
                    panel.apply_tx(TxProgress::Failed(message));
                }
            }

            RuntimeEvent::Error { message } => {
                self.log_activity(message.clone(), StatusLevel::Error);
                self.set_status(message, StatusLevel::Error);
            }

            _ if !current => {
                tracing::debug!(?epoch, current = self.epoch, "dropping stale event");
            }

            RuntimeEvent::SessionChanged {
                endpoint, session, ..
            } => {
                let expected = self.network().map(|network| network.chain_id);
                if expected.is_some_and(|chain_id| chain_id != session.chain_id) {
                    self.set_status(
                        format!("Node reports chain {}", session.chain_id),
                        StatusLevel::Warn,
                    );
                } else {
                    self.set_status(format!("Connected to {endpoint}"), StatusLevel::Info);
                }
                self.log_activity(
                    format!("connected to {endpoint} (chain {}, {})", session.chain_id, session.signer),
                    StatusLevel::Info,
                );
                self.endpoint = Some(endpoint);
                self.session = Some(session);
                self.sync_context();
            }
            RuntimeEvent::ContractLoaded {
                contract,
                deployed,
                errors,
                ..
            } => {
                for error in errors {
                    self.log_activity(error, StatusLevel::Warn);
                }
                let state = if contract.is_some() && deployed {
                    ContractState::Deployed
                } else {
                    ContractState::NotDeployed
                };
                if let Some(contract) = &contract {
                    self.log_activity(
                        format!("{} at {} ({} functions)", contract.name, contract.address, contract.len()),
                        StatusLevel::Info,
                    );
                }
                self.set_contract(contract, state);
            }
            RuntimeEvent::Disconnected { .. } => {
                self.session = None;
                self.sync_context();
            }
            RuntimeEvent::NewBlock { number, .. } => {
                self.ctx.head = Some(number);
                if self.config.refresh_on_block {
                    self.refresh_displays();
                }
            }
            RuntimeEvent::BalanceReady { balance, .. } => {
                if let Some(session) = self.session.as_mut() {
                    session.balance = Some(balance);
                }
            }
            RuntimeEvent::ReadDone {
                panel,
                function,
                outcome,
                ..
            } => {
                if let Err(message) = &outcome {
                    self.set_status(format!("{function}: {message}"), StatusLevel::Error);
                }
                if let Some(panel) = self.panel_mut(panel) {
                    panel.apply_read(outcome);
                }
            }
            RuntimeEvent::CompoundDone {
                panel, name, outcome, ..
            } => {
                if let Err(message) = &outcome {
                    self.set_status(format!("{name}: {message}"), StatusLevel::Error);
                }
                if let Some(panel) = self.panel_mut(panel) {
                    panel.apply_compound(outcome);
                }
            }
        }
    }

    // Command line

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }
        let cmd = crate::core::parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
        self.command.last = Some(input);
        self.exit_command();
    }

    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Network(name) => match self.config.network_index(name) {
                Some(index) => {
                    self.switch_network(index);
                    Action::None
                }
                None => Action::Notify(format!("Unknown network: {name}"), NotifyLevel::Warn),
            },
            Command::Block(tag) => match tag.parse::<BlockTag>() {
                Ok(block) => {
                    self.set_block(block);
                    Action::None
                }
                Err(err) => Action::Notify(err, NotifyLevel::Error),
            },
            Command::Gas(None) => Action::Notify(
                match self.gas_price {
                    Some(wei) => format!("Gas price: {} gwei", format_gwei(wei)),
                    None => "Gas price: node".to_string(),
                },
                NotifyLevel::Info,
            ),
            Command::Gas(Some(arg)) if arg.eq_ignore_ascii_case("auto") => {
                self.gas_price = None;
                Action::Notify("Gas price: node".to_string(), NotifyLevel::Info)
            }
            Command::Gas(Some(arg)) => match arg.parse::<f64>() {
                Ok(gwei) if gwei.is_finite() && gwei >= 0.0 => {
                    self.gas_price = Some((gwei * 1e9).round() as u128);
                    Action::Notify(format!("Gas price: {gwei} gwei"), NotifyLevel::Info)
                }
                _ => Action::Notify(format!("Invalid gas price: {arg}"), NotifyLevel::Error),
            },
            Command::Account(index) => {
                self.signer = SignerConfig::NodeAccount(*index);
                self.connect();
                Action::None
            }
            Command::Connect(endpoint) => {
                if let Some(endpoint) = endpoint {
                    self.endpoint_override = Some(ProviderConfig::parse(endpoint));
                }
                self.connect();
                Action::None
            }
            Command::Disconnect => {
                self.disconnect();
                Action::None
            }
            Command::Reload => {
                self.reload_config();
                Action::None
            }
            Command::Help => {
                self.help_open = true;
                Action::None
            }
            Command::Quit => Action::Quit,
            Command::Unknown(s) => Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn),
        }
    }

    /// Apply an action returned by a command or module
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None | Action::CloseOverlay => {}
            Action::Submit(submission) => self.submit(submission),
            Action::Copy(text) => self.copy_to_clipboard(text),
            Action::Notify(msg, level) => {
                if level == NotifyLevel::Error {
                    self.log_activity(msg.clone(), StatusLevel::Error);
                }
                self.set_status(msg, level.into());
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn copy_to_clipboard(&mut self, text: String) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                if clipboard.set_text(&text).is_ok() {
                    let shown = if text.chars().count() > 20 {
                        format!("{}...", text.chars().take(20).collect::<String>())
                    } else {
                        text
                    };
                    self.set_status(format!("Copied: {shown}"), StatusLevel::Info);
                } else {
                    self.set_status("Failed to copy to clipboard", StatusLevel::Error);
                }
            }
            Err(_) => self.set_status("Clipboard not available", StatusLevel::Error),
        }
    }

    /// Header text of the signer balance
    pub fn balance_label(&self) -> Option<String> {
        let balance = self.session.as_ref()?.balance?;
        Some(format!("Ξ{}", format_ether(balance)))
    }
}

fn format_gwei(wei: u128) -> String {
    // Nine more decimals turn the ether formatter into a gwei formatter
    format_ether(U256::from(wei) * U256::from(1_000_000_000u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{DescriptorSource, ParamSpec, StateMutability, FunctionDescriptor};
    use crate::infrastructure::ethereum::{ReceiptOutcome, SignerKind};
    use alloy_dyn_abi::DynSolValue;

    fn make_app() -> App {
        App::new(Config::default(), AppOptions::default())
    }

    fn validators() -> ContractDescriptor {
        let uint = ParamSpec::new("", "uint256");
        ContractDescriptor {
            name: "Validators".to_string(),
            address: "0x000000000000000000000000000000000000f333".to_string(),
            chain_id: 321,
            functions: vec![
                FunctionDescriptor::function("getPoolpendingFee", vec![], vec![uint.clone()], StateMutability::View),
                FunctionDescriptor::function(
                    "claimFeeReward",
                    vec![ParamSpec::new("_val", "address")],
                    vec![],
                    StateMutability::NonPayable,
                ),
            ],
            source: DescriptorSource::External(PathBuf::from("Validators.json")),
        }
    }

    fn session() -> Session {
        Session {
            address: None,
            chain_id: 321,
            balance: None,
            signer: SignerKind::ReadOnly,
        }
    }

    /// Connected app on the `fee` page with the contract bound
    fn connected_app() -> App {
        let mut app = make_app();
        app.take_commands();
        app.select_page(2);
        let epoch = app.epoch;
        app.apply_event(RuntimeEvent::SessionChanged {
            epoch,
            endpoint: "https://rpc-mainnet.kcc.network".to_string(),
            session: session(),
        });
        app.apply_event(RuntimeEvent::ContractLoaded {
            epoch,
            contract: Some(validators()),
            deployed: true,
            errors: vec![],
        });
        app
    }

    #[test]
    fn test_new_app_queues_connect() {
        let mut app = make_app();
        let commands = app.take_commands();
        assert_eq!(commands.len(), 1);
        match &commands[0] {
            RuntimeCommand::Connect {
                epoch,
                endpoint,
                scan,
                block,
                ..
            } => {
                assert_eq!(*epoch, 1);
                assert_eq!(
                    *endpoint,
                    ProviderConfig::Http("https://rpc-mainnet.kcc.network".to_string())
                );
                assert_eq!(scan.chain_id, 321);
                assert_eq!(scan.contract, "Validators");
                assert_eq!(*block, BlockTag::Latest);
            }
            other => panic!("expected connect, got {other:?}"),
        }
    }

    #[test]
    fn test_contract_loaded_builds_panels_and_queries_displays() {
        let mut app = connected_app();
        assert_eq!(app.contract_state, ContractState::Deployed);
        let titles: Vec<&str> = app.panels.iter().map(|slot| slot.panel.title()).collect();
        assert_eq!(titles, vec!["getPoolpendingFee", "claimFeeReward"]);

        let commands = app.take_commands();
        assert!(matches!(
            commands.as_slice(),
            [RuntimeCommand::Read { function, .. }] if function == "getPoolpendingFee"
        ));
    }

    #[test]
    fn test_not_deployed_has_no_panels() {
        let mut app = make_app();
        let epoch = app.epoch;
        app.apply_event(RuntimeEvent::ContractLoaded {
            epoch,
            contract: Some(validators()),
            deployed: false,
            errors: vec![],
        });
        assert_eq!(app.contract_state, ContractState::NotDeployed);
        assert!(app.panels.is_empty());
    }

    #[test]
    fn test_stale_read_is_dropped() {
        let mut app = connected_app();
        let id = app.panels[0].id;
        let stale = app.epoch;
        app.set_block(BlockTag::Number(1200));
        app.apply_event(RuntimeEvent::ReadDone {
            epoch: stale,
            panel: id,
            function: "getPoolpendingFee".to_string(),
            outcome: Ok(vec![DynSolValue::Uint(U256::from(1u64), 256)]),
        });
        assert_eq!(app.panels[0].panel.output(), None);

        app.apply_event(RuntimeEvent::ReadDone {
            epoch: app.epoch,
            panel: id,
            function: "getPoolpendingFee".to_string(),
            outcome: Ok(vec![DynSolValue::Uint(U256::from(2u64), 256)]),
        });
        assert_eq!(app.panels[0].panel.output(), Some("2"));
    }

    #[test]
    fn test_set_block_requeries_displays() {
        let mut app = connected_app();
        let id = app.panels[0].id;
        app.apply_event(RuntimeEvent::ReadDone {
            epoch: app.epoch,
            panel: id,
            function: "getPoolpendingFee".to_string(),
            outcome: Ok(vec![DynSolValue::Uint(U256::from(2u64), 256)]),
        });
        app.take_commands();

        app.set_block(BlockTag::Number(1200));
        let commands = app.take_commands();
        assert!(matches!(
            commands[0],
            RuntimeCommand::SetBlock {
                block: BlockTag::Number(1200),
                ..
            }
        ));
        assert!(matches!(commands[1], RuntimeCommand::Read { .. }));
        assert_eq!(app.block(), BlockTag::Number(1200));
    }

    #[test]
    fn test_set_block_while_connecting_restarts_connect() {
        let mut app = make_app();
        app.take_commands();
        let first = app.epoch;

        app.set_block(BlockTag::Number(1200));
        let commands = app.take_commands();
        let epoch = match commands.as_slice() {
            [RuntimeCommand::Connect { epoch, block, .. }] => {
                assert_eq!(*block, BlockTag::Number(1200));
                *epoch
            }
            other => panic!("expected a fresh connect, got {other:?}"),
        };
        assert!(epoch > first);

        // The answer to the abandoned connect is stale, the new one lands
        app.apply_event(RuntimeEvent::SessionChanged {
            epoch: first,
            endpoint: "https://rpc-mainnet.kcc.network".to_string(),
            session: session(),
        });
        assert!(app.session.is_none());
        app.apply_event(RuntimeEvent::SessionChanged {
            epoch,
            endpoint: "https://rpc-mainnet.kcc.network".to_string(),
            session: session(),
        });
        app.apply_event(RuntimeEvent::ContractLoaded {
            epoch,
            contract: Some(validators()),
            deployed: true,
            errors: vec![],
        });
        assert!(app.session.is_some());
        assert_eq!(app.contract_state, ContractState::Deployed);
    }

    #[test]
    fn test_set_block_while_disconnected_only_records_tag() {
        let mut app = make_app();
        app.disconnect();
        app.take_commands();
        let epoch = app.epoch;

        app.set_block(BlockTag::Number(5));
        assert!(app.take_commands().is_empty());
        assert_eq!(app.epoch, epoch);
        assert_eq!(app.block(), BlockTag::Number(5));
    }

    #[test]
    fn test_switch_to_network_without_endpoint_drops_session() {
        let mut app = connected_app();
        app.config.networks.push(NetworkConfig {
            name: "offline".to_string(),
            rpc: None,
            ws: None,
            ipc: None,
            chain_id: 9,
            explorer: None,
        });
        app.take_commands();
        let before = app.epoch;

        let index = app.config.network_index("offline").unwrap();
        app.switch_network(index);

        assert!(app.epoch > before);
        assert!(app.session.is_none());
        assert!(app.contract.is_none());
        assert!(app.panels.is_empty());
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Disconnect { .. }]
        ));
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));
    }

    #[test]
    fn test_tx_outcome_logged_even_when_stale() {
        let mut app = connected_app();
        let stale = app.epoch;
        app.disconnect();
        app.apply_event(RuntimeEvent::TxMined {
            epoch: stale,
            panel: 999,
            function: "claimFeeReward".to_string(),
            hash: "0xabc".to_string(),
            outcome: ReceiptOutcome {
                success: true,
                block_number: Some(9),
                gas_used: 21_000,
            },
        });
        assert!(app.activity[0].text.contains("claimFeeReward: confirmed in block 9"));
    }

    #[test]
    fn test_write_without_signer_is_refused() {
        let mut app = connected_app();
        app.take_commands();
        app.selected = 1;
        app.activate_selected();
        // The form has one field, so Enter starts editing
        assert!(app.is_editing());
        for c in "0x000000000000000000000000000000000000f333".chars() {
            app.handle_panel_key(crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Char(c),
                crossterm::event::KeyModifiers::NONE,
            ));
        }
        app.handle_panel_key(crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Enter,
            crossterm::event::KeyModifiers::NONE,
        ));
        assert!(app.take_commands().is_empty());
        assert_eq!(app.status_text().map(|(_, level)| level), Some(StatusLevel::Error));
    }

    #[test]
    fn test_commands() {
        let mut app = make_app();
        app.take_commands();

        let action = app_command(&mut app, "gas 2");
        app.apply_action(action);
        assert_eq!(app.gas_price, Some(2_000_000_000));
        let action = app_command(&mut app, "gas auto");
        app.apply_action(action);
        assert_eq!(app.gas_price, None);

        let action = app_command(&mut app, "network kcc-test");
        app.apply_action(action);
        assert_eq!(app.network().map(|n| n.chain_id), Some(322));
        assert!(matches!(
            app.take_commands().as_slice(),
            [RuntimeCommand::Connect { .. }]
        ));

        let action = app_command(&mut app, "block soon");
        app.apply_action(action);
        assert_eq!(app.block(), BlockTag::Latest);

        let action = app_command(&mut app, "quit");
        app.apply_action(action);
        assert!(app.should_quit);
    }

    fn app_command(app: &mut App, input: &str) -> Action {
        app.execute_command(&crate::core::parse_command(input))
    }

    #[test]
    fn test_format_gwei() {
        assert_eq!(format_gwei(1_500_000_000), "1.5");
    }
}
