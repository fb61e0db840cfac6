//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI (ratatui) thread never awaits. It sends `RuntimeCommand`s to a
//! worker thread that owns a Tokio runtime, and polls `RuntimeEvent`s back.
//! Every command carries the session epoch it was issued in; events echo it so
//! the app can drop answers that belong to a session that no longer exists.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use alloy::primitives::U256;
use alloy_dyn_abi::DynSolValue;
use tokio::runtime::Runtime;

use crate::domain::abi::ContractDescriptor;
use crate::domain::compound::CompoundRead;
use crate::domain::BlockTag;
use crate::infrastructure::abi::ScanRequest;
use crate::infrastructure::ethereum::{ProviderConfig, ReceiptOutcome, Session, SignerConfig};
use crate::infrastructure::runtime::worker::run_async_worker;

/// Session generation counter
pub type Epoch = u64;

/// Identifier of a dashboard panel, never reused while the app runs
pub type PanelId = usize;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Connect (or reconnect) and bind the contract
    Connect {
        epoch: Epoch,
        endpoint: ProviderConfig,
        signer: SignerConfig,
        scan: ScanRequest,
        block: BlockTag,
    },
    /// Drop the provider and the bound contract
    Disconnect { epoch: Epoch },
    /// Change the block tag of subsequent reads
    SetBlock { epoch: Epoch, block: BlockTag },
    /// Read-only call
    Read {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        args: Vec<DynSolValue>,
    },
    /// Transaction
    Write {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        args: Vec<DynSolValue>,
        value: Option<U256>,
        gas_price: Option<u128>,
    },
    /// Sequential reads combined by a transform
    Compound {
        epoch: Epoch,
        panel: PanelId,
        read: CompoundRead,
        args: Vec<DynSolValue>,
    },
    /// Re-fetch the signer balance
    RefreshBalance { epoch: Epoch },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Provider connected and signer resolved
    SessionChanged {
        epoch: Epoch,
        endpoint: String,
        session: Session,
    },
    /// Contract lookup finished
    ContractLoaded {
        epoch: Epoch,
        contract: Option<ContractDescriptor>,
        deployed: bool,
        errors: Vec<String>,
    },
    /// Provider dropped
    Disconnected { epoch: Epoch },
    /// New chain head
    NewBlock { epoch: Epoch, number: u64 },
    /// Signer balance ready
    BalanceReady { epoch: Epoch, balance: U256 },
    /// Read-only call finished
    ReadDone {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        outcome: Result<Vec<DynSolValue>, String>,
    },
    /// Compound read finished
    CompoundDone {
        epoch: Epoch,
        panel: PanelId,
        name: String,
        outcome: Result<DynSolValue, String>,
    },
    /// Transaction accepted by the node
    TxSubmitted {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        hash: String,
    },
    /// Transaction mined (successfully or reverted)
    TxMined {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        hash: String,
        outcome: ReceiptOutcome,
    },
    /// Transaction could not be sent or its receipt never arrived
    TxFailed {
        epoch: Epoch,
        panel: PanelId,
        function: String,
        message: String,
    },
    /// Error occurred
    Error { message: String },
}

impl RuntimeEvent {
    /// Epoch the event belongs to, `None` for epoch-less errors
    pub fn epoch(&self) -> Option<Epoch> {
        match self {
            RuntimeEvent::SessionChanged { epoch, .. }
            | RuntimeEvent::ContractLoaded { epoch, .. }
            | RuntimeEvent::Disconnected { epoch }
            | RuntimeEvent::NewBlock { epoch, .. }
            | RuntimeEvent::BalanceReady { epoch, .. }
            | RuntimeEvent::ReadDone { epoch, .. }
            | RuntimeEvent::CompoundDone { epoch, .. }
            | RuntimeEvent::TxSubmitted { epoch, .. }
            | RuntimeEvent::TxMined { epoch, .. }
            | RuntimeEvent::TxFailed { epoch, .. } => Some(*epoch),
            RuntimeEvent::Error { .. } => None,
        }
    }
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Spawn the worker thread with its own Tokio runtime
    pub fn new() -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new()?;
        thread::Builder::new()
            .name("valdash-worker".to_string())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) = run_async_worker(cmd_rx, evt_tx.clone()).await {
                        tracing::error!("worker exited: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
