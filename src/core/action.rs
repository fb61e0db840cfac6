//! Actions that modules can return to communicate with the app

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;

/// Actions returned by modules to communicate state changes
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action needed
    None,

    /// Panel asks for work on the worker
    Submit(Submission),

    /// Copy text to the system clipboard
    Copy(String),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Leave the panel's edit mode
    CloseOverlay,

    /// Request quit
    Quit,
}

/// A request raised by a panel, routed to the worker by the app
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Read-only call at the current block tag
    Read {
        function: String,
        args: Vec<DynSolValue>,
    },
    /// Transaction from the session signer
    Write {
        function: String,
        args: Vec<DynSolValue>,
        value: Option<U256>,
    },
    /// Compound read over the panel's calls
    Compound { args: Vec<DynSolValue> },
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
