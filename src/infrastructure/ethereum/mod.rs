//! Ethereum infrastructure - Alloy provider, wallet session and bound contract

mod contract;
mod provider;
mod session;

pub use contract::{BoundContract, WriteOptions};
pub use provider::{create_provider, EthereumProvider, ProviderConfig, ReceiptOutcome};
pub use session::{Session, SignerConfig, SignerKind};
