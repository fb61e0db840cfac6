//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based Ethereum provider, wallet session and bound contract
//! - ABI codec and deployment discovery using alloy-dyn-abi / alloy-json-abi
//! - Tokio runtime bridge for async operations

pub mod abi;
pub mod ethereum;
pub mod runtime;
