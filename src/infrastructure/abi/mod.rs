//! ABI infrastructure - calldata codec and deployment artifact discovery

mod codec;
mod scanner;

pub use codec::AlloyAbiCodec;
pub use scanner::{parse_abi, DeploymentScanner, ExternalContract, ScanReport, ScanRequest};
