//! ABI domain models and contracts
//!
//! Descriptor types for the bound contract and the codec seam used to turn
//! form arguments into calldata and return data into values. The codec itself
//! lives in the infrastructure layer (alloy-dyn-abi).

mod codec;
mod registry;

pub use codec::AbiCodec;
pub use registry::{
    displayed_functions, ContractDescriptor, DescriptorSource, FunctionDescriptor, ItemKind,
    ParamSpec, StateMutability,
};
