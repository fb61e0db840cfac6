//! Domain layer - contract descriptors, forms, display and compound reads
//!
//! Nothing in here talks to the network. The infrastructure layer implements
//! the seams (`AbiCodec`, `ContractReader`) with alloy.

pub mod abi;
pub mod block;
pub mod compound;
pub mod display;
pub mod form;

pub use block::BlockTag;
