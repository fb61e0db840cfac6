//! ABI codec implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::keccak256;
use anyhow::{bail, Context, Result};

use crate::domain::abi::{AbiCodec, FunctionDescriptor, ParamSpec};

/// ABI codec implementation using alloy-dyn-abi
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyAbiCodec;

impl AlloyAbiCodec {
    pub fn new() -> Self {
        Self
    }

    /// Compute the 4-byte function selector from a signature
    pub fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }
}

impl AbiCodec for AlloyAbiCodec {
    fn encode_call(&self, function: &FunctionDescriptor, args: &[DynSolValue]) -> Result<Vec<u8>> {
        if args.len() != function.inputs.len() {
            bail!(
                "{} expects {} arguments, got {}",
                function.name,
                function.inputs.len(),
                args.len()
            );
        }

        let mut data = Self::selector(&function.signature()).to_vec();
        if !args.is_empty() {
            data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        }
        Ok(data)
    }

    fn decode_output(&self, function: &FunctionDescriptor, data: &[u8]) -> Result<Vec<DynSolValue>> {
        let types = parse_types(&function.outputs)
            .with_context(|| format!("Invalid outputs of {}", function.name))?;
        if types.is_empty() {
            return Ok(Vec::new());
        }

        // Create a tuple type for decoding all outputs
        let decoded = DynSolType::Tuple(types)
            .abi_decode_params(data)
            .with_context(|| format!("Failed to decode {} return data", function.name))?;

        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }
}

fn parse_types(params: &[ParamSpec]) -> Result<Vec<DynSolType>> {
    params
        .iter()
        .map(|param| {
            param.kind.parse::<DynSolType>().with_context(|| {
                format!("Failed to parse type '{}' for param '{}'", param.kind, param.name)
            })
        })
        .collect()
}
