//! ABI codec trait

use alloy_dyn_abi::DynSolValue;

use super::FunctionDescriptor;

/// Trait for ABI encoding/decoding implementations
///
/// Keeps the panels and the composer independent of how calldata is built.
pub trait AbiCodec: Send + Sync {
    /// Encode calldata (4-byte selector followed by the encoded arguments)
    fn encode_call(
        &self,
        function: &FunctionDescriptor,
        args: &[DynSolValue],
    ) -> anyhow::Result<Vec<u8>>;

    /// Decode the return data of a call into its output values
    fn decode_output(
        &self,
        function: &FunctionDescriptor,
        data: &[u8],
    ) -> anyhow::Result<Vec<DynSolValue>>;
}
