//! Best-effort value-to-text conversion for call results

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::domain::form::format_ether;

/// Largest integer that displays as a plain number under `auto`
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Formatting hint for a displayed value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    /// Small integers as decimals, large ones as ether amounts
    #[default]
    Auto,
    /// Always render unsigned integers as ether amounts
    Ether,
    /// Always render integers as full decimals
    Raw,
}

/// Render the outputs of one call
///
/// A single output is shown bare, several outputs as a bracketed list.
pub fn try_to_display(values: &[DynSolValue], hint: FormatHint) -> String {
    match values {
        [] => String::new(),
        [single] => format_value(single, hint),
        many => {
            let items: Vec<String> = many.iter().map(|v| format_value(v, hint)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

pub fn format_value(value: &DynSolValue, hint: FormatHint) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Uint(u, _) => format_uint(*u, hint),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            let items: Vec<String> = items.iter().map(|v| format_value(v, hint)).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn format_uint(value: U256, hint: FormatHint) -> String {
    match hint {
        FormatHint::Raw => value.to_string(),
        FormatHint::Ether => format!("Ξ{}", format_ether(value)),
        FormatHint::Auto if value <= U256::from(MAX_SAFE_INTEGER) => value.to_string(),
        FormatHint::Auto => format!("Ξ{}", format_ether(value)),
    }
}
