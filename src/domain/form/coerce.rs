//! Coercion of raw form text into typed ABI values

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, B256, I256, U256};
use thiserror::Error;

use crate::domain::abi::ParamSpec;

/// Errors raised while turning user text into ABI values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("unknown type '{kind}': {reason}")]
    UnknownType { kind: String, reason: String },

    #[error("invalid address '{0}': expected 40 hex characters")]
    InvalidAddress(String),

    #[error("invalid integer '{value}' for {kind}")]
    InvalidInteger { value: String, kind: String },

    #[error("invalid hex '{0}'")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {got}")]
    Length { expected: usize, got: usize },

    #[error("{0}")]
    Malformed(String),

    #[error("unsupported type {0}")]
    Unsupported(String),

    #[error("string longer than 31 bytes cannot be stored in bytes32")]
    Bytes32TooLong,

    #[error("invalid bytes32 string - no null terminator")]
    Bytes32Unterminated,

    #[error("bytes are not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("argument {index} ({name}): {source}")]
    Argument {
        index: usize,
        name: String,
        #[source]
        source: Box<CoerceError>,
    },
}

/// Boolean normalization
///
/// Only the literal tokens `true`, `1`, `0x1`, `0x01` and `0x0001` are true.
pub fn coerce_bool(raw: &str) -> bool {
    matches!(raw, "true" | "1" | "0x1" | "0x01" | "0x0001")
}

/// Coerce every argument of a function, in declaration order
pub fn coerce_args(inputs: &[ParamSpec], raw: &[String]) -> Result<Vec<DynSolValue>, CoerceError> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let value = raw.get(index).map(String::as_str).unwrap_or("");
            let ty = param
                .kind
                .parse::<DynSolType>()
                .map_err(|err| CoerceError::UnknownType {
                    kind: param.kind.clone(),
                    reason: err.to_string(),
                })?;
            coerce_value(&ty, value).map_err(|err| CoerceError::Argument {
                index,
                name: if param.name.is_empty() {
                    format!("arg{index}")
                } else {
                    param.name.clone()
                },
                source: Box::new(err),
            })
        })
        .collect()
}

/// Coerce a single raw value according to its type
pub fn coerce_value(ty: &DynSolType, raw: &str) -> Result<DynSolValue, CoerceError> {
    match ty {
        DynSolType::Bool => Ok(DynSolValue::Bool(coerce_bool(raw))),

        DynSolType::Address => {
            let trimmed = raw.trim();
            let payload = strip_hex_prefix(trimmed).unwrap_or(trimmed);
            if payload.len() != 40 || !payload.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(CoerceError::InvalidAddress(raw.to_string()));
            }
            let bytes = hex::decode(payload).map_err(|_| CoerceError::InvalidAddress(raw.to_string()))?;
            Ok(DynSolValue::Address(Address::from_slice(&bytes)))
        }

        DynSolType::Uint(size) => {
            let value = parse_uint(raw.trim()).ok_or_else(|| CoerceError::InvalidInteger {
                value: raw.to_string(),
                kind: format!("uint{size}"),
            })?;
            if value.bit_len() > *size {
                return Err(CoerceError::InvalidInteger {
                    value: raw.to_string(),
                    kind: format!("uint{size}"),
                });
            }
            Ok(DynSolValue::Uint(value, *size))
        }

        DynSolType::Int(size) => {
            let trimmed = raw.trim();
            let value = match strip_hex_prefix(trimmed) {
                Some(hex) => U256::from_str_radix(hex, 16).ok().map(I256::from_raw),
                None => trimmed.parse::<I256>().ok(),
            }
            .ok_or_else(|| CoerceError::InvalidInteger {
                value: raw.to_string(),
                kind: format!("int{size}"),
            })?;
            Ok(DynSolValue::Int(value, *size))
        }

        DynSolType::Bytes => {
            let bytes = decode_hex(raw.trim())?;
            Ok(DynSolValue::Bytes(bytes))
        }

        DynSolType::FixedBytes(size) => {
            let bytes = decode_hex(raw.trim())?;
            if bytes.len() != *size {
                return Err(CoerceError::Length {
                    expected: *size,
                    got: bytes.len(),
                });
            }
            let mut word = B256::ZERO;
            word[..*size].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *size))
        }

        DynSolType::String => {
            let s = if raw.len() >= 2
                && ((raw.starts_with('"') && raw.ends_with('"'))
                    || (raw.starts_with('\'') && raw.ends_with('\'')))
            {
                &raw[1..raw.len() - 1]
            } else {
                raw
            };
            Ok(DynSolValue::String(s.to_string()))
        }

        DynSolType::Array(inner) => {
            let items = split_enclosed(raw, '[', ']')?;
            let values = items
                .iter()
                .map(|item| coerce_value(inner, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Array(values))
        }

        DynSolType::FixedArray(inner, size) => {
            let items = split_enclosed(raw, '[', ']')?;
            if items.len() != *size {
                return Err(CoerceError::Length {
                    expected: *size,
                    got: items.len(),
                });
            }
            let values = items
                .iter()
                .map(|item| coerce_value(inner, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::FixedArray(values))
        }

        DynSolType::Tuple(types) => {
            let items = split_enclosed(raw, '(', ')')?;
            if items.len() != types.len() {
                return Err(CoerceError::Length {
                    expected: types.len(),
                    got: items.len(),
                });
            }
            let values = types
                .iter()
                .zip(items.iter())
                .map(|(ty, item)| coerce_value(ty, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Tuple(values))
        }

        other => Err(CoerceError::Unsupported(other.sol_type_name().into_owned())),
    }
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value.strip_prefix("0x").or_else(|| value.strip_prefix("0X"))
}

fn parse_uint(value: &str) -> Option<U256> {
    match strip_hex_prefix(value) {
        Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
        Some(_) => None,
        None if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) => {
            U256::from_str_radix(value, 10).ok()
        }
        None => None,
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>, CoerceError> {
    let payload = strip_hex_prefix(value).unwrap_or(value);
    hex::decode(payload).map_err(|_| CoerceError::InvalidHex(value.to_string()))
}

/// Split `[a,b,[c,d]]` / `(a,b)` into its top-level items
fn split_enclosed(raw: &str, open: char, close: char) -> Result<Vec<String>, CoerceError> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| {
            CoerceError::Malformed(format!("expected value enclosed in {open}{close}, got '{raw}'"))
        })?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                items.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    items.push(current.trim().to_string());
    Ok(items)
}
