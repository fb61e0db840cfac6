//! Input converters: bytes32/string, bytes/utf8 and ether/wei

use alloy_primitives::U256;

use super::CoerceError;

const ETHER_DECIMALS: usize = 18;

/// Type-specific converter offered next to an input field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Toggle between text and a zero-padded bytes32 hex word
    Bytes32,
    /// Toggle between text and its UTF-8 hex encoding
    Hex,
    /// Scale a decimal ether amount to wei
    Ether,
}

impl Converter {
    /// Converter available for a declared Solidity type
    pub fn for_kind(kind: &str) -> Option<Self> {
        match kind {
            "bytes32" => Some(Converter::Bytes32),
            "bytes" => Some(Converter::Hex),
            "uint256" => Some(Converter::Ether),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Converter::Bytes32 => "to bytes32",
            Converter::Hex => "to hex",
            Converter::Ether => "* 10 ** 18",
        }
    }

    /// Convert the raw field text, returning the replacement text
    pub fn apply(&self, raw: &str) -> Result<String, CoerceError> {
        match self {
            Converter::Bytes32 if is_hex_string(raw) => parse_bytes32_string(raw),
            Converter::Bytes32 => format_bytes32_string(raw),
            Converter::Hex if is_hex_string(raw) => hex_to_utf8(raw),
            Converter::Hex => Ok(utf8_to_hex(raw)),
            Converter::Ether => parse_ether(raw).map(|wei| wei.to_string()),
        }
    }
}

/// `0x` followed by any number of hex digits
pub fn is_hex_string(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|rest| rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Encode text as a NUL-terminated, zero-padded bytes32 word
pub fn format_bytes32_string(text: &str) -> Result<String, CoerceError> {
    let bytes = text.as_bytes();
    if bytes.len() > 31 {
        return Err(CoerceError::Bytes32TooLong);
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Ok(format!("0x{}", hex::encode(word)))
}

/// Decode a bytes32 word back into text (up to the first NUL)
pub fn parse_bytes32_string(value: &str) -> Result<String, CoerceError> {
    let bytes = decode_prefixed(value)?;
    if bytes.len() != 32 {
        return Err(CoerceError::Length {
            expected: 32,
            got: bytes.len(),
        });
    }
    if bytes[31] != 0 {
        return Err(CoerceError::Bytes32Unterminated);
    }
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(32);
    String::from_utf8(bytes[..end].to_vec()).map_err(|_| CoerceError::InvalidUtf8)
}

pub fn utf8_to_hex(text: &str) -> String {
    format!("0x{}", hex::encode(text.as_bytes()))
}

pub fn hex_to_utf8(value: &str) -> Result<String, CoerceError> {
    let bytes = decode_prefixed(value)?;
    String::from_utf8(bytes).map_err(|_| CoerceError::InvalidUtf8)
}

/// Parse a decimal ether amount ("1.5") into wei
pub fn parse_ether(value: &str) -> Result<U256, CoerceError> {
    let value = value.trim();
    let invalid = || CoerceError::InvalidAmount(value.to_string());

    let (integer_part, decimal_part) = match value.split_once('.') {
        Some((integer, decimal)) => (integer, decimal),
        None => (value, ""),
    };
    if integer_part.is_empty() && decimal_part.is_empty() {
        return Err(invalid());
    }
    if !integer_part.chars().all(|c| c.is_ascii_digit())
        || !decimal_part.chars().all(|c| c.is_ascii_digit())
        || decimal_part.len() > ETHER_DECIMALS
    {
        return Err(invalid());
    }

    let padded = format!(
        "{}{}{}",
        integer_part,
        decimal_part,
        "0".repeat(ETHER_DECIMALS - decimal_part.len())
    );
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| invalid())
}

/// Format wei as a decimal ether amount, always with a fractional part ("1.0")
pub fn format_ether(wei: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(ETHER_DECIMALS));
    let whole = wei / unit;
    let frac = wei % unit;
    let frac = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{frac}")
    }
}

fn decode_prefixed(value: &str) -> Result<Vec<u8>, CoerceError> {
    let payload = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(payload).map_err(|_| CoerceError::InvalidHex(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes32_toggle() {
        let encoded = format_bytes32_string("validator").unwrap();
        assert_eq!(encoded.len(), 66);
        assert!(encoded.starts_with("0x76616c696461746f72000000"));
        assert_eq!(parse_bytes32_string(&encoded).unwrap(), "validator");

        let converter = Converter::for_kind("bytes32").unwrap();
        assert_eq!(converter.apply("validator").unwrap(), encoded);
        assert_eq!(converter.apply(&encoded).unwrap(), "validator");
    }

    #[test]
    fn test_bytes32_limits() {
        assert_eq!(
            format_bytes32_string(&"a".repeat(32)),
            Err(CoerceError::Bytes32TooLong)
        );
        let full = format!("0x{}", "61".repeat(32));
        assert_eq!(
            parse_bytes32_string(&full),
            Err(CoerceError::Bytes32Unterminated)
        );
    }

    #[test]
    fn test_hex_toggle() {
        let converter = Converter::Hex;
        assert_eq!(converter.apply("hi").unwrap(), "0x6869");
        assert_eq!(converter.apply("0x6869").unwrap(), "hi");
        assert!(is_hex_string("0x"));
        assert!(!is_hex_string("6869"));
    }

    #[test]
    fn test_parse_ether() {
        assert_eq!(
            parse_ether("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(
            parse_ether("1.5").unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_ether(".5").unwrap(), U256::from(500_000_000_000_000_000u128));
        assert_eq!(parse_ether("0").unwrap(), U256::ZERO);
        assert!(parse_ether("1.0000000000000000001").is_err());
        assert!(parse_ether("abc").is_err());
        assert!(parse_ether("").is_err());
        assert_eq!(
            Converter::Ether.apply("2").unwrap(),
            "2000000000000000000"
        );
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(U256::from(1_000_000_000_000_000_000u128)), "1.0");
        assert_eq!(format_ether(U256::from(1_500_000_000_000_000_000u128)), "1.5");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }
}
