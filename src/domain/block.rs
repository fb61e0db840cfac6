//! Block tag selecting which chain state read calls observe

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Block tag applied to every read-only invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockTag {
    #[default]
    Latest,
    Number(u64),
}

impl FromStr for BlockTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("latest") {
            return Ok(BlockTag::Latest);
        }
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(BlockTag::Number)
            .map_err(|_| format!("invalid block tag '{s}' (expected a block number or 'latest')"))
    }
}

impl TryFrom<String> for BlockTag {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockTag> for String {
    fn from(tag: BlockTag) -> Self {
        tag.to_string()
    }
}

impl fmt::Display for BlockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockTag::Latest => write!(f, "latest"),
            BlockTag::Number(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_tag() {
        assert_eq!("latest".parse::<BlockTag>(), Ok(BlockTag::Latest));
        assert_eq!("".parse::<BlockTag>(), Ok(BlockTag::Latest));
        assert_eq!("12345".parse::<BlockTag>(), Ok(BlockTag::Number(12345)));
        assert_eq!("0x10".parse::<BlockTag>(), Ok(BlockTag::Number(16)));
        assert!("pending-ish".parse::<BlockTag>().is_err());
    }
}
