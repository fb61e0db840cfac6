//! Form domain - argument entry, type converters and coercion
//!
//! A form holds the raw text a user typed per argument. Nothing is validated
//! while typing; coercion to the declared Solidity type happens on submit.

mod coerce;
mod convert;
mod state;

pub use coerce::{coerce_args, coerce_bool, coerce_value, CoerceError};
pub use convert::{
    format_bytes32_string, format_ether, hex_to_utf8, is_hex_string, parse_bytes32_string,
    parse_ether, utf8_to_hex, Converter,
};
pub use state::{input_key, FormState, VALUE_KEY};
