//! Ephemeral per-form input state

use std::collections::BTreeMap;

use alloy_dyn_abi::DynSolValue;

use super::{coerce_args, CoerceError, Converter};
use crate::domain::abi::ParamSpec;

/// Key of the extra native-value field on payable forms
pub const VALUE_KEY: &str = "__value";

/// Synthesized key for one argument of a form
///
/// `"{function}_{name}_{type}"`, with `input_{index}_` standing in for unnamed
/// arguments.
pub fn input_key(function: &str, param: &ParamSpec, index: usize) -> String {
    let name = if param.name.is_empty() {
        format!("input_{index}_")
    } else {
        param.name.clone()
    };
    format!("{}_{}_{}", function, name, param.kind)
}

/// Raw text entered per argument, owned by a single form panel
#[derive(Debug, Clone, Default)]
pub struct FormState {
    function: String,
    inputs: Vec<ParamSpec>,
    payable: bool,
    values: BTreeMap<String, String>,
}

impl FormState {
    pub fn new(function: impl Into<String>, inputs: Vec<ParamSpec>) -> Self {
        Self {
            function: function.into(),
            inputs,
            payable: false,
            values: BTreeMap::new(),
        }
    }

    /// Add the native-value field of payable functions
    pub fn with_value_field(mut self) -> Self {
        self.payable = true;
        self
    }

    pub fn inputs(&self) -> &[ParamSpec] {
        &self.inputs
    }

    pub fn is_payable(&self) -> bool {
        self.payable
    }

    /// Number of editable fields (arguments plus the value field)
    pub fn field_count(&self) -> usize {
        self.inputs.len() + usize::from(self.payable)
    }

    /// Key of the field at `index`
    pub fn field_key(&self, index: usize) -> Option<String> {
        match self.inputs.get(index) {
            Some(param) => Some(input_key(&self.function, param, index)),
            None if self.payable && index == self.inputs.len() => Some(VALUE_KEY.to_string()),
            None => None,
        }
    }

    /// Declared type of the field at `index` (the value field is `uint256`)
    pub fn field_kind(&self, index: usize) -> Option<&str> {
        match self.inputs.get(index) {
            Some(param) => Some(param.kind.as_str()),
            None if self.payable && index == self.inputs.len() => Some("uint256"),
            None => None,
        }
    }

    pub fn field_placeholder(&self, index: usize) -> String {
        match self.inputs.get(index) {
            Some(param) => param.placeholder(),
            None => "transaction value (wei)".to_string(),
        }
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn field_value(&self, index: usize) -> &str {
        self.field_key(index)
            .and_then(|key| self.values.get(&key))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn push_char(&mut self, index: usize, c: char) {
        if let Some(key) = self.field_key(index) {
            self.values.entry(key).or_default().push(c);
        }
    }

    pub fn pop_char(&mut self, index: usize) {
        if let Some(key) = self.field_key(index) {
            if let Some(value) = self.values.get_mut(&key) {
                value.pop();
            }
        }
    }

    /// Apply the type converter of the field at `index` in place
    ///
    /// Returns `Ok(false)` when the field's type has no converter.
    pub fn convert_field(&mut self, index: usize) -> Result<bool, CoerceError> {
        let Some(converter) = self.field_kind(index).and_then(Converter::for_kind) else {
            return Ok(false);
        };
        let Some(key) = self.field_key(index) else {
            return Ok(false);
        };
        let converted = converter.apply(self.value(&key))?;
        self.values.insert(key, converted);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Raw argument text in declaration order
    pub fn raw_args(&self) -> Vec<String> {
        (0..self.inputs.len())
            .map(|index| self.field_value(index).to_string())
            .collect()
    }

    /// Coerce every argument to its declared type
    pub fn coerce(&self) -> Result<Vec<DynSolValue>, CoerceError> {
        coerce_args(&self.inputs, &self.raw_args())
    }

    /// Raw text of the native-value field, if this form has one and it is set
    pub fn raw_value(&self) -> Option<&str> {
        if !self.payable {
            return None;
        }
        self.values
            .get(VALUE_KEY)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_key_named_and_unnamed() {
        let named = ParamSpec::new("miner_address", "address");
        let unnamed = ParamSpec::new("", "uint256");
        assert_eq!(
            input_key("Rewards Amount", &named, 0),
            "Rewards Amount_miner_address_address"
        );
        assert_eq!(
            input_key("setFeeSharesOfValidator", &unnamed, 1),
            "setFeeSharesOfValidator_input_1__uint256"
        );
    }

    #[test]
    fn test_typing_and_clear() {
        let mut form = FormState::new(
            "isWithdrawable",
            vec![ParamSpec::new("val", "address")],
        );
        for c in "0xab".chars() {
            form.push_char(0, c);
        }
        form.pop_char(0);
        assert_eq!(form.field_value(0), "0xa");
        assert_eq!(form.raw_args(), vec!["0xa".to_string()]);
        form.clear();
        assert_eq!(form.field_value(0), "");
    }

    #[test]
    fn test_value_field_only_on_payable() {
        let form = FormState::new("redeemMargin", vec![]);
        assert_eq!(form.field_count(), 0);
        assert_eq!(form.raw_value(), None);

        let mut payable = FormState::new("depositMargin", vec![]).with_value_field();
        assert_eq!(payable.field_count(), 1);
        assert_eq!(payable.field_kind(0), Some("uint256"));
        payable.set(VALUE_KEY, "1");
        assert!(payable.convert_field(0).unwrap());
        assert_eq!(payable.raw_value(), Some("1000000000000000000"));
    }

    #[test]
    fn test_convert_field_without_converter() {
        let mut form = FormState::new("f", vec![ParamSpec::new("flag", "bool")]);
        form.push_char(0, '1');
        assert_eq!(form.convert_field(0), Ok(false));
        assert_eq!(form.field_value(0), "1");
    }
}
