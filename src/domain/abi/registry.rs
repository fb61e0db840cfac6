//! Contract descriptor - the loaded interface of the bound contract

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A function parameter specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    #[serde(default)]
    pub name: String,
    /// Solidity type (e.g., "address", "uint256", "(uint256,address)")
    pub kind: String,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Placeholder shown in an empty input field, e.g. "address miner_address"
    pub fn placeholder(&self) -> String {
        if self.name.trim().is_empty() {
            self.kind.clone()
        } else {
            format!("{} {}", self.kind, self.name)
        }
    }
}

/// ABI item kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Function,
    Event,
    Error,
    Constructor,
    Fallback,
    Receive,
}

/// Declared state mutability of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// `view` and `pure` functions can be called without a transaction
    pub fn is_read_only(self) -> bool {
        matches!(self, StateMutability::View | StateMutability::Pure)
    }
}

/// A single ABI entry of the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub kind: ItemKind,
    pub name: String,
    pub inputs: Vec<ParamSpec>,
    pub outputs: Vec<ParamSpec>,
    pub state_mutability: StateMutability,
}

impl FunctionDescriptor {
    pub fn function(
        name: impl Into<String>,
        inputs: Vec<ParamSpec>,
        outputs: Vec<ParamSpec>,
        state_mutability: StateMutability,
    ) -> Self {
        Self {
            kind: ItemKind::Function,
            name: name.into(),
            inputs,
            outputs,
            state_mutability,
        }
    }

    /// Canonical signature used for the selector, e.g. "transfer(address,uint256)"
    pub fn signature(&self) -> String {
        let kinds: Vec<&str> = self.inputs.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", self.name, kinds.join(","))
    }

    /// Zero-argument read: rendered as a display element rather than a form
    pub fn is_queryable(&self) -> bool {
        self.state_mutability.is_read_only() && self.inputs.is_empty()
    }

    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }
}

/// Where a descriptor was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    /// Explicit `[[contracts]]` config entry
    External(PathBuf),
    /// Scaffold-style `hardhat_contracts.json`
    Bundle(PathBuf),
    /// hardhat-deploy `deployments/<network>/<Name>.json`
    Deployment(PathBuf),
}

impl DescriptorSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            DescriptorSource::External(path)
            | DescriptorSource::Bundle(path)
            | DescriptorSource::Deployment(path) => path,
        }
    }
}

/// The interface and deployed address of the bound contract
///
/// Immutable once loaded. A network, account or deployment change replaces the
/// whole descriptor.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub name: String,
    pub address: String,
    pub chain_id: u64,
    pub functions: Vec<FunctionDescriptor>,
    pub source: DescriptorSource,
}

impl ContractDescriptor {
    /// Look up a function by name (first overload wins)
    pub fn function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions
            .iter()
            .find(|f| f.kind == ItemKind::Function && f.name == name)
    }

    /// Number of callable functions
    pub fn len(&self) -> usize {
        self.functions
            .iter()
            .filter(|f| f.kind == ItemKind::Function)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Select the functions a page displays
///
/// Keeps ABI order. Only `function` items whose name is in `show` survive; an
/// absent contract or an absent/empty allow-list yields nothing.
pub fn displayed_functions<'a>(
    contract: Option<&'a ContractDescriptor>,
    show: Option<&[String]>,
) -> Vec<&'a FunctionDescriptor> {
    let (Some(contract), Some(show)) = (contract, show) else {
        return Vec::new();
    };
    contract
        .functions
        .iter()
        .filter(|f| f.kind == ItemKind::Function && show.iter().any(|name| *name == f.name))
        .collect()
}
