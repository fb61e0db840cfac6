//! Deployment scanner - locates the bound contract's ABI and address on disk
//!
//! Three sources are consulted, first match wins:
//! 1. explicit external contracts (`[[contracts]]` in the config file)
//! 2. scaffold-style `hardhat_contracts.json` bundles keyed by chain id
//! 3. hardhat-deploy artifacts at `deployments/<network>/<Name>.json`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use alloy_json_abi::{AbiItem, Param};
use anyhow::{Context, Result};
use serde_json::Value;
use walkdir::WalkDir;

use crate::domain::abi::{
    ContractDescriptor, DescriptorSource, FunctionDescriptor, ItemKind, ParamSpec, StateMutability,
};

const BUNDLE_FILE: &str = "hardhat_contracts.json";
const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// A contract declared explicitly rather than discovered
#[derive(Debug, Clone)]
pub struct ExternalContract {
    pub chain_id: u64,
    pub name: String,
    pub address: String,
    pub abi: PathBuf,
}

/// What to look for
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub roots: Vec<PathBuf>,
    pub chain_id: u64,
    pub network: String,
    pub contract: String,
    pub external: Vec<ExternalContract>,
}

/// Outcome of a scan
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub contract: Option<ContractDescriptor>,
    pub scanned_files: usize,
    pub errors: Vec<String>,
    pub scan_ms: u128,
}

/// Deployment artifact scanner
pub struct DeploymentScanner;

impl DeploymentScanner {
    /// Resolve the requested contract for the requested chain
    pub fn resolve(request: &ScanRequest) -> ScanReport {
        let started = Instant::now();
        let mut report = ScanReport::default();

        report.contract = Self::from_external(request, &mut report)
            .or_else(|| Self::from_bundles(request, &mut report))
            .or_else(|| Self::from_deployments(request, &mut report));

        report.scan_ms = started.elapsed().as_millis();
        report
    }

    fn from_external(request: &ScanRequest, report: &mut ScanReport) -> Option<ContractDescriptor> {
        let entry = request
            .external
            .iter()
            .find(|e| e.chain_id == request.chain_id && e.name == request.contract)?;

        report.scanned_files += 1;
        let loaded = Self::read_json(&entry.abi).and_then(|value| {
            // Either a raw ABI array or an artifact with an "abi" field
            let abi = value.get("abi").cloned().unwrap_or(value);
            parse_abi(&abi)
        });
        match loaded {
            Ok(functions) => Some(ContractDescriptor {
                name: entry.name.clone(),
                address: entry.address.clone(),
                chain_id: entry.chain_id,
                functions,
                source: DescriptorSource::External(entry.abi.clone()),
            }),
            Err(err) => {
                report.errors.push(format!("{}: {:#}", entry.abi.display(), err));
                None
            }
        }
    }

    fn from_bundles(request: &ScanRequest, report: &mut ScanReport) -> Option<ContractDescriptor> {
        for path in Self::walk(&request.roots, report) {
            if path.file_name().and_then(|n| n.to_str()) != Some(BUNDLE_FILE) {
                continue;
            }
            report.scanned_files += 1;
            match Self::read_json(&path).and_then(|bundle| Self::lookup_bundle(&bundle, request)) {
                Ok(Some((address, functions))) => {
                    return Some(ContractDescriptor {
                        name: request.contract.clone(),
                        address,
                        chain_id: request.chain_id,
                        functions,
                        source: DescriptorSource::Bundle(path),
                    });
                }
                Ok(None) => {}
                Err(err) => report.errors.push(format!("{}: {:#}", path.display(), err)),
            }
        }
        None
    }

    /// `{ "<chainId>": [ { "contracts": { "<Name>": { "address", "abi" } } } ] }`
    fn lookup_bundle(
        bundle: &Value,
        request: &ScanRequest,
    ) -> Result<Option<(String, Vec<FunctionDescriptor>)>> {
        let Some(deployments) = bundle
            .get(request.chain_id.to_string())
            .and_then(Value::as_array)
        else {
            return Ok(None);
        };
        for deployment in deployments {
            let Some(contract) = deployment
                .get("contracts")
                .and_then(|contracts| contracts.get(&request.contract))
            else {
                continue;
            };
            return Self::address_and_abi(contract).map(Some);
        }
        Ok(None)
    }

    fn from_deployments(request: &ScanRequest, report: &mut ScanReport) -> Option<ContractDescriptor> {
        let file_name = format!("{}.json", request.contract);
        for path in Self::walk(&request.roots, report) {
            if path.file_name().and_then(|n| n.to_str()) != Some(file_name.as_str()) {
                continue;
            }
            let Some(network_dir) = path.parent() else {
                continue;
            };
            if !Self::is_network_dir(network_dir, request) {
                continue;
            }
            report.scanned_files += 1;
            match Self::read_json(&path).and_then(|artifact| Self::address_and_abi(&artifact)) {
                Ok((address, functions)) => {
                    return Some(ContractDescriptor {
                        name: request.contract.clone(),
                        address,
                        chain_id: request.chain_id,
                        functions,
                        source: DescriptorSource::Deployment(path),
                    });
                }
                Err(err) => report.errors.push(format!("{}: {:#}", path.display(), err)),
            }
        }
        None
    }

    /// hardhat-deploy network directory: named after the network, or with a
    /// matching `.chainId` marker file
    fn is_network_dir(dir: &Path, request: &ScanRequest) -> bool {
        let named = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(|name| name == request.network)
            .unwrap_or(false);
        if named {
            return true;
        }
        fs::read_to_string(dir.join(".chainId"))
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(|chain_id| chain_id == request.chain_id)
            .unwrap_or(false)
    }

    fn address_and_abi(artifact: &Value) -> Result<(String, Vec<FunctionDescriptor>)> {
        let address = artifact
            .get("address")
            .and_then(Value::as_str)
            .context("artifact has no address")?
            .to_string();
        let abi = artifact.get("abi").context("artifact has no abi")?;
        Ok((address, parse_abi(abi)?))
    }

    fn read_json(path: &Path) -> Result<Value> {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// All candidate JSON files under the roots, in a stable order
    fn walk(roots: &[PathBuf], report: &mut ScanReport) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in roots {
            for entry in WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !Self::is_ignored_dir(e.path()))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        report.errors.push(err.to_string());
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if path.extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }
                // Skip files larger than 5MB
                match entry.metadata() {
                    Ok(meta) if meta.len() > MAX_FILE_BYTES => continue,
                    Ok(_) => files.push(path.to_path_buf()),
                    Err(err) => report.errors.push(format!("{}: {}", path.display(), err)),
                }
            }
        }
        files
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| matches!(name, ".git" | "target" | "node_modules" | "cache"))
            .unwrap_or(false)
    }
}

/// Convert a JSON ABI into descriptors, keeping the declaration order
pub fn parse_abi(abi: &Value) -> Result<Vec<FunctionDescriptor>> {
    let items: Vec<AbiItem<'static>> =
        serde_json::from_value(abi.clone()).context("invalid JSON ABI")?;

    Ok(items.iter().map(descriptor_from_item).collect())
}

fn descriptor_from_item(item: &AbiItem<'_>) -> FunctionDescriptor {
    match item {
        AbiItem::Function(function) => FunctionDescriptor {
            kind: ItemKind::Function,
            name: function.name.clone(),
            inputs: params(&function.inputs),
            outputs: params(&function.outputs),
            state_mutability: mutability(function.state_mutability),
        },
        AbiItem::Constructor(constructor) => FunctionDescriptor {
            kind: ItemKind::Constructor,
            name: String::new(),
            inputs: params(&constructor.inputs),
            outputs: Vec::new(),
            state_mutability: mutability(constructor.state_mutability),
        },
        AbiItem::Fallback(fallback) => FunctionDescriptor {
            kind: ItemKind::Fallback,
            name: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state_mutability: mutability(fallback.state_mutability),
        },
        AbiItem::Receive(receive) => FunctionDescriptor {
            kind: ItemKind::Receive,
            name: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state_mutability: mutability(receive.state_mutability),
        },
        AbiItem::Event(event) => FunctionDescriptor {
            kind: ItemKind::Event,
            name: event.name.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
        },
        AbiItem::Error(error) => FunctionDescriptor {
            kind: ItemKind::Error,
            name: error.name.clone(),
            inputs: params(&error.inputs),
            outputs: Vec::new(),
            state_mutability: StateMutability::NonPayable,
        },
    }
}

/// Tuple parameters are flattened to their canonical `(a,b)[]` form
fn params(params: &[Param]) -> Vec<ParamSpec> {
    params
        .iter()
        .map(|param| ParamSpec::new(param.name.clone(), param.selector_type().into_owned()))
        .collect()
}

fn mutability(value: alloy_json_abi::StateMutability) -> StateMutability {
    match value {
        alloy_json_abi::StateMutability::Pure => StateMutability::Pure,
        alloy_json_abi::StateMutability::View => StateMutability::View,
        alloy_json_abi::StateMutability::NonPayable => StateMutability::NonPayable,
        alloy_json_abi::StateMutability::Payable => StateMutability::Payable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_abi_keeps_order_and_kinds() {
        let abi = json!([
            {"type": "event", "name": "LogDeposit", "anonymous": false, "inputs": []},
            {
                "type": "function",
                "name": "isWithdrawable",
                "stateMutability": "view",
                "inputs": [
                    {"name": "_val", "type": "address"},
                    {"name": "_user", "type": "address"}
                ],
                "outputs": [{"name": "", "type": "bool"}]
            },
            {
                "type": "function",
                "name": "depositMargin",
                "stateMutability": "payable",
                "inputs": [],
                "outputs": []
            }
        ]);

        let functions = parse_abi(&abi).unwrap();
        assert_eq!(functions.len(), 3);
        assert_eq!(functions[0].kind, ItemKind::Event);
        assert_eq!(functions[1].signature(), "isWithdrawable(address,address)");
        assert_eq!(functions[1].outputs[0].kind, "bool");
        assert!(functions[2].is_payable());
    }

    #[test]
    fn test_tuple_params_flattened() {
        let abi = json!([{
            "type": "function",
            "name": "setInfo",
            "stateMutability": "nonpayable",
            "inputs": [{
                "name": "info",
                "type": "tuple",
                "components": [
                    {"name": "a", "type": "uint256"},
                    {"name": "b", "type": "address"}
                ]
            }],
            "outputs": []
        }]);
        let functions = parse_abi(&abi).unwrap();
        assert_eq!(functions[0].inputs[0].kind, "(uint256,address)");
    }

    #[test]
    fn test_is_ignored_dir() {
        assert!(DeploymentScanner::is_ignored_dir(Path::new(".git")));
        assert!(DeploymentScanner::is_ignored_dir(Path::new("node_modules")));
        assert!(!DeploymentScanner::is_ignored_dir(Path::new("deployments")));
    }

    #[test]
    fn test_lookup_bundle_by_chain() {
        let bundle = json!({
            "321": [{
                "name": "kcc",
                "chainId": "321",
                "contracts": {
                    "Validators": {
                        "address": "0x000000000000000000000000000000000000f333",
                        "abi": []
                    }
                }
            }]
        });
        let mut request = ScanRequest {
            roots: vec![],
            chain_id: 321,
            network: "kcc-main".to_string(),
            contract: "Validators".to_string(),
            external: vec![],
        };
        let (address, functions) = DeploymentScanner::lookup_bundle(&bundle, &request)
            .unwrap()
            .unwrap();
        assert_eq!(address, "0x000000000000000000000000000000000000f333");
        assert!(functions.is_empty());

        request.chain_id = 322;
        assert!(DeploymentScanner::lookup_bundle(&bundle, &request)
            .unwrap()
            .is_none());
    }
}
