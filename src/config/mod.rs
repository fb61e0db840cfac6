use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::abi::ParamSpec;
use crate::domain::display::FormatHint;
use crate::domain::BlockTag;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
    pub chain_id: u64,
    pub explorer: Option<String>,
}

/// An explicitly declared contract (address plus ABI file)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContractEntry {
    pub chain_id: u64,
    pub name: String,
    pub address: String,
    pub abi: String,
}

/// A tab of the dashboard and the functions it shows
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageConfig {
    pub name: String,
    #[serde(default)]
    pub show: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompoundConfig {
    pub page: String,
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ParamSpec>,
    pub calls: Vec<String>,
    pub transform: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: String,
    pub contract: String,
    pub deployments: Vec<String>,
    pub gas_price_gwei: Option<f64>,
    pub refresh_on_block: bool,
    pub block: BlockTag,
    // Empty when omitted; `parse` decides which built-in tables apply
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
    pub contracts: Vec<ContractEntry>,
    #[serde(default)]
    pub pages: Vec<PageConfig>,
    #[serde(default)]
    pub compound: Vec<CompoundConfig>,
    pub formats: BTreeMap<String, FormatHint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "kcc-main".to_string(),
            contract: "Validators".to_string(),
            deployments: vec!["./deployments".to_string(), "./src/contracts".to_string()],
            gas_price_gwei: None,
            refresh_on_block: false,
            block: BlockTag::Latest,
            networks: default_networks(),
            contracts: Vec::new(),
            pages: default_pages(),
            compound: default_compound(),
            formats: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse a config file, filling omitted tables with the defaults
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(content)?;
        let defaults = Config::default();
        if config.networks.is_empty() {
            config.networks = defaults.networks;
        }
        if config.pages.is_empty() {
            config.pages = defaults.pages;
            if config.compound.is_empty() {
                config.compound = defaults.compound;
            }
        }
        Ok(config)
    }

    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn network_index(&self, name: &str) -> Option<usize> {
        self.networks.iter().position(|n| n.name == name)
    }

    pub fn page(&self, name: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|p| p.name == name)
    }

    pub fn compound_for<'a>(&'a self, page: &'a str) -> impl Iterator<Item = &'a CompoundConfig> + 'a {
        self.compound.iter().filter(move |c| c.page == page)
    }

    pub fn format_for(&self, function: &str) -> FormatHint {
        self.formats.get(function).copied().unwrap_or_default()
    }

    /// Configured gas price in wei
    pub fn gas_price_wei(&self) -> Option<u128> {
        self.gas_price_gwei
            .filter(|gwei| gwei.is_finite() && *gwei >= 0.0)
            .map(|gwei| (gwei * 1e9).round() as u128)
    }
}

pub fn default_networks() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig {
            name: "kcc-main".to_string(),
            rpc: Some("https://rpc-mainnet.kcc.network".to_string()),
            ws: None,
            ipc: None,
            chain_id: 321,
            explorer: Some("https://explorer.kcc.io".to_string()),
        },
        NetworkConfig {
            name: "kcc-test".to_string(),
            rpc: Some("https://rpc-testnet.kcc.network".to_string()),
            ws: None,
            ipc: None,
            chain_id: 322,
            explorer: Some("https://scan-testnet.kcc.network".to_string()),
        },
        NetworkConfig {
            name: "localhost".to_string(),
            rpc: Some("http://localhost:8545".to_string()),
            ws: None,
            ipc: None,
            chain_id: 31337,
            explorer: None,
        },
    ]
}

pub fn default_pages() -> Vec<PageConfig> {
    let page = |name: &str, show: &[&str]| PageConfig {
        name: name.to_string(),
        show: show.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        page(
            "margin",
            &[
                "getPoolSelfBallots",
                "depositMargin",
                "redeemMargin",
                "withdrawMargin",
                "isWithdrawable",
            ],
        ),
        page("rewards", &["claimSelfBallotsReward"]),
        page(
            "fee",
            &[
                "getPoolpendingFee",
                "getPoolfeeShares",
                "setFeeSharesOfValidator",
                "claimFeeReward",
            ],
        ),
    ]
}

pub fn default_compound() -> Vec<CompoundConfig> {
    vec![CompoundConfig {
        page: "rewards".to_string(),
        name: "Rewards Amount".to_string(),
        inputs: vec![ParamSpec::new("miner_address", "address")],
        calls: vec![
            "getPoolSelfBallots".to_string(),
            "getPoolaccRewardPerShare".to_string(),
            "getPoolSelfBallotsRewardsDebt".to_string(),
        ],
        transform: "pending_rewards".to_string(),
    }]
}

/// Load the config file, falling back to the defaults
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match Config::parse(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("ignoring {}: {err}", path.display());
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("VALDASH_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("valdash").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("valdash").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "valdash", "valdash")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("valdash"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("valdash"));
    }
    directories::ProjectDirs::from("io", "valdash", "valdash")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("valdash.log"))
}

/// Expand `~/` and make relative paths absolute against the working directory
pub fn expand_path(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return Some(home.join(rest));
        }
    }

    let mut buf = PathBuf::from(trimmed);
    if buf.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            buf = cwd.join(buf);
        }
    }
    Some(buf)
}
