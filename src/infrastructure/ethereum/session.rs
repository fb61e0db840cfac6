//! Wallet session - who is signing, on which chain

use std::fmt;

use alloy::primitives::{Address, U256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};

use super::EthereumProvider;

/// How transactions of the session get signed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    /// In-process private key
    LocalKey,
    /// Account unlocked on the node, by index into `eth_accounts`
    NodeAccount(usize),
    /// No signer; writes are refused
    ReadOnly,
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerKind::LocalKey => write!(f, "local key"),
            SignerKind::NodeAccount(index) => write!(f, "node account #{index}"),
            SignerKind::ReadOnly => write!(f, "read-only"),
        }
    }
}

/// Requested signer, before it is resolved against a node
#[derive(Debug, Clone)]
pub enum SignerConfig {
    LocalKey(PrivateKeySigner),
    NodeAccount(usize),
    ReadOnly,
}

impl SignerConfig {
    /// Parse a hex private key (with or without `0x`)
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()
            .context("invalid private key")?;
        Ok(SignerConfig::LocalKey(signer))
    }

    /// The local signer, if any, for building the provider's wallet
    pub fn local_signer(&self) -> Option<PrivateKeySigner> {
        match self {
            SignerConfig::LocalKey(signer) => Some(signer.clone()),
            _ => None,
        }
    }
}

/// Connected wallet state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub chain_id: u64,
    pub balance: Option<U256>,
    pub signer: SignerKind,
}

impl Session {
    /// Resolve a signer against the node the provider is connected to
    pub async fn establish(provider: &dyn EthereumProvider, signer: &SignerConfig) -> Result<Self> {
        let chain_id = provider.chain_id().await.context("eth_chainId failed")?;

        let (address, kind) = match signer {
            SignerConfig::LocalKey(key) => (Some(key.address()), SignerKind::LocalKey),
            SignerConfig::NodeAccount(index) => {
                let accounts = provider.accounts().await.context("eth_accounts failed")?;
                let Some(address) = accounts.get(*index).copied() else {
                    bail!(
                        "node account #{} not available ({} unlocked)",
                        index,
                        accounts.len()
                    );
                };
                (Some(address), SignerKind::NodeAccount(*index))
            }
            SignerConfig::ReadOnly => (None, SignerKind::ReadOnly),
        };

        let balance = match address {
            Some(address) => provider.get_balance(address).await.ok(),
            None => None,
        };

        Ok(Self {
            address,
            chain_id,
            balance,
            signer: kind,
        })
    }

    pub fn can_sign(&self) -> bool {
        self.address.is_some() && self.signer != SignerKind::ReadOnly
    }
}
