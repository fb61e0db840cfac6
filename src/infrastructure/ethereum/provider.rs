//! Ethereum provider abstraction and Alloy implementation

use std::path::PathBuf;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockId, BlockNumberOrTag, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::domain::BlockTag;

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Check if this is a WebSocket endpoint
    pub fn is_websocket(&self) -> bool {
        matches!(self, ProviderConfig::WebSocket(_))
    }

    /// Classify an endpoint string by its scheme
    ///
    /// `ws://`/`wss://` are WebSocket, `.ipc` files and absolute paths are IPC
    /// on Unix, anything else is HTTP (`http://` added when missing).
    pub fn parse(endpoint: &str) -> Self {
        let trimmed = endpoint.trim();
        if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
            return ProviderConfig::WebSocket(trimmed.to_string());
        }
        #[cfg(unix)]
        {
            let is_path = trimmed.ends_with(".ipc") || trimmed.starts_with('/') || trimmed.starts_with("~/");
            if let Some(path) = crate::config::expand_path(trimmed).filter(|_| is_path) {
                return ProviderConfig::Ipc(path);
            }
        }
        ProviderConfig::Http(normalize_http_endpoint(trimmed))
    }
}

fn normalize_http_endpoint(endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

/// Mined transaction outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptOutcome {
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Abstract Ethereum provider trait
///
/// This trait defines all the operations the dashboard needs,
/// abstracting over the specific Alloy transport.
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Chain id reported by the node
    async fn chain_id(&self) -> Result<u64>;

    /// Get the current block number
    async fn block_number(&self) -> Result<u64>;

    /// Accounts unlocked on the node
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Get account balance
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Deployed bytecode at an address (empty when nothing is deployed)
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Node gas price in wei
    async fn gas_price(&self) -> Result<u128>;

    /// Execute a call (eth_call) against the given block
    async fn call(&self, request: TransactionRequest, block: BlockTag) -> Result<Bytes>;

    /// Submit a transaction, returning its hash
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Receipt of a mined transaction, `None` while pending
    async fn get_receipt(&self, hash: B256) -> Result<Option<ReceiptOutcome>>;

    /// Subscribe to new block numbers (for WebSocket and IPC)
    async fn subscribe_heads(&self) -> Result<mpsc::Receiver<u64>>;

    /// Check if subscriptions are supported
    fn supports_subscriptions(&self) -> bool;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

/// Alloy-backed provider over any transport
pub struct AlloyProvider {
    provider: DynProvider,
    config: ProviderConfig,
}

// Attach the same builder to whichever transport the config names
macro_rules! connect_transport {
    ($builder:expr, $config:expr) => {
        match $config {
            ProviderConfig::Http(url) => {
                let rpc_url = url.parse().context("Invalid HTTP URL")?;
                $builder.connect_http(rpc_url).erased()
            }
            ProviderConfig::WebSocket(url) => $builder
                .connect(url)
                .await
                .context("Failed to create WebSocket provider")?
                .erased(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => {
                use alloy::providers::IpcConnect;
                let ipc = IpcConnect::new(path.to_string_lossy().to_string());
                $builder
                    .connect_ipc(ipc)
                    .await
                    .context("Failed to create IPC provider")?
                    .erased()
            }
        }
    };
}

/// Create a provider from configuration
///
/// With a local signer every transaction is signed in-process; without one,
/// `eth_sendTransaction` leaves signing to the node.
pub async fn create_provider(
    config: ProviderConfig,
    signer: Option<PrivateKeySigner>,
) -> Result<Box<dyn EthereumProvider>> {
    let provider = match signer {
        Some(signer) => {
            connect_transport!(
                ProviderBuilder::new().wallet(EthereumWallet::from(signer)),
                &config
            )
        }
        None => connect_transport!(ProviderBuilder::new(), &config),
    };
    Ok(Box::new(AlloyProvider { provider, config }))
}

fn block_id(tag: BlockTag) -> BlockId {
    match tag {
        BlockTag::Latest => BlockId::Number(BlockNumberOrTag::Latest),
        BlockTag::Number(number) => BlockId::Number(BlockNumberOrTag::Number(number)),
    }
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.provider.get_accounts().await?)
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address).await?)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        Ok(self.provider.get_code_at(address).await?)
    }

    async fn gas_price(&self) -> Result<u128> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn call(&self, request: TransactionRequest, block: BlockTag) -> Result<Bytes> {
        Ok(self.provider.call(request).block(block_id(block)).await?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = self.provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: B256) -> Result<Option<ReceiptOutcome>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|receipt| ReceiptOutcome {
            success: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }))
    }

    async fn subscribe_heads(&self) -> Result<mpsc::Receiver<u64>> {
        let (tx, rx) = mpsc::channel(100);
        if !self.supports_subscriptions() {
            // HTTP doesn't support subscriptions, return immediately closed channel
            return Ok(rx);
        }

        let sub = self.provider.subscribe_blocks().await?;
        tokio::spawn(async move {
            let mut stream = sub.into_stream();
            while let Some(header) = stream.next().await {
                if tx.send(header.number).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }

    fn supports_subscriptions(&self) -> bool {
        match self.config {
            ProviderConfig::Http(_) => false,
            ProviderConfig::WebSocket(_) => true,
            #[cfg(unix)]
            ProviderConfig::Ipc(_) => true,
        }
    }

    fn endpoint_name(&self) -> String {
        self.config.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_mapping() {
        assert_eq!(
            block_id(BlockTag::Latest),
            BlockId::Number(BlockNumberOrTag::Latest)
        );
        assert_eq!(
            block_id(BlockTag::Number(7)),
            BlockId::Number(BlockNumberOrTag::Number(7))
        );
    }

    #[test]
    fn test_config_display() {
        let http = ProviderConfig::Http("https://rpc-mainnet.kcc.network".to_string());
        assert_eq!(http.display(), "https://rpc-mainnet.kcc.network");
        assert!(!http.is_websocket());
        assert!(ProviderConfig::WebSocket("ws://localhost:8546".to_string()).is_websocket());
    }

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(
            ProviderConfig::parse("localhost:8545"),
            ProviderConfig::Http("http://localhost:8545".to_string())
        );
        assert_eq!(
            ProviderConfig::parse(" wss://rpc-ws-mainnet.kcc.network "),
            ProviderConfig::WebSocket("wss://rpc-ws-mainnet.kcc.network".to_string())
        );
        #[cfg(unix)]
        {
            assert_eq!(
                ProviderConfig::parse("/tmp/geth.ipc"),
                ProviderConfig::Ipc(PathBuf::from("/tmp/geth.ipc"))
            );
        }
    }
}
