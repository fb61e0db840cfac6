//! The bound contract - descriptor, address and block tag on one provider

use std::sync::Arc;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy_dyn_abi::DynSolValue;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;

use super::EthereumProvider;
use crate::domain::abi::{AbiCodec, ContractDescriptor, FunctionDescriptor};
use crate::domain::compound::ContractReader;
use crate::domain::BlockTag;
use crate::infrastructure::abi::AlloyAbiCodec;

/// Transaction parameters supplied from outside the form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub from: Option<Address>,
    pub value: Option<U256>,
    pub gas_price: Option<u128>,
}

/// The contract the dashboard is bound to
///
/// Reads always observe `block`; writes never carry it.
#[derive(Clone)]
pub struct BoundContract {
    provider: Arc<dyn EthereumProvider>,
    descriptor: Arc<ContractDescriptor>,
    address: Address,
    block: BlockTag,
    codec: AlloyAbiCodec,
}

impl BoundContract {
    pub fn new(
        provider: Arc<dyn EthereumProvider>,
        descriptor: Arc<ContractDescriptor>,
        block: BlockTag,
    ) -> Result<Self> {
        let address = descriptor
            .address
            .parse::<Address>()
            .with_context(|| format!("invalid contract address '{}'", descriptor.address))?;
        Ok(Self {
            provider,
            descriptor,
            address,
            block,
            codec: AlloyAbiCodec::new(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn block(&self) -> BlockTag {
        self.block
    }

    /// Same contract, reads observing another block
    pub fn with_block(&self, block: BlockTag) -> Self {
        Self {
            block,
            ..self.clone()
        }
    }

    pub fn descriptor(&self) -> &ContractDescriptor {
        &self.descriptor
    }

    /// Whether any code lives at the contract address
    pub async fn is_deployed(&self) -> Result<bool> {
        let code = self.provider.get_code(self.address).await?;
        Ok(!code.is_empty())
    }

    fn function(&self, name: &str) -> Result<&FunctionDescriptor> {
        self.descriptor
            .function(name)
            .ok_or_else(|| anyhow!("{} has no function {}", self.descriptor.name, name))
    }

    /// `eth_call` a read-only function at the bound block tag
    pub async fn call(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        let function = self.function(name)?;
        let data = self.codec.encode_call(function, args)?;
        let request = TransactionRequest::default()
            .with_to(self.address)
            .with_input(Bytes::from(data));

        tracing::debug!(function = name, block = %self.block, "eth_call");
        let output = self
            .provider
            .call(request, self.block)
            .await
            .with_context(|| format!("{name} call failed"))?;
        self.codec.decode_output(function, &output)
    }

    /// Send a transaction invoking `name`, returning its hash
    pub async fn send(&self, name: &str, args: &[DynSolValue], options: WriteOptions) -> Result<B256> {
        let function = self.function(name)?;
        if options.value.is_some_and(|value| !value.is_zero()) && !function.is_payable() {
            bail!("{name} is not payable");
        }
        let data = self.codec.encode_call(function, args)?;

        let mut request = TransactionRequest::default()
            .with_to(self.address)
            .with_input(Bytes::from(data));
        if let Some(from) = options.from {
            request = request.with_from(from);
        }
        if let Some(value) = options.value {
            request = request.with_value(value);
        }
        if let Some(gas_price) = options.gas_price {
            request = request.with_gas_price(gas_price);
        }

        tracing::debug!(function = name, "eth_sendTransaction");
        self.provider
            .send_transaction(request)
            .await
            .with_context(|| format!("{name} transaction failed"))
    }
}

#[async_trait]
impl ContractReader for BoundContract {
    async fn read(&self, function: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        self.call(function, args).await
    }
}
