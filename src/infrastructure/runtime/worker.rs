//! Async worker - runs in Tokio runtime and handles RPC operations

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};
use alloy_dyn_abi::DynSolValue;
use anyhow::{Context, Result};
use tokio::time::interval;

use crate::domain::compound::CompoundRead;
use crate::domain::BlockTag;
use crate::infrastructure::abi::{DeploymentScanner, ScanRequest};
use crate::infrastructure::ethereum::{
    create_provider, BoundContract, EthereumProvider, ProviderConfig, ReceiptOutcome, Session,
    SignerConfig, WriteOptions,
};
use crate::infrastructure::runtime::bridge::{Epoch, PanelId, RuntimeCommand, RuntimeEvent};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
const RECEIPT_POLL_ATTEMPTS: u32 = 120;

/// Live connection state owned by the worker loop
struct Connection {
    epoch: Epoch,
    provider: Arc<dyn EthereumProvider>,
    session: Session,
    contract: Option<BoundContract>,
    heads: Option<tokio::sync::mpsc::Receiver<u64>>,
    last_block: Option<u64>,
}

/// Run the async worker loop
pub async fn run_async_worker(
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let mut connection: Option<Connection> = None;

    // Polling interval for HTTP endpoints
    let mut poll_interval = interval(Duration::from_millis(500));

    loop {
        // Process commands (non-blocking)
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                RuntimeCommand::Shutdown => return Ok(()),

                RuntimeCommand::Connect {
                    epoch,
                    endpoint,
                    signer,
                    scan,
                    block,
                } => {
                    connection = None;
                    let endpoint_name = endpoint.display();
                    match connect(epoch, endpoint, signer, scan, block, &evt_tx).await {
                        Ok(conn) => connection = Some(conn),
                        Err(err) => {
                            tracing::error!(endpoint = %endpoint_name, "connection failed: {err:#}");
                            let _ = evt_tx.send(RuntimeEvent::Error {
                                message: format!("Connection failed ({}): {:#}", endpoint_name, err),
                            });
                        }
                    }
                }

                RuntimeCommand::Disconnect { epoch } => {
                    connection = None;
                    tracing::info!("disconnected");
                    let _ = evt_tx.send(RuntimeEvent::Disconnected { epoch });
                }

                RuntimeCommand::SetBlock { epoch, block } => {
                    if let Some(conn) = connection.as_mut() {
                        conn.epoch = epoch;
                        conn.contract = conn.contract.as_ref().map(|c| c.with_block(block));
                        tracing::info!(block = %block, "block tag changed");
                    }
                }

                RuntimeCommand::Read {
                    epoch,
                    panel,
                    function,
                    args,
                } => match bound(&connection) {
                    Some(contract) => {
                        let evt_tx = evt_tx.clone();
                        tokio::spawn(async move {
                            let outcome = contract
                                .call(&function, &args)
                                .await
                                .map_err(|err| format!("{err:#}"));
                            let _ = evt_tx.send(RuntimeEvent::ReadDone {
                                epoch,
                                panel,
                                function,
                                outcome,
                            });
                        });
                    }
                    None => {
                        let _ = evt_tx.send(RuntimeEvent::ReadDone {
                            epoch,
                            panel,
                            function,
                            outcome: Err("no contract bound".to_string()),
                        });
                    }
                },

                RuntimeCommand::Compound {
                    epoch,
                    panel,
                    read,
                    args,
                } => match bound(&connection) {
                    Some(contract) => {
                        let evt_tx = evt_tx.clone();
                        tokio::spawn(async move {
                            run_compound(contract, epoch, panel, read, args, evt_tx).await;
                        });
                    }
                    None => {
                        let _ = evt_tx.send(RuntimeEvent::CompoundDone {
                            epoch,
                            panel,
                            name: read.name,
                            outcome: Err("no contract bound".to_string()),
                        });
                    }
                },

                RuntimeCommand::Write {
                    epoch,
                    panel,
                    function,
                    args,
                    value,
                    gas_price,
                } => {
                    let Some(conn) = connection.as_ref() else {
                        let _ = evt_tx.send(RuntimeEvent::TxFailed {
                            epoch,
                            panel,
                            function,
                            message: "not connected".to_string(),
                        });
                        continue;
                    };
                    let (Some(contract), Some(from)) =
                        (conn.contract.clone(), signing_address(&conn.session))
                    else {
                        let _ = evt_tx.send(RuntimeEvent::TxFailed {
                            epoch,
                            panel,
                            function,
                            message: "no signer or no contract bound".to_string(),
                        });
                        continue;
                    };
                    let provider = Arc::clone(&conn.provider);
                    let evt_tx = evt_tx.clone();
                    tokio::spawn(async move {
                        let write = PendingWrite {
                            epoch,
                            panel,
                            function,
                            args,
                            options: WriteOptions {
                                from: Some(from),
                                value,
                                gas_price,
                            },
                        };
                        run_write(provider, contract, write, evt_tx).await;
                    });
                }

                RuntimeCommand::RefreshBalance { epoch } => {
                    if let Some(conn) = connection.as_ref() {
                        if let Some(address) = conn.session.address {
                            let provider = Arc::clone(&conn.provider);
                            let evt_tx = evt_tx.clone();
                            tokio::spawn(async move {
                                send_balance(provider.as_ref(), address, epoch, &evt_tx).await;
                            });
                        }
                    }
                }
            }
        }

        // Check for new blocks
        if let Some(conn) = connection.as_mut() {
            if let Some(heads) = conn.heads.as_mut() {
                while let Ok(number) = heads.try_recv() {
                    conn.last_block = Some(number);
                    let _ = evt_tx.send(RuntimeEvent::NewBlock {
                        epoch: conn.epoch,
                        number,
                    });
                }
            }

            // Fall back to polling for HTTP endpoints
            if !conn.provider.supports_subscriptions() {
                poll_interval.tick().await;
                match conn.provider.block_number().await {
                    Ok(head) if Some(head) != conn.last_block => {
                        conn.last_block = Some(head);
                        let _ = evt_tx.send(RuntimeEvent::NewBlock {
                            epoch: conn.epoch,
                            number: head,
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!("block poll failed: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("RPC error: {:#}", err),
                        });
                    }
                }
            }
        }

        // Small yield to prevent busy loop
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Connect to an endpoint, resolve the session and bind the contract
async fn connect(
    epoch: Epoch,
    endpoint: ProviderConfig,
    signer: SignerConfig,
    mut scan: ScanRequest,
    block: BlockTag,
    evt_tx: &Sender<RuntimeEvent>,
) -> Result<Connection> {
    let provider: Arc<dyn EthereumProvider> =
        Arc::from(create_provider(endpoint, signer.local_signer()).await?);

    let session = Session::establish(provider.as_ref(), &signer).await?;
    tracing::info!(
        endpoint = %provider.endpoint_name(),
        chain_id = session.chain_id,
        signer = %session.signer,
        "session established"
    );
    let _ = evt_tx.send(RuntimeEvent::SessionChanged {
        epoch,
        endpoint: provider.endpoint_name(),
        session: session.clone(),
    });

    // The node decides which chain's deployment applies
    scan.chain_id = session.chain_id;
    let report = tokio::task::spawn_blocking(move || DeploymentScanner::resolve(&scan))
        .await
        .context("deployment scan panicked")?;
    for error in &report.errors {
        tracing::warn!("deployment scan: {error}");
    }

    let mut contract = None;
    let mut deployed = false;
    match report.contract.clone() {
        Some(descriptor) => {
            match BoundContract::new(Arc::clone(&provider), Arc::new(descriptor), block) {
                Ok(bound) => {
                    deployed = match bound.is_deployed().await {
                        Ok(deployed) => deployed,
                        Err(err) => {
                            tracing::warn!("eth_getCode failed: {err:#}");
                            false
                        }
                    };
                    tracing::info!(
                        contract = %bound.descriptor().name,
                        address = %bound.address(),
                        deployed,
                        "contract bound"
                    );
                    if deployed {
                        contract = Some(bound);
                    }
                }
                Err(err) => tracing::warn!("cannot bind contract: {err:#}"),
            }
        }
        None => tracing::info!("no deployment found for chain {}", session.chain_id),
    }

    let _ = evt_tx.send(RuntimeEvent::ContractLoaded {
        epoch,
        contract: report.contract,
        deployed,
        errors: report.errors,
    });

    // Set up head subscription if supported
    let heads = if provider.supports_subscriptions() {
        Some(provider.subscribe_heads().await?)
    } else {
        None
    };

    Ok(Connection {
        epoch,
        provider,
        session,
        contract,
        heads,
        last_block: None,
    })
}

fn bound(connection: &Option<Connection>) -> Option<BoundContract> {
    connection.as_ref().and_then(|conn| conn.contract.clone())
}

fn signing_address(session: &Session) -> Option<Address> {
    if session.can_sign() {
        session.address
    } else {
        None
    }
}

async fn run_compound(
    contract: BoundContract,
    epoch: Epoch,
    panel: PanelId,
    read: CompoundRead,
    args: Vec<DynSolValue>,
    evt_tx: Sender<RuntimeEvent>,
) {
    let outcome = read
        .run(&contract, &args)
        .await
        .map_err(|err| err.to_string());
    let _ = evt_tx.send(RuntimeEvent::CompoundDone {
        epoch,
        panel,
        name: read.name,
        outcome,
    });
}

struct PendingWrite {
    epoch: Epoch,
    panel: PanelId,
    function: String,
    args: Vec<DynSolValue>,
    options: WriteOptions,
}

/// Send a transaction, then wait for its receipt
async fn run_write(
    provider: Arc<dyn EthereumProvider>,
    contract: BoundContract,
    mut write: PendingWrite,
    evt_tx: Sender<RuntimeEvent>,
) {
    let (epoch, panel) = (write.epoch, write.panel);
    let fail = |function: String, err: anyhow::Error| {
        tracing::warn!(function = %function, "transaction failed: {err:#}");
        let _ = evt_tx.send(RuntimeEvent::TxFailed {
            epoch,
            panel,
            function,
            message: format!("{err:#}"),
        });
    };

    // Gas price from the node when none was supplied
    if write.options.gas_price.is_none() {
        match provider.gas_price().await {
            Ok(price) => write.options.gas_price = Some(price),
            Err(err) => return fail(write.function, err),
        }
    }

    let hash = match contract.send(&write.function, &write.args, write.options).await {
        Ok(hash) => hash,
        Err(err) => return fail(write.function, err),
    };
    let _ = evt_tx.send(RuntimeEvent::TxSubmitted {
        epoch,
        panel,
        function: write.function.clone(),
        hash: format!("{hash:#x}"),
    });

    match wait_for_receipt(provider.as_ref(), hash).await {
        Ok(outcome) => {
            tracing::info!(
                function = %write.function,
                hash = %hash,
                success = outcome.success,
                "transaction mined"
            );
            let _ = evt_tx.send(RuntimeEvent::TxMined {
                epoch,
                panel,
                function: write.function,
                hash: format!("{hash:#x}"),
                outcome,
            });
            if let Some(from) = write.options.from {
                send_balance(provider.as_ref(), from, epoch, &evt_tx).await;
            }
        }
        Err(err) => fail(write.function, err),
    }
}

async fn wait_for_receipt(provider: &dyn EthereumProvider, hash: B256) -> Result<ReceiptOutcome> {
    for _ in 0..RECEIPT_POLL_ATTEMPTS {
        if let Some(outcome) = provider.get_receipt(hash).await? {
            return Ok(outcome);
        }
        tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
    }
    anyhow::bail!("no receipt for {hash:#x} after {RECEIPT_POLL_ATTEMPTS} attempts")
}

async fn send_balance(
    provider: &dyn EthereumProvider,
    address: Address,
    epoch: Epoch,
    evt_tx: &Sender<RuntimeEvent>,
) {
    match provider.get_balance(address).await {
        Ok(balance) => {
            let _ = evt_tx.send(RuntimeEvent::BalanceReady { epoch, balance });
        }
        Err(err) => tracing::warn!("balance fetch failed: {err:#}"),
    }
}
