//! Module for building, signing and sending transfer transactions.
//!
//! Transactions are filled explicitly (pending nonce, fees, the given gas limit), signed locally
//! with the sender's wallet and sent raw. Nothing waits for receipts.

use ethers::abi::AbiEncode;
use ethers::providers::Middleware;
use ethers::signers::{LocalWallet, Signer, WalletError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    BlockId, BlockNumber, Bytes, Eip1559TransactionRequest, TransactionRequest, TxHash, H160,
    U256,
};
use std::sync::Arc;
use tracing::instrument;

use super::abi::TransferCall;
use crate::error::TransactionError;
use crate::types::{Asset, Transfer};

/// Destination, value and calldata of the transaction carrying `transfer`.
pub fn call_parts(transfer: &Transfer) -> (H160, U256, Option<Bytes>) {
    match transfer.asset {
        Asset::Native => (transfer.to, transfer.amount, None),
        Asset::Erc20 { contract } => {
            let calldata = TransferCall {
                to: transfer.to,
                amount: transfer.amount,
            }
            .encode();
            (contract, U256::zero(), Some(calldata.into()))
        }
    }
}

/// Unsigned request used for gas estimation.
pub fn estimation_request(transfer: &Transfer) -> TypedTransaction {
    let (to, value, data) = call_parts(transfer);
    let mut request = TransactionRequest::new().from(transfer.from).to(to).value(value);
    if let Some(data) = data {
        request = request.data(data);
    }
    request.into()
}

/// Fills a transaction for `transfer` with the pending nonce, current fees and `gas_limit`.
///
/// EIP-1559 fees are used when the node can estimate them; otherwise a legacy transaction
/// priced at `eth_gasPrice` is built.
///
/// # Errors
///
/// This function returns an error if the nonce or both fee queries fail.
#[instrument(skip(middleware))]
pub async fn fill_transfer_transaction<M: Middleware>(
    transfer: &Transfer,
    gas_limit: U256,
    chain_id: u64,
    middleware: Arc<M>,
) -> Result<TypedTransaction, TransactionError<M>> {
    let (to, value, data) = call_parts(transfer);

    let nonce = middleware
        .get_transaction_count(transfer.from, Some(BlockId::Number(BlockNumber::Pending)))
        .await
        .map_err(TransactionError::MiddlewareError)?;

    let tx: TypedTransaction = match middleware.estimate_eip1559_fees(None).await {
        Ok((max_fee_per_gas, max_priority_fee_per_gas)) => {
            tracing::debug!(
                ?max_fee_per_gas,
                ?max_priority_fee_per_gas,
                "Estimated gas fees"
            );
            let mut request = Eip1559TransactionRequest::new()
                .to(to)
                .from(transfer.from)
                .value(value)
                .nonce(nonce)
                .gas(gas_limit)
                .chain_id(chain_id)
                .max_fee_per_gas(max_fee_per_gas)
                .max_priority_fee_per_gas(max_priority_fee_per_gas);
            if let Some(data) = data {
                request = request.data(data);
            }
            request.into()
        }
        Err(err) => {
            tracing::debug!(%err, "EIP-1559 fees unavailable, using legacy gas price");
            let gas_price = middleware
                .get_gas_price()
                .await
                .map_err(TransactionError::MiddlewareError)?;
            let mut request = TransactionRequest::new()
                .to(to)
                .from(transfer.from)
                .value(value)
                .nonce(nonce)
                .gas(gas_limit)
                .gas_price(gas_price)
                .chain_id(chain_id);
            if let Some(data) = data {
                request = request.data(data);
            }
            request.into()
        }
    };

    Ok(tx)
}

/// Signs and sends a transaction, returning its hash once the node accepted it.
///
/// # Errors
///
/// This function returns an error if signing or sending fails. A node rejection mentioning
/// insufficient funds is reported as `TransactionError::InsufficientWalletFunds`.
#[instrument(skip(tx, wallet, middleware), fields(from = ?wallet.address()))]
pub async fn sign_and_send_transaction<M: Middleware>(
    tx: TypedTransaction,
    wallet: &LocalWallet,
    middleware: Arc<M>,
) -> Result<TxHash, TransactionError<M>> {
    tracing::debug!("Signing tx");
    let signed_tx = raw_signed_transaction(&tx, wallet)?;
    tracing::debug!("Sending tx");
    match middleware.send_raw_transaction(signed_tx).await {
        Ok(pending_tx) => {
            let tx_hash = pending_tx.tx_hash();
            tracing::info!(?tx_hash, "Pending tx");
            Ok(tx_hash)
        }
        Err(err) => {
            if err.to_string().contains("insufficient funds") {
                tracing::warn!("Insufficient funds");
                return Err(TransactionError::InsufficientWalletFunds);
            }
            Err(TransactionError::MiddlewareError(err))
        }
    }
}

/// RLP encoding of `tx` signed by `wallet`.
pub fn raw_signed_transaction(
    tx: &TypedTransaction,
    wallet: &LocalWallet,
) -> Result<Bytes, WalletError> {
    Ok(tx.rlp_signed(&wallet.sign_transaction_sync(tx)?))
}
