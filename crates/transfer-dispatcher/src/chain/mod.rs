//! Access to the chain behind the selected endpoint.
//!
//! The dispatcher only talks to the chain through [`ChainClient`], so the transfer loop can be
//! exercised without a node. [`EthClient`] is the ethers implementation.

pub mod abi;
pub mod client;
pub mod transaction;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};

use crate::endpoint::Endpoint;
use crate::error::{ChainError, DispatchError};
use crate::signer::SignerIdentity;
use crate::types::{Asset, AssetMetadata, Transfer};

pub use client::{EthClient, HttpConnector};

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Symbol and decimals of `asset`.
    async fn asset_metadata(
        &self,
        asset: &Asset,
        symbol_fallback: &str,
    ) -> Result<AssetMetadata, ChainError>;

    /// Balance of `owner` in base units of `asset`.
    async fn balance(&self, asset: &Asset, owner: Address) -> Result<U256, ChainError>;

    /// Gas needed by `transfer`.
    async fn estimate_gas(&self, transfer: &Transfer) -> Result<U256, ChainError>;

    /// Signs `transfer` with `signer` and sends it with `gas_limit` as its ceiling. Returns as
    /// soon as the node accepted the transaction.
    async fn submit(
        &self,
        signer: &SignerIdentity,
        transfer: &Transfer,
        gas_limit: U256,
    ) -> Result<TxHash, ChainError>;
}

/// Opens a [`ChainClient`] on the selected endpoint.
pub trait Connect {
    type Client: ChainClient;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, DispatchError>;
}
