use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::{Address, TxHash, U256};
use tracing::instrument;

use super::abi::Erc20;
use super::transaction::{estimation_request, fill_transfer_transaction, sign_and_send_transaction};
use super::{ChainClient, Connect};
use crate::config::{NATIVE_DECIMALS, NATIVE_SYMBOL};
use crate::endpoint::Endpoint;
use crate::error::{ChainError, DispatchError};
use crate::signer::SignerIdentity;
use crate::types::{Asset, AssetMetadata, Transfer};

/// [`ChainClient`] over an ethers middleware.
#[derive(Debug)]
pub struct EthClient<M> {
    middleware: Arc<M>,
}

impl<M> Clone for EthClient<M> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
        }
    }
}

impl<M: Middleware + 'static> EthClient<M> {
    pub fn new(middleware: Arc<M>) -> Self {
        Self { middleware }
    }

    fn erc20(&self, contract: Address) -> Erc20<M> {
        Erc20::new(contract, self.middleware.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for EthClient<M> {
    async fn asset_metadata(
        &self,
        asset: &Asset,
        symbol_fallback: &str,
    ) -> Result<AssetMetadata, ChainError> {
        match asset {
            Asset::Native => Ok(AssetMetadata {
                symbol: NATIVE_SYMBOL.to_string(),
                decimals: NATIVE_DECIMALS,
            }),
            Asset::Erc20 { contract } => {
                let token = self.erc20(*contract);
                let decimals = token
                    .decimals()
                    .call()
                    .await
                    .map_err(|e| ChainError::Contract(e.to_string()))?;
                let symbol = match token.symbol().call().await {
                    Ok(symbol) => symbol,
                    Err(err) => {
                        tracing::debug!(%err, "symbol() failed, using fallback");
                        symbol_fallback.to_string()
                    }
                };
                Ok(AssetMetadata { symbol, decimals })
            }
        }
    }

    async fn balance(&self, asset: &Asset, owner: Address) -> Result<U256, ChainError> {
        match asset {
            Asset::Native => self
                .middleware
                .get_balance(owner, None)
                .await
                .map_err(|e| ChainError::Provider(e.to_string())),
            Asset::Erc20 { contract } => self
                .erc20(*contract)
                .balance_of(owner)
                .call()
                .await
                .map_err(|e| ChainError::Contract(e.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn estimate_gas(&self, transfer: &Transfer) -> Result<U256, ChainError> {
        let request = estimation_request(transfer);
        self.middleware
            .estimate_gas(&request, None)
            .await
            .map_err(|e| ChainError::Estimation(e.to_string()))
    }

    #[instrument(skip(self, signer))]
    async fn submit(
        &self,
        signer: &SignerIdentity,
        transfer: &Transfer,
        gas_limit: U256,
    ) -> Result<TxHash, ChainError> {
        let tx = fill_transfer_transaction(
            transfer,
            gas_limit,
            signer.chain_id(),
            self.middleware.clone(),
        )
        .await?;
        let tx_hash = sign_and_send_transaction(tx, signer.wallet(), self.middleware.clone()).await?;
        Ok(tx_hash)
    }
}

/// Connects an [`EthClient`] over HTTP.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connect for HttpConnector {
    type Client = EthClient<Provider<Http>>;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, DispatchError> {
        let provider =
            Provider::<Http>::try_from(endpoint.url.as_str()).map_err(|e| DispatchError::Connect {
                url: endpoint.url.clone(),
                reason: e.to_string(),
            })?;
        Ok(EthClient::new(Arc::new(provider)))
    }
}
