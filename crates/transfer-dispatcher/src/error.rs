use ethers::providers::{Middleware, ProviderError};
use ethers::signers::WalletError;
use thiserror::Error;

use crate::run::RunState;

/// Invalid run inputs. Always raised before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is empty or has no valid entries")]
    EmptyInput(String),

    #[error("invalid private key (expected 0x + 64 hex characters)")]
    InvalidCredential,

    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("amount must be a decimal number: {0}")]
    InvalidAmount(String),

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("transactions per recipient must be an integer >= 1, got {0:?}")]
    InvalidTransactionCount(String),

    #[error("no endpoint candidates configured")]
    NoEndpointCandidates,

    #[error("amount {amount} is below the precision of the asset ({decimals} decimals)")]
    AmountBelowPrecision { amount: String, decimals: u8 },
}

/// Fatal errors. Any of these ends the run before (or instead of) dispatching.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no valid credentials")]
    NoValidCredentials,

    #[error("no valid recipients")]
    NoValidRecipients,

    #[error("no responsive endpoint among {attempted} candidate(s); set PHAROS_RPC or pass --rpc <url>")]
    NoResponsiveEndpoint { attempted: usize },

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("failed to read asset metadata: {0}")]
    AssetMetadata(ChainError),

    #[error("run already executed (state {state:?})")]
    AlreadyExecuted { state: RunState },
}

/// Why a single endpoint candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("timed out")]
    Timeout,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Per-transaction failure. Recorded in the outcome, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("gas estimation failed: {0}")]
    Estimation(String),

    #[error("Wallet has insufficient funds")]
    InsufficientFunds,

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("contract call failed: {0}")]
    Contract(String),
}

#[derive(Error, Debug)]
pub enum TransactionError<M>
where
    M: Middleware,
{
    #[error("Middleware error")]
    MiddlewareError(<M as Middleware>::Error),
    #[error("Provider error")]
    ProviderError(#[from] ProviderError),
    #[error("Wallet error")]
    WalletError(#[from] WalletError),
    #[error("Wallet has insufficient funds")]
    InsufficientWalletFunds,
}

impl<M: Middleware> From<TransactionError<M>> for ChainError {
    fn from(err: TransactionError<M>) -> Self {
        match err {
            TransactionError::MiddlewareError(e) => ChainError::Rejected(e.to_string()),
            TransactionError::ProviderError(e) => ChainError::Provider(e.to_string()),
            TransactionError::WalletError(e) => ChainError::Signing(e.to_string()),
            TransactionError::InsufficientWalletFunds => ChainError::InsufficientFunds,
        }
    }
}
