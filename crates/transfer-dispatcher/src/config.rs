use std::time::Duration;

use ethers::types::{Address, H160};

use crate::amount;
use crate::error::{ConfigError, DispatchError};
use crate::types::{Asset, Credential, RecipientAddress};

/// Chain id every accepted endpoint must report.
pub const PHAROS_CHAIN_ID: u64 = 688_688;
/// Endpoint used when neither `--rpc` nor `PHAROS_RPC` is set.
pub const DEFAULT_RPC_URL: &str = "https://testnet.dplabs-internal.com";
/// Environment variable holding the second endpoint candidate.
pub const RPC_ENV_VAR: &str = "PHAROS_RPC";
/// USDT token contract on the Pharos test network.
pub const PHAROS_USDT: &str = "0xD4071393f8716661958F766DF660033b3d35fD29";

pub const NATIVE_SYMBOL: &str = "PHRS";
pub const NATIVE_DECIMALS: u8 = 18;

pub const NATIVE_GAS_FALLBACK: u64 = 21_000;
pub const ERC20_GAS_FALLBACK: u64 = 70_000;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_PACING: Duration = Duration::from_millis(300);
pub const PREVIEW_LIMIT: usize = 10;

/// Ordered endpoint candidates, first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointCandidates(Vec<String>);

impl EndpointCandidates {
    /// Builds the list from an explicit override, the environment value and the default,
    /// in that priority. Blank and repeated entries are dropped.
    pub fn new(
        explicit: Option<String>,
        from_env: Option<String>,
        default: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_urls([explicit, from_env, default].into_iter().flatten())
    }

    pub fn from_urls<I, S>(urls: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for url in urls {
            let url = url.into().trim().to_string();
            if !url.is_empty() && !list.contains(&url) {
                list.push(url);
            }
        }
        if list.is_empty() {
            return Err(ConfigError::NoEndpointCandidates);
        }
        Ok(Self(list))
    }

    pub fn urls(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Amount per transaction and transactions per recipient for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferJob {
    amount: String,
    transactions_per_recipient: u32,
}

impl TransferJob {
    pub fn new(amount: &str, transactions_per_recipient: u32) -> Result<Self, ConfigError> {
        let amount = amount::validate(amount)?;
        if transactions_per_recipient == 0 {
            return Err(ConfigError::InvalidTransactionCount(
                transactions_per_recipient.to_string(),
            ));
        }
        Ok(Self {
            amount,
            transactions_per_recipient,
        })
    }

    /// Parses both values from text, as typed by an operator.
    pub fn parse(amount: &str, transactions_per_recipient: &str) -> Result<Self, ConfigError> {
        let count = transactions_per_recipient
            .trim()
            .parse::<u32>()
            .map_err(|_| {
                ConfigError::InvalidTransactionCount(transactions_per_recipient.to_string())
            })?;
        Self::new(amount, count)
    }

    /// The amount as the validated decimal text.
    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn transactions_per_recipient(&self) -> u32 {
        self.transactions_per_recipient
    }
}

/// Knobs of the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub pacing: Duration,
    pub check_balance: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            check_balance: true,
        }
    }
}

/// Everything a batch run needs, validated up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: Vec<Credential>,
    pub recipients: Vec<RecipientAddress>,
    pub job: TransferJob,
    pub asset: Asset,
    /// Symbol used for an ERC-20 token whose `symbol()` call fails.
    pub symbol_fallback: String,
    pub candidates: EndpointCandidates,
    pub required_chain_id: u64,
    pub probe_timeout: Duration,
    pub settings: DispatchSettings,
}

impl RunConfig {
    pub fn new(
        credentials: Vec<Credential>,
        recipients: Vec<RecipientAddress>,
        job: TransferJob,
        candidates: EndpointCandidates,
    ) -> Result<Self, DispatchError> {
        if credentials.is_empty() {
            return Err(DispatchError::NoValidCredentials);
        }
        if recipients.is_empty() {
            return Err(DispatchError::NoValidRecipients);
        }
        Ok(Self {
            credentials,
            recipients,
            job,
            asset: Asset::Native,
            symbol_fallback: "ERC20".to_string(),
            candidates,
            required_chain_id: PHAROS_CHAIN_ID,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            settings: DispatchSettings::default(),
        })
    }

    pub fn with_asset(mut self, asset: Asset, symbol_fallback: impl Into<String>) -> Self {
        self.asset = asset;
        self.symbol_fallback = symbol_fallback.into();
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

const PHAROS_USDT_BYTES: [u8; 20] = [
    0xd4, 0x07, 0x13, 0x93, 0xf8, 0x71, 0x66, 0x61, 0x95, 0x8f, 0x76, 0x6d, 0xf6, 0x60, 0x03, 0x3b,
    0x3d, 0x35, 0xfd, 0x29,
];

/// The Pharos USDT contract address, [`PHAROS_USDT`] as bytes.
pub fn pharos_usdt() -> Address {
    H160(PHAROS_USDT_BYTES)
}
