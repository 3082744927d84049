use std::fmt;
use std::str::FromStr;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use ethers::utils::to_checksum;

use crate::config::{ERC20_GAS_FALLBACK, NATIVE_GAS_FALLBACK};
use crate::error::ConfigError;

/// A sender's secret key.
///
/// Parsed from `0x` followed by 64 hex characters. The key is only ever held in memory and
/// neither `Debug` nor `Display` reveal it.
#[derive(Clone)]
pub struct Credential(LocalWallet);

impl Credential {
    /// The public address derived from the key.
    pub fn address(&self) -> Address {
        self.0.address()
    }

    /// A wallet for this key that signs for `chain_id`.
    pub fn wallet(&self, chain_id: u64) -> LocalWallet {
        self.0.clone().with_chain_id(chain_id)
    }
}

impl FromStr for Credential {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .ok_or(ConfigError::InvalidCredential)?;
        if digits.len() != 64 {
            return Err(ConfigError::InvalidCredential);
        }
        let bytes = hex::decode(digits).map_err(|_| ConfigError::InvalidCredential)?;
        let wallet = LocalWallet::from_bytes(&bytes).map_err(|_| ConfigError::InvalidCredential)?;
        Ok(Self(wallet))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential")
            .field(&checksummed(&self.address()))
            .finish()
    }
}

/// A validated destination address. Equality is on the address, not its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipientAddress(Address);

impl RecipientAddress {
    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<Address> for RecipientAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl FromStr for RecipientAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidAddress(s.to_string());
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let address = digits.parse::<Address>().map_err(|_| invalid())?;

        // Mixed case means the input carries an EIP-55 checksum, which must match.
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower && to_checksum(&address, None) != format!("0x{digits}") {
            return Err(invalid());
        }

        Ok(Self(address))
    }
}

impl fmt::Display for RecipientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&checksummed(&self.0))
    }
}

/// Full EIP-55 spelling of an address. `Address`'s own `Display` abbreviates.
pub fn checksummed(address: &Address) -> String {
    to_checksum(address, None)
}

/// What is being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    /// The chain's native coin, sent as transaction value.
    Native,
    /// An ERC-20 token, sent through `transfer(address,uint256)`.
    Erc20 { contract: Address },
}

impl Asset {
    /// Gas limit used when the node cannot estimate one.
    pub fn fallback_gas(&self) -> U256 {
        match self {
            Asset::Native => U256::from(NATIVE_GAS_FALLBACK),
            Asset::Erc20 { .. } => U256::from(ERC20_GAS_FALLBACK),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub symbol: String,
    pub decimals: u8,
}

/// One transfer as handed to the chain client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub asset: Asset,
    pub from: Address,
    pub to: Address,
    /// Amount in base units of the asset.
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasSource {
    Estimated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Submitted {
        tx_hash: TxHash,
        gas_limit: U256,
        gas_source: GasSource,
    },
    Failed(crate::error::ChainError),
}

/// The recorded result of one attempted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub recipient: Address,
    /// Zero-based position of the recipient in the input list.
    pub position: usize,
    pub signer: Address,
    /// One-based attempt index for this recipient.
    pub attempt: u32,
    pub status: OutcomeStatus,
}

impl TransferOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Submitted { .. })
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self.status {
            OutcomeStatus::Submitted { tx_hash, .. } => Some(tx_hash),
            OutcomeStatus::Failed(_) => None,
        }
    }
}
