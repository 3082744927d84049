use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use transfer_dispatcher::config::{pharos_usdt, NATIVE_SYMBOL};
use transfer_dispatcher::{Asset, ConfigError, RecipientAddress};

#[derive(Parser, Debug)]
#[command(version)]
#[command(about = "Pharos testnet batch transfer utility")]
#[command(
    long_about = "Sends PHRS or ERC-20 tokens from the keys in a key file to the addresses in a \
    recipient file. Recipients are assigned to senders round-robin and every transaction is \
    submitted one after another through the first responsive Pharos RPC endpoint."
)]
pub struct Args {
    /// RPC endpoint tried before PHAROS_RPC and the built-in default
    #[clap(long)]
    pub rpc: Option<String>,

    /// File with one 0x-prefixed private key per line
    #[clap(long, default_value = "pk.txt")]
    pub pk_file: PathBuf,

    /// File with one recipient address per line
    #[clap(long, default_value = "wallet.txt")]
    pub wallet_file: PathBuf,

    /// Asset to send
    #[clap(long, value_enum, default_value_t = AssetKind::Native)]
    pub asset: AssetKind,

    /// Custom ERC-20 contract; overrides --asset
    #[clap(long)]
    pub token: Option<String>,

    /// Amount per transaction, asked interactively when omitted
    #[clap(long)]
    pub amount: Option<String>,

    /// Transactions per recipient, asked interactively when omitted
    #[clap(long)]
    pub tx_count: Option<String>,

    /// Delay after every transaction and every recipient, in milliseconds
    #[clap(long, default_value = "300")]
    pub pacing_ms: u64,

    /// Timeout for probing one RPC endpoint, in seconds
    #[clap(long, default_value = "5")]
    pub probe_timeout_secs: u64,

    /// Do not query sender balances before sending
    #[clap(long)]
    pub skip_balance_check: bool,

    /// Skip the confirmation prompt and use defaults for missing answers
    #[clap(short, long)]
    pub yes: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// Native PHRS
    Native,
    /// Pharos testnet USDT
    Usdt,
}

/// The asset to send and how to talk about it before its metadata is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetChoice {
    pub asset: Asset,
    pub label: String,
    pub symbol_fallback: String,
    pub default_amount: &'static str,
}

impl Args {
    pub fn asset_choice(&self) -> Result<AssetChoice, ConfigError> {
        if let Some(token) = &self.token {
            let contract: RecipientAddress = token.trim().parse()?;
            return Ok(AssetChoice {
                asset: Asset::Erc20 {
                    contract: contract.address(),
                },
                label: format!("token {contract}"),
                symbol_fallback: "TOKEN".to_string(),
                default_amount: "1",
            });
        }
        Ok(match self.asset {
            AssetKind::Native => AssetChoice {
                asset: Asset::Native,
                label: NATIVE_SYMBOL.to_string(),
                symbol_fallback: NATIVE_SYMBOL.to_string(),
                default_amount: "0.0001",
            },
            AssetKind::Usdt => AssetChoice {
                asset: Asset::Erc20 {
                    contract: pharos_usdt(),
                },
                label: "USDT".to_string(),
                symbol_fallback: "USDT".to_string(),
                default_amount: "1",
            },
        })
    }
}
