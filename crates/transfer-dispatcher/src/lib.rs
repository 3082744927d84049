//! Pharos Transfer Dispatcher Library
//!
//! This library sends batches of token transfers from a pool of sender keys to a list of
//! recipient addresses on the Pharos test network.
//!
//! # Overview
//!
//! The `transfer-dispatcher` library is designed to:
//! - Pick the first responsive JSON-RPC endpoint that reports the Pharos chain id.
//! - Bind every sender key to that endpoint and assign recipients to senders round-robin.
//! - Submit transfers strictly one after another, with gas estimation fallback and a pacing
//!   delay between submissions, recording the outcome of every attempt.
//!
//! # Modules
//!
//! - `endpoint`: Probes candidate endpoints and selects the live one.
//! - `signer`: Sender identities, the round-robin assignment function and the preview mapping.
//! - `dispatcher`: The sequential transfer loop.
//! - `run`: The whole batch run, from endpoint selection to the final report.
//! - `chain`: The `ChainClient` seam and its ethers implementation.

#![deny(unused_crate_dependencies)]

pub mod amount;
pub mod chain;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod pacing;
pub mod prompt;
pub mod run;
pub mod signer;
pub mod types;

pub use chain::{ChainClient, Connect, EthClient, HttpConnector};
pub use config::{DispatchSettings, EndpointCandidates, RunConfig, TransferJob};
pub use dispatcher::{DispatchEvent, DispatchReport, TransferDispatcher, TransferPlan};
pub use endpoint::{Endpoint, EndpointProbe, EndpointSelector, HttpProbe};
pub use error::{ChainError, ConfigError, DispatchError, ProbeError};
pub use pacing::{Pacer, TokioPacer};
pub use prompt::{AutoConfirm, Prompter};
pub use run::{BatchRun, RunReport, RunState, RunSummary};
pub use signer::{assign, preview, Preview, PreviewRow, SignerIdentity, SignerPool};
pub use types::{
    Asset, AssetMetadata, Credential, GasSource, OutcomeStatus, RecipientAddress, Transfer,
    TransferOutcome,
};
