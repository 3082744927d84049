#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ethers::types::{Address, TxHash, H256, U256};
use transfer_dispatcher::config::PHAROS_CHAIN_ID;
use transfer_dispatcher::{
    Asset, AssetMetadata, BatchRun, ChainClient, ChainError, Connect, Credential,
    DispatchError, DispatchSettings, Endpoint, EndpointCandidates, EndpointProbe, Pacer, Preview,
    ProbeError, Prompter, RecipientAddress, RunConfig, SignerIdentity, Transfer, TransferJob,
};

pub const KEYS: [&str; 3] = [
    "0x0000000000000000000000000000000000000000000000000000000000000001",
    "0x0000000000000000000000000000000000000000000000000000000000000002",
    "0x0000000000000000000000000000000000000000000000000000000000000003",
];

pub const GOOD_URL: &str = "https://rpc.good";

pub fn credentials(count: usize) -> Vec<Credential> {
    KEYS[..count].iter().map(|k| k.parse().unwrap()).collect()
}

pub fn recipients(count: usize) -> Vec<RecipientAddress> {
    (0..count)
        .map(|i| RecipientAddress::from(Address::from_low_u64_be(0x100 + i as u64)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub signer: Address,
    pub to: Address,
    pub amount: U256,
    pub gas_limit: U256,
}

#[derive(Debug, Default)]
struct ChainState {
    metadata: Option<AssetMetadata>,
    metadata_error: Option<ChainError>,
    balances: HashMap<Address, U256>,
    estimated_gas: Option<U256>,
    failing_submissions: HashSet<usize>,
    failing_recipients: HashSet<Address>,
    estimates: usize,
    balance_queries: usize,
    submissions: Vec<SubmitCall>,
}

/// In-memory chain that records every call. Estimation fails unless a gas value was scripted;
/// submissions succeed unless their index or recipient was scripted to fail.
#[derive(Debug, Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
    pub fn new() -> Self {
        let chain = Self::default();
        chain.with_estimated_gas(U256::from(21_000u64));
        chain
    }

    pub fn with_estimated_gas(&self, gas: U256) -> &Self {
        self.state.lock().unwrap().estimated_gas = Some(gas);
        self
    }

    pub fn without_estimation(&self) -> &Self {
        self.state.lock().unwrap().estimated_gas = None;
        self
    }

    pub fn with_metadata(&self, symbol: &str, decimals: u8) -> &Self {
        self.state.lock().unwrap().metadata = Some(AssetMetadata {
            symbol: symbol.to_string(),
            decimals,
        });
        self
    }

    pub fn with_metadata_error(&self, err: ChainError) -> &Self {
        self.state.lock().unwrap().metadata_error = Some(err);
        self
    }

    pub fn with_balance(&self, owner: Address, balance: U256) -> &Self {
        self.state.lock().unwrap().balances.insert(owner, balance);
        self
    }

    /// Fails the `index`-th submission (zero-based, across the whole run).
    pub fn failing_submission(&self, index: usize) -> &Self {
        self.state.lock().unwrap().failing_submissions.insert(index);
        self
    }

    pub fn failing_recipient(&self, recipient: Address) -> &Self {
        self.state.lock().unwrap().failing_recipients.insert(recipient);
        self
    }

    pub fn submissions(&self) -> Vec<SubmitCall> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn estimates(&self) -> usize {
        self.state.lock().unwrap().estimates
    }

    pub fn balance_queries(&self) -> usize {
        self.state.lock().unwrap().balance_queries
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn asset_metadata(
        &self,
        asset: &Asset,
        symbol_fallback: &str,
    ) -> Result<AssetMetadata, ChainError> {
        let state = self.state.lock().unwrap();
        if let Some(err) = &state.metadata_error {
            return Err(err.clone());
        }
        Ok(match (asset, &state.metadata) {
            (_, Some(metadata)) => metadata.clone(),
            (Asset::Native, None) => AssetMetadata {
                symbol: "PHRS".to_string(),
                decimals: 18,
            },
            (Asset::Erc20 { .. }, None) => AssetMetadata {
                symbol: symbol_fallback.to_string(),
                decimals: 6,
            },
        })
    }

    async fn balance(&self, _asset: &Asset, owner: Address) -> Result<U256, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.balance_queries += 1;
        state
            .balances
            .get(&owner)
            .copied()
            .ok_or_else(|| ChainError::Provider("unknown account".to_string()))
    }

    async fn estimate_gas(&self, _transfer: &Transfer) -> Result<U256, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.estimates += 1;
        state
            .estimated_gas
            .ok_or_else(|| ChainError::Estimation("execution reverted".to_string()))
    }

    async fn submit(
        &self,
        signer: &SignerIdentity,
        transfer: &Transfer,
        gas_limit: U256,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock().unwrap();
        let index = state.submissions.len();
        state.submissions.push(SubmitCall {
            signer: signer.address(),
            to: transfer.to,
            amount: transfer.amount,
            gas_limit,
        });
        if state.failing_submissions.contains(&index)
            || state.failing_recipients.contains(&transfer.to)
        {
            return Err(ChainError::Rejected("nonce too low".to_string()));
        }
        Ok(H256::from_low_u64_be(index as u64 + 1))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub chain: FakeChain,
    connected: Arc<Mutex<Vec<Endpoint>>>,
}

impl FakeConnector {
    pub fn new(chain: FakeChain) -> Self {
        Self {
            chain,
            connected: Arc::default(),
        }
    }

    pub fn connected(&self) -> Vec<Endpoint> {
        self.connected.lock().unwrap().clone()
    }
}

impl Connect for FakeConnector {
    type Client = FakeChain;

    fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, DispatchError> {
        self.connected.lock().unwrap().push(endpoint.clone());
        Ok(self.chain.clone())
    }
}

/// Answers probes from a per-URL script; unknown URLs refuse the connection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    answers: Arc<Mutex<HashMap<String, Result<u64, ProbeError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, url: &str, answer: Result<u64, ProbeError>) -> Self {
        self.answers.lock().unwrap().insert(url.to_string(), answer);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EndpointProbe for ScriptedProbe {
    async fn probe(&self, url: &str) -> Result<u64, ProbeError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.answers
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ProbeError::Connection("connection refused".to_string())))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedPrompter {
    accept: bool,
    selections: Arc<Mutex<Vec<(String, String)>>>,
    previews: Arc<Mutex<Vec<Preview>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(accept: bool) -> Self {
        Self {
            accept,
            selections: Arc::default(),
            previews: Arc::default(),
            prompts: Arc::default(),
        }
    }

    /// `(endpoint url, asset symbol)` for every selection shown.
    pub fn selections(&self) -> Vec<(String, String)> {
        self.selections.lock().unwrap().clone()
    }

    pub fn previews(&self) -> Vec<Preview> {
        self.previews.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn show_selection(&mut self, endpoint: &Endpoint, metadata: &AssetMetadata) {
        self.selections
            .lock()
            .unwrap()
            .push((endpoint.url.clone(), metadata.symbol.clone()));
    }

    fn show_preview(&mut self, preview: &Preview) {
        self.previews.lock().unwrap().push(preview.clone());
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.accept
    }

    fn ask(&mut self, _prompt: &str, default: &str) -> String {
        default.to_string()
    }
}

pub type TestRun = BatchRun<ScriptedProbe, FakeConnector, ScriptedPrompter, RecordingPacer>;

/// A batch run wired to fakes, with handles kept for inspection after `execute`.
pub struct TestContext {
    pub chain: FakeChain,
    pub connector: FakeConnector,
    pub probe: ScriptedProbe,
    pub prompter: ScriptedPrompter,
    pub pacer: RecordingPacer,
    pub credentials: Vec<Credential>,
    pub recipients: Vec<RecipientAddress>,
}

impl TestContext {
    pub fn new(signers: usize, recipient_count: usize) -> Self {
        let chain = FakeChain::new();
        Self {
            connector: FakeConnector::new(chain.clone()),
            chain,
            probe: ScriptedProbe::new().answer(GOOD_URL, Ok(PHAROS_CHAIN_ID)),
            prompter: ScriptedPrompter::accepting(),
            pacer: RecordingPacer::default(),
            credentials: credentials(signers),
            recipients: recipients(recipient_count),
        }
    }

    pub fn signer(&self, index: usize) -> Address {
        self.credentials[index].address()
    }

    pub fn recipient(&self, index: usize) -> Address {
        self.recipients[index].address()
    }

    pub fn config(&self, amount: &str, count: u32) -> RunConfig {
        RunConfig::new(
            self.credentials.clone(),
            self.recipients.clone(),
            TransferJob::new(amount, count).unwrap(),
            EndpointCandidates::from_urls([GOOD_URL]).unwrap(),
        )
        .unwrap()
        .with_settings(DispatchSettings {
            pacing: Duration::from_millis(300),
            check_balance: false,
        })
    }

    pub fn run(&self, config: RunConfig) -> TestRun {
        BatchRun::new(
            config,
            self.probe.clone(),
            self.connector.clone(),
            self.prompter.clone(),
            self.pacer.clone(),
        )
    }
}
