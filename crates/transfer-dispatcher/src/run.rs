//! One batch run, from endpoint selection to the final report.

use ethers::types::U256;

use crate::amount;
use crate::chain::{ChainClient, Connect};
use crate::config::{RunConfig, PREVIEW_LIMIT};
use crate::dispatcher::{DispatchEvent, DispatchReport, TransferDispatcher, TransferPlan};
use crate::endpoint::{Endpoint, EndpointProbe, EndpointSelector, Rejection};
use crate::error::DispatchError;
use crate::pacing::Pacer;
use crate::prompt::Prompter;
use crate::signer::{preview, SignerPool};
use crate::types::AssetMetadata;

pub const CONFIRM_PROMPT: &str = "Type YES to confirm and start sending";

/// Lifecycle of a [`BatchRun`]. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SelectingEndpoint,
    AwaitingConfirmation,
    Dispatching,
    Completed,
    /// A fatal error ended the run before dispatching.
    Aborted,
    /// The operator declined; nothing was sent.
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Aborted | RunState::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub endpoint: Endpoint,
    /// Candidates skipped before `endpoint` was found, in probe order.
    pub rejected: Vec<Rejection>,
    pub metadata: AssetMetadata,
    /// Base units sent per transaction.
    pub amount: U256,
    pub report: DispatchReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    Completed(RunSummary),
    Cancelled,
}

struct Prepared<C> {
    client: C,
    pool: SignerPool,
    plan: TransferPlan,
}

pub struct BatchRun<P, K, Q, T> {
    config: RunConfig,
    selector: EndpointSelector<P>,
    connector: K,
    prompter: Q,
    pacer: T,
    state: RunState,
}

impl<P, K, Q, T> BatchRun<P, K, Q, T>
where
    P: EndpointProbe,
    K: Connect,
    Q: Prompter,
    T: Pacer,
{
    pub fn new(config: RunConfig, probe: P, connector: K, prompter: Q, pacer: T) -> Self {
        let selector = EndpointSelector::new(probe, config.required_chain_id);
        Self {
            config,
            selector,
            connector,
            prompter,
            pacer,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Drives the run to a terminal state. `on_event` sees every recipient header and every
    /// outcome as it happens.
    ///
    /// # Errors
    ///
    /// Any fatal error leaves the run `Aborted` and is returned. Per-transaction failures are
    /// reported in the summary instead. A run executes once: calling this again returns
    /// `DispatchError::AlreadyExecuted` and leaves the state untouched.
    pub async fn execute<F>(&mut self, on_event: F) -> Result<RunReport, DispatchError>
    where
        F: FnMut(DispatchEvent<'_>),
    {
        if self.state != RunState::Idle {
            tracing::warn!(state = ?self.state, "Run already executed, refusing to start again");
            return Err(DispatchError::AlreadyExecuted { state: self.state });
        }

        self.advance(RunState::SelectingEndpoint);
        let selection = match self.selector.select(&self.config.candidates).await {
            Ok(selection) => selection,
            Err(err) => return Err(self.abort(err)),
        };

        let prepared = match self.prepare(&selection.endpoint).await {
            Ok(prepared) => prepared,
            Err(err) => return Err(self.abort(err)),
        };

        self.advance(RunState::AwaitingConfirmation);
        self.prompter
            .show_selection(&selection.endpoint, &prepared.plan.metadata);
        let mapping = match preview(&prepared.pool, &self.config.recipients, PREVIEW_LIMIT) {
            Ok(mapping) => mapping,
            Err(err) => return Err(self.abort(err)),
        };
        self.prompter.show_preview(&mapping);
        if !self.prompter.confirm(CONFIRM_PROMPT) {
            tracing::info!("Cancelled by operator, nothing was sent");
            self.advance(RunState::Cancelled);
            return Ok(RunReport::Cancelled);
        }

        self.advance(RunState::Dispatching);
        let Prepared { client, pool, plan } = prepared;
        let metadata = plan.metadata.clone();
        let amount = plan.amount;
        let dispatched = {
            let dispatcher =
                TransferDispatcher::new(client, &self.pacer, plan, self.config.settings.clone());
            dispatcher
                .dispatch(&pool, &self.config.recipients, on_event)
                .await
        };
        let report = match dispatched {
            Ok(report) => report,
            Err(err) => return Err(self.abort(err)),
        };

        self.advance(RunState::Completed);
        Ok(RunReport::Completed(RunSummary {
            endpoint: selection.endpoint,
            rejected: selection.rejected,
            metadata,
            amount,
            report,
        }))
    }

    async fn prepare(&self, endpoint: &Endpoint) -> Result<Prepared<K::Client>, DispatchError> {
        let client = self.connector.connect(endpoint)?;
        let pool = SignerPool::new(&self.config.credentials, endpoint.chain_id)?;

        let metadata = client
            .asset_metadata(&self.config.asset, &self.config.symbol_fallback)
            .await
            .map_err(DispatchError::AssetMetadata)?;
        let per_tx = amount::scale(self.config.job.amount(), metadata.decimals)?;
        tracing::info!(
            symbol = %metadata.symbol,
            decimals = metadata.decimals,
            amount = %amount::format(per_tx, metadata.decimals),
            transactions_per_recipient = self.config.job.transactions_per_recipient(),
            signers = pool.len(),
            recipients = self.config.recipients.len(),
            "Prepared transfer plan"
        );

        Ok(Prepared {
            client,
            pool,
            plan: TransferPlan {
                asset: self.config.asset,
                metadata,
                amount: per_tx,
                transactions_per_recipient: self.config.job.transactions_per_recipient(),
            },
        })
    }

    fn advance(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "Run state");
        self.state = next;
    }

    fn abort(&mut self, err: DispatchError) -> DispatchError {
        tracing::error!(%err, "Run aborted");
        self.advance(RunState::Aborted);
        err
    }
}
