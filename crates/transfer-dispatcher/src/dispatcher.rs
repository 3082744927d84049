//! The transfer loop.
//!
//! Recipients are processed in list order, each by its round-robin signer, one transaction at
//! a time. Every attempt produces exactly one [`TransferOutcome`]; a failed attempt is recorded
//! and the loop moves on. There is no retry and no concurrency: the pacing delay after each
//! attempt is what keeps consecutive submissions from the same sender from racing on the nonce.

use ethers::types::{Address, U256};

use crate::amount;
use crate::chain::ChainClient;
use crate::config::DispatchSettings;
use crate::error::DispatchError;
use crate::pacing::Pacer;
use crate::signer::{SignerIdentity, SignerPool};
use crate::types::{
    checksummed, Asset, AssetMetadata, GasSource, OutcomeStatus, RecipientAddress, Transfer,
    TransferOutcome,
};

/// Upper bound on the outcome buffer reserved up front; larger runs grow it as they go.
const MAX_RESERVED_OUTCOMES: usize = 1024;

/// The job scaled to the asset: what each attempt sends, and how many attempts per recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub asset: Asset,
    pub metadata: AssetMetadata,
    /// Base units per transaction.
    pub amount: U256,
    pub transactions_per_recipient: u32,
}

impl TransferPlan {
    /// What one signer needs to cover all attempts for one recipient.
    pub fn required_per_recipient(&self) -> U256 {
        amount::total(self.amount, self.transactions_per_recipient)
    }
}

/// Result of the optional balance pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceCheck {
    pub balance: U256,
    pub required: U256,
}

impl BalanceCheck {
    pub fn is_sufficient(&self) -> bool {
        self.balance >= self.required
    }
}

/// Progress notifications, in the order things happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEvent<'a> {
    /// Sent once, before the first recipient.
    Started(&'a TransferPlan),
    /// A recipient is about to be served.
    Recipient {
        /// One-based position.
        position: usize,
        total: usize,
        signer: Address,
        recipient: RecipientAddress,
        balance: Option<BalanceCheck>,
    },
    /// One attempt finished.
    Outcome(&'a TransferOutcome),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<TransferOutcome>,
}

impl DispatchReport {
    pub fn submitted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_submitted()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.submitted()
    }
}

pub struct TransferDispatcher<C, P> {
    client: C,
    pacer: P,
    plan: TransferPlan,
    settings: DispatchSettings,
}

impl<C: ChainClient, P: Pacer> TransferDispatcher<C, P> {
    pub fn new(client: C, pacer: P, plan: TransferPlan, settings: DispatchSettings) -> Self {
        Self {
            client,
            pacer,
            plan,
            settings,
        }
    }

    pub fn plan(&self) -> &TransferPlan {
        &self.plan
    }

    /// Runs every attempt for every recipient and returns all outcomes in the order they were
    /// produced. Per-transaction failures are part of the report, never an `Err`.
    ///
    /// # Errors
    ///
    /// `DispatchError::NoValidCredentials` if `pool` is empty.
    pub async fn dispatch<F>(
        &self,
        pool: &SignerPool,
        recipients: &[RecipientAddress],
        mut on_event: F,
    ) -> Result<DispatchReport, DispatchError>
    where
        F: FnMut(DispatchEvent<'_>),
    {
        let total = recipients.len();
        let expected = total.saturating_mul(self.plan.transactions_per_recipient as usize);
        let mut report = DispatchReport {
            outcomes: Vec::with_capacity(expected.min(MAX_RESERVED_OUTCOMES)),
        };

        on_event(DispatchEvent::Started(&self.plan));
        for (index, recipient) in recipients.iter().enumerate() {
            let signer = pool.signer_for(index)?;
            tracing::info!(
                position = index + 1,
                total,
                signer = %checksummed(&signer.address()),
                %recipient,
                "Dispatching to recipient"
            );

            let balance = if self.settings.check_balance {
                self.check_balance(signer).await
            } else {
                None
            };
            on_event(DispatchEvent::Recipient {
                position: index + 1,
                total,
                signer: signer.address(),
                recipient: *recipient,
                balance,
            });

            for attempt in 1..=self.plan.transactions_per_recipient {
                let outcome = self.attempt(signer, *recipient, index, attempt).await;
                on_event(DispatchEvent::Outcome(&outcome));
                report.outcomes.push(outcome);
                self.pacer.pause(self.settings.pacing).await;
            }

            self.pacer.pause(self.settings.pacing).await;
        }

        tracing::info!(
            submitted = report.submitted(),
            failed = report.failed(),
            "Dispatch finished"
        );
        Ok(report)
    }

    /// Informational only: a shortfall is logged, sending goes ahead regardless.
    async fn check_balance(&self, signer: &SignerIdentity) -> Option<BalanceCheck> {
        let balance = match self.client.balance(&self.plan.asset, signer.address()).await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::debug!(%err, "Balance query failed, skipping check");
                return None;
            }
        };
        let check = BalanceCheck {
            balance,
            required: self.plan.required_per_recipient(),
        };
        if !check.is_sufficient() {
            tracing::warn!(
                signer = %checksummed(&signer.address()),
                balance = %amount::format(check.balance, self.plan.metadata.decimals),
                required = %amount::format(check.required, self.plan.metadata.decimals),
                symbol = %self.plan.metadata.symbol,
                "Balance is short for {} transaction(s), sending anyway",
                self.plan.transactions_per_recipient
            );
        }
        Some(check)
    }

    async fn attempt(
        &self,
        signer: &SignerIdentity,
        recipient: RecipientAddress,
        position: usize,
        attempt: u32,
    ) -> TransferOutcome {
        let transfer = Transfer {
            asset: self.plan.asset,
            from: signer.address(),
            to: recipient.address(),
            amount: self.plan.amount,
        };

        let (gas_limit, gas_source) = match self.client.estimate_gas(&transfer).await {
            Ok(gas) => (gas, GasSource::Estimated),
            Err(err) => {
                let fallback = self.plan.asset.fallback_gas();
                tracing::warn!(%err, %fallback, attempt, "Gas estimation failed, using fallback");
                (fallback, GasSource::Fallback)
            }
        };

        let status = match self.client.submit(signer, &transfer, gas_limit).await {
            Ok(tx_hash) => {
                tracing::info!(attempt, ?tx_hash, %gas_limit, "Transfer submitted");
                OutcomeStatus::Submitted {
                    tx_hash,
                    gas_limit,
                    gas_source,
                }
            }
            Err(err) => {
                tracing::warn!(attempt, %err, %recipient, "Transfer failed");
                OutcomeStatus::Failed(err)
            }
        };

        TransferOutcome {
            recipient: recipient.address(),
            position,
            signer: signer.address(),
            attempt,
            status,
        }
    }
}
