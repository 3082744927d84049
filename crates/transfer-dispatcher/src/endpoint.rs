//! Selection of the live JSON-RPC endpoint.
//!
//! Candidates are probed strictly one after another in priority order. The first one that
//! answers within the timeout and reports the required chain id wins; every rejected candidate
//! is logged and recorded, and the scan goes on.

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use tracing::instrument;

use crate::config::EndpointCandidates;
use crate::error::{DispatchError, ProbeError};

/// The selected endpoint and the chain id it confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub chain_id: u64,
}

/// Asks one candidate URL for its chain id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointProbe: Send + Sync {
    /// Returns the chain id reported by `url`, or why it could not be obtained.
    async fn probe(&self, url: &str) -> Result<u64, ProbeError>;
}

/// Probes over HTTP with ethers: `eth_blockNumber` for liveness, then `eth_chainId`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl EndpointProbe for HttpProbe {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> Result<u64, ProbeError> {
        let provider =
            Provider::<Http>::try_from(url).map_err(|e| ProbeError::InvalidUrl(e.to_string()))?;

        let answer = tokio::time::timeout(self.timeout, async {
            let block = provider.get_block_number().await?;
            tracing::debug!(%block, "Endpoint is alive");
            provider.get_chainid().await
        })
        .await
        .map_err(|_| ProbeError::Timeout)?;

        let chain_id = answer.map_err(|e| ProbeError::Connection(e.to_string()))?;
        if chain_id.bits() > 64 {
            return Err(ProbeError::Connection(format!(
                "chain id {chain_id} out of range"
            )));
        }
        Ok(chain_id.as_u64())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Timeout,
    Connection(String),
    ChainMismatch { reported: u64 },
}

/// A candidate that was skipped, in probe order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub url: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub endpoint: Endpoint,
    pub rejected: Vec<Rejection>,
}

pub struct EndpointSelector<P> {
    probe: P,
    required_chain_id: u64,
}

impl<P: EndpointProbe> EndpointSelector<P> {
    pub fn new(probe: P, required_chain_id: u64) -> Self {
        Self {
            probe,
            required_chain_id,
        }
    }

    /// Returns the first candidate that is alive and on the required chain.
    ///
    /// # Errors
    ///
    /// `DispatchError::NoResponsiveEndpoint` when every candidate was rejected.
    pub async fn select(&self, candidates: &EndpointCandidates) -> Result<Selection, DispatchError> {
        let mut rejected = Vec::new();

        for url in candidates.urls() {
            let reason = match self.probe.probe(url).await {
                Ok(chain_id) if chain_id == self.required_chain_id => {
                    tracing::info!(%url, chain_id, "Selected endpoint");
                    return Ok(Selection {
                        endpoint: Endpoint {
                            url: url.clone(),
                            chain_id,
                        },
                        rejected,
                    });
                }
                Ok(reported) => {
                    tracing::warn!(
                        %url,
                        reported,
                        expected = self.required_chain_id,
                        "Endpoint is on the wrong chain, skipping"
                    );
                    RejectReason::ChainMismatch { reported }
                }
                Err(ProbeError::Timeout) => {
                    tracing::warn!(%url, "Endpoint timed out, skipping");
                    RejectReason::Timeout
                }
                Err(err) => {
                    tracing::warn!(%url, %err, "Endpoint failed, skipping");
                    RejectReason::Connection(err.to_string())
                }
            };
            rejected.push(Rejection {
                url: url.clone(),
                reason,
            });
        }

        Err(DispatchError::NoResponsiveEndpoint {
            attempted: rejected.len(),
        })
    }
}
