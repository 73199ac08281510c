use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy::transports::TransportError;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::decoder;
use super::types::FeeEvent;
use crate::config::ChainConfig;
use crate::error::{classify_transport_error, IndexerError};

const FEES_COLLECTED_SIGNATURE: &str = "FeesCollected(address,address,uint256,uint256)";

/// What the scanner consumes from a chain: the head height and decoded
/// events for a bounded block window.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn latest_block(&self) -> Result<u64, IndexerError>;

    /// Decoded `FeesCollected` events in the closed window `[from, to]`,
    /// in block-then-log order as returned by the provider.
    async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<FeeEvent>, IndexerError>;
}

/// Chain-scoped facade over the JSON-RPC provider and the event decoder.
///
/// The provider is created lazily on first use and cached for the life of
/// the process. One client per chain; providers are never shared across
/// chains.
pub struct ChainClient {
    chain: ChainConfig,
    collector: Address,
    provider: OnceCell<DynProvider>,
}

impl ChainClient {
    pub fn new(chain: ChainConfig, collector: Address) -> Self {
        Self {
            chain,
            collector,
            provider: OnceCell::new(),
        }
    }

    async fn provider(&self) -> Result<&DynProvider, IndexerError> {
        self.provider
            .get_or_try_init(|| async {
                let url = self.chain.rpc_url.parse().map_err(|e| {
                    IndexerError::Config(format!(
                        "invalid RPC URL '{}' for chain {}: {e}",
                        self.chain.rpc_url, self.chain.chain_id
                    ))
                })?;
                Ok(ProviderBuilder::new().connect_http(url).erased())
            })
            .await
    }
}

#[async_trait]
impl ChainSource for ChainClient {
    async fn latest_block(&self) -> Result<u64, IndexerError> {
        let provider = self.provider().await?;
        retry_rpc(self.chain.name, || provider.get_block_number()).await
    }

    async fn fetch_events(&self, from: u64, to: u64) -> Result<Vec<FeeEvent>, IndexerError> {
        if from > to {
            return Err(IndexerError::Validation(format!(
                "invalid block window: from {from} > to {to}"
            )));
        }

        let provider = self.provider().await?;
        let filter = Filter::new()
            .address(self.collector)
            .event(FEES_COLLECTED_SIGNATURE)
            .from_block(from)
            .to_block(to);

        let logs = retry_rpc(self.chain.name, || provider.get_logs(&filter)).await?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            events.push(decoder::decode_fees_collected(log)?);
        }
        Ok(events)
    }
}

/// Retry an RPC call with exponential backoff before classifying the final
/// error. Handles transient node trouble (rate limits, flaky transports).
async fn retry_rpc<F, Fut, T>(chain: &str, mut f: F) -> Result<T, IndexerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, TransportError>>,
{
    let mut delay = Duration::from_millis(500);
    let max_retries = 5;

    for attempt in 0..max_retries {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                tracing::warn!(
                    chain,
                    attempt = attempt + 1,
                    max_retries,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "RPC call failed, retrying..."
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }
        }
    }

    f().await.map_err(classify_transport_error)
}
