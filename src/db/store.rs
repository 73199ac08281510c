//! Storage traits consumed by the scanner and the read API.

use async_trait::async_trait;

use crate::error::IndexerError;
use crate::indexer::types::{FeeEvent, StoredFeeEvent};

/// Durable per-chain scan cursor.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// The last fully-scanned block for a chain, or `None` if the chain has
    /// never been scanned.
    async fn last_scanned_block(&self, chain_id: u64) -> Result<Option<u64>, IndexerError>;

    /// Unconditional upsert. Last-write-wins; each chain has a single writer.
    async fn set_last_scanned_block(
        &self,
        chain_id: u64,
        block_number: u64,
    ) -> Result<(), IndexerError>;
}

/// Durable, append-mostly collection of decoded fee events, deduplicated on
/// `(chain_id, transaction_hash, log_index)`.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a batch of events tagged with `chain_id`. An empty batch is a
    /// no-op. Every event is schema-validated before any write; a validation
    /// failure aborts the whole batch with nothing persisted. Duplicate
    /// identities are silently dropped. Returns the number of newly inserted
    /// rows.
    async fn insert_events(
        &self,
        chain_id: u64,
        events: &[FeeEvent],
    ) -> Result<u64, IndexerError>;

    /// Equality filter on integrator and chain; order unspecified.
    async fn events_by_integrator(
        &self,
        chain_id: u64,
        integrator: &str,
    ) -> Result<Vec<StoredFeeEvent>, IndexerError>;
}
