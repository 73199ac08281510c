use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{EventStore, ProgressStore};
use crate::error::IndexerError;
use crate::indexer::types::{FeeEvent, StoredFeeEvent};

/// PostgreSQL-backed event and progress storage, shared by all chain tasks.
///
/// Cross-chain writers never conflict: events carry disjoint identities and
/// progress rows are keyed by chain.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    /// Multi-row INSERT with ON CONFLICT DO NOTHING inside a transaction.
    /// The unique identity index makes replays idempotent; a duplicate
    /// conflict on one row never aborts the rest. Chunks of 500 rows stay
    /// within PostgreSQL's bind-parameter limit.
    async fn insert_events(
        &self,
        chain_id: u64,
        events: &[FeeEvent],
    ) -> Result<u64, IndexerError> {
        if events.is_empty() {
            return Ok(0);
        }
        if chain_id == 0 {
            return Err(IndexerError::Validation(
                "events must be tagged with a nonzero chain id".into(),
            ));
        }
        for event in events {
            event.validate()?;
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for chunk in events.chunks(500) {
            let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> = sqlx::QueryBuilder::new(
                "INSERT INTO fee_collected_events (chain_id, contract_address, token, \
                 integrator, integrator_fee, lifi_fee, block_number, transaction_hash, \
                 log_index) ",
            );

            query_builder.push_values(chunk, |mut b, e| {
                b.push_bind(chain_id as i64)
                    .push_bind(&e.contract_address)
                    .push_bind(&e.token)
                    .push_bind(&e.integrator)
                    .push_bind(&e.integrator_fee)
                    .push_bind(&e.lifi_fee)
                    .push_bind(e.block_number as i64)
                    .push_bind(&e.transaction_hash)
                    .push_bind(e.log_index as i32);
            });

            query_builder.push(" ON CONFLICT (chain_id, transaction_hash, log_index) DO NOTHING");
            let result = query_builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn events_by_integrator(
        &self,
        chain_id: u64,
        integrator: &str,
    ) -> Result<Vec<StoredFeeEvent>, IndexerError> {
        let events = sqlx::query_as::<_, StoredFeeEvent>(
            "SELECT chain_id, contract_address, token, integrator, integrator_fee, \
             lifi_fee, block_number, transaction_hash, log_index, created_at, updated_at \
             FROM fee_collected_events WHERE integrator = $1 AND chain_id = $2",
        )
        .bind(integrator)
        .bind(chain_id as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn last_scanned_block(&self, chain_id: u64) -> Result<Option<u64>, IndexerError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT block_number FROM last_scanned_blocks WHERE chain_id = $1")
                .bind(chain_id as i64)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(b,)| b as u64))
    }

    async fn set_last_scanned_block(
        &self,
        chain_id: u64,
        block_number: u64,
    ) -> Result<(), IndexerError> {
        sqlx::query(
            "INSERT INTO last_scanned_blocks (chain_id, block_number, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (chain_id) DO UPDATE
             SET block_number = $2, updated_at = NOW()",
        )
        .bind(chain_id as i64)
        .bind(block_number as i64)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
