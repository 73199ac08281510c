//! In-memory storage backend.
//!
//! Holds events and scan cursors in RAM behind the same traits as the
//! PostgreSQL store. Useful for tests and short-lived runs that don't need
//! persistence.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::store::{EventStore, ProgressStore};
use crate::error::IndexerError;
use crate::indexer::types::{FeeEvent, StoredFeeEvent};

#[derive(Default)]
pub struct MemoryStore {
    events: Mutex<Vec<StoredFeeEvent>>,
    identities: Mutex<HashSet<(u64, String, u64)>>,
    progress: Mutex<HashMap<u64, u64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events across all chains.
    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Snapshot of all stored events, in insertion order.
    pub fn all_events(&self) -> Vec<StoredFeeEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for_chain(&self, chain_id: u64) -> Vec<StoredFeeEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.chain_id == chain_id as i64)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
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

        let mut identities = self.identities.lock().unwrap();
        let mut stored = self.events.lock().unwrap();
        let now = Utc::now();
        let mut inserted = 0u64;

        for event in events {
            if !identities.insert(event.identity(chain_id)) {
                continue;
            }
            stored.push(StoredFeeEvent {
                chain_id: chain_id as i64,
                contract_address: event.contract_address.clone(),
                token: event.token.clone(),
                integrator: event.integrator.clone(),
                integrator_fee: event.integrator_fee.clone(),
                lifi_fee: event.lifi_fee.clone(),
                block_number: event.block_number as i64,
                transaction_hash: event.transaction_hash.clone(),
                log_index: event.log_index as i32,
                created_at: now,
                updated_at: now,
            });
            inserted += 1;
        }

        Ok(inserted)
    }

    async fn events_by_integrator(
        &self,
        chain_id: u64,
        integrator: &str,
    ) -> Result<Vec<StoredFeeEvent>, IndexerError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.chain_id == chain_id as i64 && e.integrator == integrator)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn last_scanned_block(&self, chain_id: u64) -> Result<Option<u64>, IndexerError> {
        Ok(self.progress.lock().unwrap().get(&chain_id).copied())
    }

    async fn set_last_scanned_block(
        &self,
        chain_id: u64,
        block_number: u64,
    ) -> Result<(), IndexerError> {
        self.progress.lock().unwrap().insert(chain_id, block_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tx_byte: u8, log_index: u64) -> FeeEvent {
        FeeEvent {
            contract_address: "0xbd6c7b0d2f68c2b7805d88388319cfb6ecb50ea9".into(),
            token: "0x2791bca1f2de4661ed88a30c99a7a9449aa84174".into(),
            integrator: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".into(),
            integrator_fee: "1000000".into(),
            lifi_fee: "250000".into(),
            block_number: 1100,
            transaction_hash: format!("0x{}", format!("{tx_byte:02x}").repeat(32)),
            log_index,
        }
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_events(137, &[]).await.unwrap(), 0);
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn duplicate_identity_is_dropped() {
        let store = MemoryStore::new();
        assert_eq!(
            store
                .insert_events(137, &[event(0xcc, 0), event(0xcc, 1)])
                .await
                .unwrap(),
            2
        );
        // Same identity again, plus one fresh event.
        assert_eq!(
            store
                .insert_events(137, &[event(0xcc, 0), event(0xdd, 0)])
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.event_count(), 3);
    }

    #[tokio::test]
    async fn same_identity_on_another_chain_is_distinct() {
        let store = MemoryStore::new();
        store.insert_events(1, &[event(0xcc, 0)]).await.unwrap();
        store.insert_events(137, &[event(0xcc, 0)]).await.unwrap();
        assert_eq!(store.events_for_chain(1).len(), 1);
        assert_eq!(store.events_for_chain(137).len(), 1);
    }

    #[tokio::test]
    async fn invalid_event_aborts_whole_batch() {
        let store = MemoryStore::new();
        let mut bad = event(0xee, 0);
        bad.integrator_fee = "1e18".into();
        let result = store.insert_events(137, &[event(0xcc, 0), bad]).await;
        assert!(matches!(result, Err(IndexerError::Validation(_))));
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn integrator_query_filters_by_chain() {
        let store = MemoryStore::new();
        store.insert_events(1, &[event(0xcc, 0)]).await.unwrap();
        store.insert_events(137, &[event(0xdd, 0)]).await.unwrap();

        let hits = store
            .events_by_integrator(137, "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chain_id, 137);
    }

    #[tokio::test]
    async fn progress_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.last_scanned_block(137).await.unwrap(), None);

        store.set_last_scanned_block(137, 1499).await.unwrap();
        store.set_last_scanned_block(137, 1999).await.unwrap();
        assert_eq!(store.last_scanned_block(137).await.unwrap(), Some(1999));
        assert_eq!(store.last_scanned_block(1).await.unwrap(), None);
    }
}
