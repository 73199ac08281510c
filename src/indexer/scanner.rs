use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::client::ChainSource;
use crate::config::ChainConfig;
use crate::db::store::{EventStore, ProgressStore};
use crate::error::IndexerError;

/// Counters for one scan pass over a chain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub head: u64,
    pub windows_scanned: u64,
    pub windows_skipped: u64,
    pub events_inserted: u64,
}

/// One scan pass: read the cursor, page from there to the chain head in
/// fixed-size windows, persist each window's events, then advance the
/// cursor.
///
/// The cursor is the last fully-scanned block; scanning resumes at
/// `cursor + 1`, or at the configured start block when the chain has never
/// been scanned. Progress is written only after a window's events are
/// stored, so a crash between the two replays the window idempotently.
///
/// Blockchain and storage errors abort the run; any other window failure is
/// logged and skipped. A shutdown request stops new windows from starting.
pub async fn scan_chain<C, S>(
    chain: &ChainConfig,
    source: &C,
    store: &S,
    chunk_size: u64,
    shutdown: &CancellationToken,
) -> Result<ScanOutcome, IndexerError>
where
    C: ChainSource,
    S: EventStore + ProgressStore,
{
    let chain_id = chain.chain_id;
    let head = source.latest_block().await?;
    let cursor = store.last_scanned_block(chain_id).await?;
    let from = match cursor {
        Some(last) => last + 1,
        None => chain.start_block,
    };

    let mut outcome = ScanOutcome {
        head,
        ..Default::default()
    };

    // Also absorbs an operator rewind past the chain head.
    if from >= head {
        tracing::info!(chain = chain.name, chain_id, head, "up to date");
        return Ok(outcome);
    }

    let mut current = from;
    while current < head {
        if shutdown.is_cancelled() {
            tracing::info!(chain = chain.name, chain_id, "shutdown requested, stopping scan");
            break;
        }

        let window_end = (current + chunk_size - 1).min(head);

        match scan_window(chain, source, store, current, window_end).await {
            Ok(inserted) => {
                outcome.windows_scanned += 1;
                outcome.events_inserted += inserted;
            }
            Err(e) if e.aborts_chain() => {
                tracing::error!(
                    chain = chain.name,
                    chain_id,
                    from = current,
                    to = window_end,
                    error = %e,
                    "window failed, aborting chain scan"
                );
                return Err(e);
            }
            Err(e) => {
                outcome.windows_skipped += 1;
                tracing::warn!(
                    chain = chain.name,
                    chain_id,
                    from = current,
                    to = window_end,
                    error = %e,
                    "skipping window"
                );
            }
        }

        current += chunk_size;
    }

    Ok(outcome)
}

async fn scan_window<C, S>(
    chain: &ChainConfig,
    source: &C,
    store: &S,
    from: u64,
    to: u64,
) -> Result<u64, IndexerError>
where
    C: ChainSource,
    S: EventStore + ProgressStore,
{
    let events = source.fetch_events(from, to).await?;
    let inserted = store.insert_events(chain.chain_id, &events).await?;
    store.set_last_scanned_block(chain.chain_id, to).await?;

    tracing::info!(
        chain = chain.name,
        chain_id = chain.chain_id,
        from,
        to,
        fetched = events.len(),
        inserted,
        "scanned window"
    );
    Ok(inserted)
}

/// Long-running per-chain service loop: rescan every `scan_interval` until
/// cancelled. A fatal scan error terminates this chain's loop; sibling
/// chains are unaffected.
pub async fn run_chain_scanner<C, S>(
    chain: ChainConfig,
    source: C,
    store: Arc<S>,
    chunk_size: u64,
    scan_interval: Duration,
    shutdown: CancellationToken,
) -> Result<(), IndexerError>
where
    C: ChainSource,
    S: EventStore + ProgressStore,
{
    tracing::info!(
        chain = chain.name,
        chain_id = chain.chain_id,
        start_block = chain.start_block,
        chunk_size,
        "starting chain scanner"
    );

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let outcome = scan_chain(&chain, &source, store.as_ref(), chunk_size, &shutdown).await?;
        if outcome.windows_scanned > 0 || outcome.windows_skipped > 0 {
            tracing::info!(
                chain = chain.name,
                chain_id = chain.chain_id,
                head = outcome.head,
                windows = outcome.windows_scanned,
                skipped = outcome.windows_skipped,
                events = outcome.events_inserted,
                "scan cycle complete"
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(scan_interval) => {}
            _ = shutdown.cancelled() => break,
        }
    }

    tracing::info!(chain = chain.name, chain_id = chain.chain_id, "chain scanner stopped");
    Ok(())
}
