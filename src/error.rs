//! Error types for the fee indexing pipeline.

use alloy::transports::TransportError;
use thiserror::Error;

/// Errors that can occur while scanning chains or persisting events.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Invalid input: bad address or hash, inverted block window, malformed
    /// fee string. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The JSON-RPC node answered with an error response.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transport-level failure reaching the node.
    #[error("network error: {0}")]
    Network(String),

    /// The RPC call timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Any other blockchain-side failure, including undecodable event data.
    #[error("blockchain error: {0}")]
    Blockchain(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid process configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl IndexerError {
    /// Returns `true` if the error must abort the owning chain's scan run.
    ///
    /// Blockchain-side and storage failures stop the chain; everything else
    /// is logged at the window level and the scan continues.
    pub fn aborts_chain(&self) -> bool {
        matches!(
            self,
            Self::Rpc(_)
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Blockchain(_)
                | Self::Database(_)
        )
    }
}

/// Classify an alloy transport error into the indexer taxonomy.
pub fn classify_transport_error(err: TransportError) -> IndexerError {
    match err {
        TransportError::ErrorResp(payload) => IndexerError::Rpc(payload.to_string()),
        TransportError::Transport(kind) => {
            let msg = kind.to_string();
            let lower = msg.to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                IndexerError::Timeout(msg)
            } else {
                IndexerError::Network(msg)
            }
        }
        other => IndexerError::Blockchain(other.to_string()),
    }
}
