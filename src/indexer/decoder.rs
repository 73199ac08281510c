use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;

use super::types::FeeEvent;
use crate::error::IndexerError;

// Generate the FeesCollected event ABI using alloy's sol! macro.
// This gives us FeesCollected::SIGNATURE_HASH and the topic layout.
sol! {
    event FeesCollected(address indexed token, address indexed integrator, uint256 integratorFee, uint256 lifiFee);
}

fn invalid_event_data() -> IndexerError {
    IndexerError::Blockchain("invalid event data".into())
}

/// Decode a raw log as a `FeesCollected` event.
///
/// The fee amounts are read as `U256` and rendered as decimal strings right
/// here; no floating point ever touches them. Any malformed log (wrong
/// signature or topic count, short data, missing block number, transaction
/// hash, or log index) fails the whole window.
pub fn decode_fees_collected(log: &Log) -> Result<FeeEvent, IndexerError> {
    let inner = &log.inner;

    let topics = inner.data.topics();
    if topics.first() != Some(&FeesCollected::SIGNATURE_HASH) {
        return Err(invalid_event_data());
    }
    // signature + token + integrator
    if topics.len() != 3 {
        return Err(invalid_event_data());
    }

    let data = inner.data.data.as_ref();
    if data.len() < 64 {
        return Err(invalid_event_data());
    }

    let token = Address::from_word(topics[1]);
    let integrator = Address::from_word(topics[2]);
    let integrator_fee = U256::from_be_slice(&data[..32]);
    let lifi_fee = U256::from_be_slice(&data[32..64]);

    let (Some(block_number), Some(transaction_hash), Some(log_index)) =
        (log.block_number, log.transaction_hash, log.log_index)
    else {
        return Err(invalid_event_data());
    };

    let event = FeeEvent {
        contract_address: format!("{:#x}", inner.address),
        token: format!("{:#x}", token),
        integrator: format!("{:#x}", integrator),
        integrator_fee: integrator_fee.to_string(),
        lifi_fee: lifi_fee.to_string(),
        block_number,
        transaction_hash: format!("{:#x}", transaction_hash),
        log_index,
    };

    if event.validate().is_err() {
        return Err(invalid_event_data());
    }
    Ok(event)
}
