use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::IndexerError;

/// A decoded `FeesCollected` event, not yet tagged with its chain.
///
/// Addresses and the transaction hash are lowercase `0x`-prefixed hex; fee
/// amounts are decimal strings so 256-bit values survive storage and
/// transport without precision loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEvent {
    pub contract_address: String,
    pub token: String,
    pub integrator: String,
    pub integrator_fee: String,
    pub lifi_fee: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u64,
}

impl FeeEvent {
    /// Check the record against the storage schema. Called on every decoded
    /// event before it leaves the chain client, and again on every batch
    /// before it is written.
    pub fn validate(&self) -> Result<(), IndexerError> {
        for (field, value) in [
            ("contract_address", &self.contract_address),
            ("token", &self.token),
            ("integrator", &self.integrator),
        ] {
            if !is_lowercase_hex(value, 42) {
                return Err(IndexerError::Validation(format!(
                    "invalid {field} '{value}'"
                )));
            }
        }
        if !is_lowercase_hex(&self.transaction_hash, 66) {
            return Err(IndexerError::Validation(format!(
                "invalid transaction hash '{}'",
                self.transaction_hash
            )));
        }
        for (field, value) in [
            ("integrator_fee", &self.integrator_fee),
            ("lifi_fee", &self.lifi_fee),
        ] {
            if !is_decimal_string(value) {
                return Err(IndexerError::Validation(format!(
                    "invalid {field} '{value}'"
                )));
            }
        }
        Ok(())
    }

    /// The event's identity under a chain: duplicate identities are dropped
    /// at insert time.
    pub fn identity(&self, chain_id: u64) -> (u64, String, u64) {
        (chain_id, self.transaction_hash.clone(), self.log_index)
    }
}

/// A persisted fee event row, ready for the read path.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredFeeEvent {
    pub chain_id: i64,
    pub contract_address: String,
    pub token: String,
    pub integrator: String,
    pub integrator_fee: String,
    pub lifi_fee: String,
    pub block_number: i64,
    pub transaction_hash: String,
    pub log_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `0x`-prefixed lowercase hex of the given total length (42 for addresses,
/// 66 for transaction hashes).
pub fn is_lowercase_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s.starts_with("0x")
        && s[2..]
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Non-empty, ASCII digits only. The form `U256::to_string` produces.
pub fn is_decimal_string(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> FeeEvent {
        FeeEvent {
            contract_address: "0xbd6c7b0d2f68c2b7805d88388319cfb6ecb50ea9".into(),
            token: "0x2791bca1f2de4661ed88a30c99a7a9449aa84174".into(),
            integrator: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".into(),
            integrator_fee: "1000000".into(),
            lifi_fee: "250000".into(),
            block_number: 1100,
            transaction_hash:
                "0xcccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccccc".into(),
            log_index: 0,
        }
    }

    #[test]
    fn valid_event_passes() {
        sample_event().validate().unwrap();
    }

    #[test]
    fn rejects_uppercase_address() {
        let mut event = sample_event();
        event.token = "0x2791BCA1f2de4661ED88A30C99A7a9449Aa84174".into();
        assert!(matches!(
            event.validate(),
            Err(IndexerError::Validation(_))
        ));
    }

    #[test]
    fn rejects_short_transaction_hash() {
        let mut event = sample_event();
        event.transaction_hash = "0xcc".into();
        assert!(event.validate().is_err());
    }

    #[test]
    fn rejects_non_decimal_fee() {
        let mut event = sample_event();
        event.lifi_fee = "12.5".into();
        assert!(event.validate().is_err());

        event.lifi_fee = "".into();
        assert!(event.validate().is_err());
    }

    #[test]
    fn decimal_string_accepts_256_bit_values() {
        // 2^256 - 1
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert!(is_decimal_string(max));
    }

    #[test]
    fn identity_carries_chain() {
        let event = sample_event();
        let (chain, hash, index) = event.identity(137);
        assert_eq!(chain, 137);
        assert_eq!(hash, event.transaction_hash);
        assert_eq!(index, 0);
    }
}
