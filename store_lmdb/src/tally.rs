//! LMDB implementation of TallyStore.
//!
//! Key format: `round_id.to_be_bytes() ++ candidate_id.to_be_bytes()`.
//! Values are raw big-endian u64 counters, mirroring the meta counters, so
//! an increment is a fixed-width overwrite rather than a re-encode.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use eggvote_store::tally::{TallyEntry, TallyStore};
use eggvote_store::StoreError;
use eggvote_types::{CandidateId, RoundId};

use crate::ballot::{increment_prefix, round_prefix};
use crate::LmdbError;

pub struct LmdbTallyStore {
    pub(crate) env: Arc<Env>,
    pub(crate) tallies_db: Database<Bytes, Bytes>,
}

/// Build the binary composite key `round_be ++ candidate_be`.
pub(crate) fn tally_key(round: RoundId, candidate: CandidateId) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 2);
    key.extend_from_slice(&round.as_u64().to_be_bytes());
    key.extend_from_slice(&candidate.as_u16().to_be_bytes());
    key
}

/// Decode a stored counter value.
pub(crate) fn decode_count(val: &[u8]) -> Result<u64, StoreError> {
    let bytes: [u8; 8] = val
        .try_into()
        .map_err(|_| StoreError::Corruption(format!("tally value of {} bytes", val.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Decode the candidate id from the trailing two key bytes.
pub(crate) fn decode_candidate(key: &[u8]) -> Result<CandidateId, StoreError> {
    let bytes: [u8; 2] = key[key.len().saturating_sub(2)..]
        .try_into()
        .map_err(|_| StoreError::Corruption(format!("tally key of {} bytes", key.len())))?;
    Ok(CandidateId::new(u16::from_be_bytes(bytes)))
}

impl TallyStore for LmdbTallyStore {
    fn get_tally(&self, round: RoundId, candidate: CandidateId) -> Result<u64, StoreError> {
        let key = tally_key(round, candidate);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .tallies_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => decode_count(bytes),
            None => Ok(0),
        }
    }

    fn tallies(&self, round: RoundId) -> Result<Vec<TallyEntry>, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let iter = self
            .tallies_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            entries.push(TallyEntry {
                candidate: decode_candidate(key)?,
                count: decode_count(val)?,
            });
        }
        Ok(entries)
    }
}
