//! LMDB implementation of BallotStore.
//!
//! Key format: `round_id.to_be_bytes() ++ voter_address_bytes` (binary
//! composite key). The fixed-width big-endian round prefix keeps one round's
//! ballots contiguous, so prefix scans walk exactly one round.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use eggvote_store::ballot::{Ballot, BallotStore};
use eggvote_store::StoreError;
use eggvote_types::{CandidateId, RoundId, WalletAddress};

use crate::LmdbError;

pub struct LmdbBallotStore {
    pub(crate) env: Arc<Env>,
    pub(crate) ballots_db: Database<Bytes, Bytes>,
}

/// Build the binary composite key `round_be ++ voter_bytes`.
pub(crate) fn ballot_key(round: RoundId, voter: &WalletAddress) -> Vec<u8> {
    let addr = voter.as_bytes();
    let mut key = Vec::with_capacity(8 + addr.len());
    key.extend_from_slice(&round.as_u64().to_be_bytes());
    key.extend_from_slice(addr);
    key
}

/// The 8-byte prefix shared by every key of one round.
pub(crate) fn round_prefix(round: RoundId) -> Vec<u8> {
    round.as_u64().to_be_bytes().to_vec()
}

/// Increment a key prefix in place to form the exclusive upper bound of a
/// prefix scan. Trailing 0xFF bytes are popped before incrementing.
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(&last) = prefix.last() {
        if last == 0xFF {
            prefix.pop();
        } else {
            let idx = prefix.len() - 1;
            prefix[idx] = last + 1;
            return;
        }
    }
}

impl BallotStore for LmdbBallotStore {
    fn get_ballot(
        &self,
        round: RoundId,
        voter: &WalletAddress,
    ) -> Result<Option<Ballot>, StoreError> {
        let key = ballot_key(round, voter);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .ballots_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let ballot: Ballot = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(ballot))
            }
            None => Ok(None),
        }
    }

    fn ballot_count(&self, round: RoundId) -> Result<u64, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let iter = self
            .ballots_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut count = 0u64;
        for result in iter {
            result.map_err(LmdbError::from)?;
            count += 1;
        }
        Ok(count)
    }

    fn voters_for(
        &self,
        round: RoundId,
        candidate: CandidateId,
    ) -> Result<Vec<WalletAddress>, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);

        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let iter = self
            .ballots_db
            .range(&rtxn, &bounds)
            .map_err(LmdbError::from)?;
        let mut voters = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let ballot: Ballot = bincode::deserialize(val).map_err(LmdbError::from)?;
            if ballot.candidate == candidate {
                voters.push(ballot.voter);
            }
        }
        Ok(voters)
    }
}
