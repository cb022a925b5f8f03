//! LMDB implementation of RoundStore.
//!
//! Closed rounds are archived in `rounds_db` keyed by big-endian round id,
//! so they iterate in creation order. The single open round lives in
//! `meta_db` under a fixed key and is swapped atomically by the close batch.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use eggvote_store::round::{Round, RoundStore};
use eggvote_store::StoreError;
use eggvote_types::RoundId;

use crate::LmdbError;

/// Meta key holding the bincode-encoded open round.
pub(crate) const CURRENT_ROUND_KEY: &[u8] = b"current_round";

pub struct LmdbRoundStore {
    pub(crate) env: Arc<Env>,
    pub(crate) rounds_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

/// The archive key for a round.
pub(crate) fn round_key(id: RoundId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

impl RoundStore for LmdbRoundStore {
    fn current_round(&self) -> Result<Option<Round>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, CURRENT_ROUND_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let round: Round = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(round))
            }
            None => Ok(None),
        }
    }

    fn get_round(&self, id: RoundId) -> Result<Option<Round>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .rounds_db
            .get(&rtxn, &round_key(id))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let round: Round = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(round))
            }
            None => Ok(None),
        }
    }

    fn closed_round_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.rounds_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
