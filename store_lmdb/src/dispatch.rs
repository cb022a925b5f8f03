//! LMDB implementation of DispatchQueueStore.
//!
//! Key format: big-endian round id. One close produces at most one job, so
//! the round id is the natural primary key and the queue drains in round
//! order.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use eggvote_store::dispatch::{DispatchJob, DispatchQueueStore};
use eggvote_store::StoreError;
use eggvote_types::RoundId;

use crate::round::round_key;
use crate::LmdbError;

pub struct LmdbDispatchStore {
    pub(crate) env: Arc<Env>,
    pub(crate) dispatch_db: Database<Bytes, Bytes>,
}

impl DispatchQueueStore for LmdbDispatchStore {
    fn pending_jobs(&self) -> Result<Vec<DispatchJob>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.dispatch_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut jobs = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let job: DispatchJob = bincode::deserialize(val).map_err(LmdbError::from)?;
            jobs.push(job);
        }
        Ok(jobs)
    }

    fn mark_attempt(&self, round: RoundId) -> Result<(), StoreError> {
        let key = round_key(round);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let val = self
            .dispatch_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("dispatch job for round {round}")))?;
        let mut job: DispatchJob = bincode::deserialize(val).map_err(LmdbError::from)?;
        job.attempts = job.attempts.saturating_add(1);
        let bytes = bincode::serialize(&job).map_err(LmdbError::from)?;
        self.dispatch_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn ack_job(&self, round: RoundId) -> Result<(), StoreError> {
        let key = round_key(round);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.dispatch_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn queue_len(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.dispatch_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
