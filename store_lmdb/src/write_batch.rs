//! Write batching — groups multiple store operations into a single LMDB write
//! transaction, amortising the cost of the fsync that each commit performs.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.insert_ballot(&ballot)?;
//! batch.increment_tally(ballot.round, ballot.candidate)?;
//! batch.put_user(&user)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).
//! LMDB serializes writers, so a batch also acts as the serialization point
//! for read-modify-write operations such as the tally increment and the
//! round-close fence.

use heed::{PutFlags, RwTxn};
use std::ops::Bound;

use eggvote_store::ballot::Ballot;
use eggvote_store::dispatch::DispatchJob;
use eggvote_store::round::Round;
use eggvote_store::tally::TallyEntry;
use eggvote_store::user::User;
use eggvote_store::StoreError;
use eggvote_types::{CandidateId, RoundId, WalletAddress};

use crate::ballot::{ballot_key, increment_prefix, round_prefix};
use crate::environment::LmdbEnvironment;
use crate::round::{round_key, CURRENT_ROUND_KEY};
use crate::tally::{decode_count, tally_key};
use crate::LmdbError;

/// A write batch that groups multiple store operations into a single LMDB
/// write transaction, amortising the cost of the fsync.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    // ── User operations ─────────────────────────────────────────────────

    /// Insert or replace a user record in the batch.
    pub fn put_user(&mut self, user: &User) -> Result<(), StoreError> {
        let bytes = bincode::serialize(user).map_err(LmdbError::from)?;
        self.env
            .users_db
            .put(&mut self.txn, user.address.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Ballot operations ───────────────────────────────────────────────

    /// Insert a ballot, failing with [`StoreError::Duplicate`] if the voter
    /// already holds one for the round.
    ///
    /// Uses LMDB's `NO_OVERWRITE` flag: the existence check and the insert
    /// are one operation, so two concurrent votes from the same wallet can
    /// never both commit. A failed insert leaves the batch usable; dropping
    /// it rolls back everything else it staged.
    pub fn insert_ballot(&mut self, ballot: &Ballot) -> Result<(), StoreError> {
        let key = ballot_key(ballot.round, &ballot.voter);
        let bytes = bincode::serialize(ballot).map_err(LmdbError::from)?;
        match self.env.ballots_db.put_with_flags(
            &mut self.txn,
            PutFlags::NO_OVERWRITE,
            &key,
            &bytes,
        ) {
            Ok(()) => Ok(()),
            Err(heed::Error::Mdb(heed::MdbError::KeyExist)) => Err(StoreError::Duplicate(
                format!("ballot for {} in round {}", ballot.voter, ballot.round),
            )),
            Err(e) => Err(LmdbError::from(e).into()),
        }
    }

    /// Delete every ballot of a round. Returns the number removed.
    pub fn clear_round_ballots(&mut self, round: RoundId) -> Result<u64, StoreError> {
        self.clear_round_prefix(self.env.ballots_db, round)
    }

    /// Addresses that voted for `candidate` in `round`, read inside the
    /// batch (used by the close sequence before the ballots are cleared).
    pub fn voters_for(
        &self,
        round: RoundId,
        candidate: CandidateId,
    ) -> Result<Vec<WalletAddress>, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let iter = self
            .env
            .ballots_db
            .range(&self.txn, &bounds)
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

    // ── Tally operations ────────────────────────────────────────────────

    /// Increment one candidate's counter, returning the new count.
    ///
    /// The read and the write happen inside this batch's transaction, and
    /// LMDB admits a single writer, so the increment is atomic and applies
    /// exactly once per committed batch.
    pub fn increment_tally(
        &mut self,
        round: RoundId,
        candidate: CandidateId,
    ) -> Result<u64, StoreError> {
        let key = tally_key(round, candidate);
        let current = match self
            .env
            .tallies_db
            .get(&self.txn, &key)
            .map_err(LmdbError::from)?
        {
            Some(val) => decode_count(val)?,
            None => 0,
        };
        let new_count = current.saturating_add(1);
        self.env
            .tallies_db
            .put(&mut self.txn, &key, &new_count.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(new_count)
    }

    /// Materialize zeroed tally rows `1..=candidate_count` for a round.
    pub fn init_tallies(&mut self, round: RoundId, candidate_count: u16) -> Result<(), StoreError> {
        for id in 1..=candidate_count {
            let key = tally_key(round, CandidateId::new(id));
            self.env
                .tallies_db
                .put(&mut self.txn, &key, &0u64.to_be_bytes())
                .map_err(LmdbError::from)?;
        }
        Ok(())
    }

    /// All tally rows of a round, read inside the batch.
    pub fn tallies(&self, round: RoundId) -> Result<Vec<TallyEntry>, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let iter = self
            .env
            .tallies_db
            .range(&self.txn, &bounds)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            entries.push(TallyEntry {
                candidate: crate::tally::decode_candidate(key)?,
                count: decode_count(val)?,
            });
        }
        Ok(entries)
    }

    /// Delete every tally row of a round. Returns the number removed.
    pub fn clear_round_tallies(&mut self, round: RoundId) -> Result<u64, StoreError> {
        self.clear_round_prefix(self.env.tallies_db, round)
    }

    // ── Round operations ────────────────────────────────────────────────

    /// The open round as seen by this batch's transaction.
    ///
    /// This is the round-close fence: the controller re-reads the round
    /// inside the batch and aborts if another close already advanced it.
    pub fn current_round(&self) -> Result<Option<Round>, StoreError> {
        let val = self
            .env
            .meta_db
            .get(&self.txn, CURRENT_ROUND_KEY)
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let round: Round = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(round))
            }
            None => Ok(None),
        }
    }

    /// Replace the open round record.
    pub fn put_current_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let bytes = bincode::serialize(round).map_err(LmdbError::from)?;
        self.env
            .meta_db
            .put(&mut self.txn, CURRENT_ROUND_KEY, &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Archive a closed round under its id.
    pub fn archive_round(&mut self, round: &Round) -> Result<(), StoreError> {
        let bytes = bincode::serialize(round).map_err(LmdbError::from)?;
        self.env
            .rounds_db
            .put(&mut self.txn, &round_key(round.id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Dispatch operations ─────────────────────────────────────────────

    /// Enqueue a tokenization job, keyed by its round.
    pub fn enqueue_dispatch(&mut self, job: &DispatchJob) -> Result<(), StoreError> {
        let bytes = bincode::serialize(job).map_err(LmdbError::from)?;
        self.env
            .dispatch_db
            .put(&mut self.txn, &round_key(job.round), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    ///
    /// This is the only fsync in the entire batch.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    /// Collect and delete every key sharing a round prefix.
    fn clear_round_prefix(
        &mut self,
        db: heed::Database<heed::types::Bytes, heed::types::Bytes>,
        round: RoundId,
    ) -> Result<u64, StoreError> {
        let prefix = round_prefix(round);
        let mut upper = prefix.clone();
        increment_prefix(&mut upper);
        let bounds = (
            Bound::Included(prefix.as_slice()),
            Bound::Excluded(upper.as_slice()),
        );
        let keys: Vec<Vec<u8>> = {
            let iter = db.range(&self.txn, &bounds).map_err(LmdbError::from)?;
            let mut keys = Vec::new();
            for result in iter {
                let (key, _val) = result.map_err(LmdbError::from)?;
                keys.push(key.to_vec());
            }
            keys
        };
        for key in &keys {
            db.delete(&mut self.txn, key).map_err(LmdbError::from)?;
        }
        Ok(keys.len() as u64)
    }
}
