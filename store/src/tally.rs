//! Tally storage trait.

use crate::StoreError;
use eggvote_types::{CandidateId, RoundId};
use serde::{Deserialize, Serialize};

/// One candidate's aggregate count within a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub candidate: CandidateId,
    pub count: u64,
}

/// Trait for tally lookups.
///
/// Increments and resets are write-batch operations: an increment commits
/// only together with the ballot that caused it, and a reset only as part
/// of a round close.
pub trait TallyStore {
    /// The stored count for one candidate, zero if no row exists.
    fn get_tally(&self, round: RoundId, candidate: CandidateId) -> Result<u64, StoreError>;

    /// All tally rows for a round in raw candidate-id order.
    ///
    /// Display ordering (count descending, id ascending on ties) is applied
    /// downstream; the store reports what is on disk.
    fn tallies(&self, round: RoundId) -> Result<Vec<TallyEntry>, StoreError>;

    /// Sum of all counts for a round.
    fn total_votes(&self, round: RoundId) -> Result<u64, StoreError> {
        Ok(self.tallies(round)?.iter().map(|t| t.count).sum())
    }
}
