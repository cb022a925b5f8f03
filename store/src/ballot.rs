//! Ballot storage trait.

use crate::StoreError;
use eggvote_types::{CandidateId, RoundId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// A single user's recorded choice for one round.
///
/// At most one ballot exists per (round, voter). The constraint is enforced
/// by the backend as an atomic unique insert, never as a check-then-insert:
/// ballot insertion happens inside the combined vote batch so two concurrent
/// votes from the same wallet cannot both commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub round: RoundId,
    pub voter: WalletAddress,
    pub candidate: CandidateId,
    pub cast_at: Timestamp,
}

/// Trait for ballot lookups.
///
/// Writes are deliberately absent: a ballot only ever commits together with
/// its tally increment, through the backend's write batch. A standalone
/// insert would let the ballot and tally counts drift.
pub trait BallotStore {
    /// The ballot `voter` cast in `round`, if any.
    fn get_ballot(
        &self,
        round: RoundId,
        voter: &WalletAddress,
    ) -> Result<Option<Ballot>, StoreError>;

    /// Number of ballots cast in a round.
    fn ballot_count(&self, round: RoundId) -> Result<u64, StoreError>;

    /// Addresses that voted for `candidate` in `round`, in key order.
    fn voters_for(
        &self,
        round: RoundId,
        candidate: CandidateId,
    ) -> Result<Vec<WalletAddress>, StoreError>;
}
