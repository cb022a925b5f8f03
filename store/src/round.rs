//! Round storage trait.

use crate::StoreError;
use eggvote_types::{CandidateId, RoundId, RoundStatus, Timestamp};
use serde::{Deserialize, Serialize};

/// One voting round.
///
/// The open round lives under a fixed current-round key; closed rounds are
/// archived under their id with the outcome fields populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub started_at: Timestamp,
    pub closes_at: Timestamp,
    pub status: RoundStatus,
    /// Winning candidate, set on close. `None` while open and for rounds
    /// that closed with zero ballots.
    pub winner: Option<CandidateId>,
    /// Total ballots cast, set on close.
    pub total_votes: u64,
}

impl Round {
    /// A fresh open round.
    pub fn open(id: RoundId, started_at: Timestamp, closes_at: Timestamp) -> Self {
        Self {
            id,
            started_at,
            closes_at,
            status: RoundStatus::Open,
            winner: None,
            total_votes: 0,
        }
    }
}

/// Trait for round lookups.
///
/// The open -> closed transition is a write-batch operation so the archive
/// write, the reset, and the successor round commit together.
pub trait RoundStore {
    /// The currently open round, `None` before bootstrap.
    fn current_round(&self) -> Result<Option<Round>, StoreError>;

    /// An archived (closed) round by id.
    fn get_round(&self, id: RoundId) -> Result<Option<Round>, StoreError>;

    /// Number of archived rounds.
    fn closed_round_count(&self) -> Result<u64, StoreError>;
}
