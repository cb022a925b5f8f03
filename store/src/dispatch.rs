//! Tokenization dispatch queue trait.

use crate::StoreError;
use eggvote_types::{CandidateId, RoundId, Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// A pending tokenization notification.
///
/// Enqueued atomically with the round close that produced it and removed
/// only once the external collaborator has acknowledged, so delivery is
/// at-least-once across restarts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchJob {
    pub round: RoundId,
    pub winner: CandidateId,
    /// Addresses that voted for the winner, in key order.
    pub voters: Vec<WalletAddress>,
    pub enqueued_at: Timestamp,
    /// Delivery attempts made so far.
    #[serde(default)]
    pub attempts: u32,
}

/// Trait for the dispatch queue.
pub trait DispatchQueueStore {
    /// All queued jobs in round order.
    fn pending_jobs(&self) -> Result<Vec<DispatchJob>, StoreError>;

    /// Record a delivery attempt (bumps the attempt counter).
    fn mark_attempt(&self, round: RoundId) -> Result<(), StoreError>;

    /// Remove a job after the collaborator acknowledged it.
    fn ack_job(&self, round: RoundId) -> Result<(), StoreError>;

    /// Number of queued jobs.
    fn queue_len(&self) -> Result<u64, StoreError>;
}
