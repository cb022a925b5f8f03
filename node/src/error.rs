use thiserror::Error;

use eggvote_store::StoreError;
use eggvote_types::{AddressError, RoundId, WalletAddress};

/// Errors surfaced by engine operations (casting, checking, snapshots).
///
/// The HTTP layer maps these onto status codes, so the variants separate
/// caller mistakes (validation, duplicate ballots) from service faults.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("unknown candidate {candidate}: valid ids are 1..={candidate_count}")]
    UnknownCandidate { candidate: u16, candidate_count: u16 },

    #[error("wallet {voter} already voted in round {round}")]
    AlreadyVoted { voter: WalletAddress, round: RoundId },

    #[error("round {0} is not accepting ballots")]
    RoundNotOpen(RoundId),

    #[error("no open round exists")]
    NoOpenRound,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the caller sent something malformed, as opposed to the
    /// service failing.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress(_) | Self::UnknownCandidate { .. } | Self::RoundNotOpen(_)
        )
    }

    /// Whether retrying could succeed without the caller changing anything.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}

/// Errors from node lifecycle management (open, start, stop).
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
