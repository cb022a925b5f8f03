//! Round identifier and lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one voting round.
///
/// Rounds are numbered sequentially starting at 1, so archived round keys
/// sort in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(u64);

impl RoundId {
    /// The first round, created at bootstrap.
    pub const FIRST: Self = Self(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The round following this one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a round.
///
/// Exactly one round is `Open` at any time. A round becomes `Closed` when
/// its scheduled end time passes and the close sequence commits; there is no
/// terminal state for the system itself, a new open round always follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Accepting ballots.
    Open,
    /// Closed and archived; outcome recorded.
    Closed,
}

impl RoundStatus {
    /// Whether ballots are accepted in this state.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}
