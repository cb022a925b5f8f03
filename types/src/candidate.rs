//! Candidate ("egg") identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one selectable candidate within a round.
///
/// Candidate ids are small positive integers. Every round uses the fixed set
/// `1..=N` where `N` is the configured candidate count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidateId(u16);

impl CandidateId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Whether this id belongs to the active set of a round with
    /// `candidate_count` candidates.
    pub fn in_set(&self, candidate_count: u16) -> bool {
        self.0 >= 1 && self.0 <= candidate_count
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
