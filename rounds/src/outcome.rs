//! Snapshot ordering and winner determination.
//!
//! Both are pure functions over tally rows so the same rules apply wherever
//! a round is ranked: the public snapshot endpoint, the close sequence, and
//! the tests exercising either.

use eggvote_store::tally::TallyEntry;
use eggvote_types::CandidateId;

/// Order tally rows for display: count descending, candidate id ascending
/// on ties. Deterministic for any input order.
pub fn ranked(mut entries: Vec<TallyEntry>) -> Vec<TallyEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.candidate.cmp(&b.candidate)));
    entries
}

/// The winning candidate: highest count, lowest id on ties.
///
/// A round with zero votes has no winner.
pub fn winner(entries: &[TallyEntry]) -> Option<CandidateId> {
    entries
        .iter()
        .filter(|t| t.count > 0)
        .max_by(|a, b| a.count.cmp(&b.count).then(b.candidate.cmp(&a.candidate)))
        .map(|t| t.candidate)
}

/// Sum of all counts.
pub fn total_votes(entries: &[TallyEntry]) -> u64 {
    entries.iter().map(|t| t.count).sum()
}
