//! The voting engine — every user-facing operation over the stores.
//!
//! The engine owns no mutable state of its own: all state lives in LMDB and
//! every mutation goes through a write batch, so a cast vote commits its
//! ballot, its tally increment, and the voter's user record together or not
//! at all.

use std::sync::Arc;

use eggvote_rounds::{ranked, total_votes, Clock, CloseSchedule};
use eggvote_store::ballot::{Ballot, BallotStore};
use eggvote_store::round::{Round, RoundStore};
use eggvote_store::tally::{TallyEntry, TallyStore};
use eggvote_store::user::{User, UserStore};
use eggvote_store::StoreError;
use eggvote_store_lmdb::LmdbEnvironment;
use eggvote_types::{CandidateId, RoundId, WalletAddress};

use crate::error::EngineError;
use crate::metrics::NodeMetrics;

/// The open round and its ordered standings at one point in time.
#[derive(Clone, Debug)]
pub struct RoundSnapshot {
    pub round: Round,
    /// Tally rows ordered by count descending, candidate id ascending on
    /// ties.
    pub standings: Vec<TallyEntry>,
    pub total_votes: u64,
}

/// Result of a ballot check for the current round.
#[derive(Clone, Debug)]
pub struct BallotCheck {
    pub user: User,
    pub round: RoundId,
    pub ballot: Option<Ballot>,
}

/// Executes voting operations against the store.
pub struct VotingEngine {
    store: Arc<LmdbEnvironment>,
    clock: Arc<dyn Clock>,
    schedule: CloseSchedule,
    candidate_count: u16,
    metrics: Arc<NodeMetrics>,
}

impl VotingEngine {
    pub fn new(
        store: Arc<LmdbEnvironment>,
        clock: Arc<dyn Clock>,
        schedule: CloseSchedule,
        candidate_count: u16,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            store,
            clock,
            schedule,
            candidate_count,
            metrics,
        }
    }

    /// Number of candidates in every round's active set.
    pub fn candidate_count(&self) -> u16 {
        self.candidate_count
    }

    /// Ensure an open round exists, creating round 1 on a fresh database.
    ///
    /// Called once at startup before any request is served. Also primes the
    /// round gauges from whatever state survived the restart.
    pub fn bootstrap(&self) -> Result<Round, EngineError> {
        if let Some(round) = self.store.round_store().current_round()? {
            let votes = self.store.tally_store().total_votes(round.id)?;
            self.metrics.current_round_id.set(round.id.as_u64() as i64);
            self.metrics.current_round_votes.set(votes as i64);
            tracing::info!(
                round = %round.id,
                votes,
                closes_at = round.closes_at.as_secs(),
                "resuming open round"
            );
            return Ok(round);
        }

        let now = self.clock.now();
        let round = Round::open(RoundId::FIRST, now, self.schedule.next_deadline(now));

        let mut batch = self.store.write_batch()?;
        batch.put_current_round(&round)?;
        batch.init_tallies(round.id, self.candidate_count)?;
        batch.commit()?;

        self.metrics.current_round_id.set(round.id.as_u64() as i64);
        self.metrics.current_round_votes.set(0);
        tracing::info!(
            round = %round.id,
            candidates = self.candidate_count,
            closes_at = round.closes_at.as_secs(),
            "opened first round"
        );
        Ok(round)
    }

    /// The currently open round.
    pub fn current_round(&self) -> Result<Round, EngineError> {
        self.store
            .round_store()
            .current_round()?
            .ok_or(EngineError::NoOpenRound)
    }

    /// The open round with its ordered standings.
    pub fn current_snapshot(&self) -> Result<RoundSnapshot, EngineError> {
        let round = self.current_round()?;
        let standings = ranked(self.store.tally_store().tallies(round.id)?);
        let total_votes = total_votes(&standings);
        Ok(RoundSnapshot {
            round,
            standings,
            total_votes,
        })
    }

    /// Wallet login: create the user on first contact, refresh `last_seen`
    /// on every later one.
    pub fn resolve_or_create(&self, raw_address: &str) -> Result<User, EngineError> {
        let address = WalletAddress::parse(raw_address)?;
        let now = self.clock.now();

        let user = match self.store.user_store().get_user(&address)? {
            Some(mut user) => {
                user.last_seen = now;
                user
            }
            None => {
                tracing::debug!(wallet = %address, "new wallet seen");
                User {
                    address,
                    created_at: now,
                    last_seen: now,
                }
            }
        };
        self.store.user_store().put_user(&user)?;
        Ok(user)
    }

    /// Whether (and how) the wallet voted in the current round.
    ///
    /// Creates the user record when the wallet has never been seen; a check
    /// counts as contact.
    pub fn check_ballot(&self, raw_address: &str) -> Result<BallotCheck, EngineError> {
        let user = self.resolve_or_create(raw_address)?;
        let round = self.current_round()?;
        let ballot = self
            .store
            .ballot_store()
            .get_ballot(round.id, &user.address)?;
        Ok(BallotCheck {
            user,
            round: round.id,
            ballot,
        })
    }

    /// Cast a ballot for `candidate` in the current round.
    ///
    /// The ballot insert, the tally increment, and the user upsert commit in
    /// one write batch. Uniqueness comes from the insert itself: a second
    /// ballot for the same wallet collides on the key and nothing in the
    /// batch commits.
    pub fn cast_vote(&self, raw_address: &str, candidate: u16) -> Result<Ballot, EngineError> {
        match self.try_cast(raw_address, candidate) {
            Ok(ballot) => {
                self.metrics.votes_total.inc();
                self.metrics.current_round_votes.inc();
                Ok(ballot)
            }
            Err(e) => {
                // Storage faults are failures, not rejections.
                if !matches!(e, EngineError::Store(_)) {
                    self.metrics.votes_rejected_total.inc();
                }
                Err(e)
            }
        }
    }

    fn try_cast(&self, raw_address: &str, candidate: u16) -> Result<Ballot, EngineError> {
        let voter = WalletAddress::parse(raw_address)?;
        let candidate = CandidateId::new(candidate);
        if !candidate.in_set(self.candidate_count) {
            return Err(EngineError::UnknownCandidate {
                candidate: candidate.as_u16(),
                candidate_count: self.candidate_count,
            });
        }

        let round = self.current_round()?;
        if !round.status.is_open() {
            return Err(EngineError::RoundNotOpen(round.id));
        }

        let now = self.clock.now();
        let user = match self.store.user_store().get_user(&voter)? {
            Some(mut user) => {
                user.last_seen = now;
                user
            }
            None => User {
                address: voter.clone(),
                created_at: now,
                last_seen: now,
            },
        };
        let ballot = Ballot {
            round: round.id,
            voter: voter.clone(),
            candidate,
            cast_at: now,
        };

        let mut batch = self.store.write_batch()?;
        match batch.insert_ballot(&ballot) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(EngineError::AlreadyVoted {
                    voter,
                    round: round.id,
                });
            }
            Err(e) => return Err(e.into()),
        }
        batch.increment_tally(round.id, candidate)?;
        batch.put_user(&user)?;
        batch.commit()?;

        tracing::debug!(
            wallet = %ballot.voter,
            round = %ballot.round,
            candidate = %ballot.candidate,
            "ballot committed"
        );
        Ok(ballot)
    }
}
