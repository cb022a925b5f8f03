//! The round controller — the single owner of round transitions.
//!
//! One scheduler task polls [`RoundController::tick`] on an interval. A tick
//! closes the open round once its deadline has passed and then works the
//! tokenization dispatch queue. The close sequence commits in one write
//! batch, fenced by re-reading the round inside the transaction, so a
//! duplicate trigger finds the round already advanced and commits nothing.

use std::sync::Arc;

use eggvote_rounds::{total_votes, winner, Clock, CloseSchedule, TokenizationRequest, Tokenizer};
use eggvote_store::dispatch::{DispatchJob, DispatchQueueStore};
use eggvote_store::round::{Round, RoundStore};
use eggvote_store_lmdb::LmdbEnvironment;
use eggvote_types::RoundStatus;

use crate::error::EngineError;
use crate::metrics::NodeMetrics;

pub struct RoundController {
    store: Arc<LmdbEnvironment>,
    clock: Arc<dyn Clock>,
    schedule: CloseSchedule,
    candidate_count: u16,
    tokenizer: Arc<Tokenizer>,
    /// Delivery attempts before a job is parked for operator attention.
    max_attempts: u32,
    metrics: Arc<NodeMetrics>,
}

impl RoundController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<LmdbEnvironment>,
        clock: Arc<dyn Clock>,
        schedule: CloseSchedule,
        candidate_count: u16,
        tokenizer: Arc<Tokenizer>,
        max_attempts: u32,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self {
            store,
            clock,
            schedule,
            candidate_count,
            tokenizer,
            max_attempts,
            metrics,
        }
    }

    /// One scheduler tick: close the round if due, then work the dispatch
    /// queue. Errors are logged, never fatal; the next tick retries.
    pub async fn tick(&self) {
        if let Err(e) = self.close_due_round() {
            tracing::error!(error = %e, "round close failed");
        }
        if let Err(e) = self.drain_dispatch_queue().await {
            tracing::error!(error = %e, "dispatch queue drain failed");
        }
    }

    /// Close the open round when its deadline has passed.
    ///
    /// Returns the archived round, or `None` when nothing was due (or a
    /// concurrent close got there first).
    pub fn close_due_round(&self) -> Result<Option<Round>, EngineError> {
        let now = self.clock.now();
        let Some(round) = self.store.round_store().current_round()? else {
            return Ok(None);
        };
        if !round.closes_at.is_past(now) {
            return Ok(None);
        }
        self.close_round(&round)
    }

    /// The close sequence, all in one write batch:
    /// snapshot → winner → archive → enqueue dispatch → clear ballots and
    /// tallies → open the successor round.
    fn close_round(&self, expected: &Round) -> Result<Option<Round>, EngineError> {
        let now = self.clock.now();
        let mut batch = self.store.write_batch()?;

        // Fence: the round this batch sees must still be the one we decided
        // to close. A lost race means another close committed; drop the
        // batch and walk away.
        let stored = match batch.current_round()? {
            Some(r) if r.id == expected.id && r.closes_at == expected.closes_at => r,
            _ => {
                tracing::debug!(round = %expected.id, "close fence: round already advanced");
                return Ok(None);
            }
        };

        let rows = batch.tallies(stored.id)?;
        let winning = winner(&rows);
        let total = total_votes(&rows);

        let mut closed = stored.clone();
        closed.status = RoundStatus::Closed;
        closed.winner = winning;
        closed.total_votes = total;
        batch.archive_round(&closed)?;

        if let Some(candidate) = winning {
            let voters = batch.voters_for(stored.id, candidate)?;
            batch.enqueue_dispatch(&DispatchJob {
                round: stored.id,
                winner: candidate,
                voters,
                enqueued_at: now,
                attempts: 0,
            })?;
        }

        batch.clear_round_ballots(stored.id)?;
        batch.clear_round_tallies(stored.id)?;

        let next = Round::open(stored.id.next(), now, self.schedule.next_deadline(now));
        batch.put_current_round(&next)?;
        batch.init_tallies(next.id, self.candidate_count)?;
        batch.commit()?;

        self.metrics.rounds_closed_total.inc();
        self.metrics.current_round_id.set(next.id.as_u64() as i64);
        self.metrics.current_round_votes.set(0);

        match winning {
            Some(candidate) => tracing::info!(
                round = %closed.id,
                winner = candidate.as_u16(),
                total_votes = total,
                next_round = %next.id,
                "round closed"
            ),
            None => tracing::info!(
                round = %closed.id,
                next_round = %next.id,
                "round closed with no ballots"
            ),
        }
        Ok(Some(closed))
    }

    /// Attempt delivery of every queued job below the attempt cap.
    ///
    /// A job is removed only on acknowledgment; failures bump its attempt
    /// counter and leave it queued for the next tick. Jobs at the cap stay
    /// persisted but are no longer attempted.
    pub async fn drain_dispatch_queue(&self) -> Result<(), EngineError> {
        let jobs = self.store.dispatch_store().pending_jobs()?;
        for job in jobs {
            if job.attempts >= self.max_attempts {
                tracing::debug!(
                    round = %job.round,
                    attempts = job.attempts,
                    "dispatch job parked, attempt cap reached"
                );
                continue;
            }

            let request = TokenizationRequest::from_job(&job);
            match self.tokenizer.dispatch(&request).await {
                Ok(()) => {
                    self.store.dispatch_store().ack_job(job.round)?;
                    tracing::info!(
                        round = %job.round,
                        winner = job.winner.as_u16(),
                        voters = job.voters.len(),
                        "tokenization dispatch acknowledged"
                    );
                }
                Err(e) => {
                    self.store.dispatch_store().mark_attempt(job.round)?;
                    self.metrics.dispatch_failures_total.inc();
                    tracing::warn!(
                        round = %job.round,
                        attempt = job.attempts + 1,
                        error = %e,
                        "tokenization dispatch failed, job stays queued"
                    );
                }
            }
        }
        Ok(())
    }
}
