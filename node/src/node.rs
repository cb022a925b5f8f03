//! The main service struct — wires storage, engine, and scheduler together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use eggvote_rounds::{Clock, HttpTokenizer, NullTokenizer, SystemClock, Tokenizer};
use eggvote_store::round::RoundStore;
use eggvote_store::tally::TallyStore;
use eggvote_store_lmdb::LmdbEnvironment;

use crate::config::NodeConfig;
use crate::controller::RoundController;
use crate::engine::VotingEngine;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::shutdown::ShutdownController;

/// Default LMDB map size: 1 GiB.
const DEFAULT_MAP_SIZE: usize = 1 << 30;
/// Number of named LMDB databases.
const MAX_DBS: u32 = 8;
/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running eggvote service.
pub struct VotingNode {
    pub config: NodeConfig,
    pub store: Arc<LmdbEnvironment>,
    pub engine: Arc<VotingEngine>,
    pub controller: Arc<RoundController>,
    pub metrics: Arc<NodeMetrics>,
    pub shutdown: Arc<ShutdownController>,
    /// Handles for spawned background tasks (joined during shutdown).
    task_handles: Vec<JoinHandle<()>>,
}

impl VotingNode {
    /// Create and initialize a node from configuration.
    ///
    /// Opens the LMDB environment at `config.node.data_dir` and prepares the
    /// engine and controller. Call [`VotingNode::start`] to bootstrap the
    /// round state and begin scheduling closes.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`VotingNode::new`] with an injected clock, for tests.
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn Clock>) -> Result<Self, NodeError> {
        config.validate()?;

        let store = Arc::new(
            LmdbEnvironment::open(&config.node.data_dir, MAX_DBS, DEFAULT_MAP_SIZE)
                .map_err(eggvote_store::StoreError::from)?,
        );

        let metrics = Arc::new(NodeMetrics::new());
        let shutdown = Arc::new(ShutdownController::new());
        let schedule = config.schedule();

        let tokenizer = Arc::new(match config.tokenizer.endpoint.as_deref() {
            Some(endpoint) => {
                tracing::info!(endpoint, "tokenization dispatch via HTTP");
                Tokenizer::Http(HttpTokenizer::new(endpoint, config.tokenizer.timeout_secs))
            }
            None => {
                tracing::info!("no tokenizer endpoint configured, acknowledging locally");
                Tokenizer::Null(NullTokenizer::new())
            }
        });

        let engine = Arc::new(VotingEngine::new(
            store.clone(),
            clock.clone(),
            schedule,
            config.node.candidate_count,
            metrics.clone(),
        ));
        let controller = Arc::new(RoundController::new(
            store.clone(),
            clock,
            schedule,
            config.node.candidate_count,
            tokenizer,
            config.tokenizer.max_attempts,
            metrics.clone(),
        ));

        Ok(Self {
            config,
            store,
            engine,
            controller,
            metrics,
            shutdown,
            task_handles: Vec::new(),
        })
    }

    /// Bootstrap round state and spawn the round scheduler.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        tracing::info!(
            data_dir = %self.config.node.data_dir.display(),
            candidates = self.config.node.candidate_count,
            close_hour = self.config.node.close_hour,
            close_minute = self.config.node.close_minute,
            "eggvote node starting"
        );

        self.engine.bootstrap()?;

        // ── Round scheduler task ────────────────────────────────────────
        let controller = Arc::clone(&self.controller);
        let mut shutdown_rx = self.shutdown.subscribe();
        let poll = Duration::from_secs(self.config.node.poll_interval_secs);

        let scheduler_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("round scheduler shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        controller.tick().await;
                    }
                }
            }
        });
        self.task_handles.push(scheduler_handle);

        tracing::info!("eggvote node started");
        Ok(())
    }

    /// Stop the node gracefully.
    ///
    /// 1. Sends the shutdown signal to all background tasks.
    /// 2. Flushes pending writes to LMDB.
    /// 3. Waits for background tasks to complete (with timeout).
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("eggvote node stopping");

        self.shutdown.shutdown();

        if let Err(e) = self.store.force_sync() {
            tracing::warn!("LMDB force_sync failed: {e}");
        }

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        self.refresh_metrics();
        tracing::info!("eggvote node stopped");
        Ok(())
    }

    /// Re-derive the round gauges from the store.
    pub fn refresh_metrics(&self) {
        if let Ok(Some(round)) = self.store.round_store().current_round() {
            self.metrics.current_round_id.set(round.id.as_u64() as i64);
            if let Ok(votes) = self.store.tally_store().total_votes(round.id) {
                self.metrics.current_round_votes.set(votes as i64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eggvote_rounds::ManualClock;
    use eggvote_types::RoundId;

    fn test_config(dir: &tempfile::TempDir) -> NodeConfig {
        let mut config = NodeConfig::default();
        config.node.data_dir = dir.path().to_path_buf();
        config.node.poll_interval_secs = 1;
        config
    }

    #[tokio::test]
    async fn start_bootstraps_and_stop_joins_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = Arc::new(ManualClock::new(1_609_459_200));
        let mut node =
            VotingNode::with_clock(test_config(&dir), clock).expect("node");

        node.start().await.expect("start");
        assert_eq!(node.engine.current_round().expect("round").id, RoundId::FIRST);
        assert_eq!(node.metrics.current_round_id.get(), 1);

        node.stop().await.expect("stop");
        assert!(node.shutdown.is_triggered());
        assert!(node.task_handles.is_empty());
    }

    #[tokio::test]
    async fn restart_resumes_existing_round_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = Arc::new(ManualClock::new(1_609_459_200));

        {
            let mut node =
                VotingNode::with_clock(test_config(&dir), clock.clone()).expect("node");
            node.start().await.expect("start");
            node.engine.cast_vote("0xaaa", 7).expect("cast");
            node.stop().await.expect("stop");
        }

        let mut node = VotingNode::with_clock(test_config(&dir), clock).expect("reopened node");
        node.start().await.expect("start");
        let snapshot = node.engine.current_snapshot().expect("snapshot");
        assert_eq!(snapshot.round.id, RoundId::FIRST);
        assert_eq!(snapshot.total_votes, 1);
        assert_eq!(node.metrics.current_round_votes.get(), 1);
        node.stop().await.expect("stop");
    }
}
