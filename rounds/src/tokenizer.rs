//! Client for the external tokenization collaborator.
//!
//! When a round closes with a winner, the controller hands off
//! `(round, winning candidate, voters)` to an external system that mints the
//! token. This module provides the HTTP client for a configured endpoint and
//! a null client that acknowledges locally when no endpoint is configured.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use eggvote_store::dispatch::DispatchJob;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("tokenizer request failed: {0}")]
    Request(String),

    #[error("tokenizer returned HTTP {status}")]
    Status { status: u16 },
}

/// Payload delivered to the tokenization endpoint.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizationRequest {
    pub round_id: u64,
    pub candidate_id: u16,
    pub voters: Vec<String>,
}

impl TokenizationRequest {
    pub fn from_job(job: &DispatchJob) -> Self {
        Self {
            round_id: job.round.as_u64(),
            candidate_id: job.winner.as_u16(),
            voters: job.voters.iter().map(|v| v.as_str().to_string()).collect(),
        }
    }
}

/// The configured tokenization client.
pub enum Tokenizer {
    Http(HttpTokenizer),
    Null(NullTokenizer),
}

impl Tokenizer {
    /// Deliver one tokenization request and wait for acknowledgment.
    pub async fn dispatch(&self, request: &TokenizationRequest) -> Result<(), DispatchError> {
        match self {
            Tokenizer::Http(client) => client.dispatch(request).await,
            Tokenizer::Null(client) => client.dispatch(request).await,
        }
    }
}

/// HTTP client posting tokenization requests to a configured endpoint.
///
/// A 2xx response is the acknowledgment; anything else leaves the job queued
/// for retry.
pub struct HttpTokenizer {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTokenizer {
    pub fn new(endpoint: &str, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn dispatch(&self, request: &TokenizationRequest) -> Result<(), DispatchError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| DispatchError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DispatchError::Status {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// A recording tokenizer used when no endpoint is configured, and by tests.
///
/// Logs the handoff, acknowledges immediately, and remembers every request
/// it saw. Can be told to fail to exercise the retry path.
#[derive(Default)]
pub struct NullTokenizer {
    dispatched: Mutex<Vec<TokenizationRequest>>,
    fail: AtomicBool,
}

impl NullTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent dispatches fail until cleared.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Every request dispatched so far.
    pub fn dispatched(&self) -> Vec<TokenizationRequest> {
        self.dispatched
            .lock()
            .expect("tokenizer mutex poisoned")
            .clone()
    }

    pub async fn dispatch(&self, request: &TokenizationRequest) -> Result<(), DispatchError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Request("null tokenizer set to fail".into()));
        }
        tracing::info!(
            round = request.round_id,
            winner = request.candidate_id,
            voters = request.voters.len(),
            "tokenization handoff acknowledged locally (no endpoint configured)"
        );
        self.dispatched
            .lock()
            .expect("tokenizer mutex poisoned")
            .push(request.clone());
        Ok(())
    }
}
