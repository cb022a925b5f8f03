//! Request handlers and wire DTOs.
//!
//! All JSON fields are camelCase. Handlers only talk to the engine; nothing
//! here reaches into the store directly.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use prometheus::TextEncoder;
use serde::{Deserialize, Serialize};

use eggvote_node::{EngineError, RoundSnapshot};
use eggvote_store::user::User;
use eggvote_types::RoundStatus;

use crate::error::RpcError;
use crate::server::RpcState;

// ── Rounds ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStanding {
    pub candidate_id: u16,
    pub votes: u64,
}

/// The open round with its ordered standings. Returned by
/// `GET /rounds/current` and by a successful `POST /votes`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    pub round_id: u64,
    pub status: &'static str,
    pub started_at: u64,
    pub closes_at: u64,
    pub total_votes: u64,
    /// Ordered by votes descending, candidate id ascending on ties.
    pub candidates: Vec<CandidateStanding>,
}

impl From<RoundSnapshot> for SnapshotResponse {
    fn from(snapshot: RoundSnapshot) -> Self {
        Self {
            round_id: snapshot.round.id.as_u64(),
            status: status_str(&snapshot.round.status),
            started_at: snapshot.round.started_at.as_secs(),
            closes_at: snapshot.round.closes_at.as_secs(),
            total_votes: snapshot.total_votes,
            candidates: snapshot
                .standings
                .iter()
                .map(|entry| CandidateStanding {
                    candidate_id: entry.candidate.as_u16(),
                    votes: entry.count,
                })
                .collect(),
        }
    }
}

fn status_str(status: &RoundStatus) -> &'static str {
    match status {
        RoundStatus::Open => "open",
        RoundStatus::Closed => "closed",
    }
}

// ── Votes ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub wallet_address: String,
    pub candidate_id: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCheckRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCheckResponse {
    pub has_voted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<u16>,
}

// ── Auth ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAuthRequest {
    pub wallet_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAuthResponse {
    /// Normalized form; may differ from the address the client sent.
    pub wallet_address: String,
    pub created_at: u64,
    pub last_seen: u64,
}

impl From<User> for WalletAuthResponse {
    fn from(user: User) -> Self {
        Self {
            wallet_address: user.address.as_str().to_string(),
            created_at: user.created_at.as_secs(),
            last_seen: user.last_seen.as_secs(),
        }
    }
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub round_id: u64,
    pub round_status: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// Retry an idempotent read once when storage reports a transient fault.
///
/// Only pure reads go through here. A failed write batch either fully
/// committed or fully didn't, so write paths surface the error and let the
/// caller re-derive state via `/votes/check` instead of retrying.
fn read_with_retry<T>(read: impl Fn() -> Result<T, EngineError>) -> Result<T, EngineError> {
    match read() {
        Err(e) if e.is_transient() => {
            tracing::debug!(error = %e, "transient read failure, retrying once");
            read()
        }
        result => result,
    }
}

/// `GET /rounds/current`
pub async fn current_round(
    State(state): State<Arc<RpcState>>,
) -> Result<Json<SnapshotResponse>, RpcError> {
    let snapshot = read_with_retry(|| state.engine.current_snapshot())?;
    Ok(Json(snapshot.into()))
}

/// `POST /votes` — cast a ballot, then return the snapshot it produced.
pub async fn cast_vote(
    State(state): State<Arc<RpcState>>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<SnapshotResponse>, RpcError> {
    state
        .engine
        .cast_vote(&request.wallet_address, request.candidate_id)?;
    let snapshot = read_with_retry(|| state.engine.current_snapshot())?;
    Ok(Json(snapshot.into()))
}

/// `POST /votes/check` — whether this wallet holds a ballot in the current
/// round. Creates the user record on first contact.
pub async fn check_vote(
    State(state): State<Arc<RpcState>>,
    Json(request): Json<VoteCheckRequest>,
) -> Result<Json<VoteCheckResponse>, RpcError> {
    let check = state.engine.check_ballot(&request.wallet_address)?;
    Ok(Json(VoteCheckResponse {
        has_voted: check.ballot.is_some(),
        candidate_id: check.ballot.map(|ballot| ballot.candidate.as_u16()),
    }))
}

/// `POST /auth/wallet` — wallet login. Creates the user on first contact,
/// refreshes `lastSeen` on every later one.
pub async fn wallet_auth(
    State(state): State<Arc<RpcState>>,
    Json(request): Json<WalletAuthRequest>,
) -> Result<Json<WalletAuthResponse>, RpcError> {
    let user = state.engine.resolve_or_create(&request.wallet_address)?;
    Ok(Json(user.into()))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<RpcState>>) -> Result<Json<HealthResponse>, RpcError> {
    let round = read_with_retry(|| state.engine.current_round())?;
    Ok(Json(HealthResponse {
        status: "ok",
        round_id: round.id.as_u64(),
        round_status: status_str(&round.status),
    }))
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<RpcState>>) -> Result<Response, RpcError> {
    let families = state.metrics.registry.gather();
    let text = TextEncoder::new()
        .encode_to_string(&families)
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        text,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eggvote_store::StoreError;
    use std::cell::Cell;

    #[test]
    fn transient_read_is_retried_once() {
        let calls = Cell::new(0u32);
        let result = read_with_retry(|| {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Err(EngineError::Store(StoreError::Backend("flaky".into())))
            } else {
                Ok(42)
            }
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn non_transient_read_fails_immediately() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = read_with_retry(|| {
            calls.set(calls.get() + 1);
            Err(EngineError::NoOpenRound)
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let response = SnapshotResponse {
            round_id: 1,
            status: "open",
            started_at: 100,
            closes_at: 200,
            total_votes: 3,
            candidates: vec![CandidateStanding {
                candidate_id: 5,
                votes: 3,
            }],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["roundId"], 1);
        assert_eq!(value["closesAt"], 200);
        assert_eq!(value["totalVotes"], 3);
        assert_eq!(value["candidates"][0]["candidateId"], 5);
    }

    #[test]
    fn check_response_omits_candidate_when_absent() {
        let no_vote = serde_json::to_value(VoteCheckResponse {
            has_voted: false,
            candidate_id: None,
        })
        .unwrap();
        assert_eq!(no_vote["hasVoted"], false);
        assert!(no_vote.get("candidateId").is_none());

        let voted = serde_json::to_value(VoteCheckResponse {
            has_voted: true,
            candidate_id: Some(7),
        })
        .unwrap();
        assert_eq!(voted["candidateId"], 7);
    }

    #[test]
    fn vote_request_accepts_camel_case() {
        let request: VoteRequest =
            serde_json::from_str(r#"{"walletAddress":"0xAbC","candidateId":5}"#).unwrap();
        assert_eq!(request.wallet_address, "0xAbC");
        assert_eq!(request.candidate_id, 5);
    }
}
