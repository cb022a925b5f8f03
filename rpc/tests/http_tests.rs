//! HTTP surface tests: a live axum server over a real LMDB environment,
//! driven with a plain HTTP client the way a wallet front end would.

use std::net::SocketAddr;
use std::sync::Arc;

use eggvote_node::{NodeMetrics, VotingEngine};
use eggvote_rounds::{CloseSchedule, ManualClock};
use eggvote_rpc::RpcServer;
use eggvote_store_lmdb::LmdbEnvironment;

/// 2021-01-01 00:00:00 UTC.
const DAY_START: u64 = 1_609_459_200;
const CANDIDATES: u16 = 20;

// ── Helpers ──────────────────────────────────────────────────────────────

struct TestServer {
    addr: SocketAddr,
    engine: Arc<VotingEngine>,
    clock: Arc<ManualClock>,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

async fn start_server() -> (tempfile::TempDir, TestServer) {
    start_server_with_cors(true).await
}

async fn start_server_with_cors(cors_allow_any: bool) -> (tempfile::TempDir, TestServer) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(
        LmdbEnvironment::open(dir.path(), 10, 32 * 1024 * 1024).expect("open environment"),
    );
    let clock = Arc::new(ManualClock::new(DAY_START));
    let metrics = Arc::new(NodeMetrics::new());
    let engine = Arc::new(VotingEngine::new(
        store,
        clock.clone(),
        CloseSchedule::new(6, 0),
        CANDIDATES,
        metrics.clone(),
    ));
    engine.bootstrap().expect("bootstrap");

    let server = RpcServer::new(
        "127.0.0.1:0".parse().expect("listen addr"),
        cors_allow_any,
        engine.clone(),
        metrics,
    );
    let app = server.router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (dir, TestServer { addr, engine, clock })
}

async fn post_vote(
    client: &reqwest::Client,
    server: &TestServer,
    wallet: &str,
    candidate: u16,
) -> reqwest::Response {
    client
        .post(server.url("/votes"))
        .json(&serde_json::json!({ "walletAddress": wallet, "candidateId": candidate }))
        .send()
        .await
        .expect("send vote")
}

// ── 1. Round snapshot ────────────────────────────────────────────────────

#[tokio::test]
async fn current_round_lists_every_candidate_with_zero_votes() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/rounds/current"))
        .send()
        .await
        .expect("get round");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["roundId"], 1);
    assert_eq!(body["status"], "open");
    assert_eq!(body["closesAt"], DAY_START + 6 * 3600);
    assert_eq!(body["totalVotes"], 0);

    let candidates = body["candidates"].as_array().expect("candidates array");
    assert_eq!(candidates.len(), CANDIDATES as usize);
    // All zero, so the order falls back to candidate id ascending.
    assert_eq!(candidates[0]["candidateId"], 1);
    assert_eq!(candidates[0]["votes"], 0);
    assert_eq!(candidates[19]["candidateId"], 20);
}

// ── 2. Casting and rejecting votes ───────────────────────────────────────

#[tokio::test]
async fn vote_updates_snapshot_and_duplicate_is_a_conflict() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = post_vote(&client, &server, "0xAbC", 5).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["totalVotes"], 1);
    assert_eq!(body["candidates"][0]["candidateId"], 5);
    assert_eq!(body["candidates"][0]["votes"], 1);

    // Same wallet, different candidate: rejected, nothing recorded.
    let response = post_vote(&client, &server, "0xabc", 7).await;
    assert_eq!(response.status(), 409);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["error"], "alreadyVoted");
    assert!(body["message"].as_str().expect("message").contains("0xabc"));

    // The engine agrees with what HTTP reported.
    let check = server.engine.check_ballot("0xABC").expect("check");
    assert_eq!(
        check.ballot.expect("ballot").candidate.as_u16(),
        5,
        "first ballot stands"
    );
    let snapshot = server.engine.current_snapshot().expect("snapshot");
    assert_eq!(snapshot.total_votes, 1);
}

#[tokio::test]
async fn malformed_votes_are_bad_requests() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    for (wallet, candidate) in [("0xAbC", 0), ("0xAbC", CANDIDATES + 1), ("", 5), ("   ", 5)] {
        let response = post_vote(&client, &server, wallet, candidate).await;
        assert_eq!(response.status(), 400, "wallet={wallet:?} candidate={candidate}");
        let body: serde_json::Value = response.json().await.expect("json body");
        assert_eq!(body["error"], "invalidRequest");
    }

    let snapshot = server.engine.current_snapshot().expect("snapshot");
    assert_eq!(snapshot.total_votes, 0, "no rejected vote was recorded");
}

// ── 3. Ballot check ──────────────────────────────────────────────────────

#[tokio::test]
async fn check_reflects_ballot_state_before_and_after_voting() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/votes/check"))
        .json(&serde_json::json!({ "walletAddress": "0xCafe" }))
        .send()
        .await
        .expect("check");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["hasVoted"], false);
    assert!(
        body.get("candidateId").is_none(),
        "no candidate field before voting"
    );

    assert_eq!(post_vote(&client, &server, "0xCAFE", 9).await.status(), 200);

    let response = client
        .post(server.url("/votes/check"))
        .json(&serde_json::json!({ "walletAddress": "0xcafe" }))
        .send()
        .await
        .expect("check");
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["hasVoted"], true);
    assert_eq!(body["candidateId"], 9);
}

// ── 4. Wallet auth ───────────────────────────────────────────────────────

#[tokio::test]
async fn wallet_auth_creates_then_refreshes_the_user() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/auth/wallet"))
        .json(&serde_json::json!({ "walletAddress": "0xFeedBeef" }))
        .send()
        .await
        .expect("auth");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["walletAddress"], "0xfeedbeef", "normalized");
    assert_eq!(body["createdAt"], DAY_START);
    assert_eq!(body["lastSeen"], DAY_START);

    server.clock.advance(300);

    let response = client
        .post(server.url("/auth/wallet"))
        .json(&serde_json::json!({ "walletAddress": "0xFEEDBEEF" }))
        .send()
        .await
        .expect("auth");
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["createdAt"], DAY_START, "creation time is stable");
    assert_eq!(body["lastSeen"], DAY_START + 300);
}

// ── 5. Health and metrics ────────────────────────────────────────────────

#[tokio::test]
async fn health_and_metrics_report_service_state() {
    let (_dir, server) = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/health"))
        .send()
        .await
        .expect("health");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("json body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["roundId"], 1);
    assert_eq!(body["roundStatus"], "open");

    assert_eq!(post_vote(&client, &server, "0xA", 3).await.status(), 200);

    let response = client
        .get(server.url("/metrics"))
        .send()
        .await
        .expect("metrics");
    assert_eq!(response.status(), 200);
    let text = response.text().await.expect("metrics text");
    assert!(text.contains("eggvote_votes_total 1"));
    assert!(text.contains("eggvote_current_round_id 1"));
    assert!(text.contains("eggvote_request_duration_seconds_bucket"));
}

// ── 6. CORS ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn cors_toggle_controls_the_allow_origin_header() {
    let (_dir, open) = start_server_with_cors(true).await;
    let client = reqwest::Client::new();

    let response = client
        .get(open.url("/health"))
        .header("Origin", "http://dapp.example")
        .send()
        .await
        .expect("health");
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .expect("allow-origin header"),
        "*"
    );

    let (_dir2, closed) = start_server_with_cors(false).await;
    let response = client
        .get(closed.url("/health"))
        .header("Origin", "http://dapp.example")
        .send()
        .await
        .expect("health");
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
