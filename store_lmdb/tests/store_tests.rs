//! Integration tests exercising the LMDB store implementations end-to-end:
//! write batches → trait readbacks → environment reopen.

use eggvote_store::ballot::{Ballot, BallotStore};
use eggvote_store::dispatch::{DispatchJob, DispatchQueueStore};
use eggvote_store::round::{Round, RoundStore};
use eggvote_store::tally::TallyStore;
use eggvote_store::user::{User, UserStore};
use eggvote_store::StoreError;
use eggvote_store_lmdb::LmdbEnvironment;
use eggvote_types::{CandidateId, RoundId, RoundStatus, Timestamp, WalletAddress};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 10, 64 * 1024 * 1024).expect("open env");
    (dir, env)
}

fn addr(raw: &str) -> WalletAddress {
    WalletAddress::parse(raw).expect("valid address")
}

fn user(raw: &str, created: u64, seen: u64) -> User {
    User {
        address: addr(raw),
        created_at: Timestamp::new(created),
        last_seen: Timestamp::new(seen),
    }
}

fn ballot(round: u64, voter: &str, candidate: u16, ts: u64) -> Ballot {
    Ballot {
        round: RoundId::new(round),
        voter: addr(voter),
        candidate: CandidateId::new(candidate),
        cast_at: Timestamp::new(ts),
    }
}

/// Cast one vote the way the engine does: ballot + tally in one batch.
fn cast(env: &LmdbEnvironment, b: &Ballot) {
    let mut batch = env.write_batch().expect("write_batch");
    batch.insert_ballot(b).expect("insert_ballot");
    batch
        .increment_tally(b.round, b.candidate)
        .expect("increment_tally");
    batch.commit().expect("commit");
}

// ---------------------------------------------------------------------------
// 1. User store
// ---------------------------------------------------------------------------

#[test]
fn user_roundtrip_and_upsert() {
    let (_dir, env) = temp_env();
    let store = env.user_store();

    assert!(store.get_user(&addr("0xabc")).expect("get").is_none());

    store.put_user(&user("0xabc", 100, 100)).expect("put");
    let loaded = store
        .get_user(&addr("0xABC"))
        .expect("get")
        .expect("user exists");
    assert_eq!(loaded.created_at, Timestamp::new(100));

    // Upsert refreshes last_seen, keeps created_at.
    store.put_user(&user("0xabc", 100, 250)).expect("put");
    let loaded = store
        .get_user(&addr("0xabc"))
        .expect("get")
        .expect("user exists");
    assert_eq!(loaded.created_at, Timestamp::new(100));
    assert_eq!(loaded.last_seen, Timestamp::new(250));
    assert_eq!(store.user_count().expect("count"), 1);
}

// ---------------------------------------------------------------------------
// 2. Ballot store
// ---------------------------------------------------------------------------

#[test]
fn voters_for_filters_by_candidate() {
    let (_dir, env) = temp_env();

    cast(&env, &ballot(1, "0xaaa", 5, 10));
    cast(&env, &ballot(1, "0xbbb", 5, 11));
    cast(&env, &ballot(1, "0xccc", 7, 12));
    cast(&env, &ballot(2, "0xddd", 5, 13));

    let store = env.ballot_store();
    let voters = store
        .voters_for(RoundId::new(1), CandidateId::new(5))
        .expect("voters_for");
    assert_eq!(voters, vec![addr("0xaaa"), addr("0xbbb")]);

    assert_eq!(store.ballot_count(RoundId::new(1)).expect("count"), 3);
    assert_eq!(store.ballot_count(RoundId::new(2)).expect("count"), 1);
    assert_eq!(store.ballot_count(RoundId::new(3)).expect("count"), 0);
}

// ---------------------------------------------------------------------------
// 3. Tally store
// ---------------------------------------------------------------------------

#[test]
fn tally_counts_match_ballots() {
    let (_dir, env) = temp_env();

    {
        let mut batch = env.write_batch().expect("write_batch");
        batch.init_tallies(RoundId::new(1), 20).expect("init");
        batch.commit().expect("commit");
    }

    cast(&env, &ballot(1, "0xaaa", 5, 10));
    cast(&env, &ballot(1, "0xbbb", 5, 11));
    cast(&env, &ballot(1, "0xccc", 7, 12));

    let tallies = env.tally_store();
    assert_eq!(
        tallies
            .get_tally(RoundId::new(1), CandidateId::new(5))
            .expect("get"),
        2
    );
    assert_eq!(
        tallies
            .get_tally(RoundId::new(1), CandidateId::new(7))
            .expect("get"),
        1
    );
    // Absent row reads as zero.
    assert_eq!(
        tallies
            .get_tally(RoundId::new(9), CandidateId::new(1))
            .expect("get"),
        0
    );

    // sum(tallies) == count(ballots)
    let total = tallies.total_votes(RoundId::new(1)).expect("total");
    let ballots = env
        .ballot_store()
        .ballot_count(RoundId::new(1))
        .expect("count");
    assert_eq!(total, ballots);
    assert_eq!(tallies.tallies(RoundId::new(1)).expect("rows").len(), 20);
}

// ---------------------------------------------------------------------------
// 4. Round store
// ---------------------------------------------------------------------------

#[test]
fn round_archive_and_current() {
    let (_dir, env) = temp_env();
    let rounds = env.round_store();

    assert!(rounds.current_round().expect("current").is_none());

    let open = Round::open(RoundId::new(1), Timestamp::new(0), Timestamp::new(100));
    {
        let mut batch = env.write_batch().expect("write_batch");
        batch.put_current_round(&open).expect("put current");
        batch.commit().expect("commit");
    }
    let current = rounds
        .current_round()
        .expect("current")
        .expect("round exists");
    assert_eq!(current.id, RoundId::new(1));
    assert!(current.status.is_open());

    let mut closed = open.clone();
    closed.status = RoundStatus::Closed;
    closed.winner = Some(CandidateId::new(3));
    closed.total_votes = 7;
    {
        let mut batch = env.write_batch().expect("write_batch");
        batch.archive_round(&closed).expect("archive");
        batch
            .put_current_round(&Round::open(
                RoundId::new(2),
                Timestamp::new(100),
                Timestamp::new(200),
            ))
            .expect("put next");
        batch.commit().expect("commit");
    }

    assert_eq!(rounds.closed_round_count().expect("count"), 1);
    let archived = rounds
        .get_round(RoundId::new(1))
        .expect("get")
        .expect("archived");
    assert_eq!(archived.winner, Some(CandidateId::new(3)));
    assert_eq!(archived.total_votes, 7);
    assert!(rounds.get_round(RoundId::new(9)).expect("get").is_none());
}

// ---------------------------------------------------------------------------
// 5. Dispatch queue
// ---------------------------------------------------------------------------

#[test]
fn dispatch_queue_lifecycle() {
    let (_dir, env) = temp_env();
    let queue = env.dispatch_store();

    assert_eq!(queue.queue_len().expect("len"), 0);

    let job = DispatchJob {
        round: RoundId::new(1),
        winner: CandidateId::new(5),
        voters: vec![addr("0xaaa")],
        enqueued_at: Timestamp::new(100),
        attempts: 0,
    };
    {
        let mut batch = env.write_batch().expect("write_batch");
        batch.enqueue_dispatch(&job).expect("enqueue");
        batch.commit().expect("commit");
    }

    queue.mark_attempt(RoundId::new(1)).expect("mark");
    queue.mark_attempt(RoundId::new(1)).expect("mark");
    let jobs = queue.pending_jobs().expect("jobs");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].attempts, 2);
    assert_eq!(jobs[0].winner, CandidateId::new(5));

    queue.ack_job(RoundId::new(1)).expect("ack");
    assert_eq!(queue.queue_len().expect("len"), 0);

    // Bumping a missing job is an error the retry loop can log.
    let err = queue.mark_attempt(RoundId::new(9)).expect_err("missing job");
    assert!(matches!(err, StoreError::NotFound(_)));
}

// ---------------------------------------------------------------------------
// 6. Persistence across reopen
// ---------------------------------------------------------------------------

#[test]
fn data_survives_environment_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");

    {
        let env = LmdbEnvironment::open(dir.path(), 10, 64 * 1024 * 1024).expect("open env");
        env.user_store()
            .put_user(&user("0xabc", 1, 1))
            .expect("put user");
        cast(&env, &ballot(1, "0xabc", 5, 10));
    }

    let env = LmdbEnvironment::open(dir.path(), 10, 64 * 1024 * 1024).expect("reopen env");
    assert!(env
        .user_store()
        .get_user(&addr("0xabc"))
        .expect("get")
        .is_some());
    assert_eq!(
        env.tally_store()
            .get_tally(RoundId::new(1), CandidateId::new(5))
            .expect("get"),
        1
    );
}
