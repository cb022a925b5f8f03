//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use eggvote_store::StoreError;

use crate::ballot::LmdbBallotStore;
use crate::dispatch::LmdbDispatchStore;
use crate::round::LmdbRoundStore;
use crate::tally::LmdbTallyStore;
use crate::user::LmdbUserStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Wraps the LMDB environment and all named database handles.
///
/// One environment holds every store. Cross-store mutations (casting a vote,
/// closing a round) must go through [`LmdbEnvironment::write_batch`] so they
/// commit in a single transaction.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub users_db: Database<Bytes, Bytes>,
    pub ballots_db: Database<Bytes, Bytes>,
    pub tallies_db: Database<Bytes, Bytes>,
    pub rounds_db: Database<Bytes, Bytes>,
    pub meta_db: Database<Bytes, Bytes>,
    pub dispatch_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("failed to create {}: {e}", path.display())))?;

        // SAFETY: each environment path is opened exactly once per process;
        // the daemon owns a single LmdbEnvironment.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)
        }
        .map_err(LmdbError::from)?;

        let mut wtxn = env.write_txn().map_err(LmdbError::from)?;
        let users_db = env
            .create_database(&mut wtxn, Some("users"))
            .map_err(LmdbError::from)?;
        let ballots_db = env
            .create_database(&mut wtxn, Some("ballots"))
            .map_err(LmdbError::from)?;
        let tallies_db = env
            .create_database(&mut wtxn, Some("tallies"))
            .map_err(LmdbError::from)?;
        let rounds_db = env
            .create_database(&mut wtxn, Some("rounds"))
            .map_err(LmdbError::from)?;
        let meta_db = env
            .create_database(&mut wtxn, Some("meta"))
            .map_err(LmdbError::from)?;
        let dispatch_db = env
            .create_database(&mut wtxn, Some("dispatch_queue"))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::info!(
            path = %path.display(),
            map_size,
            "opened LMDB environment"
        );

        Ok(Self {
            env: Arc::new(env),
            users_db,
            ballots_db,
            tallies_db,
            rounds_db,
            meta_db,
            dispatch_db,
        })
    }

    /// The underlying heed environment.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Flush buffered writes to disk. Called once during shutdown.
    pub fn force_sync(&self) -> Result<(), StoreError> {
        self.env.force_sync().map_err(LmdbError::from)?;
        Ok(())
    }

    /// Begin a write batch spanning any combination of stores.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }

    // ── Store accessors ─────────────────────────────────────────────────

    pub fn user_store(&self) -> LmdbUserStore {
        LmdbUserStore {
            env: self.env.clone(),
            users_db: self.users_db,
        }
    }

    pub fn ballot_store(&self) -> LmdbBallotStore {
        LmdbBallotStore {
            env: self.env.clone(),
            ballots_db: self.ballots_db,
        }
    }

    pub fn tally_store(&self) -> LmdbTallyStore {
        LmdbTallyStore {
            env: self.env.clone(),
            tallies_db: self.tallies_db,
        }
    }

    pub fn round_store(&self) -> LmdbRoundStore {
        LmdbRoundStore {
            env: self.env.clone(),
            rounds_db: self.rounds_db,
            meta_db: self.meta_db,
        }
    }

    pub fn dispatch_store(&self) -> LmdbDispatchStore {
        LmdbDispatchStore {
            env: self.env.clone(),
            dispatch_db: self.dispatch_db,
        }
    }
}
