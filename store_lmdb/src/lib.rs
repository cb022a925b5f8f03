//! LMDB storage backend for the eggvote service.
//!
//! Implements all storage traits from `eggvote-store` using the `heed` LMDB
//! bindings. Each logical store maps to one named database within a single
//! environment. Mutations that must land together — a ballot with its tally
//! increment, a round close with its reset — go through [`WriteBatch`] and
//! commit in one transaction.

pub mod ballot;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod round;
pub mod tally;
pub mod user;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use write_batch::WriteBatch;
