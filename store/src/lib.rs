//! Abstract storage traits for the eggvote service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod ballot;
pub mod dispatch;
pub mod error;
pub mod round;
pub mod tally;
pub mod user;

pub use ballot::{Ballot, BallotStore};
pub use dispatch::{DispatchJob, DispatchQueueStore};
pub use error::StoreError;
pub use round::{Round, RoundStore};
pub use tally::{TallyEntry, TallyStore};
pub use user::{User, UserStore};
