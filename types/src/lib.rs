//! Fundamental types for the eggvote service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: wallet addresses, candidate and round identifiers, timestamps,
//! and the round lifecycle status.

pub mod address;
pub mod candidate;
pub mod round;
pub mod time;

pub use address::{AddressError, WalletAddress};
pub use candidate::CandidateId;
pub use round::{RoundId, RoundStatus};
pub use time::Timestamp;
