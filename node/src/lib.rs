//! eggvote node — orchestrates the voting service.
//!
//! The node is the central coordinator that:
//! - Opens the LMDB environment and bootstraps round state
//! - Executes vote, check, and login operations through the [`VotingEngine`]
//! - Owns the round scheduler that closes rounds at the configured time
//! - Dispatches round winners to the tokenization collaborator
//! - Exposes metrics, logging setup, and graceful shutdown

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use controller::RoundController;
pub use engine::{BallotCheck, RoundSnapshot, VotingEngine};
pub use error::{EngineError, NodeError};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::VotingNode;
pub use shutdown::ShutdownController;
