//! HTTP API for the eggvote node.
//!
//! Provides endpoints for:
//! - Current round and candidate standings
//! - Casting a ballot and checking for one
//! - Wallet login (create or refresh the user record)
//! - Liveness and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{RpcServer, RpcState};
