//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use eggvote_node::EngineError;

/// Errors surfaced to HTTP clients.
///
/// Engine errors keep their own display text; this layer only decides the
/// status code and the machine-readable `error` code in the JSON body.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    /// Validation failures are 400, a duplicate ballot is 409, transient
    /// storage trouble is 503, everything else is 500.
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Engine(e) if e.is_validation() => StatusCode::BAD_REQUEST,
            RpcError::Engine(EngineError::AlreadyVoted { .. }) => StatusCode::CONFLICT,
            RpcError::Engine(e) if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
            RpcError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for the `error` field of the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::InvalidRequest(_) => "invalidRequest",
            RpcError::Engine(e) if e.is_validation() => "invalidRequest",
            RpcError::Engine(EngineError::AlreadyVoted { .. }) => "alreadyVoted",
            RpcError::Engine(e) if e.is_transient() => "storageUnavailable",
            RpcError::Engine(_) => "internalError",
            RpcError::Server(_) => "internalError",
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }
        let body = Json(serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eggvote_store::StoreError;
    use eggvote_types::{RoundId, WalletAddress};

    fn rpc(e: EngineError) -> RpcError {
        RpcError::from(e)
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let bad_address = EngineError::from(WalletAddress::parse("   ").unwrap_err());
        let bad_candidate = EngineError::UnknownCandidate {
            candidate: 25,
            candidate_count: 20,
        };
        let closed = EngineError::RoundNotOpen(RoundId::new(3));

        for e in [bad_address, bad_candidate, closed] {
            let e = rpc(e);
            assert_eq!(e.status(), StatusCode::BAD_REQUEST);
            assert_eq!(e.code(), "invalidRequest");
        }
    }

    #[test]
    fn duplicate_ballot_is_a_conflict() {
        let e = rpc(EngineError::AlreadyVoted {
            voter: WalletAddress::parse("0xAbC").unwrap(),
            round: RoundId::new(1),
        });
        assert_eq!(e.status(), StatusCode::CONFLICT);
        assert_eq!(e.code(), "alreadyVoted");
    }

    #[test]
    fn transient_store_errors_are_service_unavailable() {
        let e = rpc(EngineError::Store(StoreError::Backend(
            "map full".to_string(),
        )));
        assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(e.code(), "storageUnavailable");
    }

    #[test]
    fn everything_else_is_internal() {
        let corrupt = rpc(EngineError::Store(StoreError::Corruption(
            "bad record".to_string(),
        )));
        assert_eq!(corrupt.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(corrupt.code(), "internalError");

        let no_round = rpc(EngineError::NoOpenRound);
        assert_eq!(no_round.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let server = RpcError::Server("encoder failed".to_string());
        assert_eq!(server.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
