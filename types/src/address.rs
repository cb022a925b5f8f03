//! Wallet address type, normalized for use as a storage key.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a raw wallet address fails validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("wallet address is empty")]
    Empty,
}

/// A wallet address as reported by a connected browser wallet.
///
/// The domain treats addresses as opaque identifiers: the only validation
/// required is non-emptiness. Input is normalized (trimmed, lowercased) so
/// the same wallet always resolves to the same user record regardless of how
/// the client cased it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Parse and normalize a raw address string.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(normalized))
    }

    /// Return the normalized address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized address as raw bytes, for key composition.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
