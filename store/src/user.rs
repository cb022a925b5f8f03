//! User storage trait.

use crate::StoreError;
use eggvote_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

/// A wallet user record.
///
/// Created on first contact (login, vote, or ballot check) and never
/// deleted. `last_seen` is refreshed on every subsequent contact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub address: WalletAddress,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
}

/// Trait for user storage operations.
pub trait UserStore {
    /// Fetch a user by normalized address, `None` if never seen.
    fn get_user(&self, address: &WalletAddress) -> Result<Option<User>, StoreError>;

    /// Insert or replace a user record.
    fn put_user(&self, user: &User) -> Result<(), StoreError>;

    /// Total number of user records.
    fn user_count(&self) -> Result<u64, StoreError>;
}
