//! LMDB implementation of UserStore.
//!
//! Key format: the normalized address bytes. Values are bincode-encoded
//! [`User`] records.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use eggvote_store::user::{User, UserStore};
use eggvote_store::StoreError;
use eggvote_types::WalletAddress;

use crate::LmdbError;

pub struct LmdbUserStore {
    pub(crate) env: Arc<Env>,
    pub(crate) users_db: Database<Bytes, Bytes>,
}

impl UserStore for LmdbUserStore {
    fn get_user(&self, address: &WalletAddress) -> Result<Option<User>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .users_db
            .get(&rtxn, address.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let user: User = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let bytes = bincode::serialize(user).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, user.address.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.users_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
