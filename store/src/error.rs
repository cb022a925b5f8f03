use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether the caller may safely retry the operation.
    ///
    /// Only backend failures are transient. A retried read is harmless;
    /// writes must re-derive state first because the failed attempt may
    /// have committed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
