use deadpool::managed::PoolError;
use thiserror::Error;

/// Failures surfaced by the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("target {0} not found")]
    TargetNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError<libsql::Error>),
    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::TargetNotFound(_))
    }
}
