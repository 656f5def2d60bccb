use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewResultRecord, ResultRecord};

/// Failures of the record store. The calculator never produces these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Append-only log of analysis results.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Stores `record` under the next sequential id and returns that id.
    /// Existing records are never overwritten.
    async fn append(
        &self,
        record: NewResultRecord,
    ) -> Result<i64, RepositoryError>;

    async fn get(
        &self,
        id: i64,
    ) -> Result<ResultRecord, RepositoryError>;

    /// Every stored record, newest (highest id) first.
    async fn list_all(&self) -> Result<Vec<ResultRecord>, RepositoryError>;

    /// Releases the underlying storage handle. The repository must not be
    /// used afterwards.
    async fn close(&self) {}
}
