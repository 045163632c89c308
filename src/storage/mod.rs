//! Case persistence.
//!
//! The orchestrator talks to storage through the [`CaseStore`] trait:
//! - **SqliteCaseStore**: sqlx-backed store used by the CLI
//! - **MemoryCaseStore**: in-process store for tests and one-shot runs
//!
//! # Usage
//!
//! ```rust,ignore
//! use jury::storage::{CaseStore, SqliteCaseStore};
//! use jury::agents::CaseConfig;
//!
//! let store = SqliteCaseStore::open("sqlite://jury.db").await?;
//! let case = store.create_case("Design a rate limiter", &CaseConfig::default()).await?;
//! let loaded = store.load_case(case.id).await?;
//! ```

pub mod memory;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::agents::types::{Case, CaseConfig};

pub use memory::MemoryCaseStore;
pub use sqlite::SqliteCaseStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection to the database failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Case does not exist.
    #[error("Case not found: {0}")]
    NotFound(i64),

    /// Stored data could not be decoded.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Persistence collaborator for cases.
///
/// Implementations do not lock cases; callers serialize stage advancement
/// per case.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Creates a case in state `NEW` and returns it with its assigned id.
    async fn create_case(&self, query: &str, config: &CaseConfig) -> Result<Case, StorageError>;

    /// Loads a case, `None` if it does not exist.
    async fn load_case(&self, id: i64) -> Result<Option<Case>, StorageError>;

    /// Overwrites a stored case. Fails with [`StorageError::NotFound`] for unknown ids.
    async fn save_case(&self, case: &Case) -> Result<(), StorageError>;

    /// Most recent case with exactly this query that has a final verdict.
    async fn find_completed_by_query(&self, query: &str) -> Result<Option<Case>, StorageError>;

    /// Cases ordered by creation time, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Case>, StorageError>;
}
