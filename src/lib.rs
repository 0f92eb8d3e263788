//! # Alert Tags - key/value annotations for security findings
//!
//! Attaches an arbitrary set of tags to alerts and persists them in SQLite.
//!
//! Alert Tags provides:
//! - An immutable [`AlertTagRecord`] row model
//! - Idempotent schema management run on every (re)connect
//! - A single-connection gateway with statements re-bound on reconnect
//! - [`TagStore`], a mutex-serialized CRUD/upsert API
//! - A CLI and a small HTTP API on top of the store

pub mod record;
pub mod storage;
pub mod config;
pub mod server;
pub mod ui;
pub mod output;

// Re-exports for convenient access
pub use record::AlertTagRecord;
pub use storage::{DatabaseTarget, TagStats, TagStore};

/// Result type alias for tag store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for tag store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Table/index creation failed, or the store is not initialized
    #[error("Schema error: {0}")]
    Schema(String),

    /// A statement failed to execute
    #[error("Storage error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}
