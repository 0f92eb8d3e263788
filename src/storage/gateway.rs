//! Single-connection gateway
//!
//! Owns the one live SQLite session of a store. Every (re)connect runs the
//! schema check and re-binds the store's statements into the connection's
//! prepared statement cache. Nothing here reconnects on its own.

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::Connection;
use crate::{Error, Result};
use super::{schema, statements};

/// How long SQLite waits on a locked database before failing a statement
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where the gateway opens its connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    /// Private in-memory database; every reconnect starts empty
    Memory,
}

impl DatabaseTarget {
    pub fn file(path: impl AsRef<Path>) -> Self {
        DatabaseTarget::File(path.as_ref().to_path_buf())
    }
}

impl std::fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
            DatabaseTarget::Memory => write!(f, ":memory:"),
        }
    }
}

/// Owns the live connection; `None` means uninitialized
pub struct ConnectionGateway {
    target: DatabaseTarget,
    conn: Option<Connection>,
}

impl ConnectionGateway {
    /// Create an uninitialized gateway; call [`connect`](Self::connect) before use
    pub fn new(target: DatabaseTarget) -> Self {
        Self { target, conn: None }
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    pub fn is_ready(&self) -> bool {
        self.conn.is_some()
    }

    /// Open a fresh connection, ensure the schema and bind all statements.
    ///
    /// Any previous connection is dropped first. On failure the gateway is
    /// left uninitialized.
    pub fn connect(&mut self) -> Result<()> {
        self.disconnect();

        let conn = open_connection(&self.target)?;
        schema::ensure_schema(&conn)?;
        bind_statements(&conn)?;

        tracing::debug!("Connected tag store to {}", self.target);
        self.conn = Some(conn);
        Ok(())
    }

    /// Drop the live connection, returning to the uninitialized state
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Error closing connection to {}: {}", self.target, e);
            }
            tracing::debug!("Disconnected tag store from {}", self.target);
        }
    }

    /// The live connection, or a schema error while uninitialized
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| Error::Schema("tag store is not initialized".to_string()))
    }
}

impl Drop for ConnectionGateway {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn open_connection(target: &DatabaseTarget) -> Result<Connection> {
    let conn = match target {
        DatabaseTarget::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let conn = Connection::open(path)?;
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            conn
        }
        DatabaseTarget::Memory => Connection::open_in_memory()?,
    };
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Prepare every store statement into the connection's cache
fn bind_statements(conn: &Connection) -> Result<()> {
    conn.set_prepared_statement_cache_capacity(statements::ALL.len().max(16));
    conn.flush_prepared_statement_cache();
    for sql in statements::ALL {
        // Dropping the handle returns it to the cache
        conn.prepare_cached(sql)?;
    }
    tracing::debug!("Bound {} statements", statements::ALL.len());
    Ok(())
}
