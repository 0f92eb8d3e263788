//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with one table:
//! - alert_tag(tag_id, alert_id, key, value), indexed on alert_id
//!
//! [`TagStore`] serializes every call through one mutex around a
//! [`gateway::ConnectionGateway`], which owns the connection and re-runs the
//! schema check on every (re)connect.

pub mod gateway;
pub mod schema;
pub mod statements;
pub mod store;

pub use gateway::DatabaseTarget;
pub use store::{TagStats, TagStore};
