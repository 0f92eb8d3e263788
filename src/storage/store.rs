//! Mutex-serialized tag store
//!
//! Every operation, reads included, takes the store's single lock before it
//! touches the connection. Schema setup and reconnects run under the same
//! lock, so they cannot interleave with in-flight calls.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use crate::record::{self, AlertTagRecord};
use crate::Result;
use super::gateway::{ConnectionGateway, DatabaseTarget};
use super::statements;

/// Tag store over one SQLite connection
pub struct TagStore {
    gateway: Mutex<ConnectionGateway>,
}

impl TagStore {
    /// Connect to `target` and initialize the schema
    pub fn connect(target: DatabaseTarget) -> Result<Self> {
        let mut gateway = ConnectionGateway::new(target);
        gateway.connect()?;
        Ok(Self { gateway: Mutex::new(gateway) })
    }

    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::connect(DatabaseTarget::file(path))
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::connect(DatabaseTarget::Memory)
    }

    /// Create a store without connecting; every call fails until [`reconnect`](Self::reconnect)
    pub fn uninitialized(target: DatabaseTarget) -> Self {
        Self { gateway: Mutex::new(ConnectionGateway::new(target)) }
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionGateway> {
        self.gateway.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Tag store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ========== Lifecycle ==========

    /// Re-establish the connection, re-run the schema check and re-bind statements
    pub fn reconnect(&self) -> Result<()> {
        self.lock().connect()
    }

    /// Drop the connection; the store is uninitialized until the next reconnect
    pub fn disconnect(&self) {
        self.lock().disconnect();
    }

    pub fn is_ready(&self) -> bool {
        self.lock().is_ready()
    }

    pub fn target(&self) -> DatabaseTarget {
        self.lock().target().clone()
    }

    // ========== Reads ==========

    /// Get a tag by its id
    pub fn read_by_tag_id(&self, tag_id: i64) -> Result<Option<AlertTagRecord>> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let mut stmt = conn.prepare_cached(statements::READ_BY_TAG_ID)?;
        stmt.query_row([tag_id], AlertTagRecord::from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Get the tag an alert holds under `key`
    pub fn read_by_alert_and_key(&self, alert_id: i64, key: &str) -> Result<Option<AlertTagRecord>> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        read_by_alert_and_key(conn, alert_id, key)
    }

    /// All tags of one alert, keyed by tag key
    pub fn tags_for_alert(&self, alert_id: i64) -> Result<BTreeMap<String, String>> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let mut stmt = conn.prepare_cached(statements::TAGS_FOR_ALERT)?;
        let tags = stmt
            .query_map([alert_id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;
        Ok(tags)
    }

    /// Distinct (key, value) pairs across all alerts, ordered by key then value
    pub fn distinct_tag_pairs(&self) -> Result<Vec<(String, String)>> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let mut stmt = conn.prepare_cached(statements::DISTINCT_TAGS)?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()?;
        Ok(pairs)
    }

    /// Distinct tags collapsed into a map keyed by tag key.
    ///
    /// Lossy: when one key carries several values across alerts, only the
    /// last value in (key, value) order is kept. Use
    /// [`distinct_tag_pairs`](Self::distinct_tag_pairs) to see them all.
    pub fn all_distinct_tags(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.distinct_tag_pairs()?.into_iter().collect())
    }

    /// Every stored record, ordered by tag id
    pub fn all_records(&self) -> Result<Vec<AlertTagRecord>> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let mut stmt = conn.prepare_cached(statements::ALL_RECORDS)?;
        let records = stmt
            .query_map([], AlertTagRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<TagStats> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let mut stmt = conn.prepare_cached(statements::STATS)?;
        let (tags, alerts, distinct_keys): (i64, i64, i64) =
            stmt.query_row([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        Ok(TagStats {
            tags: tags as usize,
            alerts: alerts as usize,
            distinct_keys: distinct_keys as usize,
        })
    }

    // ========== Writes ==========

    /// Insert a tag, or replace its value if the alert already has `key`.
    ///
    /// The conflict check and the write are one statement, so concurrent
    /// upserts of the same pair never both insert. Returns the stored row
    /// as read back after the write. Keys over [`record::MAX_KEY_LEN`] or values over
    /// [`record::MAX_VALUE_LEN`] characters fail with [`crate::Error::Store`].
    pub fn upsert(&self, alert_id: i64, key: &str, value: &str) -> Result<AlertTagRecord> {
        record::check_lengths(key, value)?;
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let changed = conn
            .prepare_cached(statements::UPSERT)?
            .execute(params![alert_id, key, value])?;
        tracing::debug!(alert_id, key, changed, "upserted tag");

        read_by_alert_and_key(conn, alert_id, key)?
            .ok_or(crate::Error::Store(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Delete a tag by id; missing ids are not an error
    pub fn delete_by_tag_id(&self, tag_id: i64) -> Result<()> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let removed = conn.prepare_cached(statements::DELETE_BY_TAG_ID)?.execute([tag_id])?;
        tracing::debug!(tag_id, removed, "deleted tag by id");
        Ok(())
    }

    /// Delete the tag an alert holds under `key`; missing tags are not an error
    pub fn delete_by_alert_and_key(&self, alert_id: i64, key: &str) -> Result<()> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let removed = conn
            .prepare_cached(statements::DELETE_BY_ALERT_AND_KEY)?
            .execute(params![alert_id, key])?;
        tracing::debug!(alert_id, key, removed, "deleted tag by key");
        Ok(())
    }

    /// Delete every tag of an alert, e.g. when the alert itself is removed
    pub fn delete_all_for_alert(&self, alert_id: i64) -> Result<()> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let removed = conn.prepare_cached(statements::DELETE_FOR_ALERT)?.execute([alert_id])?;
        tracing::debug!(alert_id, removed, "deleted all tags for alert");
        Ok(())
    }

    /// Delete every tag in the store, returning how many rows were removed
    pub fn delete_all_tags(&self) -> Result<usize> {
        let gateway = self.lock();
        let conn = gateway.connection()?;
        let removed = conn.prepare_cached(statements::DELETE_ALL)?.execute([])?;
        tracing::info!("Deleted all {} tags", removed);
        Ok(removed)
    }
}

fn read_by_alert_and_key(
    conn: &rusqlite::Connection,
    alert_id: i64,
    key: &str,
) -> Result<Option<AlertTagRecord>> {
    let mut stmt = conn.prepare_cached(statements::READ_BY_ALERT_AND_KEY)?;
    stmt.query_row(params![alert_id, key], AlertTagRecord::from_row)
        .optional()
        .map_err(Into::into)
}

/// Tag store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagStats {
    pub tags: usize,
    pub alerts: usize,
    pub distinct_keys: usize,
}

impl std::fmt::Display for TagStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tag Store Statistics:")?;
        writeln!(f, "  Tags: {}", self.tags)?;
        writeln!(f, "  Alerts: {}", self.alerts)?;
        writeln!(f, "  Distinct keys: {}", self.distinct_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MAX_KEY_LEN, MAX_VALUE_LEN};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_upsert_scenario() {
        let store = TagStore::open_in_memory().unwrap();

        let first = store.upsert(1, "RISK", "HIGH").unwrap();
        assert_eq!(first, AlertTagRecord::new(1, 1, "RISK", "HIGH"));

        let second = store.upsert(1, "RISK", "LOW").unwrap();
        assert_eq!(second, AlertTagRecord::new(1, 1, "RISK", "LOW"));

        let tags = store.tags_for_alert(1).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("RISK").map(String::as_str), Some("LOW"));
    }

    #[test]
    fn test_upsert_replaces_value_keeps_id() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(9, "other", "x").unwrap();

        let v1 = store.upsert(3, "owner", "alice").unwrap();
        let v2 = store.upsert(3, "owner", "bob").unwrap();

        assert_eq!(v1.tag_id, v2.tag_id);
        assert_eq!(v2.value, "bob");
        assert_eq!(store.stats().unwrap().tags, 2);
    }

    #[test]
    fn test_upsert_same_value_is_noop() {
        let store = TagStore::open_in_memory().unwrap();

        let first = store.upsert(4, "state", "open").unwrap();
        let again = store.upsert(4, "state", "open").unwrap();
        let third = store.upsert(4, "state", "open").unwrap();

        assert_eq!(first, again);
        assert_eq!(again, third);
        assert_eq!(store.all_records().unwrap(), vec![first]);
    }

    #[test]
    fn test_same_key_on_different_alerts() {
        let store = TagStore::open_in_memory().unwrap();

        let a = store.upsert(1, "CWE", "79").unwrap();
        let b = store.upsert(2, "CWE", "89").unwrap();

        assert_ne!(a.tag_id, b.tag_id);
        assert_eq!(store.read_by_alert_and_key(1, "CWE").unwrap(), Some(a));
        assert_eq!(store.read_by_alert_and_key(2, "CWE").unwrap(), Some(b));
    }

    #[test]
    fn test_read_missing_is_none() {
        let store = TagStore::open_in_memory().unwrap();
        assert_eq!(store.read_by_tag_id(12345).unwrap(), None);
        assert_eq!(store.read_by_alert_and_key(1, "nope").unwrap(), None);
    }

    #[test]
    fn test_read_by_tag_id() {
        let store = TagStore::open_in_memory().unwrap();
        let record = store.upsert(5, "k", "v").unwrap();

        assert_eq!(store.read_by_tag_id(record.tag_id).unwrap(), Some(record));
    }

    #[test]
    fn test_delete_by_tag_id_is_idempotent() {
        let store = TagStore::open_in_memory().unwrap();
        let record = store.upsert(1, "k", "v").unwrap();

        store.delete_by_tag_id(record.tag_id).unwrap();
        store.delete_by_tag_id(record.tag_id).unwrap();
        store.delete_by_tag_id(999).unwrap();

        assert_eq!(store.read_by_tag_id(record.tag_id).unwrap(), None);
    }

    #[test]
    fn test_delete_by_alert_and_key() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(1, "keep", "1").unwrap();
        store.upsert(1, "drop", "2").unwrap();

        store.delete_by_alert_and_key(1, "drop").unwrap();
        store.delete_by_alert_and_key(1, "drop").unwrap();

        let tags = store.tags_for_alert(1).unwrap();
        assert_eq!(tags.keys().collect::<Vec<_>>(), vec!["keep"]);
    }

    #[test]
    fn test_delete_all_for_alert() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(1, "a", "1").unwrap();
        store.upsert(1, "b", "2").unwrap();
        store.upsert(2, "a", "3").unwrap();

        store.delete_all_for_alert(1).unwrap();

        assert!(store.tags_for_alert(1).unwrap().is_empty());
        assert_eq!(store.tags_for_alert(2).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_all_tags_returns_count() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(1, "a", "1").unwrap();
        store.upsert(2, "b", "2").unwrap();
        store.upsert(3, "c", "3").unwrap();

        assert_eq!(store.delete_all_tags().unwrap(), 3);
        assert!(store.all_records().unwrap().is_empty());
        assert_eq!(store.delete_all_tags().unwrap(), 0);
    }

    #[test]
    fn test_tag_ids_not_reused() {
        let store = TagStore::open_in_memory().unwrap();
        let first = store.upsert(1, "a", "1").unwrap();
        store.delete_all_tags().unwrap();

        let next = store.upsert(1, "a", "1").unwrap();
        assert!(next.tag_id > first.tag_id);
    }

    #[test]
    fn test_distinct_is_over_pairs() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(1, "A", "1").unwrap();
        store.upsert(2, "A", "2").unwrap();
        store.upsert(3, "A", "2").unwrap();
        store.upsert(3, "B", "x").unwrap();

        let pairs = store.distinct_tag_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("A".to_string(), "2".to_string()),
                ("B".to_string(), "x".to_string()),
            ]
        );

        // Collapsing by key keeps one value per key
        let collapsed = store.all_distinct_tags().unwrap();
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed.get("A").map(String::as_str), Some("2"));
        assert_eq!(collapsed.get("B").map(String::as_str), Some("x"));
    }

    #[test]
    fn test_all_records_has_full_columns() {
        let store = TagStore::open_in_memory().unwrap();
        let a = store.upsert(10, "x", "1").unwrap();
        let b = store.upsert(20, "y", "2").unwrap();

        assert_eq!(store.all_records().unwrap(), vec![a, b]);
    }

    #[test]
    fn test_stats() {
        let store = TagStore::open_in_memory().unwrap();
        store.upsert(1, "a", "1").unwrap();
        store.upsert(1, "b", "1").unwrap();
        store.upsert(2, "a", "2").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats, TagStats { tags: 3, alerts: 2, distinct_keys: 2 });
    }

    #[test]
    fn test_length_limits() {
        let store = TagStore::open_in_memory().unwrap();

        let key = "k".repeat(MAX_KEY_LEN);
        let value = "v".repeat(MAX_VALUE_LEN);
        assert!(store.upsert(1, &key, &value).is_ok());

        let long_key = "k".repeat(MAX_KEY_LEN + 1);
        assert!(store.upsert(1, &long_key, "v").unwrap_err().is_store());

        let long_value = "v".repeat(MAX_VALUE_LEN + 1);
        assert!(store.upsert(1, "k", &long_value).unwrap_err().is_store());
    }

    #[test]
    fn test_length_limits_with_leading_nul() {
        let store = TagStore::open_in_memory().unwrap();

        let long_key = format!("\0{}", "k".repeat(MAX_KEY_LEN + 500));
        assert!(store.upsert(1, &long_key, "v").unwrap_err().is_store());

        let long_value = format!("\0{}", "v".repeat(MAX_VALUE_LEN + 500));
        assert!(store.upsert(1, "k", &long_value).unwrap_err().is_store());

        assert!(store.all_records().unwrap().is_empty());

        // NUL inside the limit is ordinary text
        let record = store.upsert(1, "\0k", "\0v").unwrap();
        assert_eq!(record.key, "\0k");
        assert_eq!(record.value, "\0v");
    }

    #[test]
    fn test_operations_fail_while_uninitialized() {
        let store = TagStore::uninitialized(DatabaseTarget::Memory);
        assert!(!store.is_ready());

        assert!(store.read_by_tag_id(1).unwrap_err().is_schema());
        assert!(store.upsert(1, "k", "v").unwrap_err().is_schema());
        assert!(store.delete_all_tags().unwrap_err().is_schema());
        assert!(store.tags_for_alert(1).unwrap_err().is_schema());

        store.reconnect().unwrap();
        assert!(store.is_ready());
        assert!(store.upsert(1, "k", "v").is_ok());
    }

    #[test]
    fn test_disconnect_then_reconnect_file() {
        let dir = tempdir().unwrap();
        let store = TagStore::open(&dir.path().join("tags.db")).unwrap();
        let record = store.upsert(1, "RISK", "HIGH").unwrap();

        store.disconnect();
        assert!(store.read_by_tag_id(record.tag_id).unwrap_err().is_schema());

        store.reconnect().unwrap();
        assert_eq!(store.read_by_tag_id(record.tag_id).unwrap(), Some(record));
    }

    #[test]
    fn test_concurrent_upserts_insert_once() {
        let dir = tempdir().unwrap();
        let store = Arc::new(TagStore::open(&dir.path().join("tags.db")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        store.upsert(7, "shared", &format!("{}-{}", i, j)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let records = store.all_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag_id, 1);
        assert_eq!(records[0].key, "shared");
    }

    #[test]
    fn test_two_stores_on_one_file_insert_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tags.db");
        let first = TagStore::open(&path).unwrap();
        let second = TagStore::open(&path).unwrap();

        std::thread::scope(|scope| {
            for (n, store) in [&first, &second].into_iter().enumerate() {
                scope.spawn(move || {
                    for i in 0..200 {
                        let alert_id = (i % 5) as i64;
                        store.upsert(alert_id, "owner", &format!("{}-{}", n, i)).unwrap();
                    }
                });
            }
        });

        let records = first.all_records().unwrap();
        assert_eq!(records.len(), 5);
        for alert_id in 0..5 {
            assert_eq!(second.tags_for_alert(alert_id).unwrap().len(), 1);
        }
    }

    #[test]
    fn test_store_survives_poisoned_lock() {
        let store = Arc::new(TagStore::open_in_memory().unwrap());
        store.upsert(1, "RISK", "HIGH").unwrap();

        let poisoner = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _gateway = poisoner.lock();
            panic!("panic while holding the tag store lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(store.gateway.is_poisoned());

        let record = store.upsert(1, "RISK", "LOW").unwrap();
        assert_eq!(record.tag_id, 1);
        assert_eq!(record.value, "LOW");
        assert!(store.is_ready());
    }

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TagStore>();
    }
}
