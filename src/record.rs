//! Alert tag row model

use serde::{Deserialize, Serialize};

/// Maximum length of a tag key, in characters
pub const MAX_KEY_LEN: usize = 1024;

/// Maximum length of a tag value, in characters
pub const MAX_VALUE_LEN: usize = 4000;

/// One stored tag: a key/value pair attached to a single alert.
///
/// `tag_id` is assigned by the database on first insert and never changes,
/// even when the value is later replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertTagRecord {
    pub tag_id: i64,
    pub alert_id: i64,
    pub key: String,
    pub value: String,
}

impl AlertTagRecord {
    pub fn new(tag_id: i64, alert_id: i64, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_id,
            alert_id,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Build a record from a row selected with all four columns in table order
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            tag_id: row.get(0)?,
            alert_id: row.get(1)?,
            key: row.get(2)?,
            value: row.get(3)?,
        })
    }
}

/// Reject keys or values longer than the column limits.
///
/// Counts characters in Rust because SQLite's `length()` stops at the first
/// NUL, so the table's CHECK constraints alone miss NUL-prefixed text.
pub(crate) fn check_lengths(key: &str, value: &str) -> crate::Result<()> {
    let too_long = |column: &str, len: usize, max: usize| {
        let message = format!("{} is {} characters, limit is {}", column, len, max);
        crate::Error::Store(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_CHECK),
            Some(message),
        ))
    };

    let key_len = key.chars().count();
    if key_len > MAX_KEY_LEN {
        return Err(too_long("key", key_len, MAX_KEY_LEN));
    }
    let value_len = value.chars().count();
    if value_len > MAX_VALUE_LEN {
        return Err(too_long("value", value_len, MAX_VALUE_LEN));
    }
    Ok(())
}

impl std::fmt::Display for AlertTagRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} alert={} {}={}", self.tag_id, self.alert_id, self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let record = AlertTagRecord::new(7, 42, "RISK", "HIGH");
        assert_eq!(record.to_string(), "#7 alert=42 RISK=HIGH");
    }

    #[test]
    fn test_json_shape() {
        let record = AlertTagRecord::new(1, 2, "CWE", "79");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tag_id"], 1);
        assert_eq!(json["alert_id"], 2);
        assert_eq!(json["key"], "CWE");
        assert_eq!(json["value"], "79");
    }

    #[test]
    fn test_check_lengths_counts_characters() {
        let key = "é".repeat(MAX_KEY_LEN);
        assert!(check_lengths(&key, "").is_ok());

        let err = check_lengths(&format!("{}é", key), "").unwrap_err();
        assert!(err.is_store());
        assert!(err.to_string().contains("limit is 1024"));
    }

    #[test]
    fn test_check_lengths_sees_past_nul() {
        let key = format!("\0{}", "k".repeat(MAX_KEY_LEN));
        assert!(check_lengths(&key, "v").unwrap_err().is_store());

        let value = format!("\0{}", "v".repeat(MAX_VALUE_LEN));
        assert!(check_lengths("k", &value).unwrap_err().is_store());
    }
}
