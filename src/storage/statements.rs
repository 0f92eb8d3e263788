//! SQL statements bound to every live connection

pub const READ_BY_TAG_ID: &str =
    "SELECT tag_id, alert_id, key, value FROM alert_tag WHERE tag_id = ?1";

pub const READ_BY_ALERT_AND_KEY: &str =
    "SELECT tag_id, alert_id, key, value FROM alert_tag WHERE alert_id = ?1 AND key = ?2";

/// Insert, replace a differing value, or do nothing, in one statement.
///
/// The WHERE clause on the update arm leaves an equal value untouched.
pub const UPSERT: &str = r#"
INSERT INTO alert_tag (alert_id, key, value)
VALUES (?1, ?2, ?3)
ON CONFLICT(alert_id, key) DO UPDATE SET value = excluded.value
WHERE alert_tag.value <> excluded.value
"#;

pub const TAGS_FOR_ALERT: &str = "SELECT key, value FROM alert_tag WHERE alert_id = ?1";

pub const DISTINCT_TAGS: &str = "SELECT DISTINCT key, value FROM alert_tag ORDER BY key, value";

pub const ALL_RECORDS: &str = "SELECT tag_id, alert_id, key, value FROM alert_tag ORDER BY tag_id";

pub const DELETE_BY_TAG_ID: &str = "DELETE FROM alert_tag WHERE tag_id = ?1";

pub const DELETE_BY_ALERT_AND_KEY: &str = "DELETE FROM alert_tag WHERE alert_id = ?1 AND key = ?2";

pub const DELETE_FOR_ALERT: &str = "DELETE FROM alert_tag WHERE alert_id = ?1";

pub const DELETE_ALL: &str = "DELETE FROM alert_tag";

pub const STATS: &str =
    "SELECT COUNT(*), COUNT(DISTINCT alert_id), COUNT(DISTINCT key) FROM alert_tag";

/// Every statement the tag store executes
pub const ALL: &[&str] = &[
    READ_BY_TAG_ID,
    READ_BY_ALERT_AND_KEY,
    UPSERT,
    TAGS_FOR_ALERT,
    DISTINCT_TAGS,
    ALL_RECORDS,
    DELETE_BY_TAG_ID,
    DELETE_BY_ALERT_AND_KEY,
    DELETE_FOR_ALERT,
    DELETE_ALL,
    STATS,
];
