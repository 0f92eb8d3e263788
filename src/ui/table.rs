use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};
use crate::record::AlertTagRecord;
use crate::storage::TagStats;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Tag")]
    tag_id: i64,
    #[tabled(rename = "Alert")]
    alert_id: i64,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: usize,
}

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn records_table(records: &[AlertTagRecord]) -> String {
    let rows: Vec<RecordRow> = records
        .iter()
        .map(|r| RecordRow {
            tag_id: r.tag_id,
            alert_id: r.alert_id,
            key: r.key.clone(),
            value: r.value.clone(),
        })
        .collect();
    render(&rows)
}

pub fn tags_table(tags: &BTreeMap<String, String>) -> String {
    let rows: Vec<TagRow> = tags
        .iter()
        .map(|(key, value)| TagRow { key: key.clone(), value: value.clone() })
        .collect();
    render(&rows)
}

pub fn stats_table(stats: &TagStats) -> String {
    render(&[
        StatRow { metric: "Tags", value: stats.tags },
        StatRow { metric: "Alerts", value: stats.alerts },
        StatRow { metric: "Distinct keys", value: stats.distinct_keys },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(records_table(&[]).is_empty());
        assert!(tags_table(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_records_table_contains_cells() {
        let table = records_table(&[AlertTagRecord::new(3, 9, "RISK", "HIGH")]);
        assert!(table.contains("Alert"));
        assert!(table.contains("RISK"));
        assert!(table.contains("HIGH"));
    }

    #[test]
    fn test_stats_table() {
        let table = stats_table(&TagStats { tags: 4, alerts: 2, distinct_keys: 3 });
        assert!(table.contains("Distinct keys"));
        assert!(table.contains('4'));
    }
}
