use std::collections::BTreeMap;
use crate::output::is_quiet;
use crate::record::AlertTagRecord;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::TAG, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", Icons::INFO, label.style(theme().dim.clone()), value);
}

/// One tag on one line: `#id alert=N key = value`
pub fn record(record: &AlertTagRecord) {
    println!(
        "{} alert={} {} = {}",
        format!("#{}", record.tag_id).style(theme().tag_id.clone()),
        record.alert_id,
        record.key.style(theme().tag_key.clone()),
        record.value.style(theme().tag_value.clone())
    );
}

/// Key/value lines, or an empty marker
pub fn tag_map(tags: &BTreeMap<String, String>) {
    if tags.is_empty() {
        println!("{} No tags.", Icons::EMPTY);
        return;
    }
    for (key, value) in tags {
        println!("  {} = {}", key.style(theme().tag_key.clone()), value.style(theme().tag_value.clone()));
    }
}
