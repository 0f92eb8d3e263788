use std::path::Path;
use std::sync::Arc;
use alert_tags::config::{self, AlertTagsConfig};
use alert_tags::output::{emit_success, OutputMode};
use alert_tags::storage::TagStore;
use alert_tags::ui::{self, Icons};

pub fn run_init(
    output_mode: OutputMode,
    config_path: &Path,
    database: &Path,
    force: bool,
) -> anyhow::Result<()> {
    let config = AlertTagsConfig {
        database: Some(database.display().to_string()),
        port: None,
    };
    config.save(config_path, force)?;

    let project_root = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config::ensure_gitignore(project_root)?;

    // Creates the file and schema up front
    TagStore::open(database)?;

    if output_mode.is_human() {
        ui::success(&format!("Wrote {}", config_path.display()));
        ui::info("Database", &database.display().to_string());
    } else {
        emit_success(
            output_mode,
            "init",
            serde_json::json!({
                "config": config_path.display().to_string(),
                "database": database.display().to_string(),
            }),
        )?;
    }
    Ok(())
}

pub fn run_set(
    store: &TagStore,
    output_mode: OutputMode,
    alert_id: i64,
    key: &str,
    value: &str,
) -> anyhow::Result<()> {
    let record = store.upsert(alert_id, key, value)?;
    if output_mode.is_human() {
        ui::record(&record);
    } else {
        emit_success(output_mode, "set", serde_json::to_value(&record)?)?;
    }
    Ok(())
}

pub fn run_get(store: &TagStore, output_mode: OutputMode, alert_id: i64, key: &str) -> anyhow::Result<()> {
    let record = store.read_by_alert_and_key(alert_id, key)?;
    if output_mode.is_human() {
        match record {
            Some(record) => ui::record(&record),
            None => println!("{} Alert {} has no tag '{}'.", Icons::EMPTY, alert_id, key),
        }
    } else {
        emit_success(output_mode, "get", serde_json::to_value(&record)?)?;
    }
    Ok(())
}

pub fn run_show(store: &TagStore, output_mode: OutputMode, tag_id: i64) -> anyhow::Result<()> {
    let record = store.read_by_tag_id(tag_id)?;
    if output_mode.is_human() {
        match record {
            Some(record) => ui::record(&record),
            None => println!("{} No tag with id {}.", Icons::EMPTY, tag_id),
        }
    } else {
        emit_success(output_mode, "show", serde_json::to_value(&record)?)?;
    }
    Ok(())
}

pub fn run_list(store: &TagStore, output_mode: OutputMode, alert_id: i64) -> anyhow::Result<()> {
    let tags = store.tags_for_alert(alert_id)?;
    if output_mode.is_human() {
        ui::header(&format!("Tags for alert {}", alert_id));
        if tags.is_empty() {
            ui::tag_map(&tags);
        } else {
            println!("{}", ui::tags_table(&tags));
        }
    } else {
        emit_success(output_mode, "list", serde_json::to_value(&tags)?)?;
    }
    Ok(())
}

pub fn run_keys(store: &TagStore, output_mode: OutputMode, pairs: bool) -> anyhow::Result<()> {
    if pairs {
        let pairs = store.distinct_tag_pairs()?;
        if output_mode.is_human() {
            ui::header("Distinct tag pairs");
            for (key, value) in &pairs {
                println!("  {} = {}", key, value);
            }
        } else {
            emit_success(output_mode, "keys", serde_json::to_value(&pairs)?)?;
        }
        return Ok(());
    }

    let tags = store.all_distinct_tags()?;
    if output_mode.is_human() {
        ui::header("Distinct tags");
        ui::tag_map(&tags);
    } else {
        emit_success(output_mode, "keys", serde_json::to_value(&tags)?)?;
    }
    Ok(())
}

pub fn run_records(store: &TagStore, output_mode: OutputMode) -> anyhow::Result<()> {
    let records = store.all_records()?;
    if output_mode.is_human() {
        if records.is_empty() {
            println!("{} No tags stored.", Icons::EMPTY);
        } else {
            println!("{}", ui::records_table(&records));
        }
    } else {
        emit_success(output_mode, "records", serde_json::to_value(&records)?)?;
    }
    Ok(())
}

pub fn run_remove(store: &TagStore, output_mode: OutputMode, alert_id: i64, key: &str) -> anyhow::Result<()> {
    store.delete_by_alert_and_key(alert_id, key)?;
    if output_mode.is_human() {
        println!("{} Removed '{}' from alert {}", Icons::DEL, key, alert_id);
    } else {
        emit_success(output_mode, "remove", serde_json::json!({ "alert_id": alert_id, "key": key }))?;
    }
    Ok(())
}

pub fn run_remove_id(store: &TagStore, output_mode: OutputMode, tag_id: i64) -> anyhow::Result<()> {
    store.delete_by_tag_id(tag_id)?;
    if output_mode.is_human() {
        println!("{} Removed tag {}", Icons::DEL, tag_id);
    } else {
        emit_success(output_mode, "remove-id", serde_json::json!({ "tag_id": tag_id }))?;
    }
    Ok(())
}

pub fn run_purge(store: &TagStore, output_mode: OutputMode, alert_id: i64) -> anyhow::Result<()> {
    store.delete_all_for_alert(alert_id)?;
    if output_mode.is_human() {
        println!("{} Removed all tags of alert {}", Icons::DEL, alert_id);
    } else {
        emit_success(output_mode, "purge", serde_json::json!({ "alert_id": alert_id }))?;
    }
    Ok(())
}

pub fn run_clear(store: &TagStore, output_mode: OutputMode, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to delete every tag without --yes");
    }
    let deleted = store.delete_all_tags()?;
    if output_mode.is_human() {
        if deleted == 0 {
            ui::warn("Store was already empty");
        } else {
            ui::success(&format!("Deleted {} tags", deleted));
        }
    } else {
        emit_success(output_mode, "clear", serde_json::json!({ "deleted": deleted }))?;
    }
    Ok(())
}

pub fn run_stats(store: &TagStore, output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    let stats = store.stats()?;
    if output_mode.is_human() {
        println!("{} Tag Store Statistics ({})", Icons::STATS, database.display());
        println!("{}", ui::stats_table(&stats));
    } else {
        emit_success(output_mode, "stats", serde_json::to_value(&stats)?)?;
    }
    Ok(())
}

pub fn run_serve(store: TagStore, port: u16) -> anyhow::Result<()> {
    println!("{} Server running at http://0.0.0.0:{}", Icons::GLOBE, port);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(alert_tags::server::start_server(port, Arc::new(store)))
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        println!("{} alert-tags {}", Icons::TAG, env!("CARGO_PKG_VERSION"));
    } else {
        emit_success(
            output_mode,
            "version",
            serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }),
        )?;
    }
    Ok(())
}
