//! Output mode for the CLI: themed text for people, JSON envelopes for scripts

use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Suppress informational lines (set `ALERT_TAGS_QUIET=1`)
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("ALERT_TAGS_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputMode::Json } else { OutputMode::Human }
    }

    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// JSON envelope printed for a successful command
pub fn success_envelope(command: &str, data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    })
}

/// JSON envelope printed for a failed command
pub fn error_envelope(command: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "ok": false,
        "command": command,
        "error": message,
    })
}

pub fn emit_success(mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&success_envelope(command, data))?);
    }
    Ok(())
}

pub fn emit_error(mode: OutputMode, command: &str, message: &str) {
    if mode == OutputMode::Json {
        match serde_json::to_string_pretty(&error_envelope(command, message)) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("{}", e),
        }
    } else {
        crate::ui::error(message);
    }
}
