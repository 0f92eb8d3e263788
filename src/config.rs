use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port the HTTP API listens on when neither config nor flag sets one
pub const DEFAULT_PORT: u16 = 7878;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AlertTagsConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("alert-tags.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".alert-tags").join("alert-tags.db")
}

impl AlertTagsConfig {
    /// Read the TOML file at `path`; a missing file is `None`
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        toml::from_str(&contents)
            .map(Some)
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// Write this config to `path`, refusing to replace an existing file unless `force`
    pub fn save(&self, path: &Path, force: bool) -> anyhow::Result<()> {
        anyhow::ensure!(
            force || !path.exists(),
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("writing {}", path.display()))
    }
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".alert-tags/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

/// Pick the database path: CLI flag, then config file, then the default under `base`
pub fn resolve_database_path(
    flag: Option<&Path>,
    config: Option<&AlertTagsConfig>,
    base: &Path,
) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    config
        .and_then(|c| c.database.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_database_path_in(base))
}

/// Pick the server port: CLI flag, then config file, then [`DEFAULT_PORT`]
pub fn resolve_port(flag: Option<u16>, config: Option<&AlertTagsConfig>) -> u16 {
    flag.or_else(|| config.and_then(|c| c.port)).unwrap_or(DEFAULT_PORT)
}
