//! alert-tags CLI - view, add and remove tags on alerts

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use alert_tags::config::{self, AlertTagsConfig};
use alert_tags::output::{emit_error, OutputMode};
use alert_tags::storage::TagStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "alert-tags")]
#[command(version)]
#[command(about = "Key/value tags for security alerts, stored in SQLite")]
#[command(long_about = r#"
alert-tags attaches key/value annotations to alerts. Each alert holds at
most one value per key; setting a key again replaces its value in place.

Example usage:
  alert-tags set 42 RISK HIGH
  alert-tags list 42
  alert-tags remove 42 RISK
  alert-tags serve --port 7878
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Set a tag on an alert, replacing any existing value for the key
    Set {
        alert_id: i64,
        key: String,
        value: String,
    },

    /// Show the tag an alert holds under a key
    Get { alert_id: i64, key: String },

    /// Show a tag by its id
    Show { tag_id: i64 },

    /// List all tags of an alert
    List { alert_id: i64 },

    /// List distinct tags across all alerts
    Keys {
        /// Show every distinct key/value pair instead of one value per key
        #[arg(long)]
        pairs: bool,
    },

    /// List every stored tag record
    Records,

    /// Remove a tag from an alert
    Remove { alert_id: i64, key: String },

    /// Remove a tag by its id
    RemoveId { tag_id: i64 },

    /// Remove every tag of an alert
    Purge { alert_id: i64 },

    /// Remove every tag in the store
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Show statistics about stored tags
    Stats,

    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the version
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Init { .. } => "init",
            Commands::Set { .. } => "set",
            Commands::Get { .. } => "get",
            Commands::Show { .. } => "show",
            Commands::List { .. } => "list",
            Commands::Keys { .. } => "keys",
            Commands::Records => "records",
            Commands::Remove { .. } => "remove",
            Commands::RemoveId { .. } => "remove-id",
            Commands::Purge { .. } => "purge",
            Commands::Clear { .. } => "clear",
            Commands::Stats => "stats",
            Commands::Serve { .. } => "serve",
            Commands::Version => "version",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = OutputMode::from_json_flag(cli.json);
    let command_name = cli.command.name();

    if let Err(e) = run(cli, output_mode) {
        emit_error(output_mode, command_name, &format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let file_config = AlertTagsConfig::load(&config_path)?;
    let cwd = std::env::current_dir()?;
    let database = config::resolve_database_path(cli.database.as_deref(), file_config.as_ref(), &cwd);
    tracing::debug!("Using database {}", database.display());

    match cli.command {
        Commands::Init { force } => {
            return commands::run_init(output_mode, &config_path, &database, force);
        }
        Commands::Version => return commands::run_version(output_mode),
        _ => {}
    }

    let store = TagStore::open(&database)?;

    match cli.command {
        Commands::Set { alert_id, key, value } => {
            commands::run_set(&store, output_mode, alert_id, &key, &value)
        }
        Commands::Get { alert_id, key } => commands::run_get(&store, output_mode, alert_id, &key),
        Commands::Show { tag_id } => commands::run_show(&store, output_mode, tag_id),
        Commands::List { alert_id } => commands::run_list(&store, output_mode, alert_id),
        Commands::Keys { pairs } => commands::run_keys(&store, output_mode, pairs),
        Commands::Records => commands::run_records(&store, output_mode),
        Commands::Remove { alert_id, key } => {
            commands::run_remove(&store, output_mode, alert_id, &key)
        }
        Commands::RemoveId { tag_id } => commands::run_remove_id(&store, output_mode, tag_id),
        Commands::Purge { alert_id } => commands::run_purge(&store, output_mode, alert_id),
        Commands::Clear { yes } => commands::run_clear(&store, output_mode, yes),
        Commands::Stats => commands::run_stats(&store, output_mode, &database),
        Commands::Serve { port } => {
            let port = config::resolve_port(port, file_config.as_ref());
            commands::run_serve(store, port)
        }
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}
