//! Forgemirror server - HTTP daemon and operations CLI for the mirror.

mod commands;
mod config;
mod progress;
mod routes;
mod shutdown;
mod tasks;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::commands::status::OutputFormat;

#[derive(Parser)]
#[command(name = "forgemirrord")]
#[command(version)]
#[command(about = "Local mirror of GitHub review state")]
#[command(
    long_about = "Forgemirrord keeps a queryable local mirror of GitHub repositories, pull \
requests, issues, reviews, comments, and check runs. The mirror converges from two \
directions: incremental REST sync pulls whatever changed since the stored cursor, and \
signed webhook deliveries push changes as they happen. Both paths write the same rows, \
so they can run together without conflicting."
)]
#[command(after_long_help = r#"EXAMPLES
    Run the HTTP server (webhook receiver + sync triggers):
        $ forgemirrord serve

    Apply database migrations:
        $ forgemirrord migrate up

    Mirror the repository list of an account:
        $ forgemirrord sync repos user-1

    Mirror every pull request of one repository:
        $ forgemirrord sync pulls user-1 acme/api

    Replay parked webhook events whose parents were missing:
        $ forgemirrord pending process

    Show per-unit sync state for an account:
        $ forgemirrord status user-1

    Generate shell completions:
        $ forgemirrord completions bash > ~/.local/share/bash-completion/completions/forgemirrord

CONFIGURATION
    Forgemirrord reads configuration from:
      1. ~/.config/forgemirror/config.toml (or $XDG_CONFIG_HOME/forgemirror/config.toml)
      2. ./forgemirror.toml in the current directory
      3. Environment variables (FORGEMIRROR_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    FORGEMIRROR_DATABASE_URL    Database connection string (default: ~/.local/state/forgemirror/forgemirror.db)
    FORGEMIRROR_GITHUB_TOKEN    GitHub token used by the sync subcommands
    FORGEMIRROR_WEBHOOK_SECRET  Shared secret for verifying webhook deliveries
    FORGEMIRROR_SERVER_BIND     Listen address for `serve` (default: 127.0.0.1:8440)

    Compound settings (github.api_base, webhook.callback_url, the retry
    schedule) live in the config file.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server: webhook receiver, sync triggers, state API
    Serve {
        /// Listen address, e.g. 127.0.0.1:8440 (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Run sync units against the host
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },
    /// Inspect and replay parked webhook events
    Pending {
        #[command(subcommand)]
        action: PendingAction,
    },
    /// Show per-unit sync state for an account
    Status {
        /// Account ID
        user: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[derive(Subcommand)]
enum SyncAction {
    /// Mirror the repository list of the account
    Repos {
        /// Account ID
        user: String,
    },
    /// Mirror every pull request of one repository (list scope)
    Pulls {
        /// Account ID
        user: String,
        /// Repository as owner/name
        repository: String,
    },
    /// Refresh one pull request's detail scope (merge state, reviewed files)
    Pull {
        /// Account ID
        user: String,
        /// Repository as owner/name
        repository: String,
        /// Pull request number
        number: i32,
    },
    /// Mirror the issues of one repository
    Issues {
        /// Account ID
        user: String,
        /// Repository as owner/name
        repository: String,
    },
    /// Mirror the check runs for one commit or branch
    Checks {
        /// Account ID
        user: String,
        /// Repository as owner/name
        repository: String,
        /// Commit SHA or branch name
        git_ref: String,
    },
    /// Run the phased full sync for the account
    Full {
        /// Account ID
        user: String,
    },
}

#[derive(Subcommand)]
enum PendingAction {
    /// Replay every parked event that is due
    Process,
    /// List events that spent their retry budget
    Failed {
        /// Limit to one account
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Return a failed event to the queue with a fresh attempt budget
    Requeue {
        /// Pending event row ID
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("forgemirror=info,forgemirror_server=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    // Completions and man pages never touch the database
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("could not determine a database URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "database path '{}' is relative; behavior depends on the current directory",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Serve { bind } => {
            commands::serve::handle_serve(bind, config, &database_url).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync { action } => {
            commands::sync::handle_sync(action, &config, &database_url).await?;
        }
        Commands::Pending { action } => {
            commands::pending::handle_pending(action, &config, &database_url).await?;
        }
        Commands::Status { user, output } => {
            commands::status::handle_status(&user, output, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}
