//! # crumbtrail-cli
//!
//! Command-line interface for Crumbtrail.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crumbtrail_core::Config;
use crumbtrail_session::SqliteSessionStore;

mod commands;

/// Application context containing shared state.
pub struct AppContext {
    pub config: Config,
    /// Directory holding `sessions.db`
    pub db_dir: PathBuf,
}

/// Crumbtrail - per-session navigation breadcrumbs
#[derive(Parser)]
#[command(name = "crumbtrail")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the session database
    #[arg(long, global = true, value_name = "DIR", env = "CRUMBTRAIL_DB")]
    db: Option<PathBuf>,

    /// Read configuration from this file only
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record request paths in a session's trail
    Visit {
        /// Session ID (a new one is generated when omitted)
        #[arg(short, long)]
        session: Option<String>,
        /// Request paths, e.g. /wiki/WikiStart
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Show a session's trail
    Show {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Base path for links
        #[arg(long, default_value = "")]
        base: String,
    },
    /// Render a session's trail as HTML
    Render {
        /// Session ID
        #[arg(short, long)]
        session: String,
        /// Base path for links
        #[arg(long, default_value = "")]
        base: String,
        /// Splice the trail into this HTML page instead of printing the fragment
        #[arg(long, value_name = "FILE")]
        page: Option<PathBuf>,
    },
    /// Remove a session's trail
    Clear {
        /// Session ID
        #[arg(short, long)]
        session: String,
    },
    /// List sessions that hold a trail
    List,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let loaded = match cli.config_file {
        Some(ref path) => Config::load_file(path),
        None => Config::load(),
    };

    // Load configuration
    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let db_dir = match cli.db {
        Some(dir) => dir,
        None => SqliteSessionStore::default_dir()?,
    };

    let ctx = AppContext { config, db_dir };

    match cli.command {
        Commands::Config { action } => commands::config::handle(action, &ctx)?,
        command => commands::trail::handle(command, &ctx).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_visit_paths() {
        let cli = Cli::try_parse_from(["crumbtrail", "visit", "-s", "abc", "/wiki/A", "/ticket/1"])
            .unwrap();
        match cli.command {
            Commands::Visit { session, paths } => {
                assert_eq!(session.as_deref(), Some("abc"));
                assert_eq!(paths, vec!["/wiki/A", "/ticket/1"]);
            }
            _ => panic!("expected visit"),
        }
    }

    #[test]
    fn test_visit_requires_a_path() {
        assert!(Cli::try_parse_from(["crumbtrail", "visit"]).is_err());
    }
}
