//! # Bangumi Archive CLI (`bgm-archive`)
//!
//! ## Usage
//!
//! ```bash
//! bgm-archive --config ./config/archive.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bgm-archive init` | Create the SQLite database and schema |
//! | `bgm-archive run` | Download the latest bundle and rebuild the snapshot |
//! | `bgm-archive ingest <dir>` | Ingest an already-extracted directory of `.jsonlines` files |
//!
//! `run` accepts `--token` for an optional bearer token (raises the upstream
//! rate limit) and `--keep-temp` to leave the scratch directory in place for
//! inspection.

use bangumi_archive::{config, db, ingest, migrate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bangumi Archive — rebuild a local SQLite snapshot of the public archive.
#[derive(Parser)]
#[command(
    name = "bgm-archive",
    about = "Rebuilds a local SQLite snapshot of the Bangumi public archive",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/archive.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and all entity tables. Idempotent. Note that
    /// ingestion itself is not: re-running against a populated store
    /// duplicates junction rows.
    Init,

    /// Download the latest archive bundle and ingest it.
    Run {
        /// Bearer token for the manifest and bundle requests.
        #[arg(long)]
        token: Option<String>,

        /// Leave the scratch directory (bundle, extraction) in place.
        #[arg(long)]
        keep_temp: bool,
    },

    /// Ingest `.jsonlines` files from a local directory, skipping download
    /// and extraction.
    Ingest {
        /// Directory holding the extracted archive files.
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Run { token, keep_temp } => {
            let outcome = ingest::run_archive(&cfg, token.as_deref(), keep_temp).await;
            if outcome.success {
                if let Some(path) = &outcome.database_path {
                    println!("ok");
                    println!("  database: {}", path.display());
                }
            } else {
                eprintln!(
                    "Error: {}",
                    outcome.error.as_deref().unwrap_or("unknown failure")
                );
                std::process::exit(1);
            }
        }
        Commands::Ingest { dir } => {
            let pool = db::connect(&cfg).await?;
            ingest::ingest_dir(&pool, &dir, &cfg.ingest).await?;
            pool.close().await;
            println!("ok");
        }
    }

    Ok(())
}
