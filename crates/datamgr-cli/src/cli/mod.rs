//! CLI for the datamgr data file cache.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use datamgr_core::config;
use datamgr_core::SqliteStorage;
use std::path::PathBuf;

use commands::{run_checksum, run_completions, run_fetch, run_list, run_remove};

/// Top-level CLI for datamgr.
#[derive(Debug, Parser)]
#[command(name = "datamgr")]
#[command(about = "datamgr: download, verify and cache named data files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Make sure a data file is cached and print its local path.
    Fetch {
        /// Logical name the file is cached under.
        name: String,
        /// Candidate URL; repeat for mirrors, tried in order.
        #[arg(long = "url", value_name = "URL", required = true)]
        urls: Vec<String>,
        /// Expected SHA-256 of the content (hex).
        #[arg(long, value_name = "SHA256")]
        hash: String,
    },

    /// List cached data files.
    List {
        /// Print entries as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Forget a cached data file.
    Remove {
        /// Logical name of the entry.
        name: String,
        /// Also delete the cached file from disk.
        #[arg(long)]
        delete_file: bool,
    },

    /// Compute SHA-256 of a file (e.g. to fill in `fetch --hash`).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Checksum { path } => return run_checksum(&path),
            CliCommand::Completions { shell } => {
                run_completions(shell);
                return Ok(());
            }
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let storage = SqliteStorage::open_at(cfg.resolved_db_path()?)?;

        match cli.command {
            CliCommand::Fetch { name, urls, hash } => run_fetch(storage, &cfg, &name, urls, &hash)?,
            CliCommand::List { json } => run_list(&storage, json)?,
            CliCommand::Remove { name, delete_file } => run_remove(&storage, &name, delete_file)?,
            CliCommand::Checksum { .. } | CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
