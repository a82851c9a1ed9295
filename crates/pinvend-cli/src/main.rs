// Copyright 2026 Oxide Computer Company

//! The `pinvend` command.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use pinvend_cli::{Config, DEFAULT_VENDOR_DIR, Workspace, dependency_patterns};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pin vendored dependencies to version control revisions.
#[derive(Parser)]
#[command(name = "pinvend", version, about, long_about = None)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    dir: Option<Utf8PathBuf>,

    /// The vendor directory, relative to the project directory
    #[arg(long, global = true, default_value = DEFAULT_VENDOR_DIR)]
    vendor_dir: Utf8PathBuf,

    /// Log every command that fails, and more
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record and vendor the dependencies of the given packages
    Save {
        /// Also update existing dependencies matching the patterns.
        /// Relative patterns such as ./... name project packages and are
        /// not used to select dependencies; with no other patterns every
        /// dependency is updated
        #[arg(short, long)]
        update: bool,

        /// Root packages (default: the recorded packages, or ./...)
        patterns: Vec<String>,
    },

    /// Re-pin dependencies to the revisions checked out in the workspace
    Update {
        /// Dependencies to update (default: all)
        patterns: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("pinvend: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => {
            let cwd = std::env::current_dir()
                .context("failed to determine current directory")?;
            Utf8PathBuf::try_from(cwd)
                .context("current directory is not valid UTF-8")?
        }
    };
    let config = Config::new(&dir).with_vendor_dir(cli.vendor_dir);
    let workspace = Workspace::from_env(config)?;

    match cli.command {
        Command::Save { update, patterns } => {
            let saved = workspace
                .save(&patterns)
                .context("error adding new dependencies")?;
            info!(
                added = saved.added.len(),
                removed = saved.removed.len(),
                "saved"
            );
            if update {
                let updated = workspace
                    .update(&dependency_patterns(&patterns))
                    .context("error updating dependencies")?;
                info!(updated = updated.updated.len(), "updated");
            }
        }
        Command::Update { patterns } => {
            let updated = workspace
                .update(&patterns)
                .context("error updating dependencies")?;
            info!(updated = updated.updated.len(), "updated");
        }
    }
    Ok(())
}
