//! Command-line arguments.
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// List and safely eject removable USB volumes.
#[derive(Debug, Parser)]
#[command(name = "usbeject", version, about)]
pub struct Cli {
    /// Include fixed disks as well as removable ones.
    #[arg(long, global = true)]
    pub all_disks: bool,

    /// JSON settings file (see `VolumeListConfig`).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the removable volumes (the default).
    List {
        /// Machine-readable output.
        #[arg(long)]
        json: bool,
    },
    /// Eject the whole device holding the volume at INDEX.
    Eject {
        /// 0-based position as printed by `list`.
        index: usize,
    },
    /// Print the list now and again after every hardware change.
    Watch,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::List { json: false })
    }
}
