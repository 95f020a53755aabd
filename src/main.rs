//! usbeject: list and safely eject removable USB volumes.
//!
//! Thin binary entry point. All logic lives in the `usbeject-core`
//! and `usbeject-cli` crates.
use clap::Parser;
use usbeject_cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `list --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("usbeject {} starting", env!("CARGO_PKG_VERSION"));

    usbeject_cli::run(&cli)
}
