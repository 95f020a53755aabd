//! usbeject command-line front-end.
//!
//! Talks to `usbeject-core` only through [`usbeject_core::VolumeList`].
pub mod args;
pub mod render;
pub mod settings;
pub mod state;

pub use args::{Cli, Command};
pub use state::{AppState, EjectReport};

use anyhow::Context;
use std::io::Write;
use std::time::Duration;
use tracing::info;
use usbeject_core::VolumeList;

/// How long one `watch` iteration waits for hardware events.
const WATCH_TICK: Duration = Duration::from_millis(250);

/// Build the volume list described by `cli` and run its command.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let command = cli.command();
    let mut config = settings::load(cli.config.as_deref(), cli.all_disks)?;
    // One-shot commands have no use for hardware notifications.
    config.watch_hardware &= command == Command::Watch;

    let list = VolumeList::with_config(config);
    info!("Using the {} backend", list.backend_name());
    let mut state = AppState::new(list);
    let stdout = std::io::stdout();
    execute(&command, &mut state, &mut stdout.lock(), || false)
}

/// Run `command` against `state`, writing user-facing output to `out`.
///
/// `watch` keeps going until `stop` returns `true`.
pub fn execute(
    command: &Command,
    state: &mut AppState,
    out: &mut dyn Write,
    mut stop: impl FnMut() -> bool,
) -> anyhow::Result<()> {
    match command {
        Command::List { json: false } => {
            write!(out, "{}", render::detailed(state.volumes()))?;
        }
        Command::List { json: true } => {
            let json = render::to_json(state.volumes()).context("serialising volume list")?;
            writeln!(out, "{json}")?;
        }
        Command::Eject { index } => {
            state.request_eject_at(*index);
            let report = loop {
                if let Some(report) = state.take_report() {
                    break report;
                }
                state.pump(WATCH_TICK);
            };
            match report.result {
                Ok(()) => writeln!(out, "{}", report.message())?,
                Err(e) => {
                    return Err(e).with_context(|| format!("Could not eject {}", report.display_name))
                }
            }
        }
        Command::Watch => {
            write!(out, "{}", render::detailed(state.volumes()))?;
            out.flush()?;
            while !stop() {
                if state.pump(WATCH_TICK) {
                    writeln!(out, "--")?;
                    write!(out, "{}", render::detailed(state.volumes()))?;
                    out.flush()?;
                }
            }
        }
    }
    Ok(())
}
