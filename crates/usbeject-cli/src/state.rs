/// Front-end state.
///
/// Owns the [`VolumeList`] and everything a front-end shows on top of it:
/// the current rows, a selection that follows its volume across refills,
/// and the outcome of the last eject. Change notifications and eject
/// outcomes arrive on channels and are applied in [`AppState::pump`].
use crate::render;
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;
use tracing::{debug, info};
use usbeject_core::{EjectResult, Snapshot, Volume, VolumeList};

/// Outcome of the most recent eject, tagged with the volume it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectReport {
    pub display_name: String,
    pub result: EjectResult,
}

impl EjectReport {
    /// One-line human summary.
    pub fn message(&self) -> String {
        match &self.result {
            Ok(()) => format!(
                "{} ejected. The device can be safely removed.",
                self.display_name
            ),
            Err(e) => format!("Could not eject {}: {}", self.display_name, e),
        }
    }
}

pub struct AppState {
    list: VolumeList,
    volumes: Snapshot,
    selected: Option<usize>,
    changes: Receiver<()>,
    reports_tx: Sender<EjectReport>,
    reports_rx: Receiver<EjectReport>,
    last_report: Option<EjectReport>,
}

impl AppState {
    pub fn new(mut list: VolumeList) -> Self {
        let changes = list.subscribe();
        let volumes = list.snapshot();
        let (reports_tx, reports_rx) = crossbeam_channel::unbounded();
        Self {
            selected: (!volumes.is_empty()).then_some(0),
            list,
            volumes,
            changes,
            reports_tx,
            reports_rx,
            last_report: None,
        }
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_volume(&self) -> Option<&Volume> {
        self.selected.and_then(|i| self.volumes.get(i))
    }

    /// Select the row at `index`. Out-of-range indices clear the selection.
    pub fn select(&mut self, index: usize) {
        self.selected = (index < self.volumes.len()).then_some(index);
    }

    /// Details of the selected volume, or nothing when no row is selected.
    pub fn info_lines(&self) -> Vec<(&'static str, String)> {
        self.selected_volume().map(render::info_lines).unwrap_or_default()
    }

    pub fn is_ejecting(&self) -> bool {
        self.list.is_ejecting()
    }

    /// Eject the device holding the selected volume.
    ///
    /// Ignored (returns `false`) while another eject is running or when
    /// nothing is selected.
    pub fn request_eject(&mut self) -> bool {
        match self.selected {
            Some(index) if !self.is_ejecting() => self.request_eject_at(index),
            _ => false,
        }
    }

    /// Eject the device holding the volume at `index`.
    ///
    /// An out-of-range index is reported through [`AppState::last_report`]
    /// like any other failure. Returns `false` while another eject is
    /// running.
    pub fn request_eject_at(&mut self, index: usize) -> bool {
        if self.is_ejecting() {
            debug!("Eject request ignored: one is already running");
            return false;
        }
        let display_name = self
            .volumes
            .get(index)
            .map(|v| v.friendly_display_name.clone())
            .unwrap_or_else(|| format!("volume #{index}"));
        let reports = self.reports_tx.clone();
        self.list.eject_whole_device_at_index(index, move |result| {
            if reports
                .send(EjectReport {
                    display_name,
                    result,
                })
                .is_err()
            {
                debug!("Eject report dropped: controller is gone");
            }
        });
        self.apply_reports();
        true
    }

    /// Wait up to `timeout` for background work and apply its results.
    /// Returns `true` if the rows changed.
    pub fn pump(&mut self, timeout: Duration) -> bool {
        self.list.wait_events(timeout);
        self.apply_reports();
        let changed = self.changes.try_iter().count() > 0;
        if changed {
            self.refill();
        }
        changed
    }

    /// Force an immediate refresh of the underlying list.
    pub fn refresh(&mut self) {
        self.list.refresh();
        self.changes.try_iter().for_each(drop);
        self.refill();
    }

    /// The outcome of the most recent eject, if any has finished.
    pub fn last_report(&self) -> Option<&EjectReport> {
        self.last_report.as_ref()
    }

    /// Message of the last failed eject.
    pub fn last_error(&self) -> Option<String> {
        self.last_report
            .as_ref()
            .filter(|r| r.result.is_err())
            .map(EjectReport::message)
    }

    pub fn take_report(&mut self) -> Option<EjectReport> {
        self.last_report.take()
    }

    /// Reload the rows from the list, keeping the selection on the same
    /// mount root when it is still present.
    fn refill(&mut self) {
        let previous = self
            .selected_volume()
            .map(|v| v.root_directory.clone());
        self.volumes = self.list.snapshot();
        self.selected = previous
            .and_then(|root| self.volumes.iter().position(|v| v.root_directory == root))
            .or((!self.volumes.is_empty()).then_some(0));
        debug!(
            "Refilled {} row(s), selection {:?}",
            self.volumes.len(),
            self.selected
        );
    }

    fn apply_reports(&mut self) {
        for report in self.reports_rx.try_iter() {
            info!("{}", report.message());
            self.last_report = Some(report);
        }
    }
}
