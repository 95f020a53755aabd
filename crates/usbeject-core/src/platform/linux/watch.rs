//! Hardware change poller.
//!
//! sysfs has no portable change callback without netlink, so a background
//! thread snapshots the block-device set and the mounted-device set every
//! `interval` and reports the difference. Mount changes count as arrivals
//! and removals too: a stick is usable only once something mounts it.
use super::{mounts, sysfs, SysRoots};
use crate::error::PlatformError;
use crate::events::HardwareEvent;
use crate::listener::{EventSink, Watch};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub(super) struct PollWatch {
    cancel: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

pub(super) fn start(
    roots: SysRoots,
    interval: Duration,
    sink: EventSink,
) -> Result<PollWatch, PlatformError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel);
    let initial = Topology::read(&roots);

    let thread = thread::Builder::new()
        .name("usbeject-watch".to_owned())
        .spawn(move || run(roots, interval, sink, cancel_clone, initial))
        .map_err(|e| PlatformError::api("spawn", e.to_string()))?;

    Ok(PollWatch {
        cancel,
        thread: Some(thread),
    })
}

impl Watch for PollWatch {
    fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Watch: poller thread panicked");
            }
        }
    }
}

impl Drop for PollWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Topology {
    block: BTreeSet<String>,
    mounted: BTreeSet<String>,
}

impl Topology {
    fn read(roots: &SysRoots) -> Self {
        let block = sysfs::list_dir(&roots.sys.join("class").join("block"))
            .unwrap_or_default()
            .into_iter()
            .collect();
        let mounted = mounts::read_mounts(&roots.mountinfo)
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.source)
            .collect();
        Self { block, mounted }
    }

    /// Events describing the change from `self` to `next`.
    fn diff(&self, next: &Topology) -> Vec<HardwareEvent> {
        let mut events = Vec::new();
        if next.block.difference(&self.block).next().is_some()
            || next.mounted.difference(&self.mounted).next().is_some()
        {
            events.push(HardwareEvent::InterfaceArrival);
        }
        if self.block.difference(&next.block).next().is_some()
            || self.mounted.difference(&next.mounted).next().is_some()
        {
            events.push(HardwareEvent::InterfaceRemoval);
        }
        events
    }
}

/// Sleep in short slices so `stop()` never waits a whole interval.
const CANCEL_SLICE: Duration = Duration::from_millis(50);

fn run(
    roots: SysRoots,
    interval: Duration,
    sink: EventSink,
    cancel: Arc<AtomicBool>,
    mut last: Topology,
) {
    debug!("Watch: polling {:?} every {:?}", roots.sys, interval);
    'outer: loop {
        let mut slept = Duration::ZERO;
        while slept < interval {
            if cancel.load(Ordering::Relaxed) {
                break 'outer;
            }
            let step = CANCEL_SLICE.min(interval - slept);
            thread::sleep(step);
            slept += step;
        }
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let next = Topology::read(&roots);
        for event in last.diff(&next) {
            debug!("Watch: {:?}", event);
            sink.notify(event);
        }
        last = next;
    }
    debug!("Watch: stopped");
}
