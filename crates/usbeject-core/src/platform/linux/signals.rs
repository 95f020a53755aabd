//! Hot-plug notifications from UDisks2 signals.
//!
//! Block and filesystem objects appearing or vanishing on the udisks object
//! manager are arrivals and removals. A `PropertiesChanged` on a filesystem
//! interface means its mount points moved, which changes the usable set too.
//!
//! The subscription lives on its own thread with a current-thread runtime;
//! `start` returns only once the subscription is in place or has failed.
use super::udisks::{self, UDisks2ObjectManagerProxy, BLOCK_IFACE, FILESYSTEM_IFACE, SERVICE};
use crate::error::PlatformError;
use crate::events::HardwareEvent;
use crate::listener::{EventSink, Watch};
use crossbeam_channel::Sender;
use futures::StreamExt;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use zbus::{Connection, MatchRule, MessageStream};

pub(super) struct SignalWatch {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

pub(super) fn start(sink: EventSink) -> Result<SignalWatch, PlatformError> {
    let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let thread = thread::Builder::new()
        .name("usbeject-udisks".to_owned())
        .spawn(move || run(sink, ready_tx, shutdown_rx))
        .map_err(|e| PlatformError::api("spawn", e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(SignalWatch {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }),
        Ok(Err(e)) => {
            join(thread);
            Err(e)
        }
        Err(_) => {
            join(thread);
            Err(PlatformError::api("udisks", "signal thread exited before subscribing"))
        }
    }
}

impl Watch for SignalWatch {
    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // A closed receiver means the loop already ended.
            shutdown.send(()).ok();
        }
        if let Some(thread) = self.thread.take() {
            join(thread);
        }
    }
}

impl Drop for SignalWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

fn join(thread: thread::JoinHandle<()>) {
    if thread.join().is_err() {
        warn!("udisks signal thread panicked");
    }
}

/// Whether a set of interface names includes one that carries a volume.
fn touches_volumes<'a>(mut interfaces: impl Iterator<Item = &'a str>) -> bool {
    interfaces.any(|i| i == BLOCK_IFACE || i == FILESYSTEM_IFACE)
}

fn run(
    sink: EventSink,
    ready: Sender<Result<(), PlatformError>>,
    shutdown: oneshot::Receiver<()>,
) {
    let runtime = match udisks::runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            ready.send(Err(PlatformError::api("tokio", e.to_string()))).ok();
            return;
        }
    };
    runtime.block_on(listen(sink, ready, shutdown));
    debug!("Watch: udisks signals stopped");
}

async fn listen(
    sink: EventSink,
    ready: Sender<Result<(), PlatformError>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let subscribed = async {
        let connection = Connection::system().await?;
        let manager = UDisks2ObjectManagerProxy::new(&connection).await?;
        let added = manager.receive_interfaces_added().await?;
        let removed = manager.receive_interfaces_removed().await?;
        let rule = MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .sender(SERVICE)?
            .interface("org.freedesktop.DBus.Properties")?
            .member("PropertiesChanged")?
            .arg(0, FILESYSTEM_IFACE)?
            .build();
        let mounts = MessageStream::for_match_rule(rule, &connection, None).await?;
        Ok::<_, zbus::Error>((added, removed, mounts))
    }
    .await;

    let (mut added, mut removed, mut mounts) = match subscribed {
        Ok(streams) => streams,
        Err(e) => {
            ready.send(Err(PlatformError::api("udisks", e.to_string()))).ok();
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }
    debug!("Watch: subscribed to udisks signals");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            signal = added.next() => {
                let Some(signal) = signal else { break };
                match signal.args() {
                    Ok(args) => {
                        if touches_volumes(args.interfaces_and_properties.keys().map(String::as_str)) {
                            debug!("Watch: {} added", args.object_path.as_str());
                            sink.notify(HardwareEvent::InterfaceArrival);
                        }
                    }
                    Err(e) => warn!("Failed to parse InterfacesAdded signal args: {}", e),
                }
            }
            signal = removed.next() => {
                let Some(signal) = signal else { break };
                match signal.args() {
                    Ok(args) => {
                        if touches_volumes(args.interfaces.iter().map(String::as_str)) {
                            debug!("Watch: {} removed", args.object_path.as_str());
                            sink.notify(HardwareEvent::InterfaceRemoval);
                        }
                    }
                    Err(e) => warn!("Failed to parse InterfacesRemoved signal args: {}", e),
                }
            }
            message = mounts.next() => {
                match message {
                    Some(Ok(_)) => {
                        // Mounts and unmounts both change the usable set.
                        debug!("Watch: mount points changed");
                        sink.notify(HardwareEvent::InterfaceArrival);
                    }
                    Some(Err(e)) => warn!("Bad PropertiesChanged message: {}", e),
                    None => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_and_filesystem_objects_count() {
        assert!(touches_volumes([BLOCK_IFACE].into_iter()));
        assert!(touches_volumes(
            ["org.freedesktop.UDisks2.Partition", FILESYSTEM_IFACE].into_iter()
        ));
    }

    #[test]
    fn drive_and_job_objects_are_ignored() {
        assert!(!touches_volumes(
            ["org.freedesktop.UDisks2.Drive", "org.freedesktop.UDisks2.Drive.Ata"].into_iter()
        ));
        assert!(!touches_volumes(["org.freedesktop.UDisks2.Job"].into_iter()));
        assert!(!touches_volumes(std::iter::empty()));
    }
}
