//! Ejector: whole-device removal requests.
//!
//! One request at a time. The platform call runs on a worker thread and its
//! outcome is posted back to the owner's event channel; the owner then
//! calls [`Ejector::finish`], which clears the in-flight slot and invokes
//! the callback. There is no cancellation and no timeout.
pub mod veto;

pub use veto::{Veto, VetoType, UNRECOGNIZED_VETO_MESSAGE, VETO_TABLE};

use crate::error::{EjectError, EjectResult};
use crate::events::Event;
use crate::model::DeviceKey;
use crate::platform::Backend;
use crossbeam_channel::Sender;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Receives the outcome of one eject request, exactly once.
pub type EjectCallback = Box<dyn FnOnce(EjectResult)>;

pub struct Ejector {
    backend: Arc<dyn Backend>,
    events: Sender<Event>,
    in_flight: Option<InFlight>,
}

struct InFlight {
    key: DeviceKey,
    callback: EjectCallback,
    worker: Option<thread::JoinHandle<()>>,
}

impl Ejector {
    pub fn new(backend: Arc<dyn Backend>, events: Sender<Event>) -> Self {
        Self {
            backend,
            events,
            in_flight: None,
        }
    }

    pub fn is_ejecting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start ejecting `key`.
    ///
    /// Rejects immediately with [`EjectError::AlreadyInProgress`] while
    /// another request is running; the running request is unaffected.
    pub fn start(&mut self, key: DeviceKey, callback: EjectCallback) {
        if self.is_ejecting() {
            warn!("Eject of {} rejected: another request is in flight", key);
            callback(Err(EjectError::AlreadyInProgress));
            return;
        }

        info!("Requesting eject of device {}", key);
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let worker_key = key.clone();
        let spawned = thread::Builder::new()
            .name("usbeject-eject".into())
            .spawn(move || {
                let outcome = request(backend.as_ref(), &worker_key);
                if events.send(Event::EjectFinished(outcome)).is_err() {
                    debug!("Eject of {} finished after its owner went away", worker_key);
                }
            });

        match spawned {
            Ok(worker) => {
                self.in_flight = Some(InFlight {
                    key,
                    callback,
                    worker: Some(worker),
                })
            }
            Err(e) => {
                error!("Failed to spawn eject worker: {}", e);
                callback(Err(EjectError::Refused {
                    reason: VetoType::Unknown,
                    vetoing_device: None,
                }));
            }
        }
    }

    /// Deliver a worker outcome. Clears the in-flight slot, then invokes the
    /// callback.
    pub fn finish(&mut self, outcome: EjectResult) {
        let Some(InFlight { key, callback, .. }) = self.in_flight.take() else {
            warn!("Eject outcome arrived with no request in flight");
            return;
        };
        match &outcome {
            Ok(()) => info!("Device {} ejected", key),
            Err(e) => warn!("Eject of device {} failed: {}", key, e),
        }
        callback(outcome);
    }

    /// Block until the in-flight worker has posted its outcome. No-op when
    /// nothing is in flight or the worker was already joined.
    pub fn join_worker(&mut self) {
        let Some(worker) = self.in_flight.as_mut().and_then(|f| f.worker.take()) else {
            return;
        };
        if worker.join().is_err() {
            error!("Eject worker panicked");
        }
    }
}

/// Perform one platform request and translate a refusal.
pub fn request(backend: &dyn Backend, key: &DeviceKey) -> EjectResult {
    match catch_unwind(AssertUnwindSafe(|| backend.request_eject(key))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(veto)) => Err(EjectError::Refused {
            reason: veto.reason,
            vetoing_device: veto.vetoing_device.filter(|name| !name.is_empty()),
        }),
        Err(_) => {
            error!("Platform eject call for {} panicked", key);
            Err(EjectError::Refused {
                reason: VetoType::Unknown,
                vetoing_device: None,
            })
        }
    }
}
