//! Audio floor shared by the voice ports
//!
//! Records which port currently owns the audio device together with the
//! abort handle of its task. An utterance always wins the floor; a capture is
//! refused while an utterance holds it.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::machine::{CaptureId, Event, UtteranceId};

/// Current owner of the audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorHolder {
    Free,
    Capture(CaptureId),
    Utterance(UtteranceId),
}

#[derive(Debug)]
struct Slot {
    holder: FloorHolder,
    task: Option<AbortHandle>,
}

impl Slot {
    fn abort(&mut self) -> FloorHolder {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        std::mem::replace(&mut self.holder, FloorHolder::Free)
    }
}

/// Shared ownership record of the audio device
#[derive(Debug)]
pub struct AudioFloor {
    slot: Mutex<Slot>,
}

impl Default for AudioFloor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioFloor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                holder: FloorHolder::Free,
                task: None,
            }),
        }
    }

    /// Who holds the floor right now
    #[must_use]
    pub fn holder(&self) -> FloorHolder {
        self.lock().holder
    }

    /// Claim the floor for a capture, spawning its task while holding the lock
    ///
    /// Returns `false` without spawning if an utterance holds the floor. An
    /// older capture is aborted and replaced.
    pub(crate) fn claim_capture(&self, id: CaptureId, spawn: impl FnOnce() -> AbortHandle) -> bool {
        let mut slot = self.lock();
        match slot.holder {
            FloorHolder::Utterance(current) => {
                tracing::debug!(capture_id = %id, utterance_id = %current, "floor busy, capture refused");
                return false;
            }
            FloorHolder::Capture(current) => {
                tracing::debug!(capture_id = %id, replaced = %current, "replacing open capture");
                slot.abort();
            }
            FloorHolder::Free => {}
        }
        slot.holder = FloorHolder::Capture(id);
        slot.task = Some(spawn());
        true
    }

    /// Claim the floor for an utterance, aborting whatever holds it
    pub(crate) fn claim_utterance(&self, id: UtteranceId, spawn: impl FnOnce() -> AbortHandle) {
        let mut slot = self.lock();
        match slot.abort() {
            FloorHolder::Free => {}
            FloorHolder::Capture(current) => {
                tracing::debug!(utterance_id = %id, capture_id = %current, "utterance preempts capture");
            }
            FloorHolder::Utterance(current) => {
                tracing::debug!(utterance_id = %id, cancelled = %current, "utterance replaces utterance");
            }
        }
        slot.holder = FloorHolder::Utterance(id);
        slot.task = Some(spawn());
    }

    /// Release the floor after `holder` finished on its own
    pub(crate) fn release(&self, holder: FloorHolder) {
        let mut slot = self.lock();
        if slot.holder == holder {
            slot.holder = FloorHolder::Free;
            slot.task = None;
        }
    }

    /// Abort an open capture, if any
    pub(crate) fn abort_capture(&self) -> Option<CaptureId> {
        let mut slot = self.lock();
        match slot.holder {
            FloorHolder::Capture(id) => {
                slot.abort();
                Some(id)
            }
            _ => None,
        }
    }

    /// Abort a playing utterance, if any
    pub(crate) fn abort_utterance(&self) -> Option<UtteranceId> {
        let mut slot = self.lock();
        match slot.holder {
            FloorHolder::Utterance(id) => {
                slot.abort();
                Some(id)
            }
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Spawn a port task; a panic inside it is reported as a fault event
pub(crate) fn spawn_port_task<F>(
    events: mpsc::UnboundedSender<Event>,
    label: &'static str,
    work: F,
) -> AbortHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(work);
    let abort = task.abort_handle();
    tokio::spawn(async move {
        if let Err(e) = task.await {
            if e.is_panic() {
                tracing::error!(task = label, "port task panicked");
                let _ = events.send(Event::Fault(format!("{label} task panicked")));
            }
        }
    });
    abort
}
