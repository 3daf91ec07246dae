//! Voice input port

use std::sync::Arc;

use tokio::sync::mpsc;

use super::Recognizer;
use super::floor::{AudioFloor, FloorHolder, spawn_port_task};
use crate::Language;
use crate::machine::{CaptureEvent, CaptureEventKind, CaptureId, Event};

/// Runs captures on a [`Recognizer`] and reports their progress
pub struct VoiceInput {
    recognizer: Arc<dyn Recognizer>,
    floor: Arc<AudioFloor>,
    events: mpsc::UnboundedSender<Event>,
}

impl VoiceInput {
    #[must_use]
    pub fn new(
        recognizer: Arc<dyn Recognizer>,
        floor: Arc<AudioFloor>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            recognizer,
            floor,
            events,
        }
    }

    /// Begin capture `id` in `language`
    ///
    /// Emits `Started` and then exactly one terminal event. If an utterance
    /// holds the audio floor the capture is refused with a `busy` error.
    pub fn start(&self, id: CaptureId, language: Language) {
        let recognizer = Arc::clone(&self.recognizer);
        let floor = Arc::clone(&self.floor);
        let events = self.events.clone();

        let claimed = self.floor.claim_capture(id, || {
            spawn_port_task(self.events.clone(), "capture", async move {
                send(&events, id, CaptureEventKind::Started);

                let kind = match recognizer.recognize(language).await {
                    Ok(Some(text)) if !text.trim().is_empty() => {
                        tracing::debug!(capture_id = %id, transcript = %text, "recognized");
                        CaptureEventKind::Result(text.trim().to_string())
                    }
                    Ok(_) => CaptureEventKind::Ended,
                    Err(e) => {
                        tracing::debug!(capture_id = %id, error = %e, "recognition failed");
                        CaptureEventKind::Error(e.to_string())
                    }
                };

                floor.release(FloorHolder::Capture(id));
                send(&events, id, kind);
            })
        });

        if claimed {
            tracing::debug!(capture_id = %id, locale = language.locale(), "capture started");
        } else {
            send(&self.events, id, CaptureEventKind::Error("busy".to_string()));
        }
    }

    /// Stop the open capture, if any
    pub fn stop(&self) {
        if let Some(id) = self.floor.abort_capture() {
            tracing::debug!(capture_id = %id, "capture stopped");
        }
    }
}

fn send(events: &mpsc::UnboundedSender<Event>, id: CaptureId, kind: CaptureEventKind) {
    // The controller loop is gone during shutdown; nothing left to notify
    let _ = events.send(Event::Capture(CaptureEvent { id, kind }));
}
