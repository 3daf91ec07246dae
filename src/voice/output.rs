//! Voice output port

use std::sync::Arc;

use tokio::sync::mpsc;

use super::floor::{AudioFloor, FloorHolder, spawn_port_task};
use super::{Synthesizer, sanitize_for_speech, select_voice};
use crate::machine::{Event, SpeechEvent, SpeechEventKind, Utterance, UtteranceId};

/// Speaks utterances on a [`Synthesizer`] and reports their progress
pub struct VoiceOutput {
    synthesizer: Arc<dyn Synthesizer>,
    floor: Arc<AudioFloor>,
    events: mpsc::UnboundedSender<Event>,
}

impl VoiceOutput {
    #[must_use]
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        floor: Arc<AudioFloor>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            synthesizer,
            floor,
            events,
        }
    }

    /// Speak `utterance`, cancelling any utterance or capture in progress
    ///
    /// Emits `Started` and then exactly one of `Ended` or `Failed`.
    pub fn speak(&self, utterance: Utterance) {
        let Utterance {
            id,
            text,
            language,
            is_exit,
        } = utterance;

        let text = sanitize_for_speech(&text);
        let voice = select_voice(&self.synthesizer.voices(), language).cloned();
        tracing::debug!(
            utterance_id = %id,
            voice = voice.as_ref().map_or("default", |v| v.name.as_str()),
            is_exit,
            "speaking"
        );

        let synthesizer = Arc::clone(&self.synthesizer);
        let floor = Arc::clone(&self.floor);
        let events = self.events.clone();

        self.floor.claim_utterance(id, || {
            spawn_port_task(self.events.clone(), "speech", async move {
                send(&events, id, SpeechEventKind::Started);

                let kind = if text.is_empty() {
                    SpeechEventKind::Ended
                } else {
                    match synthesizer.speak(&text, voice.as_ref(), language).await {
                        Ok(()) => SpeechEventKind::Ended,
                        Err(e) => {
                            tracing::warn!(utterance_id = %id, error = %e, "playback failed");
                            SpeechEventKind::Failed(e.to_string())
                        }
                    }
                };

                floor.release(FloorHolder::Utterance(id));
                send(&events, id, kind);
            })
        });
    }

    /// Cancel the utterance in progress, if any
    pub fn cancel(&self) {
        if let Some(id) = self.floor.abort_utterance() {
            tracing::debug!(utterance_id = %id, "speech cancelled");
        }
    }
}

fn send(events: &mpsc::UnboundedSender<Event>, id: UtteranceId, kind: SpeechEventKind) {
    let _ = events.send(Event::Speech(SpeechEvent { id, kind }));
}
