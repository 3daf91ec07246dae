//! Voice interaction state machine
//!
//! Pure transition function: every [`Event`] updates the machine and returns
//! the [`Effect`]s the controller must execute. Nothing here touches audio,
//! the network or the clock, so every path is testable without them.
//!
//! ```text
//!   Idle ──start──▶ AwaitingWakeWord ──wake──▶ Listening ──text──▶ Processing
//!    ▲                    │ exit                 │ exit               │ reply
//!    │                    ▼                      ▼                    ▼
//!    └──── settle ◀── Speaking(exit) ◀───────────┘      Speaking ──settle──▶ Listening
//! ```

mod event;
mod state;

pub use event::{
    CaptureEvent, CaptureEventKind, Effect, Event, RESTART_DELAY, RETRY_DELAY, SETTLE_DELAY,
    SpeechEvent, SpeechEventKind, Timer, TimerKind, Utterance,
};
pub use state::{ActivityState, CaptureId, Mode, RequestId, UtteranceId};

use std::time::Duration;

use state::Phase;

use crate::lexicon::{Lexicon, Verdict};
use crate::phrases::Phrase;
use crate::presenter::Speaker;
use crate::{Capabilities, Language};

/// Consecutive capture errors after which the user is told
const CAPTURE_ERROR_NOTICE_AFTER: u32 = 5;

/// The interaction state machine
#[derive(Debug, Clone)]
pub struct Machine {
    lexicon: Lexicon,
    capabilities: Capabilities,
    language: Language,
    mode: Mode,
    phase: Phase,
    epoch: u64,
    next_id: u64,
    capture_errors: u32,
    thinking: bool,
}

impl Machine {
    /// Create an idle machine
    #[must_use]
    pub const fn new(lexicon: Lexicon, capabilities: Capabilities, language: Language) -> Self {
        Self {
            lexicon,
            capabilities,
            language,
            mode: Mode::Off,
            phase: Phase::Ready,
            epoch: 0,
            next_id: 0,
            capture_errors: 0,
            thinking: false,
        }
    }

    /// Current activity
    #[must_use]
    pub const fn activity(&self) -> ActivityState {
        match (self.phase, self.mode) {
            (Phase::Processing { .. }, _) => ActivityState::Processing,
            (Phase::Speaking { .. }, _) => ActivityState::Speaking,
            (_, Mode::Off) => ActivityState::Idle,
            (_, Mode::Armed) => ActivityState::AwaitingWakeWord,
            (_, Mode::Active) => ActivityState::Listening,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// A capture has been requested and not yet finished
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        matches!(self.phase, Phase::Capturing { .. })
    }

    /// An utterance is in flight
    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        matches!(self.phase, Phase::Speaking { .. })
    }

    /// A reply request is in flight
    #[must_use]
    pub const fn is_processing(&self) -> bool {
        matches!(self.phase, Phase::Processing { .. })
    }

    /// The "thinking" placeholder is shown
    #[must_use]
    pub const fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Apply one event and return the effects to execute, in order
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        let before = self.activity();
        let mut fx = Vec::new();

        match event {
            Event::Start => self.start(&mut fx),
            Event::Stop => {
                tracing::info!(language = %self.language, "voice mode stopped");
                self.reset(&mut fx);
            }
            Event::TypedMessage(text) => self.typed(&text, &mut fx),
            Event::ToggleLanguage => self.toggle_language(&mut fx),
            Event::Hidden => {
                if self.mode != Mode::Off {
                    tracing::info!("front-end hidden, pausing voice mode");
                    self.reset(&mut fx);
                }
            }
            Event::Fault(reason) => {
                tracing::error!(reason = %reason, "fault, cancelling speech and capture");
                self.reset(&mut fx);
                fx.push(Effect::Notice(format!("recovered from an error: {reason}")));
            }
            Event::Capture(capture) => self.on_capture(capture, &mut fx),
            Event::Speech(speech) => self.on_speech(speech, &mut fx),
            Event::Reply { request, outcome } => self.on_reply(request, outcome, &mut fx),
            Event::Timer(timer) => self.on_timer(timer, &mut fx),
        }

        let after = self.activity();
        if before != after {
            tracing::debug!(from = %before, to = %after, "activity changed");
            fx.push(Effect::Activity(after));
        }
        fx
    }

    fn start(&mut self, fx: &mut Vec<Effect>) {
        if let crate::Availability::Unavailable(reason) = &self.capabilities.input {
            fx.push(Effect::Notice(format!(
                "speech recognition unavailable: {reason}"
            )));
            return;
        }

        tracing::info!(language = %self.language, "voice mode started");
        self.mode = Mode::Armed;
        self.epoch += 1;
        self.capture_errors = 0;

        match self.phase {
            Phase::Ready => self.begin_capture(fx),
            Phase::Capturing { .. } => tracing::debug!("capture already active"),
            Phase::Speaking { .. } | Phase::Processing { .. } => {
                tracing::debug!("audio floor busy, retrying start");
                self.schedule(TimerKind::RetryStart, RESTART_DELAY, fx);
            }
        }
    }

    /// Neutralize capture, speech and the pending reply; back to `Idle`
    fn reset(&mut self, fx: &mut Vec<Effect>) {
        self.mode = Mode::Off;
        self.phase = Phase::Ready;
        self.epoch += 1;
        self.capture_errors = 0;

        fx.push(Effect::StopCapture);
        fx.push(Effect::CaptureIndicator(false));
        fx.push(Effect::CancelSpeech);
        if self.thinking {
            self.thinking = false;
            fx.push(Effect::Thinking(false));
        }
    }

    fn typed(&mut self, text: &str, fx: &mut Vec<Effect>) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.is_processing() {
            fx.push(Effect::Notice(
                "still waiting for the previous reply".to_string(),
            ));
            return;
        }

        fx.push(Effect::Transcript {
            speaker: Speaker::User,
            text: text.to_string(),
        });
        self.begin_processing(text, fx);
    }

    fn toggle_language(&mut self, fx: &mut Vec<Effect>) {
        self.language = self.language.toggled();
        tracing::info!(language = %self.language, "language switched");
        fx.push(Effect::LanguageChanged(self.language));

        if self.is_capturing() {
            self.phase = Phase::Ready;
            fx.push(Effect::StopCapture);
            fx.push(Effect::CaptureIndicator(false));
            self.schedule(TimerKind::RestartAfterLanguage, RESTART_DELAY, fx);
        }
    }

    fn on_capture(&mut self, event: CaptureEvent, fx: &mut Vec<Effect>) {
        let Phase::Capturing { id, started } = self.phase else {
            tracing::trace!(capture_id = %event.id, "capture event while not capturing");
            return;
        };
        if id != event.id {
            tracing::trace!(capture_id = %event.id, current = %id, "stale capture event");
            return;
        }

        match event.kind {
            CaptureEventKind::Started => {
                if !started {
                    self.phase = Phase::Capturing { id, started: true };
                    fx.push(Effect::CaptureIndicator(true));
                }
            }
            CaptureEventKind::Result(text) if text.trim().is_empty() => {
                self.finish_capture(fx);
                self.schedule(TimerKind::RestartAfterSilence, RESTART_DELAY, fx);
            }
            CaptureEventKind::Result(text) => {
                self.finish_capture(fx);
                self.capture_errors = 0;
                self.interpret(&text, fx);
            }
            CaptureEventKind::Error(code) => {
                self.finish_capture(fx);
                self.capture_errors += 1;
                tracing::warn!(capture_id = %id, code = %code, errors = self.capture_errors, "capture error");
                if self.capture_errors == CAPTURE_ERROR_NOTICE_AFTER {
                    fx.push(Effect::Notice(format!(
                        "speech recognition keeps failing ({code})"
                    )));
                }
                if self.mode != Mode::Off {
                    self.schedule(TimerKind::RetryAfterError, RETRY_DELAY, fx);
                }
            }
            CaptureEventKind::Ended => {
                self.finish_capture(fx);
                if self.mode != Mode::Off {
                    self.schedule(TimerKind::RestartAfterSilence, RESTART_DELAY, fx);
                }
            }
        }
    }

    fn finish_capture(&mut self, fx: &mut Vec<Effect>) {
        self.phase = Phase::Ready;
        fx.push(Effect::CaptureIndicator(false));
    }

    /// Gate a recognized transcript: exit, then wake, then content
    fn interpret(&mut self, text: &str, fx: &mut Vec<Effect>) {
        let verdict = self.lexicon.classify(self.language, text);
        tracing::debug!(?verdict, mode = ?self.mode, transcript = text, "interpreting transcript");

        match (verdict, self.mode) {
            (Verdict::Exit, _) => {
                fx.push(Effect::Transcript {
                    speaker: Speaker::User,
                    text: text.to_string(),
                });
                self.speak(Phrase::Goodbye.text(self.language), true, fx);
            }
            (Verdict::Wake, Mode::Armed) => {
                tracing::info!("wake phrase heard, conversation active");
                self.mode = Mode::Active;
                self.speak(Phrase::Greeting.text(self.language), false, fx);
            }
            (_, Mode::Active) => {
                fx.push(Effect::Transcript {
                    speaker: Speaker::User,
                    text: text.to_string(),
                });
                self.begin_processing(text, fx);
            }
            (_, Mode::Armed | Mode::Off) => {
                tracing::debug!("no wake phrase, ignoring");
                self.schedule(TimerKind::RestartAfterNoWake, RESTART_DELAY, fx);
            }
        }
    }

    fn begin_processing(&mut self, text: &str, fx: &mut Vec<Effect>) {
        if self.is_capturing() {
            fx.push(Effect::StopCapture);
            fx.push(Effect::CaptureIndicator(false));
        }
        fx.push(Effect::CancelSpeech);

        let request = RequestId(self.next_id());
        self.phase = Phase::Processing { request };
        self.thinking = true;
        fx.push(Effect::Thinking(true));
        fx.push(Effect::RequestReply {
            id: request,
            text: text.to_string(),
            language: self.language,
        });
    }

    fn on_reply(
        &mut self,
        request: RequestId,
        outcome: Result<String, String>,
        fx: &mut Vec<Effect>,
    ) {
        match self.phase {
            Phase::Processing { request: pending } if pending == request => {}
            _ => {
                tracing::debug!(request = %request, "reply arrived after reset, dropping");
                return;
            }
        }

        self.thinking = false;
        fx.push(Effect::Thinking(false));

        let text = match outcome {
            Ok(reply) => reply,
            Err(error) => {
                tracing::warn!(request = %request, error = %error, "reply failed, apologizing");
                Phrase::Apology.text(self.language).to_string()
            }
        };
        fx.push(Effect::Transcript {
            speaker: Speaker::Assistant,
            text: text.clone(),
        });
        self.speak(&text, false, fx);
    }

    fn speak(&mut self, text: &str, is_exit: bool, fx: &mut Vec<Effect>) {
        if !self.capabilities.output.is_available() {
            // Nothing to wait for; run the post-speech transition now
            self.phase = Phase::Ready;
            self.after_speech(is_exit, fx);
            return;
        }

        let id = UtteranceId(self.next_id());
        self.phase = Phase::Speaking { id, exit: is_exit };
        fx.push(Effect::Speak(Utterance {
            id,
            text: text.to_string(),
            language: self.language,
            is_exit,
        }));
    }

    fn on_speech(&mut self, event: SpeechEvent, fx: &mut Vec<Effect>) {
        let Phase::Speaking { id, exit } = self.phase else {
            tracing::trace!(utterance_id = %event.id, "speech event while not speaking");
            return;
        };
        if id != event.id {
            tracing::trace!(utterance_id = %event.id, current = %id, "stale speech event");
            return;
        }

        match event.kind {
            SpeechEventKind::Started => tracing::debug!(utterance_id = %id, "speech started"),
            SpeechEventKind::Ended => {
                self.phase = Phase::Ready;
                self.after_speech(exit, fx);
            }
            SpeechEventKind::Failed(reason) => {
                tracing::warn!(utterance_id = %id, reason = %reason, "speech failed, continuing");
                self.phase = Phase::Ready;
                self.after_speech(exit, fx);
            }
        }
    }

    fn after_speech(&mut self, is_exit: bool, fx: &mut Vec<Effect>) {
        let kind = if is_exit {
            TimerKind::ResetAfterGoodbye
        } else {
            TimerKind::ResumeAfterSpeech
        };
        self.schedule(kind, SETTLE_DELAY, fx);
    }

    fn on_timer(&mut self, timer: Timer, fx: &mut Vec<Effect>) {
        if timer.epoch != self.epoch {
            tracing::trace!(kind = ?timer.kind, epoch = timer.epoch, "stale timer");
            return;
        }

        match timer.kind {
            TimerKind::ResetAfterGoodbye => {
                tracing::info!("goodbye finished, voice mode stopped");
                self.reset(fx);
            }
            TimerKind::ResumeAfterSpeech
            | TimerKind::RestartAfterNoWake
            | TimerKind::RestartAfterSilence
            | TimerKind::RestartAfterLanguage
            | TimerKind::RetryAfterError
            | TimerKind::RetryStart => {
                if self.mode != Mode::Off && self.phase == Phase::Ready {
                    self.begin_capture(fx);
                } else {
                    tracing::trace!(kind = ?timer.kind, activity = %self.activity(), "timer not applicable");
                }
            }
        }
    }

    fn begin_capture(&mut self, fx: &mut Vec<Effect>) {
        if !self.capabilities.input.is_available() {
            return;
        }
        let id = CaptureId(self.next_id());
        self.phase = Phase::Capturing { id, started: false };
        tracing::debug!(capture_id = %id, language = %self.language, "starting capture");
        fx.push(Effect::StartCapture {
            id,
            language: self.language,
        });
    }

    fn schedule(&self, kind: TimerKind, delay: Duration, fx: &mut Vec<Effect>) {
        fx.push(Effect::Schedule {
            timer: Timer {
                kind,
                epoch: self.epoch,
            },
            delay,
        });
    }

    const fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}
