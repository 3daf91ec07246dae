//! Inputs to and outputs from the interaction machine

use std::time::Duration;

use super::state::{ActivityState, CaptureId, RequestId, UtteranceId};
use crate::Language;
use crate::presenter::Speaker;

/// Delay between the end of an utterance and the follow-up transition
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Delay before re-arming capture after a discarded or interrupted capture
pub const RESTART_DELAY: Duration = Duration::from_millis(500);

/// Back-off before retrying capture after a recognition error
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Something the machine reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// User started voice mode
    Start,
    /// User stopped voice mode
    Stop,
    /// User typed a message
    TypedMessage(String),
    /// User flipped the language
    ToggleLanguage,
    /// The front-end was hidden
    Hidden,
    /// Unrecoverable error somewhere outside the machine
    Fault(String),
    /// Voice input port event
    Capture(CaptureEvent),
    /// Voice output port event
    Speech(SpeechEvent),
    /// Reply service call finished
    Reply {
        request: RequestId,
        outcome: Result<String, String>,
    },
    /// A scheduled timer elapsed
    Timer(Timer),
}

/// Event from one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    pub id: CaptureId,
    pub kind: CaptureEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEventKind {
    Started,
    Result(String),
    Error(String),
    /// Capture closed without recognizing anything
    Ended,
}

/// Event from one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechEvent {
    pub id: UtteranceId,
    pub kind: SpeechEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEventKind {
    Started,
    Ended,
    Failed(String),
}

/// A timer token; only acts while its epoch is current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub kind: TimerKind,
    pub epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Resume capture after a normal utterance
    ResumeAfterSpeech,
    /// Full reset after the goodbye utterance
    ResetAfterGoodbye,
    /// Re-arm after a transcript without wake phrase
    RestartAfterNoWake,
    /// Re-arm after a capture closed without a result
    RestartAfterSilence,
    /// Re-arm under the new locale after a language switch
    RestartAfterLanguage,
    /// Retry after a recognition error
    RetryAfterError,
    /// Retry a start that found the audio floor busy
    RetryStart,
}

/// Text to be spoken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub language: Language,
    pub is_exit: bool,
}

/// Side effect requested by the machine, executed by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartCapture { id: CaptureId, language: Language },
    StopCapture,
    Speak(Utterance),
    CancelSpeech,
    RequestReply {
        id: RequestId,
        text: String,
        language: Language,
    },
    Schedule { timer: Timer, delay: Duration },
    Transcript { speaker: Speaker, text: String },
    Thinking(bool),
    CaptureIndicator(bool),
    Activity(ActivityState),
    LanguageChanged(Language),
    Notice(String),
}
