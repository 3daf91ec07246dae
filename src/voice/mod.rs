//! Voice input and output ports
//!
//! The ports wrap a [`Recognizer`] and a [`Synthesizer`] engine, run each
//! capture or utterance as a cancellable task and report progress back to the
//! controller as machine events. Both ports share one [`AudioFloor`] so an
//! utterance always preempts a capture.

mod console;
mod floor;
mod input;
mod output;
mod sanitize;
pub mod segment;

#[cfg(feature = "audio")]
mod capture;
#[cfg(feature = "audio")]
mod engine;
#[cfg(feature = "audio")]
mod playback;
#[cfg(feature = "audio")]
mod stt;
#[cfg(feature = "audio")]
mod tts;

use async_trait::async_trait;
use serde::Serialize;

pub use console::{ConsoleRecognizer, ConsoleSynthesizer};
pub use floor::{AudioFloor, FloorHolder};
pub use input::VoiceInput;
pub use output::VoiceOutput;
pub use sanitize::{sanitize_for_speech, select_voice};

#[cfg(feature = "audio")]
pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
#[cfg(feature = "audio")]
pub use engine::{MicrophoneRecognizer, SpeakerSynthesizer};
#[cfg(feature = "audio")]
pub use playback::AudioPlayback;
#[cfg(feature = "audio")]
pub use stt::SpeechToText;
#[cfg(feature = "audio")]
pub use tts::TextToSpeech;

use crate::{Language, Result};

/// A synthesizer voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceInfo {
    pub name: String,
    /// Locale tag such as `en-IN`
    pub lang: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Speech-to-text engine
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Capture one phrase in `language`
    ///
    /// Resolves to `Ok(None)` when the capture closed without recognizing
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns error if capture or transcription fails
    async fn recognize(&self, language: Language) -> Result<Option<String>>;
}

/// Text-to-speech engine
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Voices this engine can speak with
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Speak `text`, resolving once playback has finished
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&self, text: &str, voice: Option<&VoiceInfo>, language: Language)
    -> Result<()>;
}
