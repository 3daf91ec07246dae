//! Presentation adapter
//!
//! The controller reports everything user-visible through [`Presenter`]: the
//! transcript, the thinking placeholder, the listening indicator, status and
//! notices. [`ConsolePresenter`] renders them on a terminal.

use std::fmt;
use std::io::Write;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::Language;
use crate::machine::ActivityState;
use crate::phrases::Phrase;
use crate::service::HistoryItem;

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("You"),
            Self::Assistant => f.write_str("Sarah"),
        }
    }
}

/// One line of the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl TranscriptEntry {
    /// Entry stamped with the current time
    #[must_use]
    pub fn now(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

/// Sink for everything the user sees
pub trait Presenter: Send {
    /// Append a transcript entry
    fn append(&mut self, entry: &TranscriptEntry);

    /// Replace the whole transcript with `entry`
    fn reset(&mut self, entry: &TranscriptEntry);

    /// Show or hide the "thinking" placeholder
    fn thinking(&mut self, shown: bool, language: Language);

    /// Toggle the listening indicator
    fn listening(&mut self, on: bool, language: Language);

    /// Activity changed
    fn activity(&mut self, state: ActivityState, language: Language);

    /// Language switched
    fn language(&mut self, language: Language);

    /// Out-of-band message (degradation, refusals, failures)
    fn notice(&mut self, text: &str);

    /// Stored conversation history fetched from the service
    fn history(&mut self, items: &[HistoryItem]);
}

/// Status line for an activity
#[must_use]
pub const fn status_line(state: ActivityState, language: Language) -> &'static str {
    match (state, language) {
        (ActivityState::Idle, Language::English) => {
            "Type /start and say \"Hey Sarah\" to begin"
        }
        (ActivityState::Idle, Language::Kannada) => {
            "/start ಟೈಪ್ ಮಾಡಿ ಮತ್ತು \"ಹೇ ಸಾರಾ\" ಎಂದು ಹೇಳಿ"
        }
        (ActivityState::AwaitingWakeWord, Language::English) => "Listening for wake word...",
        (ActivityState::AwaitingWakeWord, Language::Kannada) => "ಎಚ್ಚರ ಪದಕ್ಕಾಗಿ ಕೇಳುತ್ತಿದ್ದೇನೆ...",
        (ActivityState::Listening, Language::English) => "🔄 Ready for next input...",
        (ActivityState::Listening, Language::Kannada) => "🔄 ಮುಂದಿನ ಇನ್‌ಪುಟ್‌ಗಾಗಿ ಸಿದ್ಧ...",
        (ActivityState::Processing, Language::English) => "⏳ Processing...",
        (ActivityState::Processing, Language::Kannada) => "⏳ ಪ್ರೋಸೆಸ್ ಮಾಡುತ್ತಿದ್ದೇನೆ...",
        (ActivityState::Speaking, Language::English) => "🗣️ Sarah is speaking...",
        (ActivityState::Speaking, Language::Kannada) => "🗣️ ಸಾರಾ ಮಾತನಾಡುತ್ತಿದ್ದಾಳೆ...",
    }
}

const fn listening_line(language: Language) -> &'static str {
    match language {
        Language::English => "🎤 Listening... (Speak now)",
        Language::Kannada => "🎤 ಕೇಳುತ್ತಿದ್ದೇನೆ... (ಈಗ ಮಾತನಾಡಿ)",
    }
}

const fn language_line(language: Language) -> &'static str {
    match language {
        Language::English => "English Mode",
        Language::Kannada => "ಕನ್ನಡ Mode",
    }
}

/// Renders the conversation on a terminal
pub struct ConsolePresenter {
    out: Box<dyn Write + Send>,
    entries: Vec<TranscriptEntry>,
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePresenter {
    /// Presenter writing to stdout
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    /// Presenter writing to `out`
    #[must_use]
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            entries: Vec::new(),
        }
    }

    /// Transcript shown so far
    #[must_use]
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    fn line(&mut self, text: impl fmt::Display) {
        // A closed terminal is not worth failing the conversation over
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "console write failed");
        }
    }

    fn show(&mut self, entry: &TranscriptEntry) {
        let line = format!(
            "[{}] {}: {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.speaker,
            entry.text
        );
        self.line(line);
    }
}

impl Presenter for ConsolePresenter {
    fn append(&mut self, entry: &TranscriptEntry) {
        self.show(entry);
        self.entries.push(entry.clone());
    }

    fn reset(&mut self, entry: &TranscriptEntry) {
        self.entries.clear();
        self.line("────────────────────────────────────────");
        self.append(entry);
    }

    fn thinking(&mut self, shown: bool, language: Language) {
        if shown {
            self.line(format!("   {}", Phrase::Thinking.text(language)));
        }
    }

    fn listening(&mut self, on: bool, language: Language) {
        if on {
            self.line(format!("   {}", listening_line(language)));
        }
    }

    fn activity(&mut self, state: ActivityState, language: Language) {
        self.line(format!("   · {}", status_line(state, language)));
    }

    fn language(&mut self, language: Language) {
        self.line(format!("   · {}", language_line(language)));
    }

    fn notice(&mut self, text: &str) {
        self.line(format!("   ! {text}"));
    }

    fn history(&mut self, items: &[HistoryItem]) {
        if items.is_empty() {
            self.line("   (no stored history)");
            return;
        }
        for item in items {
            let line = format!(
                "   {} [{}]\n     You: {}\n     Sarah: {}",
                item.timestamp, item.language, item.user_input, item.assistant_response
            );
            self.line(line);
        }
    }
}
