//! Terminal stand-ins for the speech engines
//!
//! [`ConsoleRecognizer`] treats a line typed while a capture is open as the
//! recognized speech. [`ConsoleSynthesizer`] "speaks" by waiting roughly as
//! long as reading the text aloud would take; the transcript itself is shown
//! by the presenter.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{Recognizer, Synthesizer, VoiceInfo};
use crate::{Language, Result};

/// Recognizer fed by lines typed on the terminal
#[derive(Debug, Default)]
pub struct ConsoleRecognizer {
    pending: Mutex<Option<oneshot::Sender<String>>>,
}

impl ConsoleRecognizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a capture is waiting for a line
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Hand a typed line to the open capture
    ///
    /// # Errors
    ///
    /// Gives the line back if no capture is waiting for it
    pub fn offer(&self, line: String) -> std::result::Result<(), String> {
        match self.slot().take() {
            Some(tx) => tx.send(line),
            None => Err(line),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<oneshot::Sender<String>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Recognizer for ConsoleRecognizer {
    async fn recognize(&self, language: Language) -> Result<Option<String>> {
        let (tx, rx) = oneshot::channel();
        // A replaced sender closes the older capture without a result
        self.slot().replace(tx);
        tracing::trace!(locale = language.locale(), "waiting for typed speech");
        Ok(rx.await.ok())
    }
}

/// Default time to "say" one word
const WORD_DURATION: Duration = Duration::from_millis(60);

/// Synthesizer that only takes time
#[derive(Debug, Clone)]
pub struct ConsoleSynthesizer {
    per_word: Duration,
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSynthesizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            per_word: WORD_DURATION,
        }
    }

    /// Override how long each word takes
    #[must_use]
    pub const fn with_word_duration(mut self, per_word: Duration) -> Self {
        self.per_word = per_word;
        self
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Console English Female", "en-IN"),
            VoiceInfo::new("Console Kannada", "kn-IN"),
        ]
    }

    async fn speak(
        &self,
        text: &str,
        voice: Option<&VoiceInfo>,
        language: Language,
    ) -> Result<()> {
        let words = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
        tracing::trace!(
            voice = voice.map_or("none", |v| v.name.as_str()),
            locale = language.locale(),
            words,
            "console speech"
        );
        tokio::time::sleep(self.per_word.saturating_mul(words)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_offer_without_capture_returns_line() {
        let recognizer = ConsoleRecognizer::new();
        assert!(!recognizer.is_listening());
        assert_eq!(recognizer.offer("hello".to_string()), Err("hello".to_string()));
    }

    #[tokio::test]
    async fn test_offer_completes_open_capture() {
        let recognizer = Arc::new(ConsoleRecognizer::new());
        let capture = tokio::spawn({
            let recognizer = Arc::clone(&recognizer);
            async move { recognizer.recognize(Language::English).await }
        });
        while !recognizer.is_listening() {
            tokio::task::yield_now().await;
        }

        recognizer.offer("hey sarah".to_string()).unwrap();
        let heard = capture.await.unwrap().unwrap();
        assert_eq!(heard.as_deref(), Some("hey sarah"));
        assert!(!recognizer.is_listening());
    }

    #[tokio::test]
    async fn test_aborted_capture_does_not_swallow_line() {
        let recognizer = Arc::new(ConsoleRecognizer::new());
        let capture = tokio::spawn({
            let recognizer = Arc::clone(&recognizer);
            async move { recognizer.recognize(Language::Kannada).await }
        });
        while !recognizer.is_listening() {
            tokio::task::yield_now().await;
        }
        capture.abort();
        let _ = capture.await;

        assert!(!recognizer.is_listening());
        assert!(recognizer.offer("typed".to_string()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthesizer_takes_time_per_word() {
        let synth = ConsoleSynthesizer::new().with_word_duration(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        synth.speak("one two three", None, Language::English).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
