//! Microphone and speaker engines

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::playback::AudioPlayback;
use super::segment::{Segment, Segmenter};
use super::stt::SpeechToText;
use super::tts::TextToSpeech;
use super::{Recognizer, Synthesizer, VoiceInfo};
use crate::{Error, Language, Result};

/// How often the capture buffer is drained into the segmenter
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Sets a flag when the owning future is dropped, stopping blocking audio work
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Records one phrase from the microphone and transcribes it with Whisper
pub struct MicrophoneRecognizer {
    stt: SpeechToText,
}

impl MicrophoneRecognizer {
    /// Create the recognizer, checking that a microphone is present
    ///
    /// # Errors
    ///
    /// Returns error if no input device is usable
    pub fn new(stt: SpeechToText) -> Result<Self> {
        AudioCapture::open()?;
        Ok(Self { stt })
    }
}

#[async_trait]
impl Recognizer for MicrophoneRecognizer {
    async fn recognize(&self, language: Language) -> Result<Option<String>> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancelled));

        let phrase = tokio::task::spawn_blocking(move || listen_for_phrase(&cancelled))
            .await
            .map_err(|e| Error::Capture(e.to_string()))??;

        let Some(samples) = phrase else {
            return Ok(None);
        };

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let text = self.stt.transcribe(&wav, language).await?;
        Ok(Some(text).filter(|t| !t.trim().is_empty()))
    }
}

fn listen_for_phrase(cancelled: &AtomicBool) -> Result<Option<Vec<f32>>> {
    let mut capture = AudioCapture::open()?;
    capture.start()?;
    let mut segmenter = Segmenter::new();

    let outcome = loop {
        if cancelled.load(Ordering::Relaxed) {
            break None;
        }
        std::thread::sleep(POLL_INTERVAL);

        let chunk = capture.take_buffer();
        if chunk.is_empty() {
            continue;
        }
        match segmenter.process(&chunk) {
            Segment::Pending => {}
            Segment::Phrase(samples) => break Some(samples),
            Segment::NoSpeech => break None,
        }
    };

    capture.stop();
    Ok(outcome)
}

/// Speaks through `OpenAI` TTS and the default speaker
pub struct SpeakerSynthesizer {
    tts: TextToSpeech,
    voice: String,
}

impl SpeakerSynthesizer {
    /// Create the synthesizer, checking that a speaker is present
    ///
    /// # Errors
    ///
    /// Returns error if no output device is usable
    pub fn new(tts: TextToSpeech, voice: String) -> Result<Self> {
        AudioPlayback::open()?;
        Ok(Self {
            tts,
            voice,
        })
    }
}

#[async_trait]
impl Synthesizer for SpeakerSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        // OpenAI voices are multilingual; the configured one serves both languages
        vec![VoiceInfo::new(self.voice.clone(), "multilingual")]
    }

    async fn speak(
        &self,
        text: &str,
        voice: Option<&VoiceInfo>,
        language: Language,
    ) -> Result<()> {
        let voice = voice.map_or(self.voice.as_str(), |v| v.name.as_str());
        tracing::debug!(voice, language = %language, "synthesizing");
        let mp3 = self.tts.synthesize(text, voice).await?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(Arc::clone(&cancelled));
        tokio::task::spawn_blocking(move || AudioPlayback::open()?.play_mp3(&mp3, &cancelled))
            .await
            .map_err(|e| Error::Playback(e.to_string()))?
    }
}
