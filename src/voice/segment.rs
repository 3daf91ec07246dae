//! Energy-based speech endpointing
//!
//! Splits a microphone stream into one spoken phrase: waits for speech,
//! accumulates it and closes the phrase after a run of silence. Gives up when
//! nobody speaks within the listening window.

/// Sample rate the segmenter's windows are expressed in (16kHz speech)
pub const SEGMENT_SAMPLE_RATE: u32 = 16_000;

/// Minimum RMS energy to count a chunk as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum phrase length (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Trailing silence that closes a phrase (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Silence before any speech after which the capture ends empty
const NO_SPEECH_SAMPLES: usize = SEGMENT_SAMPLE_RATE as usize * 8;

/// Longest phrase kept (in samples)
const MAX_PHRASE_SAMPLES: usize = SEGMENT_SAMPLE_RATE as usize * 30;

/// What the segmenter concluded after a chunk
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Keep feeding audio
    Pending,
    /// A phrase was captured
    Phrase(Vec<f32>),
    /// Nobody spoke within the listening window
    NoSpeech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Waiting,
    Speaking,
}

/// Endpoints one phrase in an audio stream
#[derive(Debug)]
pub struct Segmenter {
    state: State,
    phrase: Vec<f32>,
    silence: usize,
    waited: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Waiting,
            phrase: Vec::new(),
            silence: 0,
            waited: 0,
        }
    }

    /// Feed a chunk of mono samples
    pub fn process(&mut self, samples: &[f32]) -> Segment {
        let energy = rms_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            State::Waiting => {
                if is_speech {
                    tracing::trace!(energy, "speech detected");
                    self.state = State::Speaking;
                    self.phrase.extend_from_slice(samples);
                    self.silence = 0;
                } else {
                    self.waited += samples.len();
                    if self.waited > NO_SPEECH_SAMPLES {
                        tracing::trace!(waited = self.waited, "no speech in window");
                        self.reset();
                        return Segment::NoSpeech;
                    }
                }
            }
            State::Speaking => {
                self.phrase.extend_from_slice(samples);
                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                let closed = self.silence > SILENCE_SAMPLES;
                if (closed && self.phrase.len() > MIN_SPEECH_SAMPLES)
                    || self.phrase.len() >= MAX_PHRASE_SAMPLES
                {
                    tracing::debug!(samples = self.phrase.len(), "phrase complete");
                    let phrase = std::mem::take(&mut self.phrase);
                    self.reset();
                    return Segment::Phrase(phrase);
                }

                // A blip too short to be speech; keep waiting
                if closed {
                    tracing::trace!(samples = self.phrase.len(), "discarding short noise");
                    self.phrase.clear();
                    self.silence = 0;
                    self.state = State::Waiting;
                }
            }
        }

        Segment::Pending
    }

    /// Whether speech has been heard and the phrase is still open
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.state == State::Speaking
    }

    /// Forget everything heard so far
    pub fn reset(&mut self) {
        self.state = State::Waiting;
        self.phrase.clear();
        self.silence = 0;
        self.waited = 0;
    }
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
