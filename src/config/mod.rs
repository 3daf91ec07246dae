//! Configuration management for the Sarah assistant
//!
//! Values come from the environment, then the optional TOML file, then
//! built-in defaults, in that order of precedence.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::lexicon::Lexicon;
use crate::{Error, Language, Result};

pub use file::ConfigFile;

/// Default reply service location
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Default reply service timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Reply service base URL
    pub service_url: String,

    /// Reply service request timeout
    pub request_timeout: Duration,

    /// Language at startup
    pub language: Language,

    /// Speech engine configuration
    pub voice: VoiceConfig,

    /// Wake and exit phrases, built-ins plus configured extras
    pub lexicon: Lexicon,
}

/// Speech engine configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// `OpenAI` key for the microphone and speaker engines
    pub openai_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,
}

impl Config {
    /// Load configuration from the environment and config file
    ///
    /// # Errors
    ///
    /// Returns error if the config file is unreadable or a value is invalid
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("SARAH_CONFIG").ok().map(PathBuf::from);
        let file = file::load_config_file(explicit.as_deref())?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Combine a config file with environment lookups
    ///
    /// Empty environment values count as unset.
    ///
    /// # Errors
    ///
    /// Returns error if a value is invalid
    pub fn resolve(file: ConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let service_url = env("SARAH_SERVICE_URL")
            .or(file.service.url)
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let timeout_secs = match env("SARAH_REQUEST_TIMEOUT") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("SARAH_REQUEST_TIMEOUT must be whole seconds, got {raw:?}"))
            })?,
            None => file.service.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::Config("request timeout must be positive".to_string()));
        }

        let language = env("SARAH_LANGUAGE")
            .or(file.language)
            .map(|raw| raw.parse::<Language>())
            .transpose()?
            .unwrap_or_default();

        let voice = VoiceConfig {
            openai_api_key: env("OPENAI_API_KEY").or(file.voice.openai_api_key),
            stt_model: env("SARAH_STT_MODEL")
                .or(file.voice.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            tts_model: env("SARAH_TTS_MODEL")
                .or(file.voice.tts_model)
                .unwrap_or_else(|| "tts-1".to_string()),
            tts_voice: env("SARAH_TTS_VOICE")
                .or(file.voice.tts_voice)
                .unwrap_or_else(|| "nova".to_string()),
        };

        let mut lexicon = Lexicon::builtin();
        let phrases = file.phrases;
        lexicon.extend(Language::English, phrases.english.wake, phrases.english.exit);
        lexicon.extend(Language::Kannada, phrases.kannada.wake, phrases.kannada.exit);

        tracing::debug!(service_url = %service_url, timeout_secs, language = %language, "configuration resolved");

        Ok(Self {
            service_url,
            request_timeout: Duration::from_secs(timeout_secs),
            language,
            voice,
            lexicon,
        })
    }
}
