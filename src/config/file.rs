//! TOML configuration file loading
//!
//! Supports `~/.config/sarah/config.toml` (or the file named by
//! `SARAH_CONFIG`) as a persistent config source. All fields are optional;
//! the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Initial language ("english" or "kannada")
    pub language: Option<String>,

    /// Reply service connection
    #[serde(default)]
    pub service: ServiceFileConfig,

    /// Speech engines
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Extra trigger phrases
    #[serde(default)]
    pub phrases: PhrasesFileConfig,
}

/// Reply service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServiceFileConfig {
    /// Base URL (e.g. "http://localhost:5000")
    pub url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Speech engine configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    pub openai_api_key: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "nova")
    pub tts_voice: Option<String>,
}

/// Extra wake and exit phrases per language
#[derive(Debug, Default, Deserialize)]
pub struct PhrasesFileConfig {
    #[serde(default)]
    pub english: PhraseFileConfig,

    #[serde(default)]
    pub kannada: PhraseFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct PhraseFileConfig {
    #[serde(default)]
    pub wake: Vec<String>,

    #[serde(default)]
    pub exit: Vec<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed or has wrongly typed fields
pub fn parse(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the config file
///
/// An explicitly named file must exist; the default file is optional.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(ConfigFile::default()),
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;
    let config = parse(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the default config file path: `~/.config/sarah/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("sarah").join("config.toml"))
}
