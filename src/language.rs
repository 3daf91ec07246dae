//! Conversation language selection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Language the assistant listens and speaks in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Kannada,
}

impl Language {
    /// All supported languages, in toggle order
    pub const ALL: [Self; 2] = [Self::English, Self::Kannada];

    /// Wire name used by the reply service
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Kannada => "kannada",
        }
    }

    /// BCP-47 locale tag handed to the recognizer and synthesizer
    #[must_use]
    pub const fn locale(self) -> &'static str {
        match self {
            Self::English => "en-IN",
            Self::Kannada => "kn-IN",
        }
    }

    /// ISO-639-1 code, as speech APIs expect it
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Kannada => "kn",
        }
    }

    /// Unicode block of the language's native script, if it is not Latin
    #[must_use]
    pub const fn script_block(self) -> Option<(char, char)> {
        match self {
            Self::English => None,
            Self::Kannada => Some(('\u{0C80}', '\u{0CFF}')),
        }
    }

    /// The other language
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::English => Self::Kannada,
            Self::Kannada => Self::English,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" | "en-in" => Ok(Self::English),
            "kannada" | "kn" | "kn-in" => Ok(Self::Kannada),
            other => Err(Error::Config(format!("unsupported language: {other}"))),
        }
    }
}
