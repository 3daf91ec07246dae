//! Speech capability availability, resolved once at startup

/// Whether an engine can be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Not usable; the reason is shown to the user once
    Unavailable(String),
}

impl Availability {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Availability of both speech directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Speech-to-text
    pub input: Availability,
    /// Text-to-speech
    pub output: Availability,
}

impl Capabilities {
    /// Both directions usable
    #[must_use]
    pub const fn full() -> Self {
        Self {
            input: Availability::Available,
            output: Availability::Available,
        }
    }

    /// Degradation notices to surface at startup, one per missing capability
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        let mut notices = Vec::new();
        if let Availability::Unavailable(reason) = &self.input {
            notices.push(format!("speech recognition unavailable: {reason}"));
        }
        if let Availability::Unavailable(reason) = &self.output {
            notices.push(format!("speech synthesis unavailable: {reason}"));
        }
        notices
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}
