//! Activity state of the interaction machine

use std::fmt;

/// Externally visible activity, derived from mode and phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityState {
    /// Voice mode off
    Idle,
    /// Voice mode on, waiting for a wake phrase
    AwaitingWakeWord,
    /// Conversation active
    Listening,
    /// Waiting on the reply service
    Processing,
    /// Playing an utterance
    Speaking,
}

impl ActivityState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingWakeWord => "awaiting_wake_word",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
        }
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How engaged the user is with voice mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Voice mode stopped
    Off,
    /// Voice mode started, wake phrase required
    Armed,
    /// Wake phrase heard; every utterance is conversation
    Active,
}

/// What the machine is doing right now; exactly one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Ready,
    Capturing { id: CaptureId, started: bool },
    Processing { request: RequestId },
    Speaking { id: UtteranceId, exit: bool },
}

/// Identifies one capture attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureId(pub u64);

/// Identifies one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

/// Identifies one reply request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
