//! Sarah - voice-driven conversational assistant front-end
//!
//! This library provides the core of the Sarah assistant:
//! - The voice interaction state machine (wake word, conversation, exit)
//! - Voice input/output ports over pluggable speech engines
//! - Session tracking and the remote reply service client
//! - A console presentation adapter
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Front-ends                         │
//! │        Console  │  Microphone  │  Speaker            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ commands / port events
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Controller                          │
//! │   Machine (pure)  │  Voice ports  │  Sessions        │
//! └────────────────────┬────────────────────────────────┘
//!                      │ HTTP/JSON
//! ┌────────────────────▼────────────────────────────────┐
//! │              Reply service                           │
//! │   /chat  │  /new_session  │  /add_system_prompt      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod language;
pub mod lexicon;
pub mod machine;
pub mod phrases;
pub mod presenter;
pub mod service;
pub mod session;
pub mod voice;

pub use capability::{Availability, Capabilities};
pub use config::Config;
pub use controller::{Command, Controller, ControllerHandle, Ports, Settings};
pub use error::{Error, Result};
pub use language::Language;
pub use lexicon::{Lexicon, Verdict};
pub use machine::{ActivityState, Machine};
pub use presenter::{ConsolePresenter, Presenter, Speaker, TranscriptEntry};
pub use service::{HttpReplyClient, ReplyService};
pub use session::{SessionId, SessionManager};
