//! Shared test utilities
//!
//! Scripted engines, an in-memory reply service and a recording presenter,
//! plus a harness that runs a controller over them.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sarah_assistant::machine::ActivityState;
use sarah_assistant::presenter::{Presenter, Speaker, TranscriptEntry};
use sarah_assistant::service::{ChatReply, HistoryItem, ReplyService, SystemPrompt};
use sarah_assistant::session::SessionId;
use sarah_assistant::voice::{Recognizer, Synthesizer, VoiceInfo};
use sarah_assistant::{
    Capabilities, Controller, ControllerHandle, Error, Language, Lexicon, Ports, Result, Settings,
};
use tokio::task::JoinHandle;

/// One scripted recognition outcome
#[derive(Debug, Clone)]
pub enum Heard {
    Text(String),
    Silence,
    Fail(String),
}

impl Heard {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Recognizer replaying a script; pends forever once the script runs out
#[derive(Default)]
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Heard>>,
    languages: Mutex<Vec<Language>>,
}

impl ScriptedRecognizer {
    pub fn new(script: impl IntoIterator<Item = Heard>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            languages: Mutex::new(Vec::new()),
        }
    }

    /// Queue more outcomes
    pub fn push(&self, heard: Heard) {
        self.script.lock().unwrap().push_back(heard);
    }

    /// Language of every capture started so far
    pub fn languages(&self) -> Vec<Language> {
        self.languages.lock().unwrap().clone()
    }

    pub fn captures(&self) -> usize {
        self.languages.lock().unwrap().len()
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, language: Language) -> Result<Option<String>> {
        self.languages.lock().unwrap().push(language);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Heard::Text(text)) => Ok(Some(text)),
            Some(Heard::Silence) => Ok(None),
            Some(Heard::Fail(code)) => Err(Error::Capture(code)),
            None => std::future::pending().await,
        }
    }
}

/// Synthesizer recording what it was asked to say
pub struct RecordingSynthesizer {
    delay: Duration,
    fail: bool,
    spoken: Mutex<Vec<(String, Option<String>)>>,
    finished: Mutex<usize>,
}

impl RecordingSynthesizer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            spoken: Mutex::new(Vec::new()),
            finished: Mutex::new(0),
        }
    }

    /// Every utterance fails after its delay
    pub fn failing(delay: Duration) -> Self {
        Self {
            fail: true,
            ..Self::new(delay)
        }
    }

    /// Texts handed to the engine, in order
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    /// Voice chosen for each utterance
    pub fn voices_used(&self) -> Vec<Option<String>> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|(_, voice)| voice.clone())
            .collect()
    }

    /// Utterances that played to the end
    pub fn finished(&self) -> usize {
        *self.finished.lock().unwrap()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Test English Female", "en-IN"),
            VoiceInfo::new("Test Kannada", "kn-IN"),
        ]
    }

    async fn speak(&self, text: &str, voice: Option<&VoiceInfo>, _language: Language) -> Result<()> {
        self.spoken
            .lock()
            .unwrap()
            .push((text.to_string(), voice.map(|v| v.name.clone())));
        tokio::time::sleep(self.delay).await;
        *self.finished.lock().unwrap() += 1;
        if self.fail {
            return Err(Error::Playback("device unplugged".to_string()));
        }
        Ok(())
    }
}

/// A chat call as the service saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCall {
    pub message: String,
    pub session: Option<String>,
    pub language: Language,
}

/// In-memory reply service
#[derive(Default)]
pub struct FakeService {
    sessions_created: Mutex<u32>,
    fail_sessions: Mutex<bool>,
    session_delay: Mutex<Duration>,
    panics: Mutex<u32>,
    replies: Mutex<VecDeque<std::result::Result<ChatReply, String>>>,
    chats: Mutex<Vec<ChatCall>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply; once the queue is empty every chat answers "Sure thing"
    pub fn reply(&self, text: &str, session: Option<&str>) {
        self.replies.lock().unwrap().push_back(Ok(ChatReply {
            session_id: session.map(SessionId::new),
            text: text.to_string(),
        }));
    }

    /// Queue a failing chat
    pub fn fail_next(&self, error: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
    }

    pub fn refuse_sessions(&self) {
        *self.fail_sessions.lock().unwrap() = true;
    }

    /// Every session request takes `delay` before answering
    pub fn slow_sessions(&self, delay: Duration) {
        *self.session_delay.lock().unwrap() = delay;
    }

    /// The next chat panics instead of answering
    pub fn panic_next(&self) {
        *self.panics.lock().unwrap() += 1;
    }

    pub fn sessions_created(&self) -> u32 {
        *self.sessions_created.lock().unwrap()
    }

    pub fn chats(&self) -> Vec<ChatCall> {
        self.chats.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyService for FakeService {
    async fn new_session(&self) -> Result<SessionId> {
        let delay = *self.session_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if *self.fail_sessions.lock().unwrap() {
            return Err(Error::Service("503 Service Unavailable: down".to_string()));
        }
        let mut created = self.sessions_created.lock().unwrap();
        *created += 1;
        Ok(SessionId::new(format!("session-{created}")))
    }

    async fn chat(
        &self,
        message: &str,
        session: Option<&SessionId>,
        language: Language,
    ) -> Result<ChatReply> {
        self.chats.lock().unwrap().push(ChatCall {
            message: message.to_string(),
            session: session.map(|s| s.as_str().to_string()),
            language,
        });
        let panicking = {
            let mut panics = self.panics.lock().unwrap();
            let panicking = *panics > 0;
            *panics = panics.saturating_sub(1);
            panicking
        };
        if panicking {
            panic!("reply backend crashed");
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(error)) => Err(Error::Service(error)),
            None => Ok(ChatReply {
                session_id: None,
                text: "Sure thing".to_string(),
            }),
        }
    }

    async fn add_system_prompt(&self, prompt: &str) -> Result<()> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(())
    }

    async fn system_prompts(&self) -> Result<Vec<SystemPrompt>> {
        Ok(Vec::new())
    }

    async fn toggle_system_prompt(&self, _id: i64) -> Result<()> {
        Ok(())
    }

    async fn history(&self, _session: &SessionId) -> Result<Vec<HistoryItem>> {
        let chats = self.chats.lock().unwrap();
        Ok(chats
            .iter()
            .map(|c| HistoryItem {
                user_input: c.message.clone(),
                assistant_response: "Sure thing".to_string(),
                timestamp: "2024-01-01 10:00:00".to_string(),
                language: c.language.as_str().to_string(),
            })
            .collect())
    }
}

/// Something the presenter was asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Append(Speaker, String),
    Reset(String),
    Thinking(bool),
    Listening(bool),
    Activity(ActivityState),
    Language(Language),
    Notice(String),
    History(usize),
}

/// Presenter keeping everything in a shared log
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    log: Arc<Mutex<Vec<Shown>>>,
}

impl RecordingPresenter {
    fn record(&self, shown: Shown) {
        self.log.lock().unwrap().push(shown);
    }
}

impl Presenter for RecordingPresenter {
    fn append(&mut self, entry: &TranscriptEntry) {
        self.record(Shown::Append(entry.speaker, entry.text.clone()));
    }

    fn reset(&mut self, entry: &TranscriptEntry) {
        self.record(Shown::Reset(entry.text.clone()));
    }

    fn thinking(&mut self, shown: bool, _language: Language) {
        self.record(Shown::Thinking(shown));
    }

    fn listening(&mut self, on: bool, _language: Language) {
        self.record(Shown::Listening(on));
    }

    fn activity(&mut self, state: ActivityState, _language: Language) {
        self.record(Shown::Activity(state));
    }

    fn language(&mut self, language: Language) {
        self.record(Shown::Language(language));
    }

    fn notice(&mut self, text: &str) {
        self.record(Shown::Notice(text.to_string()));
    }

    fn history(&mut self, items: &[HistoryItem]) {
        self.record(Shown::History(items.len()));
    }
}

/// How to set up a harness
pub struct Setup {
    pub script: Vec<Heard>,
    pub capabilities: Capabilities,
    pub language: Language,
    pub speech_delay: Duration,
    pub failing_speech: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            script: Vec::new(),
            capabilities: Capabilities::full(),
            language: Language::English,
            speech_delay: Duration::from_millis(200),
            failing_speech: false,
        }
    }
}

/// A running controller over fakes
pub struct Harness {
    pub handle: ControllerHandle,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub synthesizer: Arc<RecordingSynthesizer>,
    pub service: Arc<FakeService>,
    presenter: RecordingPresenter,
    task: JoinHandle<()>,
}

impl Harness {
    pub fn spawn(setup: Setup) -> Self {
        Self::spawn_with(setup, FakeService::new())
    }

    pub fn spawn_with(setup: Setup, service: FakeService) -> Self {
        let recognizer = Arc::new(ScriptedRecognizer::new(setup.script));
        let synthesizer = Arc::new(if setup.failing_speech {
            RecordingSynthesizer::failing(setup.speech_delay)
        } else {
            RecordingSynthesizer::new(setup.speech_delay)
        });
        let service = Arc::new(service);
        let presenter = RecordingPresenter::default();

        let controller = Controller::new(
            Settings {
                lexicon: Lexicon::builtin(),
                capabilities: setup.capabilities,
                language: setup.language,
            },
            Ports {
                recognizer: recognizer.clone(),
                synthesizer: synthesizer.clone(),
                service: service.clone(),
                presenter: Box::new(presenter.clone()),
            },
        );
        let handle = controller.handle();
        let task = tokio::spawn(controller.run());

        Self {
            handle,
            recognizer,
            synthesizer,
            service,
            presenter,
            task,
        }
    }

    pub fn shown(&self) -> Vec<Shown> {
        self.presenter.log.lock().unwrap().clone()
    }

    pub fn activities(&self) -> Vec<ActivityState> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Activity(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    pub fn activity(&self) -> Option<ActivityState> {
        self.activities().last().copied()
    }

    pub fn notices(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|s| match s {
                Shown::Notice(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Poll `check` on the paused clock until it holds
    pub async fn wait_until(&self, what: &str, check: impl Fn(&Self) -> bool) {
        for _ in 0..600 {
            if check(self) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("timed out waiting until {what}; shown: {:#?}", self.shown());
    }

    /// Let virtual time pass
    pub async fn idle(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Shut the controller down and wait for its loop to end
    pub async fn shutdown(self) -> ControllerHandle {
        self.handle
            .send(sarah_assistant::Command::Shutdown)
            .expect("controller still running");
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("controller did not stop")
            .expect("controller task panicked");
        self.handle
    }
}
