//! Controller: the thin driver around the interaction machine
//!
//! One task owns the [`Machine`] and drains two unbounded channels: machine
//! events (port progress, timers) and controller inputs (user commands and
//! finished service calls). Every effect the machine returns is executed here;
//! long-running work is spawned and reports back through the channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::lexicon::Lexicon;
use crate::machine::{Effect, Event, Machine, RequestId};
use crate::phrases::Phrase;
use crate::presenter::{Presenter, Speaker, TranscriptEntry};
use crate::service::{ChatReply, HistoryItem, ReplyService};
use crate::session::{SessionId, SessionManager};
use crate::voice::{AudioFloor, Recognizer, Synthesizer, VoiceInput, VoiceOutput};
use crate::{Capabilities, Error, Language, Result};

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StartVoice,
    StopVoice,
    SendText(String),
    ToggleLanguage,
    NewSession,
    ClearHistory,
    AddSystemPrompt(String),
    LoadHistory,
    /// The front-end went out of view
    Hidden,
    /// Stop everything and end the controller loop
    Shutdown,
}

/// Controller inputs other than machine events
enum Input {
    Command(Command),
    ReplyDone {
        request: RequestId,
        result: Result<ChatReply>,
    },
    SessionCreated {
        result: Result<SessionId>,
        /// Requested by the controller itself when it started
        startup: bool,
    },
    PromptAdded(Result<()>),
    HistoryLoaded(Result<Vec<HistoryItem>>),
}

/// Cloneable handle for sending commands to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Input>,
}

impl ControllerHandle {
    /// Queue a command
    ///
    /// # Errors
    ///
    /// Returns error if the controller loop has ended
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Input::Command(command))
            .map_err(|_| Error::Stopped)
    }
}

/// Startup settings of the controller
#[derive(Debug, Clone)]
pub struct Settings {
    pub lexicon: Lexicon,
    pub capabilities: Capabilities,
    pub language: Language,
}

/// Engines and adapters the controller drives
pub struct Ports {
    pub recognizer: Arc<dyn Recognizer>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub service: Arc<dyn ReplyService>,
    pub presenter: Box<dyn Presenter>,
}

/// Owns the machine and executes its effects
pub struct Controller {
    machine: Machine,
    input: VoiceInput,
    output: VoiceOutput,
    service: Arc<dyn ReplyService>,
    sessions: SessionManager,
    presenter: Box<dyn Presenter>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    inputs_tx: mpsc::UnboundedSender<Input>,
    inputs_rx: mpsc::UnboundedReceiver<Input>,
}

impl Controller {
    /// Wire a controller from its ports
    #[must_use]
    pub fn new(settings: Settings, ports: Ports) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let floor = Arc::new(AudioFloor::new());

        Self {
            machine: Machine::new(settings.lexicon, settings.capabilities, settings.language),
            input: VoiceInput::new(ports.recognizer, Arc::clone(&floor), events_tx.clone()),
            output: VoiceOutput::new(ports.synthesizer, floor, events_tx.clone()),
            sessions: SessionManager::new(Arc::clone(&ports.service)),
            service: ports.service,
            presenter: ports.presenter,
            events_tx,
            events_rx,
            inputs_tx,
            inputs_rx,
        }
    }

    /// Handle for sending commands to this controller
    #[must_use]
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            tx: self.inputs_tx.clone(),
        }
    }

    /// Run until [`Command::Shutdown`]
    ///
    /// The first session is requested in the background; commands are handled
    /// meanwhile. Creation problems are surfaced as notices; a conversation
    /// can still start and the service may assign an id with its first reply.
    pub async fn run(mut self) {
        let language = self.machine.language();
        for notice in self.machine.capabilities().notices() {
            tracing::warn!(notice = %notice, "capability degraded");
            self.presenter.notice(&notice);
        }
        self.presenter.language(language);
        self.presenter.activity(self.machine.activity(), language);
        self.create_session(true);

        tracing::info!(language = %language, "controller running");
        loop {
            tokio::select! {
                Some(event) = self.events_rx.recv() => self.dispatch(event),
                Some(input) = self.inputs_rx.recv() => {
                    if matches!(input, Input::Command(Command::Shutdown)) {
                        tracing::info!("shutdown requested");
                        self.dispatch(Event::Stop);
                        break;
                    }
                    self.on_input(input);
                }
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        tracing::trace!(?event, "event");
        for effect in self.machine.handle(event) {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        let language = self.machine.language();
        match effect {
            Effect::StartCapture { id, language } => self.input.start(id, language),
            Effect::StopCapture => self.input.stop(),
            Effect::Speak(utterance) => self.output.speak(utterance),
            Effect::CancelSpeech => self.output.cancel(),
            Effect::RequestReply { id, text, language } => self.request_reply(id, text, language),
            Effect::Schedule { timer, delay } => self.schedule(Event::Timer(timer), delay),
            Effect::Transcript { speaker, text } => {
                self.presenter.append(&TranscriptEntry::now(speaker, text));
            }
            Effect::Thinking(shown) => self.presenter.thinking(shown, language),
            Effect::CaptureIndicator(on) => self.presenter.listening(on, language),
            Effect::Activity(state) => self.presenter.activity(state, language),
            Effect::LanguageChanged(language) => self.presenter.language(language),
            Effect::Notice(text) => self.presenter.notice(&text),
        }
    }

    fn on_input(&mut self, input: Input) {
        match input {
            Input::Command(command) => self.on_command(command),
            Input::ReplyDone { request, result } => {
                let outcome = match result {
                    Ok(reply) => {
                        if let Some(id) = reply.session_id {
                            self.sessions.adopt(id);
                        }
                        Ok(reply.text)
                    }
                    Err(e) => Err(e.to_string()),
                };
                self.dispatch(Event::Reply { request, outcome });
            }
            Input::SessionCreated {
                result: Ok(id),
                startup,
            } => {
                self.sessions.adopt(id);
                self.show_welcome();
                if !startup {
                    self.presenter.notice("new session created");
                }
            }
            Input::SessionCreated { result: Err(e), .. } => {
                tracing::warn!(error = %e, "could not create session");
                self.presenter
                    .notice(&format!("could not create a session: {e}"));
            }
            Input::PromptAdded(Ok(())) => self.presenter.notice("system prompt added"),
            Input::PromptAdded(Err(e)) => {
                self.presenter
                    .notice(&format!("could not add system prompt: {e}"));
            }
            Input::HistoryLoaded(Ok(items)) => self.presenter.history(&items),
            Input::HistoryLoaded(Err(e)) => {
                self.presenter.notice(&format!("could not load history: {e}"));
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        tracing::debug!(?command, "command");
        match command {
            Command::StartVoice => self.dispatch(Event::Start),
            Command::StopVoice => self.dispatch(Event::Stop),
            Command::SendText(text) => self.dispatch(Event::TypedMessage(text)),
            Command::ToggleLanguage => self.dispatch(Event::ToggleLanguage),
            Command::Hidden => self.dispatch(Event::Hidden),
            Command::ClearHistory => {
                tracing::info!("transcript cleared");
                let text = Phrase::HistoryCleared.text(self.machine.language());
                self.presenter
                    .reset(&TranscriptEntry::now(Speaker::Assistant, text));
            }
            Command::NewSession => self.create_session(false),
            Command::AddSystemPrompt(prompt) => {
                let prompt = prompt.trim().to_string();
                if prompt.is_empty() {
                    self.presenter.notice("a system prompt needs some text");
                    return;
                }
                let service = Arc::clone(&self.service);
                self.spawn_call(
                    async move { Input::PromptAdded(service.add_system_prompt(&prompt).await) },
                    |e| Input::PromptAdded(Err(e)),
                );
            }
            Command::LoadHistory => {
                let Some(session) = self.sessions.current().cloned() else {
                    self.presenter.notice("no session yet");
                    return;
                };
                let service = Arc::clone(&self.service);
                self.spawn_call(
                    async move { Input::HistoryLoaded(service.history(&session).await) },
                    |e| Input::HistoryLoaded(Err(e)),
                );
            }
            Command::Shutdown => self.dispatch(Event::Stop),
        }
    }

    fn request_reply(&self, request: RequestId, text: String, language: Language) {
        let service = Arc::clone(&self.service);
        let session = self.sessions.current().cloned();
        tracing::debug!(request = %request, session_id = ?session.as_ref().map(SessionId::as_str), "requesting reply");
        self.spawn_call(
            async move {
                let result = service.chat(&text, session.as_ref(), language).await;
                Input::ReplyDone { request, result }
            },
            move |e| Input::ReplyDone {
                request,
                result: Err(e),
            },
        );
    }

    fn create_session(&self, startup: bool) {
        let service = Arc::clone(&self.service);
        self.spawn_call(
            async move {
                Input::SessionCreated {
                    result: service.new_session().await,
                    startup,
                }
            },
            move |e| Input::SessionCreated {
                result: Err(e),
                startup,
            },
        );
    }

    /// Run a service call in its own task and feed its outcome back
    ///
    /// A call that panics still completes: `failed` turns the join error into
    /// the input the loop is waiting for.
    fn spawn_call<F, E>(&self, call: F, failed: E)
    where
        F: std::future::Future<Output = Input> + Send + 'static,
        E: FnOnce(Error) -> Input + Send + 'static,
    {
        let tx = self.inputs_tx.clone();
        let task = tokio::spawn(call);
        tokio::spawn(async move {
            let input = match task.await {
                Ok(input) => input,
                Err(e) => {
                    tracing::error!(error = %e, "service call task failed");
                    failed(Error::Task(e.to_string()))
                }
            };
            // The loop may have shut down meanwhile
            let _ = tx.send(input);
        });
    }

    fn schedule(&self, event: Event, delay: Duration) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        });
    }

    fn show_welcome(&mut self) {
        let text = Phrase::Welcome.text(self.machine.language());
        self.presenter
            .reset(&TranscriptEntry::now(Speaker::Assistant, text));
    }
}
