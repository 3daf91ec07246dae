use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sarah_assistant::controller::{Command as ControllerCommand, ControllerHandle, Ports, Settings};
use sarah_assistant::presenter::ConsolePresenter;
use sarah_assistant::service::{HttpReplyClient, ReplyService};
use sarah_assistant::session::SessionId;
use sarah_assistant::voice::{ConsoleRecognizer, ConsoleSynthesizer, Recognizer, Synthesizer};
use sarah_assistant::{Availability, Capabilities, Config, Controller, Language};

/// Sarah - voice-driven conversational assistant
#[derive(Parser)]
#[command(name = "sarah", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Language to start in ("english" or "kannada")
    #[arg(short, long)]
    language: Option<Language>,

    /// Reply service base URL
    #[arg(long)]
    service_url: Option<String>,

    /// Disable speech recognition (typed messages still work)
    #[arg(long)]
    no_voice_input: bool,

    /// Disable speech output (replies are only shown)
    #[arg(long)]
    no_voice_output: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive conversation (default)
    Run,
    /// Create a session and print its id
    NewSession,
    /// Print the stored history of a session
    History {
        /// Session id
        session: String,
    },
    /// Add a system prompt
    AddPrompt {
        /// Prompt text
        text: String,
    },
    /// List system prompts
    Prompts,
    /// Toggle a system prompt on or off
    TogglePrompt {
        /// Prompt id as listed by `prompts`
        id: i64,
    },
    /// List the voices of the speech synthesizer
    Voices,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; stdout belongs to the transcript
    let filter = match cli.verbose {
        0 => "warn,sarah_assistant=info",
        1 => "info,sarah_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = cli.service_url.clone() {
        config.service_url = url;
    }
    if let Some(language) = cli.language {
        config.language = language;
    }

    let service = HttpReplyClient::new(config.service_url.clone(), config.request_timeout)?;
    let flags = cli_flags(&cli);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => interactive(&flags, config, Arc::new(service)).await,
        Command::NewSession => {
            let id = service.new_session().await?;
            println!("{id}");
            Ok(())
        }
        Command::History { session } => {
            let items = service.history(&SessionId::new(session)).await?;
            if items.is_empty() {
                println!("(no stored history)");
            }
            for item in items {
                println!("{} [{}]", item.timestamp, item.language);
                println!("  You:   {}", item.user_input);
                println!("  Sarah: {}", item.assistant_response);
            }
            Ok(())
        }
        Command::AddPrompt { text } => {
            service.add_system_prompt(&text).await?;
            println!("System prompt added");
            Ok(())
        }
        Command::Prompts => {
            for prompt in service.system_prompts().await? {
                let marker = if prompt.active { "*" } else { " " };
                println!("{marker} {:>4}  {}", prompt.id, prompt.text);
            }
            Ok(())
        }
        Command::TogglePrompt { id } => {
            service.toggle_system_prompt(id).await?;
            println!("System prompt {id} toggled");
            Ok(())
        }
        Command::Voices => {
            let engines = Engines::resolve(&flags, &config);
            if let Availability::Unavailable(reason) = &engines.capabilities.output {
                println!("speech output unavailable: {reason}");
            }
            for voice in engines.synthesizer.voices() {
                println!("{:<32} {}", voice.name, voice.lang);
            }
            Ok(())
        }
    }
}

/// Voice switches from the command line
struct Flags {
    no_voice_input: bool,
    no_voice_output: bool,
}

const fn cli_flags(cli: &Cli) -> Flags {
    Flags {
        no_voice_input: cli.no_voice_input,
        no_voice_output: cli.no_voice_output,
    }
}

/// Speech engines chosen at startup
struct Engines {
    recognizer: Arc<dyn Recognizer>,
    synthesizer: Arc<dyn Synthesizer>,
    capabilities: Capabilities,
    /// Set when typed lines may stand in for speech
    console: Option<Arc<ConsoleRecognizer>>,
}

impl Engines {
    fn resolve(flags: &Flags, config: &Config) -> Self {
        let console = Arc::new(ConsoleRecognizer::new());

        let (recognizer, input, console) = if flags.no_voice_input {
            let disabled = Availability::Unavailable("disabled by --no-voice-input".to_string());
            (Arc::clone(&console) as Arc<dyn Recognizer>, disabled, None)
        } else {
            match audio::microphone(config) {
                Some(Ok(mic)) => (mic, Availability::Available, None),
                Some(Err(e)) => (
                    Arc::clone(&console) as Arc<dyn Recognizer>,
                    Availability::Unavailable(e.to_string()),
                    None,
                ),
                None => (
                    Arc::clone(&console) as Arc<dyn Recognizer>,
                    Availability::Available,
                    Some(console),
                ),
            }
        };

        let fallback: Arc<dyn Synthesizer> = Arc::new(ConsoleSynthesizer::new());
        let (synthesizer, output) = if flags.no_voice_output {
            let disabled = Availability::Unavailable("disabled by --no-voice-output".to_string());
            (fallback, disabled)
        } else {
            match audio::speaker(config) {
                Some(Ok(speaker)) => (speaker, Availability::Available),
                Some(Err(e)) => (fallback, Availability::Unavailable(e.to_string())),
                None => (fallback, Availability::Available),
            }
        };

        Self {
            recognizer,
            synthesizer,
            capabilities: Capabilities { input, output },
            console,
        }
    }
}

#[cfg(feature = "audio")]
mod audio {
    use std::sync::Arc;

    use sarah_assistant::voice::{
        MicrophoneRecognizer, Recognizer, SpeakerSynthesizer, SpeechToText, Synthesizer,
        TextToSpeech,
    };
    use sarah_assistant::{Config, Result};

    /// Microphone engine, if an `OpenAI` key is configured
    pub fn microphone(config: &Config) -> Option<Result<Arc<dyn Recognizer>>> {
        let key = config.voice.openai_api_key.clone()?;
        Some(
            SpeechToText::new(key, config.voice.stt_model.clone())
                .and_then(MicrophoneRecognizer::new)
                .map(|mic| Arc::new(mic) as Arc<dyn Recognizer>),
        )
    }

    /// Speaker engine, if an `OpenAI` key is configured
    pub fn speaker(config: &Config) -> Option<Result<Arc<dyn Synthesizer>>> {
        let key = config.voice.openai_api_key.clone()?;
        Some(
            TextToSpeech::new(key, config.voice.tts_model.clone())
                .and_then(|tts| SpeakerSynthesizer::new(tts, config.voice.tts_voice.clone()))
                .map(|speaker| Arc::new(speaker) as Arc<dyn Synthesizer>),
        )
    }
}

#[cfg(not(feature = "audio"))]
mod audio {
    use std::sync::Arc;

    use sarah_assistant::voice::{Recognizer, Synthesizer};
    use sarah_assistant::{Config, Result};

    #[allow(clippy::unnecessary_wraps)]
    pub const fn microphone(_config: &Config) -> Option<Result<Arc<dyn Recognizer>>> {
        None
    }

    #[allow(clippy::unnecessary_wraps)]
    pub const fn speaker(_config: &Config) -> Option<Result<Arc<dyn Synthesizer>>> {
        None
    }
}

async fn interactive(
    flags: &Flags,
    config: Config,
    service: Arc<dyn ReplyService>,
) -> anyhow::Result<()> {
    let engines = Engines::resolve(flags, &config);
    tracing::info!(
        service_url = %config.service_url,
        language = %config.language,
        input = engines.capabilities.input.is_available(),
        output = engines.capabilities.output.is_available(),
        "starting sarah"
    );

    let controller = Controller::new(
        Settings {
            lexicon: config.lexicon,
            capabilities: engines.capabilities,
            language: config.language,
        },
        Ports {
            recognizer: engines.recognizer,
            synthesizer: engines.synthesizer,
            service,
            presenter: Box::new(ConsolePresenter::new()),
        },
    );
    let handle = controller.handle();
    let running = tokio::spawn(controller.run());

    print_help();
    read_lines(&handle, engines.console.as_deref()).await?;

    running.await?;
    Ok(())
}

/// What a typed line asks for
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Command(ControllerCommand),
    Text(String),
    Help,
    Unknown(String),
    Empty,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return if line.is_empty() {
            Line::Empty
        } else {
            Line::Text(line.to_string())
        };
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, arg)| (name, arg.trim()));

    let command = match name {
        "start" => ControllerCommand::StartVoice,
        "stop" => ControllerCommand::StopVoice,
        "lang" | "language" => ControllerCommand::ToggleLanguage,
        "new" => ControllerCommand::NewSession,
        "clear" => ControllerCommand::ClearHistory,
        "prompt" => ControllerCommand::AddSystemPrompt(arg.to_string()),
        "history" => ControllerCommand::LoadHistory,
        "hide" => ControllerCommand::Hidden,
        "quit" | "exit" => ControllerCommand::Shutdown,
        "help" => return Line::Help,
        other => return Line::Unknown(other.to_string()),
    };
    Line::Command(command)
}

fn print_help() {
    println!("Commands: /start /stop /lang /new /clear /prompt <text> /history /hide /quit");
    println!("Anything else is sent as a message (or heard as speech while listening).");
}

async fn read_lines(
    handle: &ControllerHandle,
    console: Option<&ConsoleRecognizer>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            handle.send(ControllerCommand::Shutdown)?;
            return Ok(());
        };

        match parse_line(&line) {
            Line::Empty => {}
            Line::Help => print_help(),
            Line::Unknown(name) => println!("unknown command /{name} (try /help)"),
            Line::Command(command) => {
                let quit = command == ControllerCommand::Shutdown;
                handle.send(command)?;
                if quit {
                    return Ok(());
                }
            }
            Line::Text(text) => {
                let unheard = match console {
                    Some(console) => console.offer(text).err(),
                    None => Some(text),
                };
                if let Some(text) = unheard {
                    handle.send(ControllerCommand::SendText(text))?;
                }
            }
        }
    }
}
