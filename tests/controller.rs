//! Controller integration tests
//!
//! Drives a controller over scripted engines on a paused clock

use std::time::Duration;

use sarah_assistant::phrases::Phrase;
use sarah_assistant::{
    ActivityState, Availability, Capabilities, Command, Error, Language, Speaker,
};

mod common;
use common::{ChatCall, FakeService, Harness, Heard, Setup, Shown};

fn voice_script(lines: &[&str]) -> Setup {
    Setup {
        script: lines.iter().map(|l| Heard::text(l)).collect(),
        ..Setup::default()
    }
}

fn said(h: &Harness, speaker: Speaker, text: &str) -> bool {
    h.shown()
        .iter()
        .any(|s| matches!(s, Shown::Append(who, t) if *who == speaker && t == text))
}

#[tokio::test(start_paused = true)]
async fn test_startup_creates_session_and_welcomes() {
    let h = Harness::spawn(Setup::default());
    let welcome = Phrase::Welcome.text(Language::English).to_string();

    h.wait_until("welcome shown", |h| h.shown().contains(&Shown::Reset(welcome.clone())))
        .await;
    assert_eq!(h.activity(), Some(ActivityState::Idle));
    assert!(h.shown().contains(&Shown::Language(Language::English)));
    assert!(h.notices().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_session_service_does_not_delay_commands() {
    let service = FakeService::new();
    service.slow_sessions(Duration::from_secs(30));
    let h = Harness::spawn_with(Setup::default(), service);
    h.handle.send(Command::StartVoice).unwrap();

    h.idle(Duration::from_secs(1)).await;
    assert_eq!(h.recognizer.captures(), 1);
    assert_eq!(h.activity(), Some(ActivityState::AwaitingWakeWord));
    assert_eq!(h.service.sessions_created(), 0);

    let welcome = Phrase::Welcome.text(Language::English).to_string();
    h.wait_until("welcome shown", |h| h.shown().contains(&Shown::Reset(welcome.clone())))
        .await;
    assert_eq!(h.service.sessions_created(), 1);
    assert!(!h.notices().iter().any(|n| n == "new session created"));
}

#[tokio::test(start_paused = true)]
async fn test_wake_phrase_greets_and_keeps_listening() {
    let h = Harness::spawn(voice_script(&["Hey Sarah"]));
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("greeting spoken", |h| h.synthesizer.spoken().len() == 1)
        .await;
    assert!(h.synthesizer.spoken()[0].contains("Lucifer"));

    h.wait_until("capture resumed", |h| h.recognizer.captures() == 2)
        .await;
    assert_eq!(
        h.activities(),
        vec![
            ActivityState::Idle,
            ActivityState::AwaitingWakeWord,
            ActivityState::Speaking,
            ActivityState::Listening,
        ]
    );

    // The wake phrase is not a conversation turn
    assert!(!h.shown().iter().any(|s| matches!(s, Shown::Append(..))));
    assert!(h.service.chats().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_speech_without_wake_phrase_is_ignored() {
    let h = Harness::spawn(voice_script(&["what time is it"]));
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("capture re-armed", |h| h.recognizer.captures() == 2)
        .await;
    assert!(h.synthesizer.spoken().is_empty());
    assert!(h.service.chats().is_empty());
    assert_eq!(h.activity(), Some(ActivityState::AwaitingWakeWord));
}

#[tokio::test(start_paused = true)]
async fn test_conversation_turn_uses_session_and_speaks_reply() {
    let service = FakeService::new();
    service.reply("Sunny today", Some("session-9"));
    let h = Harness::spawn_with(
        voice_script(&["hey sarah", "what is the weather", "and tomorrow"]),
        service,
    );
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("first chat sent", |h| !h.service.chats().is_empty())
        .await;
    assert_eq!(
        h.service.chats()[0],
        ChatCall {
            message: "what is the weather".to_string(),
            session: Some("session-1".to_string()),
            language: Language::English,
        }
    );

    h.wait_until("reply spoken", |h| {
        h.synthesizer.spoken().iter().any(|t| t == "Sunny today")
    })
    .await;
    assert!(said(&h, Speaker::User, "what is the weather"));
    assert!(said(&h, Speaker::Assistant, "Sunny today"));
    assert!(h.shown().contains(&Shown::Thinking(true)));
    assert!(h.shown().contains(&Shown::Thinking(false)));

    // The id the service filed the reply under is used from now on
    h.wait_until("second chat sent", |h| h.service.chats().len() == 2)
        .await;
    assert_eq!(h.service.chats()[1].session.as_deref(), Some("session-9"));
}

#[tokio::test(start_paused = true)]
async fn test_reply_failure_apologizes_and_resumes() {
    let service = FakeService::new();
    service.fail_next("500 Internal Server Error: boom");
    let h = Harness::spawn_with(voice_script(&["hey sarah", "tell me a joke"]), service);
    h.handle.send(Command::StartVoice).unwrap();

    let apology = Phrase::Apology.text(Language::English);
    h.wait_until("apology shown", |h| said(h, Speaker::Assistant, apology))
        .await;
    h.wait_until("apology spoken", |h| h.synthesizer.spoken().len() == 2)
        .await;
    assert!(h.synthesizer.spoken()[1].starts_with("Sorry Lucifer"));

    h.wait_until("listening again", |h| h.recognizer.captures() == 3)
        .await;
    assert_eq!(h.activity(), Some(ActivityState::Listening));
}

#[tokio::test(start_paused = true)]
async fn test_goodbye_ends_voice_mode() {
    let h = Harness::spawn(voice_script(&["hey sarah", "okay bye"]));
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("goodbye spoken", |h| h.synthesizer.spoken().len() == 2)
        .await;
    assert!(h.synthesizer.spoken()[1].contains("Goodbye"));
    assert!(said(&h, Speaker::User, "okay bye"));
    assert!(h.service.chats().is_empty());

    h.wait_until("idle", |h| h.activity() == Some(ActivityState::Idle))
        .await;
    h.idle(Duration::from_secs(5)).await;
    assert_eq!(h.recognizer.captures(), 2);
    assert_eq!(h.activity(), Some(ActivityState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_speech_in_progress() {
    let h = Harness::spawn(Setup {
        speech_delay: Duration::from_secs(10),
        ..voice_script(&["hey sarah"])
    });
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("greeting started", |h| h.synthesizer.spoken().len() == 1)
        .await;
    h.handle.send(Command::StopVoice).unwrap();

    h.wait_until("idle", |h| h.activity() == Some(ActivityState::Idle))
        .await;
    h.idle(Duration::from_secs(15)).await;
    assert_eq!(h.synthesizer.finished(), 0);
    assert_eq!(h.recognizer.captures(), 1);
    assert_eq!(h.activity(), Some(ActivityState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_hidden_front_end_pauses_voice_mode() {
    let h = Harness::spawn(Setup::default());
    h.handle.send(Command::StartVoice).unwrap();
    h.wait_until("capturing", |h| h.recognizer.captures() == 1)
        .await;

    h.handle.send(Command::Hidden).unwrap();
    h.wait_until("idle", |h| h.activity() == Some(ActivityState::Idle))
        .await;
    h.idle(Duration::from_secs(5)).await;
    assert_eq!(h.recognizer.captures(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_kannada_conversation() {
    let h = Harness::spawn(voice_script(&["ಹೇ ಸಾರಾ"]));
    h.handle.send(Command::ToggleLanguage).unwrap();
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("greeting spoken", |h| h.synthesizer.spoken().len() == 1)
        .await;
    assert_eq!(h.recognizer.languages()[0], Language::Kannada);
    assert!(h.synthesizer.spoken()[0].contains("ಲೂಸಿಫರ್"));
    assert_eq!(
        h.synthesizer.voices_used()[0].as_deref(),
        Some("Test Kannada")
    );
    assert!(h.shown().contains(&Shown::Language(Language::Kannada)));
}

#[tokio::test(start_paused = true)]
async fn test_language_switch_restarts_open_capture() {
    let h = Harness::spawn(Setup::default());
    h.handle.send(Command::StartVoice).unwrap();
    h.wait_until("capturing", |h| h.recognizer.captures() == 1)
        .await;

    h.handle.send(Command::ToggleLanguage).unwrap();
    h.wait_until("capture restarted", |h| h.recognizer.captures() == 2)
        .await;
    assert_eq!(
        h.recognizer.languages(),
        vec![Language::English, Language::Kannada]
    );
    assert_eq!(h.activity(), Some(ActivityState::AwaitingWakeWord));
}

#[tokio::test(start_paused = true)]
async fn test_failed_speech_does_not_stall_conversation() {
    let h = Harness::spawn(Setup {
        failing_speech: true,
        ..voice_script(&["hey sarah", "hello"])
    });
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("chat sent", |h| h.service.chats().len() == 1)
        .await;
    assert_eq!(h.service.chats()[0].message, "hello");
}

#[tokio::test(start_paused = true)]
async fn test_recognition_errors_are_retried() {
    let h = Harness::spawn(Setup {
        script: vec![
            Heard::Fail("network".to_string()),
            Heard::Silence,
            Heard::text("hey sarah"),
        ],
        ..Setup::default()
    });
    h.handle.send(Command::StartVoice).unwrap();

    h.wait_until("greeting spoken", |h| h.synthesizer.spoken().len() == 1)
        .await;
    assert_eq!(h.recognizer.captures(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_missing_recognizer_is_reported() {
    let h = Harness::spawn(Setup {
        capabilities: Capabilities {
            input: Availability::Unavailable("no microphone".to_string()),
            output: Availability::Available,
        },
        ..Setup::default()
    });
    h.wait_until("startup notice", |h| h.notices().len() == 1)
        .await;
    assert_eq!(h.notices()[0], "speech recognition unavailable: no microphone");

    h.handle.send(Command::StartVoice).unwrap();
    h.wait_until("start refused", |h| h.notices().len() == 2)
        .await;
    assert_eq!(h.recognizer.captures(), 0);
    assert_eq!(h.activity(), Some(ActivityState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_typed_message_without_speech_output() {
    let h = Harness::spawn(Setup {
        capabilities: Capabilities {
            input: Availability::Available,
            output: Availability::Unavailable("no speaker".to_string()),
        },
        ..Setup::default()
    });
    h.handle
        .send(Command::SendText("  hello there ".to_string()))
        .unwrap();

    h.wait_until("reply shown", |h| said(h, Speaker::Assistant, "Sure thing"))
        .await;
    assert!(said(&h, Speaker::User, "hello there"));
    assert!(h.synthesizer.spoken().is_empty());

    h.idle(Duration::from_secs(2)).await;
    assert_eq!(h.activity(), Some(ActivityState::Idle));
    assert_eq!(h.recognizer.captures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_assigned_by_first_reply_when_creation_fails() {
    let service = FakeService::new();
    service.refuse_sessions();
    service.reply("first", Some("session-7"));
    let h = Harness::spawn_with(Setup::default(), service);

    h.wait_until("session notice", |h| {
        h.notices()
            .iter()
            .any(|n| n.starts_with("could not create a session"))
    })
    .await;

    h.handle.send(Command::SendText("one".to_string())).unwrap();
    h.wait_until("first reply done", |h| {
        said(h, Speaker::Assistant, "first") && h.activity() == Some(ActivityState::Idle)
    })
    .await;
    assert_eq!(h.service.chats()[0].session, None);

    h.handle.send(Command::SendText("two".to_string())).unwrap();
    h.wait_until("second chat sent", |h| h.service.chats().len() == 2)
        .await;
    assert_eq!(h.service.chats()[1].session.as_deref(), Some("session-7"));
}

#[tokio::test(start_paused = true)]
async fn test_new_session_switches_id() {
    let h = Harness::spawn(Setup::default());
    let welcome = Phrase::Welcome.text(Language::English).to_string();
    h.wait_until("startup session", |h| h.shown().contains(&Shown::Reset(welcome.clone())))
        .await;
    h.handle.send(Command::NewSession).unwrap();
    h.wait_until("session created", |h| {
        h.notices().iter().any(|n| n == "new session created")
    })
    .await;

    h.handle.send(Command::SendText("hi".to_string())).unwrap();
    h.wait_until("chat sent", |h| h.service.chats().len() == 1)
        .await;
    assert_eq!(h.service.chats()[0].session.as_deref(), Some("session-2"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_history_resets_transcript() {
    let h = Harness::spawn(Setup::default());
    h.handle.send(Command::ClearHistory).unwrap();

    let cleared = Phrase::HistoryCleared.text(Language::English).to_string();
    h.wait_until("transcript reset", |h| h.shown().contains(&Shown::Reset(cleared.clone())))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_system_prompts_are_forwarded() {
    let h = Harness::spawn(Setup::default());
    h.handle
        .send(Command::AddSystemPrompt("   ".to_string()))
        .unwrap();
    h.handle
        .send(Command::AddSystemPrompt(" Keep answers short ".to_string()))
        .unwrap();

    h.wait_until("prompt acknowledged", |h| {
        h.notices().iter().any(|n| n == "system prompt added")
    })
    .await;
    assert_eq!(h.service.prompts(), vec!["Keep answers short".to_string()]);
    assert!(h.notices().iter().any(|n| n == "a system prompt needs some text"));
}

#[tokio::test(start_paused = true)]
async fn test_load_history_shows_stored_exchanges() {
    let h = Harness::spawn(Setup::default());
    h.handle.send(Command::SendText("hi".to_string())).unwrap();
    h.wait_until("reply shown", |h| said(h, Speaker::Assistant, "Sure thing"))
        .await;

    h.handle.send(Command::LoadHistory).unwrap();
    h.wait_until("history shown", |h| h.shown().contains(&Shown::History(1)))
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_ends_loop() {
    let h = Harness::spawn(Setup::default());
    h.handle.send(Command::StartVoice).unwrap();
    h.wait_until("capturing", |h| h.recognizer.captures() == 1)
        .await;

    let handle = h.shutdown().await;
    assert!(matches!(
        handle.send(Command::StartVoice),
        Err(Error::Stopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_crashed_reply_call_apologizes_and_accepts_next_message() {
    let service = FakeService::new();
    service.panic_next();
    let h = Harness::spawn_with(Setup::default(), service);
    h.handle.send(Command::SendText("hello".to_string())).unwrap();

    let apology = Phrase::Apology.text(Language::English);
    h.wait_until("apology shown", |h| said(h, Speaker::Assistant, apology))
        .await;
    h.wait_until("thinking cleared", |h| h.shown().contains(&Shown::Thinking(false)))
        .await;
    h.wait_until("idle again", |h| h.activity() == Some(ActivityState::Idle))
        .await;

    h.handle.send(Command::SendText("again".to_string())).unwrap();
    h.wait_until("second reply shown", |h| said(h, Speaker::Assistant, "Sure thing"))
        .await;
    let messages: Vec<_> = h.service.chats().into_iter().map(|c| c.message).collect();
    assert_eq!(messages, vec!["hello".to_string(), "again".to_string()]);
}
