//! Text preparation and voice choice for speech output

use std::sync::LazyLock;

use regex::Regex;

use super::VoiceInfo;
use crate::Language;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*").expect("valid regex"));

static PICTOGRAPHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Emoji_Presentation}\p{Extended_Pictographic}\x{FE0F}\x{200D}]")
        .expect("valid regex")
});

static PERIODS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s*").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Anything but ASCII word characters, whitespace, the native scripts of the
/// supported languages and basic punctuation
static UNSPEAKABLE: LazyLock<Regex> = LazyLock::new(|| {
    let scripts: String = Language::ALL
        .into_iter()
        .filter_map(Language::script_block)
        .map(|(lo, hi)| format!(r"\x{{{:04X}}}-\x{{{:04X}}}", u32::from(lo), u32::from(hi)))
        .collect();
    Regex::new(&format!(r"[^A-Za-z0-9_\s{scripts}.,!?]")).expect("valid regex")
});

/// Strip what a synthesizer would read out literally or choke on
///
/// Markup asterisks and pictographs are dropped, periods become pauses
/// (`", "`), every other character outside ASCII word characters and the
/// supported native scripts becomes a space, and whitespace is collapsed.
/// The rules are the same whichever language is active, so Kannada text in
/// an English reply survives while accented Latin letters do not.
#[must_use]
pub fn sanitize_for_speech(text: &str) -> String {
    let text = MARKUP.replace_all(text, "");
    let text = PICTOGRAPHS.replace_all(&text, "");
    let text = PERIODS.replace_all(&text, ", ");
    let text = UNSPEAKABLE.replace_all(&text, " ");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// How well a voice fits a language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fit {
    Exact,
    Regional,
    None,
}

fn fit(voice: &VoiceInfo, language: Language) -> Fit {
    let lang = voice.lang.to_lowercase();
    let name = voice.name.to_lowercase();
    match language {
        Language::Kannada if lang.contains("kn") || name.contains("kannada") => Fit::Exact,
        Language::Kannada if lang.contains("hi") => Fit::Regional,
        Language::English
            if lang.contains("en") && (name.contains("female") || name.contains("woman")) =>
        {
            Fit::Exact
        }
        Language::English if lang.contains("en") => Fit::Regional,
        _ => Fit::None,
    }
}

/// Pick the voice to speak `language` with
///
/// Prefers an exact match for the language, then a regional relative, then
/// whatever voice comes first.
#[must_use]
pub fn select_voice(voices: &[VoiceInfo], language: Language) -> Option<&VoiceInfo> {
    let find = |wanted: Fit| voices.iter().find(|v| fit(v, language) == wanted);
    find(Fit::Exact)
        .or_else(|| find(Fit::Regional))
        .or_else(|| voices.first())
}
