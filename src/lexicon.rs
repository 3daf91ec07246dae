//! Wake and exit phrase lexicon
//!
//! Per-language trigger phrases. Matching is case-insensitive substring
//! containment against the normalized transcript, and the exit set is always
//! consulted before the wake set.

use std::collections::HashMap;

use crate::Language;

/// How a recognized transcript should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Ends the conversation
    Exit,
    /// Opens a conversation
    Wake,
    /// Neither; conversational content (or noise while awaiting a wake word)
    Content,
}

/// Trigger phrases for one language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseSet {
    wake: Vec<String>,
    exit: Vec<String>,
}

impl PhraseSet {
    /// Build a phrase set, normalizing every phrase
    #[must_use]
    pub fn new<W, E>(wake: W, exit: E) -> Self
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(wake, exit);
        set
    }

    /// Add more phrases; blanks and duplicates are skipped
    pub fn extend<W, E>(&mut self, wake: W, exit: E)
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        push_normalized(&mut self.wake, wake);
        push_normalized(&mut self.exit, exit);
    }

    /// Wake phrases, normalized
    #[must_use]
    pub fn wake(&self) -> &[String] {
        &self.wake
    }

    /// Exit phrases, normalized
    #[must_use]
    pub fn exit(&self) -> &[String] {
        &self.exit
    }
}

fn push_normalized<I>(target: &mut Vec<String>, phrases: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for phrase in phrases {
        let phrase = normalize(phrase.as_ref());
        if !phrase.is_empty() && !target.contains(&phrase) {
            target.push(phrase);
        }
    }
}

/// Lowercase and trim a transcript or phrase
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Wake/exit phrases for every supported language
#[derive(Debug, Clone)]
pub struct Lexicon {
    sets: HashMap<Language, PhraseSet>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    /// The stock phrase lists
    #[must_use]
    pub fn builtin() -> Self {
        let mut sets = HashMap::new();
        sets.insert(
            Language::English,
            PhraseSet::new(
                [
                    "sarah",
                    "hey sarah",
                    "hello sarah",
                    "hi sarah",
                    "hello sara",
                    "sara",
                    "hi sara",
                    "hey sara",
                ],
                ["bye", "goodbye", "bye bye", "see you later"],
            ),
        );
        sets.insert(
            Language::Kannada,
            PhraseSet::new(
                [
                    "ಸಾರಾ",
                    "ಹೇ ಸಾರಾ",
                    "ಹಲೋ ಸಾರಾ",
                    "sarah",
                    "sara",
                    "ಸರ",
                    "ಹಾಯ್ ಸರ",
                ],
                ["ಬೈ", "ಟಾಟಾ", "ಗುಡ್ ಬೈ", "bye", "tata"],
            ),
        );
        Self { sets }
    }

    /// Add extra phrases for a language
    pub fn extend<W, E>(&mut self, language: Language, wake: W, exit: E)
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        self.sets.entry(language).or_default().extend(wake, exit);
    }

    /// Phrases for a language
    #[must_use]
    pub fn phrases(&self, language: Language) -> Option<&PhraseSet> {
        self.sets.get(&language)
    }

    /// Whether the transcript contains an exit phrase of `language`
    #[must_use]
    pub fn is_exit(&self, language: Language, transcript: &str) -> bool {
        self.find(language, transcript, PhraseSet::exit).is_some()
    }

    /// Whether the transcript contains a wake phrase of `language`
    #[must_use]
    pub fn is_wake(&self, language: Language, transcript: &str) -> bool {
        self.find(language, transcript, PhraseSet::wake).is_some()
    }

    /// Classify a transcript: exit first, then wake, else content
    #[must_use]
    pub fn classify(&self, language: Language, transcript: &str) -> Verdict {
        if let Some(phrase) = self.find(language, transcript, PhraseSet::exit) {
            tracing::debug!(%language, phrase, "exit phrase matched");
            Verdict::Exit
        } else if let Some(phrase) = self.find(language, transcript, PhraseSet::wake) {
            tracing::debug!(%language, phrase, "wake phrase matched");
            Verdict::Wake
        } else {
            Verdict::Content
        }
    }

    fn find<'a>(
        &'a self,
        language: Language,
        transcript: &str,
        pick: fn(&PhraseSet) -> &[String],
    ) -> Option<&'a str> {
        let normalized = normalize(transcript);
        self.sets
            .get(&language)
            .map(pick)
            .unwrap_or_default()
            .iter()
            .find(|phrase| normalized.contains(phrase.as_str()))
            .map(String::as_str)
    }
}
