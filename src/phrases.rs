//! Canned assistant lines in each language

use crate::Language;

/// A fixed line the assistant says or shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// Spoken after the wake word
    Greeting,
    /// Spoken after an exit phrase
    Goodbye,
    /// Spoken when the reply service fails
    Apology,
    /// First transcript entry of a fresh session
    Welcome,
    /// Transcript entry after a local history reset
    HistoryCleared,
    /// Placeholder shown while a reply is pending
    Thinking,
}

impl Phrase {
    /// Text of this phrase in `language`
    #[must_use]
    pub const fn text(self, language: Language) -> &'static str {
        match (self, language) {
            (Self::Greeting, Language::English) => "Hey Lucifer! I'm here. What's up?",
            (Self::Greeting, Language::Kannada) => "ಹೇ ಲೂಸಿಫರ್! ನಾನು ಇಲ್ಲಿದ್ದೇನೆ. ಏನು ಆಗಿದೆ?",
            (Self::Goodbye, Language::English) => "Goodbye Lucifer! Talk to you later!",
            (Self::Goodbye, Language::Kannada) => "ಬೈ ಲೂಸಿಫರ್! ನಂತರ ಮಾತನಾಡೋಣ!",
            (Self::Apology, Language::English) => {
                "Sorry Lucifer, I'm having some trouble right now. Can you try again?"
            }
            (Self::Apology, Language::Kannada) => {
                "ಕ್ಷಮಿಸಿ ಲೂಸಿಫರ್, ನನಗೆ ಸ್ವಲ್ಪ ತೊಂದರೆ ಆಗುತ್ತಿದೆ. ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ?"
            }
            (Self::Welcome, Language::English) => {
                "Hey Lucifer! 👋 I'm Sarah, your personal assistant. Say \"Hey Sarah\" to start talking with me!"
            }
            (Self::Welcome, Language::Kannada) => {
                "ಹೇ ಲೂಸಿಫರ್! 👋 ನಾನು ಸಾರಾ, ನಿಮ್ಮ ವೈಯಕ್ತಿಕ ಸಹಾಯಕ. \"ಹೇ ಸಾರಾ\" ಎಂದು ಹೇಳಿ!"
            }
            (Self::HistoryCleared, Language::English) => {
                "History cleared! Ready to start fresh, Lucifer!"
            }
            (Self::HistoryCleared, Language::Kannada) => {
                "ಇತಿಹಾಸ ತೆರವುಗೊಳಿಸಲಾಗಿದೆ! ಹೊಸದಾಗಿ ಪ್ರಾರಂಭಿಸಲು ಸಿದ್ಧ, ಲೂಸಿಫರ್!"
            }
            (Self::Thinking, Language::English) => "🤔 Thinking...",
            (Self::Thinking, Language::Kannada) => "🤔 ಯೋಚಿಸುತ್ತಿದ್ದೇನೆ...",
        }
    }
}
