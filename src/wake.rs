//! Wake-phrase detection over recognized speech.
//!
//! Recognition output is lower-cased and searched for any configured
//! phrase as a plain substring. The default list carries the phonetic
//! variants the recognizer tends to produce for "Mizuna".

/// Wake phrases used when the config does not override them.
pub const DEFAULT_WAKE_PHRASES: &[&str] = &[
    "mizuna",
    "hey mizuna",
    "computer",
    "assistant",
    "meezuna",
    "mezuna",
    "mizuno",
    "mezuno",
    "meezuno",
    "robot",
];

/// Substring matcher for a fixed set of wake phrases.
#[derive(Debug, Clone)]
pub struct WakeDetector {
    phrases: Vec<String>,
}

impl WakeDetector {
    /// Build a detector from configured phrases.
    ///
    /// Phrases are trimmed and lower-cased; empty entries are dropped so a
    /// stray `""` in the config cannot match every utterance.
    pub fn new<S: AsRef<str>>(phrases: &[S]) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Return the first configured phrase contained in `text`, if any.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<&str> {
        let lower = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lower.contains(phrase.as_str()))
            .map(String::as_str)
    }

    /// Whether `text` contains any wake phrase.
    #[must_use]
    pub fn is_wake(&self, text: &str) -> bool {
        self.detect(text).is_some()
    }

    /// The normalized phrase list.
    #[must_use]
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }
}

impl Default for WakeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_PHRASES)
    }
}
