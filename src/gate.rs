//! Context gate: decides whether an utterance warrants loading conversation
//! memory before the language model is queried.
//!
//! The gate is a flat OR over keyword category tables plus two structural
//! heuristics. Matching is plain substring search on the lower-cased
//! utterance, so it errs towards recall: a false positive costs one extra
//! memory fetch, a false negative loses context the user expected.

/// A named keyword table.
#[derive(Debug, Clone, Copy)]
pub struct KeywordCategory {
    /// Category name, used in debug logs.
    pub name: &'static str,
    /// Literal substrings; any hit matches the category.
    pub keywords: &'static [&'static str],
    /// The utterance must have strictly more words than this.
    pub min_words: usize,
}

impl KeywordCategory {
    fn matches(&self, lower: &str, word_count: usize) -> bool {
        word_count > self.min_words && self.keywords.iter().any(|k| lower.contains(k))
    }
}

/// Keyword categories, evaluated in order; order does not affect the result.
pub const CATEGORIES: &[KeywordCategory] = &[
    KeywordCategory {
        name: "memory",
        keywords: &[
            "remember", "previous", "before", "earlier", "past", "recall", "discussed",
            "talked about", "mentioned", "conversation", "history", "last time", "you said",
            "we talked", "you told me", "back then", "when we", "our chat", "our discussion",
            "what was", "what did",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "personalized",
        keywords: &[
            "my", "i am", "i'm", "about me", "tell me about myself", "what do you know about",
            "who am i", "my project", "my work", "my idea", "my plan", "my goal", "my robot",
            "my device", "i mentioned", "i told you", "i said", "i was working", "remind me",
            "help me with", "continue with", "follow up",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "knowledge_seeking",
        keywords: &[
            "what is", "who is", "explain", "define", "how does", "why does", "tell me about",
            "what are", "how to", "what's the difference", "help me understand",
            "can you explain", "what was that about", "details about", "more information",
            "elaborate on", "describe",
        ],
        min_words: 2,
    },
    KeywordCategory {
        name: "project",
        keywords: &[
            "project", "build", "building", "robot", "device", "machine", "electronic",
            "funding", "development", "prototype", "design", "technology", "engineering",
            "code", "programming", "software", "hardware", "circuit", "component", "sensor",
            "motor", "battery",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "task_continuation",
        keywords: &[
            "continue", "next step", "what's next", "proceed", "move forward", "keep going",
            "carry on", "follow through", "complete", "finish", "resume", "pick up where",
            "go back to", "return to", "status",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "advice_seeking",
        keywords: &[
            "should i", "what would you", "recommend", "suggest", "advice", "opinion",
            "think about", "feedback", "guidance", "help me decide", "best approach",
            "how would you", "what's your take", "thoughts on",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "problem_report",
        keywords: &[
            "problem", "issue", "error", "trouble", "stuck", "difficult", "challenge",
            "obstacle", "bug", "fix", "solve", "troubleshoot", "not working", "failed",
            "broken", "wrong", "help",
        ],
        min_words: 0,
    },
    KeywordCategory {
        name: "comparison",
        keywords: &[
            "better", "worse", "compare", "comparison", "versus", "vs", "difference between",
            "similar to", "like", "unlike", "instead", "alternative", "option", "choice",
            "prefer", "recommend",
        ],
        min_words: 0,
    },
];

/// Topic markers for the "asking about something" heuristic.
const TOPIC_MARKERS: &[&str] = &["about", "regarding"];
/// Word count the topic heuristic must exceed.
const TOPIC_MIN_WORDS: usize = 3;

/// Pronouns that signal a follow-up to something said earlier.
const FOLLOW_UP_PRONOUNS: &[&str] = &["this", "that", "it", "they", "them"];
/// Longest utterance still treated as a short follow-up.
const FOLLOW_UP_MAX_WORDS: usize = 5;

/// Names of every rule (category or heuristic) that matches `utterance`.
#[must_use]
pub fn matched_rules(utterance: &str) -> Vec<&'static str> {
    let lower = utterance.to_lowercase();
    let word_count = utterance.split_whitespace().count();

    let mut rules: Vec<&'static str> = CATEGORIES
        .iter()
        .filter(|c| c.matches(&lower, word_count))
        .map(|c| c.name)
        .collect();

    if word_count > TOPIC_MIN_WORDS && TOPIC_MARKERS.iter().any(|m| lower.contains(m)) {
        rules.push("topic_reference");
    }
    if word_count <= FOLLOW_UP_MAX_WORDS && FOLLOW_UP_PRONOUNS.iter().any(|p| lower.contains(p)) {
        rules.push("short_follow_up");
    }

    rules
}

/// Whether memory should be loaded before answering `utterance`.
#[must_use]
pub fn should_load_context(utterance: &str) -> bool {
    !matched_rules(utterance).is_empty()
}
