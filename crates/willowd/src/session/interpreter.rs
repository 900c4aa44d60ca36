//! Local message interpretation.
//!
//! Runs before the tiered resolver on every turn: checking whether a message
//! is a Yes/No/Sometimes variant, a meta-question, or a fresh concern is far
//! cheaper than any resolver tier, and most questioning-stage turns end here.

use willow_common::{detect_categories, AnswerValue, ConcernCategory};

/// What a questioning-stage message turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalInterpretation {
    /// An answer to the current question
    Answer(AnswerValue),
    /// A question about the process rather than an answer
    MetaQuestion,
    /// A new concern raised mid-assessment
    NewConcern(Vec<ConcernCategory>),
    /// Nothing local matched; the resolver takes over
    Unrecognized,
}

const SOMETIMES_MARKERS: &[&str] = &[
    "sometimes",
    "occasionally",
    "now and then",
    "kind of",
    "sort of",
    "rarely",
    "once in a while",
    "it depends",
    "depends",
    "on and off",
];

const NO_MARKERS: &[&str] = &[
    "no",
    "nope",
    "nah",
    "never",
    "not really",
    "not yet",
    "doesn't",
    "does not",
    "can't",
    "cannot",
    "won't",
];

const YES_MARKERS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "sure",
    "definitely",
    "absolutely",
    "of course",
    "always",
    "he does",
    "she does",
    "they do",
    "he can",
    "she can",
];

/// Check whether a marker occurs in the message.
///
/// Multi-word markers match as substrings; single-word markers must match a
/// whole token so "no" does not fire inside "now" or "know".
fn marker_present(text: &str, tokens: &[&str], marker: &str) -> bool {
    if marker.contains(' ') {
        text.contains(marker)
    } else {
        tokens.contains(&marker)
    }
}

/// Parse an open-vocabulary Yes/No/Sometimes answer.
///
/// Qualified answers lean to Sometimes ("yes sometimes"); negation markers
/// beat affirmation markers so "nope not really" resolves to No.
pub fn parse_answer(message: &str) -> Option<AnswerValue> {
    let text = message.to_lowercase();
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|t| !t.is_empty())
        .collect();

    let sometimes = SOMETIMES_MARKERS
        .iter()
        .any(|m| marker_present(&text, &tokens, m));
    let no = NO_MARKERS.iter().any(|m| marker_present(&text, &tokens, m));
    let yes = YES_MARKERS.iter().any(|m| marker_present(&text, &tokens, m));

    if sometimes {
        return Some(AnswerValue::Sometimes);
    }
    if no {
        return Some(AnswerValue::No);
    }
    if yes {
        return Some(AnswerValue::Yes);
    }
    None
}

/// Does the message read as a question about the process?
pub fn is_meta_question(message: &str) -> bool {
    let text = message.trim().to_lowercase();
    if text.ends_with('?') {
        return true;
    }
    const QUESTION_OPENERS: &[&str] = &[
        "what ", "why ", "how ", "when ", "who ", "where ", "do i ", "should i ", "can i ",
        "is this", "are these", "does this",
    ];
    QUESTION_OPENERS.iter().any(|o| text.starts_with(o))
}

/// Interpret a questioning-stage message.
///
/// Order matters: the expected input type (an answer) is checked first, then
/// meta-questions, then new concerns. Only leftovers reach the resolver.
pub fn interpret_questioning(message: &str) -> LocalInterpretation {
    if let Some(answer) = parse_answer(message) {
        return LocalInterpretation::Answer(answer);
    }
    if is_meta_question(message) {
        return LocalInterpretation::MetaQuestion;
    }
    let categories = detect_categories(message);
    if !categories.is_empty() {
        return LocalInterpretation::NewConcern(categories);
    }
    LocalInterpretation::Unrecognized
}

/// Secondary intent classification for the recommending stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUpIntent {
    Exercises,
    ReflexInfo,
    Report,
    Callback,
    NewConcern(Vec<ConcernCategory>),
    Other,
}

/// Route a recommending-stage follow-up message
pub fn interpret_follow_up(message: &str) -> FollowUpIntent {
    let text = message.to_lowercase();

    if text.contains("call") || text.contains("phone") || text.contains("speak to") || text.contains("human") {
        return FollowUpIntent::Callback;
    }
    if text.contains("exercise") || text.contains("activities") || text.contains("practice") || text.contains("at home") {
        return FollowUpIntent::Exercises;
    }
    if text.contains("reflex")
        || text.contains("moro")
        || text.contains("atnr")
        || text.contains("stnr")
        || text.contains("galant")
        || text.contains("palmar")
        || text.contains("what does that mean")
    {
        return FollowUpIntent::ReflexInfo;
    }
    if text.contains("report") || text.contains("summary") || text.contains("results") {
        return FollowUpIntent::Report;
    }
    let categories = detect_categories(message);
    if !categories.is_empty() {
        return FollowUpIntent::NewConcern(categories);
    }
    FollowUpIntent::Other
}

/// Pull a plausible child age (years) out of free text
pub fn parse_age(message: &str) -> Option<u8> {
    let text = message.to_lowercase();
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        if let Ok(age) = token.parse::<u8>() {
            if !(1..=12).contains(&age) {
                continue;
            }
            // "she is 3", "3 years old", "age 3", or a bare number reply
            let prev = i.checked_sub(1).map(|j| tokens[j]);
            let next = tokens.get(i + 1).copied();
            if prev == Some("is") || prev == Some("age") || prev == Some("turned")
                || next == Some("years") || next == Some("year")
                || tokens.len() == 1
            {
                return Some(age);
            }
        }
    }
    None
}
