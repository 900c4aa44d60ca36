//! Static keyword rules (resolver tier 4).
//!
//! Ordered rule table evaluated only after the cached and persisted tiers
//! miss. First rule with any substring match wins at fixed confidence.
//! Specific rules come before generic ones.

/// One keyword rule: any listed keyword matching as a substring fires the rule
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    pub keywords: &'static [&'static str],
    pub intent: &'static str,
    pub response_type: &'static str,
}

/// Ordered rule table. Order matters: callback before service questions
/// ("can someone call me about pricing" is a callback), concern reports last
/// so the specific service intents get first refusal.
pub const RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["call me", "phone me", "callback", "call back", "speak to someone"],
        intent: "request_callback",
        response_type: "callback",
    },
    KeywordRule {
        keywords: &["price", "cost", "fee", "how much", "payment"],
        intent: "service_question",
        response_type: "pricing",
    },
    KeywordRule {
        keywords: &["how does this work", "what is this", "what do you do", "how it works"],
        intent: "service_question",
        response_type: "about",
    },
    KeywordRule {
        keywords: &["report", "summary", "results", "assessment results"],
        intent: "request_report",
        response_type: "report",
    },
    KeywordRule {
        keywords: &["exercise", "exercises", "activities", "practice", "what can we do at home"],
        intent: "request_exercises",
        response_type: "exercises",
    },
    KeywordRule {
        keywords: &["reflex", "retained", "moro", "palmar", "galant", "atnr", "stnr"],
        intent: "ask_reflex_info",
        response_type: "reflex_info",
    },
    KeywordRule {
        keywords: &["hello", "hi ", "hi!", "hey", "good morning", "good afternoon"],
        intent: "greeting",
        response_type: "greeting",
    },
    KeywordRule {
        keywords: &[
            "worried",
            "concerned",
            "struggling",
            "delay",
            "behind",
            "won't",
            "can't",
            "doesn't",
            "not talking",
            "not walking",
        ],
        intent: "report_concern",
        response_type: "assessment",
    },
];

/// Match a message against the ordered rule table.
///
/// Returns the first rule with any substring hit, or None.
pub fn match_rules(message: &str) -> Option<&'static KeywordRule> {
    let text = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| text.contains(kw)))
}
