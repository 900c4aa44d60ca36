//! Polarity phrase tables.
//!
//! Versioned configuration data for the scoring engine: which phrasings mark
//! a question as reverse-scored (an affirmative answer indicates a problem)
//! and which mark it as explicitly achievement-framed. The two tables must
//! stay disjoint; the scoring algorithm gives positive phrasing priority.
//!
//! Table version: 1

/// Bumped whenever the tables change, so stored reports can note which
/// vocabulary scored them
pub const PHRASE_TABLE_VERSION: u32 = 1;

/// A reverse-polarity phrase group, labeled by concern domain
#[derive(Debug, Clone, Copy)]
pub struct ReversePhraseGroup {
    pub label: &'static str,
    pub phrases: &'static [&'static str],
}

/// Phrases indicating a problem when affirmed
pub const REVERSE_GROUPS: &[ReversePhraseGroup] = &[
    ReversePhraseGroup {
        label: "feeding_aversion",
        phrases: &["refuse to eat", "refuses food", "picky eater", "gag on", "spit out food", "avoid certain textures"],
    },
    ReversePhraseGroup {
        label: "aggressive_conduct",
        phrases: &["hit other", "hits or bites", "bite other", "throw tantrum", "tantrums", "lash out", "aggressive"],
    },
    ReversePhraseGroup {
        label: "motor_clumsiness",
        phrases: &["trip over", "trips often", "bump into", "fall over", "drop things", "clumsy"],
    },
    ReversePhraseGroup {
        label: "sensory_defensiveness",
        phrases: &["cover their ears", "covers ears", "bothered by tags", "avoid being touched", "upset by loud", "sensitive to light"],
    },
    ReversePhraseGroup {
        label: "medical_symptoms",
        phrases: &["complain of headaches", "complain of pain", "wet the bed", "wets the bed", "motion sickness", "car sick"],
    },
    ReversePhraseGroup {
        label: "sleep_disruption",
        phrases: &["trouble falling asleep", "wake during the night", "wakes at night", "nightmares", "resist bedtime"],
    },
    ReversePhraseGroup {
        label: "learning_delay",
        phrases: &["struggle with", "struggles to", "difficulty with", "trouble learning", "reverse letters", "avoid reading", "fall behind"],
    },
];

/// Explicit achievement framing; overrides any reverse match
pub const POSITIVE_PHRASES: &[&str] = &[
    "can your child",
    "is your child able",
    "does your child manage",
    "independently",
    "by themselves",
    "on their own",
    "share toys",
    "take turns",
    "make friends",
    "follow instructions",
    "follow a",
];
