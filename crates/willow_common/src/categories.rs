//! Concern-category registry.
//!
//! The canonical developmental domains, their phrase fragments for fuzzy
//! matching against free text, and alias collapse for reconciling labels
//! coming back from the database or the external classifier.

use serde::{Deserialize, Serialize};

/// Developmental concern category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernCategory {
    Communication,
    GrossMotor,
    FineMotor,
    Cognition,
    DailyLiving,
    Conduct,
    SchoolReadiness,
    /// Catch-all for labels we cannot reconcile
    General,
}

impl ConcernCategory {
    /// All concrete categories, in display order (General excluded)
    pub const ALL: [ConcernCategory; 7] = [
        Self::Communication,
        Self::GrossMotor,
        Self::FineMotor,
        Self::Cognition,
        Self::DailyLiving,
        Self::Conduct,
        Self::SchoolReadiness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::GrossMotor => "gross_motor",
            Self::FineMotor => "fine_motor",
            Self::Cognition => "cognition",
            Self::DailyLiving => "daily_living",
            Self::Conduct => "conduct",
            Self::SchoolReadiness => "school_readiness",
            Self::General => "general",
        }
    }

    /// Human-readable label used in generated question text and summaries
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::GrossMotor => "gross motor",
            Self::FineMotor => "fine motor",
            Self::Cognition => "thinking and learning",
            Self::DailyLiving => "daily living",
            Self::Conduct => "behaviour",
            Self::SchoolReadiness => "school readiness",
            Self::General => "general development",
        }
    }

    /// Ordered canonical phrase fragments used for fuzzy matching.
    ///
    /// More specific fragments come first; matching is substring-based over
    /// the lower-cased message.
    pub fn phrase_fragments(&self) -> &'static [&'static str] {
        match self {
            Self::Communication => &[
                "not talking",
                "speech",
                "talk",
                "language",
                "pronounce",
                "stutter",
                "vocabulary",
                "words",
            ],
            Self::GrossMotor => &[
                "walk",
                "run",
                "jump",
                "climb",
                "balance",
                "clumsy",
                "trips over",
                "coordination",
            ],
            Self::FineMotor => &[
                "pencil",
                "handwriting",
                "draw",
                "scissors",
                "buttons",
                "grip",
                "fine motor",
            ],
            Self::Cognition => &[
                "attention",
                "focus",
                "concentrate",
                "memory",
                "problem solving",
                "slow to learn",
                "understanding",
            ],
            Self::DailyLiving => &[
                "feeding",
                "picky eater",
                "eating",
                "dressing",
                "toilet",
                "potty",
                "sleep",
                "self-care",
            ],
            Self::Conduct => &[
                "tantrum",
                "aggressive",
                "hitting",
                "biting",
                "doesn't listen",
                "defiant",
                "meltdown",
                "behaviour",
                "behavior",
            ],
            Self::SchoolReadiness => &[
                "school",
                "kindergarten",
                "reading",
                "letters",
                "numbers",
                "counting",
                "sitting still",
            ],
            Self::General => &[],
        }
    }

    /// Collapse a free-form label to a canonical category.
    ///
    /// Unknown labels default to General.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        match l.as_str() {
            "communication" | "speech" | "speech_language" | "language" => Self::Communication,
            "gross_motor" | "gross motor" | "motor" | "movement" => Self::GrossMotor,
            "fine_motor" | "fine motor" | "handwriting" => Self::FineMotor,
            "cognition" | "cognitive" | "learning" | "attention" => Self::Cognition,
            "daily_living" | "daily living" | "self_care" | "self-care" | "feeding" | "sleep" => {
                Self::DailyLiving
            }
            "conduct" | "behaviour" | "behavior" | "behavioural" | "behavioral" => Self::Conduct,
            "school_readiness" | "school readiness" | "school" | "academic" => {
                Self::SchoolReadiness
            }
            _ => Self::General,
        }
    }
}

impl std::fmt::Display for ConcernCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scan a free-text message for concern categories.
///
/// Returns matched categories in registry order, each at most once.
pub fn detect_categories(message: &str) -> Vec<ConcernCategory> {
    let text = message.to_lowercase();
    ConcernCategory::ALL
        .iter()
        .copied()
        .filter(|cat| {
            cat.phrase_fragments()
                .iter()
                .any(|fragment| text.contains(fragment))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_collapse() {
        assert_eq!(
            ConcernCategory::from_label("speech"),
            ConcernCategory::Communication
        );
        assert_eq!(
            ConcernCategory::from_label("Behaviour"),
            ConcernCategory::Conduct
        );
        assert_eq!(
            ConcernCategory::from_label("gross motor"),
            ConcernCategory::GrossMotor
        );
        assert_eq!(
            ConcernCategory::from_label("something else entirely"),
            ConcernCategory::General
        );
    }

    #[test]
    fn test_detect_single_category() {
        let cats = detect_categories("My son is 3 and still not talking much");
        assert_eq!(cats, vec![ConcernCategory::Communication]);
    }

    #[test]
    fn test_detect_multiple_categories() {
        let cats = detect_categories("She has tantrums at school and trips over everything");
        assert!(cats.contains(&ConcernCategory::GrossMotor));
        assert!(cats.contains(&ConcernCategory::Conduct));
        assert!(cats.contains(&ConcernCategory::SchoolReadiness));
    }

    #[test]
    fn test_detect_nothing() {
        assert!(detect_categories("hello there").is_empty());
    }

    #[test]
    fn test_detect_returns_each_category_once() {
        let cats = detect_categories("speech delay, late talking, few words");
        assert_eq!(
            cats.iter()
                .filter(|c| **c == ConcernCategory::Communication)
                .count(),
            1
        );
    }
}
