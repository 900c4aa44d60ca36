//! Latent-category (retained reflex) inference.
//!
//! Aggregates scored answers into retained-reflex findings. Each reflex
//! carries its own indicator phrase list, separate from the scoring
//! engine's polarity tables: polarity decides how an answer scores, the
//! indicators decide which latent pattern an answer speaks to.
//!
//! Indicator table version: 1

use tracing::debug;
use willow_common::{AnswerValue, ReflexFinding, ScoredItem, Severity};

/// Bumped whenever the indicator tables change
pub const INDICATOR_TABLE_VERSION: u32 = 1;

/// Indicator phrase list for one latent category
#[derive(Debug, Clone, Copy)]
pub struct ReflexIndicators {
    pub label: &'static str,
    pub indicators: &'static [&'static str],
}

/// The latent categories and their indicator phrases
pub const REFLEXES: &[ReflexIndicators] = &[
    ReflexIndicators {
        label: "Moro reflex",
        indicators: &[
            "startle",
            "upset by loud",
            "cover their ears",
            "covers ears",
            "anxious in new",
            "motion sickness",
            "car sick",
            "sensitive to light",
        ],
    },
    ReflexIndicators {
        label: "ATNR",
        indicators: &[
            "cross the midline",
            "reverse letters",
            "lose their place when reading",
            "avoid reading",
            "messy handwriting",
            "tilt their head when writing",
        ],
    },
    ReflexIndicators {
        label: "STNR",
        indicators: &[
            "slump at the table",
            "sit in a w position",
            "lie on the desk",
            "poor posture",
            "rest their head while writing",
        ],
    },
    ReflexIndicators {
        label: "Spinal Galant",
        indicators: &[
            "wet the bed",
            "wets the bed",
            "fidget when seated",
            "bothered by waistbands",
            "bothered by tags",
            "wriggle when sitting",
        ],
    },
    ReflexIndicators {
        label: "TLR",
        indicators: &[
            "walk on their toes",
            "toe walking",
            "poor balance",
            "tire quickly when standing",
            "dislike hanging upside down",
        ],
    },
    ReflexIndicators {
        label: "Palmar reflex",
        indicators: &[
            "awkward pencil grip",
            "drop things",
            "stick out their tongue when writing",
            "tire when writing",
            "difficulty with buttons",
        ],
    },
];

/// Infer retained-reflex findings from scored answers.
///
/// For each latent category: every scored item whose question text contains
/// one of its indicators joins the denominator; Yes answers add 1 to the
/// numerator, Sometimes answers add 0.5. Categories with no matches are
/// omitted entirely, and 0% findings are excluded rather than shown as zero.
/// Output is sorted descending by retention percentage.
pub fn infer_latent_categories(items: &[ScoredItem]) -> Vec<ReflexFinding> {
    let mut findings = Vec::new();

    for reflex in REFLEXES {
        let mut numerator = 0.0_f64;
        let mut denominator = 0u32;
        let mut contributing: Vec<String> = Vec::new();

        for item in items {
            let text = item.question.text.to_lowercase();
            if !reflex.indicators.iter().any(|ind| text.contains(ind)) {
                continue;
            }
            denominator += 1;
            match item.answer {
                AnswerValue::Yes => {
                    numerator += 1.0;
                    contributing.push(item.question.text.clone());
                }
                AnswerValue::Sometimes => {
                    numerator += 0.5;
                    contributing.push(item.question.text.clone());
                }
                AnswerValue::No => {}
            }
        }

        if denominator == 0 {
            continue;
        }

        let percentage =
            ((100.0 * numerator / denominator as f64).round() as i64).clamp(0, 100) as u8;
        if percentage == 0 {
            debug!("Reflex {}: matched but 0% retention, excluded", reflex.label);
            continue;
        }

        findings.push(ReflexFinding {
            label: reflex.label.to_string(),
            retention_percentage: percentage,
            contributing_indicators: contributing,
            severity: Severity::from_percentage(percentage),
        });
    }

    findings.sort_by(|a, b| {
        b.retention_percentage
            .cmp(&a.retention_percentage)
            .then_with(|| a.label.cmp(&b.label))
    });
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score_item;
    use willow_common::{ConcernCategory, Question, QuestionSource, SkillTier};

    fn item(text: &str, answer: AnswerValue) -> ScoredItem {
        let q = Question::new(
            text,
            ConcernCategory::General,
            SkillTier::Current,
            QuestionSource::Generated,
        );
        score_item(&q, answer)
    }

    #[test]
    fn test_yes_and_sometimes_weighting() {
        let items = vec![
            item("Does your child startle at sudden sounds?", AnswerValue::Yes),
            item("Is your child upset by loud places?", AnswerValue::Sometimes),
        ];
        let findings = infer_latent_categories(&items);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].label, "Moro reflex");
        // (1 + 0.5) / 2 = 75%
        assert_eq!(findings[0].retention_percentage, 75);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].contributing_indicators.len(), 2);
    }

    #[test]
    fn test_no_matches_means_no_finding() {
        let items = vec![item("Can your child count to ten?", AnswerValue::Yes)];
        assert!(infer_latent_categories(&items).is_empty());
    }

    #[test]
    fn test_zero_percent_excluded() {
        let items = vec![item("Does your child startle at sudden sounds?", AnswerValue::No)];
        // Denominator 1, numerator 0: must be absent, not 0%
        assert!(infer_latent_categories(&items).is_empty());
    }

    #[test]
    fn test_sorted_descending() {
        let items = vec![
            item("Does your child startle at sudden sounds?", AnswerValue::Sometimes),
            item("Does your child wet the bed at night?", AnswerValue::Yes),
        ];
        let findings = infer_latent_categories(&items);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].label, "Spinal Galant");
        assert_eq!(findings[0].retention_percentage, 100);
        assert_eq!(findings[1].retention_percentage, 50);
    }

    #[test]
    fn test_severity_bands_applied() {
        let items = vec![
            item("Does your child walk on their toes?", AnswerValue::Sometimes),
            item("Does your child have poor balance on stairs?", AnswerValue::No),
        ];
        // 0.5 / 2 = 25% -> mild
        let findings = infer_latent_categories(&items);
        assert_eq!(findings[0].severity, Severity::Mild);
    }

    #[test]
    fn test_one_item_can_feed_multiple_reflexes() {
        let items = vec![item(
            "Is your child bothered by tags and waistbands?",
            AnswerValue::Yes,
        )];
        let findings = infer_latent_categories(&items);
        // "bothered by tags" indicates Spinal Galant only in this table
        assert_eq!(findings.len(), 1);
    }
}
