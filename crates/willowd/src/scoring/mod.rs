//! Smart scoring engine.
//!
//! Detects each question's polarity from its text, converts answers into
//! numeric contributions, and aggregates per-category scores. Scoring is a
//! pure function of (question text, answer); category scores are recomputed
//! fully on every pass.

pub mod phrases;

use std::collections::BTreeMap;
use willow_common::{AnswerValue, CategoryScore, ConcernCategory, Polarity, Question, ScoredItem};

use phrases::{POSITIVE_PHRASES, REVERSE_GROUPS};

/// Polarity decision for one question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionPolarity {
    pub polarity: Polarity,
    /// Reverse group that matched, when the decision came from the tables
    pub matched_group: Option<&'static str>,
}

/// Detect a question's polarity from its text.
///
/// Positive phrasing always wins: a question matching both tables is
/// normally scored. Unmatched questions default to normal.
pub fn classify_polarity(question_text: &str) -> QuestionPolarity {
    let text = question_text.to_lowercase();

    if POSITIVE_PHRASES.iter().any(|p| text.contains(p)) {
        return QuestionPolarity {
            polarity: Polarity::Normal,
            matched_group: None,
        };
    }

    for group in REVERSE_GROUPS {
        if group.phrases.iter().any(|p| text.contains(p)) {
            return QuestionPolarity {
                polarity: Polarity::Reverse,
                matched_group: Some(group.label),
            };
        }
    }

    QuestionPolarity {
        polarity: Polarity::Normal,
        matched_group: None,
    }
}

/// Convert an answer into its contribution for a question text.
///
/// Normal: Yes 1.0, Sometimes 0.5, No 0.0.
/// Reverse: No 1.0, Sometimes 0.3, Yes 0.0.
pub fn score(question_text: &str, answer: AnswerValue) -> f64 {
    match (classify_polarity(question_text).polarity, answer) {
        (Polarity::Normal, AnswerValue::Yes) => 1.0,
        (Polarity::Normal, AnswerValue::Sometimes) => 0.5,
        (Polarity::Normal, AnswerValue::No) => 0.0,
        (Polarity::Reverse, AnswerValue::No) => 1.0,
        (Polarity::Reverse, AnswerValue::Sometimes) => 0.3,
        (Polarity::Reverse, AnswerValue::Yes) => 0.0,
    }
}

/// Score one answered question
pub fn score_item(question: &Question, answer: AnswerValue) -> ScoredItem {
    let polarity = classify_polarity(&question.text).polarity;
    ScoredItem {
        question: question.clone(),
        answer,
        polarity,
        contribution: score(&question.text, answer),
    }
}

/// Aggregate scored items into per-category scores.
///
/// Only answered questions participate; percentage is
/// round(100 · Σcontribution / answered-count). A reverse-scored question
/// answered Yes is a concern; a full-contribution answer is a strength only
/// when the category percentage clears the floor.
pub fn aggregate_categories(items: &[ScoredItem], strength_floor: u8) -> Vec<CategoryScore> {
    let mut by_category: BTreeMap<&str, Vec<&ScoredItem>> = BTreeMap::new();
    for item in items {
        by_category
            .entry(item.question.category.as_str())
            .or_default()
            .push(item);
    }

    let mut scores = Vec::with_capacity(by_category.len());
    for (label, group) in by_category {
        let raw_score: f64 = group.iter().map(|i| i.contribution).sum();
        let max_score = group.len() as f64;
        let percentage = ((100.0 * raw_score / max_score).round() as i64).clamp(0, 100) as u8;

        let concerns: Vec<String> = group
            .iter()
            .filter(|i| i.polarity == Polarity::Reverse && i.contribution == 0.0)
            .map(|i| i.question.text.clone())
            .collect();

        let strengths: Vec<String> = if percentage >= strength_floor {
            group
                .iter()
                .filter(|i| i.contribution == 1.0)
                .map(|i| i.question.text.clone())
                .collect()
        } else {
            Vec::new()
        };

        scores.push(CategoryScore {
            category: ConcernCategory::from_label(label),
            raw_score,
            max_score,
            percentage,
            concerns,
            strengths,
        });
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use willow_common::{QuestionSource, SkillTier};

    fn question(text: &str) -> Question {
        Question::new(text, ConcernCategory::DailyLiving, SkillTier::Current, QuestionSource::Generated)
    }

    #[test]
    fn test_positive_phrasing_is_normal() {
        let p = classify_polarity("Can your child feed themselves with a spoon?");
        assert_eq!(p.polarity, Polarity::Normal);
        assert!(p.matched_group.is_none());
    }

    #[test]
    fn test_reverse_phrasing_detected() {
        let p = classify_polarity("Does your child refuse to eat new foods?");
        assert_eq!(p.polarity, Polarity::Reverse);
        assert_eq!(p.matched_group, Some("feeding_aversion"));
    }

    #[test]
    fn test_positive_overrides_reverse() {
        // Contains both "can your child" and "trip over"
        let p = classify_polarity("Can your child walk across the room without trip over hazards?");
        assert_eq!(p.polarity, Polarity::Normal);
    }

    #[test]
    fn test_unmatched_defaults_to_normal() {
        let p = classify_polarity("Does your child enjoy music?");
        assert_eq!(p.polarity, Polarity::Normal);
    }

    #[test]
    fn test_scoring_table_normal() {
        let q = "Can your child jump with both feet?";
        assert_relative_eq!(score(q, AnswerValue::Yes), 1.0);
        assert_relative_eq!(score(q, AnswerValue::Sometimes), 0.5);
        assert_relative_eq!(score(q, AnswerValue::No), 0.0);
    }

    #[test]
    fn test_scoring_table_reverse() {
        let q = "Does your child wake during the night?";
        assert_relative_eq!(score(q, AnswerValue::No), 1.0);
        assert_relative_eq!(score(q, AnswerValue::Sometimes), 0.3);
        assert_relative_eq!(score(q, AnswerValue::Yes), 0.0);
    }

    #[test]
    fn test_score_is_pure() {
        let q = "Does your child trip over their own feet?";
        assert_relative_eq!(score(q, AnswerValue::Yes), score(q, AnswerValue::Yes));
    }

    #[test]
    fn test_aggregate_percentage() {
        let items = vec![
            score_item(&question("Can your child wash their hands?"), AnswerValue::Yes),
            score_item(&question("Can your child dress by themselves?"), AnswerValue::No),
        ];
        let scores = aggregate_categories(&items, 70);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].percentage, 50);
        assert_relative_eq!(scores[0].raw_score, 1.0);
        assert_relative_eq!(scores[0].max_score, 2.0);
    }

    #[test]
    fn test_reverse_yes_recorded_as_concern() {
        let items = vec![score_item(
            &question("Does your child refuse to eat most meals?"),
            AnswerValue::Yes,
        )];
        let scores = aggregate_categories(&items, 70);
        assert_eq!(scores[0].concerns.len(), 1);
        assert_eq!(scores[0].percentage, 0);
    }

    #[test]
    fn test_strengths_gated_by_floor() {
        // One strong answer, one weak: 50% misses the floor
        let items = vec![
            score_item(&question("Can your child use a spoon?"), AnswerValue::Yes),
            score_item(&question("Can your child use a fork?"), AnswerValue::No),
        ];
        let scores = aggregate_categories(&items, 70);
        assert!(scores[0].strengths.is_empty());

        // All strong: 100% clears the floor
        let items = vec![
            score_item(&question("Can your child use a spoon?"), AnswerValue::Yes),
            score_item(&question("Can your child use a fork?"), AnswerValue::Yes),
        ];
        let scores = aggregate_categories(&items, 70);
        assert_eq!(scores[0].strengths.len(), 2);
    }

    #[test]
    fn test_unanswered_questions_do_not_appear() {
        // Aggregation sees only scored items; an unanswered question simply
        // never becomes one, so a single answered question yields max 1.
        let items = vec![score_item(&question("Can your child use a cup?"), AnswerValue::Yes)];
        let scores = aggregate_categories(&items, 70);
        assert_relative_eq!(scores[0].max_score, 1.0);
        assert_eq!(scores[0].percentage, 100);
    }

    #[test]
    fn test_multiple_categories_grouped() {
        let mut q1 = question("Can your child hop?");
        q1.category = ConcernCategory::GrossMotor;
        let q2 = question("Can your child use a spoon?");
        let items = vec![
            score_item(&q1, AnswerValue::Yes),
            score_item(&q2, AnswerValue::Sometimes),
        ];
        let scores = aggregate_categories(&items, 70);
        assert_eq!(scores.len(), 2);
    }
}
