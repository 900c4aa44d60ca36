//! Core vocabulary for the screening engine.
//!
//! Classification results, questions, answers, scored items, and findings.
//! Wire shapes follow the collaborator contracts: a classification is
//! `{intent, confidence, response_type}` and a finding is
//! `{label, retention_percentage, severity}`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::categories::ConcernCategory;

/// Which tier of the resolver produced a classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// In-process TTL cache hit
    Cache,
    /// Exact normalized-text match in the pattern store
    ExactMatch,
    /// Weighted-Jaccard fuzzy match in the pattern store
    FuzzyMatch,
    /// Static keyword rule
    KeywordRule,
    /// External text-classification service
    Classifier,
    /// Degraded result after every tier missed or the adapter failed
    Fallback,
}

impl std::fmt::Display for SourceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::ExactMatch => "exact_match",
            Self::FuzzyMatch => "fuzzy_match",
            Self::KeywordRule => "keyword_rule",
            Self::Classifier => "classifier",
            Self::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Resolved classification of a user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    /// What the message is trying to accomplish (open label set)
    pub intent: String,
    /// Resolver confidence in [0, 1]
    pub confidence: f32,
    /// How the reply should be shaped (open label set)
    pub response_type: String,
    /// Which tier produced this result
    pub source_tier: SourceTier,
}

impl Classification {
    /// Neutral low-confidence result used whenever nothing resolved
    pub fn unknown() -> Self {
        Self {
            intent: "unknown".to_string(),
            confidence: 0.0,
            response_type: "clarify".to_string(),
            source_tier: SourceTier::Fallback,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == "unknown" || self.confidence == 0.0
    }
}

/// Developmental difficulty of a question relative to the child's age
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillTier {
    Foundation,
    Current,
    Emerging,
}

impl SkillTier {
    /// Selection order: easier tiers before harder ones
    pub const ORDER: [SkillTier; 3] = [Self::Foundation, Self::Current, Self::Emerging];
}

impl std::fmt::Display for SkillTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Foundation => "foundation",
            Self::Current => "current",
            Self::Emerging => "emerging",
        };
        write!(f, "{}", s)
    }
}

/// Where a question came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    /// Pulled from the persisted question bank
    Bank,
    /// Synthesized for this assessment (progression entry or filler)
    Generated,
}

/// One question in an assessment battery.
///
/// Materialized per assessment instance; never written back to the bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub category: ConcernCategory,
    pub tier: SkillTier,
    pub source: QuestionSource,
}

impl Question {
    pub fn new(
        text: impl Into<String>,
        category: ConcernCategory,
        tier: SkillTier,
        source: QuestionSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            category,
            tier,
            source,
        }
    }
}

/// A question stored in the persistent bank, before materialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankQuestion {
    pub text: String,
    pub category: ConcernCategory,
    pub tier: SkillTier,
    /// Youngest age (years) the question is appropriate for
    pub min_age: u8,
}

/// Raw answer vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Yes,
    No,
    Sometimes,
}

impl std::fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Sometimes => "sometimes",
        };
        write!(f, "{}", s)
    }
}

/// A recorded answer to one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub value: AnswerValue,
}

/// Scoring direction of a question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// An affirmative answer indicates an achievement
    Normal,
    /// An affirmative answer indicates a concern
    Reverse,
}

/// A question joined with its answer and scored contribution.
///
/// Derived on every scoring pass; never stored.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub question: Question,
    pub answer: AnswerValue,
    pub polarity: Polarity,
    /// Contribution in [0, 1]
    pub contribution: f64,
}

/// Aggregate score for one concern category.
///
/// Recomputed fully on every pass to avoid incremental drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: ConcernCategory,
    pub raw_score: f64,
    pub max_score: f64,
    /// round(100 * raw / answered-count)
    pub percentage: u8,
    /// Question texts whose answer flagged a concern
    pub concerns: Vec<String>,
    /// Question texts answered at full contribution, when the category cleared the floor
    pub strengths: Vec<String>,
}

/// Severity band for a latent-category finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Moderate,
    Mild,
}

impl Severity {
    /// Band boundaries: >= 70 high, 40-69 moderate, < 40 mild
    pub fn from_percentage(pct: u8) -> Self {
        if pct >= 70 {
            Self::High
        } else if pct >= 40 {
            Self::Moderate
        } else {
            Self::Mild
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Mild => "mild",
        };
        write!(f, "{}", s)
    }
}

/// An inferred latent-category (retained reflex) finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflexFinding {
    pub label: String,
    /// 0..=100
    pub retention_percentage: u8,
    /// Question texts that matched this category's indicators
    pub contributing_indicators: Vec<String>,
    pub severity: Severity,
}

/// Conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Initial,
    Clarifying,
    Questioning,
    Diagnosing,
    Recommending,
    /// Terminal hand-off to a human; reset only on explicit restart
    Escalated,
}

impl SessionStage {
    /// Whether the presentation layer should render Yes/No/Sometimes quick replies
    pub fn wants_quick_replies(&self) -> bool {
        matches!(self, Self::Questioning | Self::Diagnosing)
    }
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Initial => "initial",
            Self::Clarifying => "clarifying",
            Self::Questioning => "questioning",
            Self::Diagnosing => "diagnosing",
            Self::Recommending => "recommending",
            Self::Escalated => "escalated",
        };
        write!(f, "{}", s)
    }
}
