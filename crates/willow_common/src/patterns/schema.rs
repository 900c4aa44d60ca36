//! Pattern store schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version for migrations
pub const SCHEMA_VERSION: u32 = 1;

/// A previously classified message, persisted for reuse.
///
/// `normalized_text` is lower-cased, trimmed, and whitespace-collapsed before
/// storage or lookup; uniqueness is by exact normalized text. Patterns are
/// created on first resolution and updated on every subsequent hit; they are
/// never deleted automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePattern {
    /// Internal identifier (UUID)
    pub id: String,
    pub normalized_text: String,
    pub intent: String,
    pub response_type: String,
    /// Confidence recorded at resolution time, [0.0, 1.0]
    pub confidence: f32,
    /// How many times this pattern has matched
    pub times_used: i64,
    /// Explicit user/operator feedback, when any was given
    pub was_correct: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl MessagePattern {
    /// Build a fresh pattern for a newly resolved message.
    ///
    /// The caller is responsible for normalizing the text first.
    pub fn new(
        normalized_text: impl Into<String>,
        intent: impl Into<String>,
        response_type: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            normalized_text: normalized_text.into(),
            intent: intent.into(),
            response_type: response_type.into(),
            confidence: confidence.clamp(0.0, 1.0),
            times_used: 1,
            was_correct: None,
            created_at: now,
            last_used_at: now,
        }
    }
}

/// Lower-case, trim, and collapse internal whitespace.
///
/// Applied to every message before storage or lookup so that equality is
/// insensitive to casing and spacing.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
