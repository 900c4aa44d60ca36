//! Lexical similarity scoring for fuzzy pattern matching (resolver tier 3).
//!
//! Jaccard overlap over whitespace-tokenized words, weighted by how often a
//! stored pattern has been confirmed through use.

use std::collections::HashSet;
use willow_common::MessagePattern;

/// Tokenize into a lower-cased word set
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Compute exact Jaccard similarity between two token sets.
///
/// J(A, B) = |A ∩ B| / |A ∪ B|
/// Returns 0.0 if both sets are empty.
pub fn jaccard_similarity(set_a: &HashSet<String>, set_b: &HashSet<String>) -> f64 {
    if set_a.is_empty() && set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(set_b).count();
    let union = set_a.union(set_b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Usage weight: 1 + 0.1·log10(times_used + 1).
///
/// Frequently-confirmed patterns win ties against rarely-seen ones.
pub fn usage_weight(times_used: i64) -> f64 {
    1.0 + 0.1 * ((times_used.max(0) as f64) + 1.0).log10()
}

/// A candidate scored against the input message
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub pattern: MessagePattern,
    /// Jaccard similarity before weighting
    pub similarity: f64,
    /// similarity × usage weight; the acceptance criterion
    pub weighted: f64,
}

/// Score candidates against a message and return the best one.
///
/// The caller compares `weighted` against the acceptance threshold.
pub fn rank_candidates(message: &str, candidates: Vec<MessagePattern>) -> Option<RankedCandidate> {
    let message_tokens = tokenize(message);

    candidates
        .into_iter()
        .map(|pattern| {
            let pattern_tokens = tokenize(&pattern.normalized_text);
            let similarity = jaccard_similarity(&message_tokens, &pattern_tokens);
            let weighted = similarity * usage_weight(pattern.times_used);
            RankedCandidate {
                pattern,
                similarity,
                weighted,
            }
        })
        .max_by(|a, b| a.weighted.total_cmp(&b.weighted))
}
