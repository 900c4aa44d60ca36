//! Question bank selector.
//!
//! Builds a fixed-size, duplicate-free, tier-stratified question battery for
//! one concern category and age. Bank questions are consumed first, then the
//! static progressions, then templated filler. The caller owns the
//! session-scoped used-text set, so batteries built later in the same session
//! never repeat a question.

pub mod progressions;

use std::collections::HashSet;
use tracing::{debug, warn};
use willow_common::{BankQuestion, ConcernCategory, Question, QuestionSource, SkillTier};

use progressions::progression_for;

/// Per-tier quotas for one battery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSet {
    pub foundation: usize,
    pub current: usize,
    pub emerging: usize,
}

impl QuotaSet {
    pub fn total(&self) -> usize {
        self.foundation + self.current + self.emerging
    }

    fn for_tier(&self, tier: SkillTier) -> usize {
        match tier {
            SkillTier::Foundation => self.foundation,
            SkillTier::Current => self.current,
            SkillTier::Emerging => self.emerging,
        }
    }
}

/// Age-keyed quota table.
///
/// Younger children get more foundation questions; older children shift
/// toward current and emerging skills.
pub fn quota_for_age(age: u8) -> QuotaSet {
    match age {
        0..=2 => QuotaSet { foundation: 5, current: 3, emerging: 2 },
        3 => QuotaSet { foundation: 4, current: 4, emerging: 2 },
        4 => QuotaSet { foundation: 3, current: 4, emerging: 3 },
        5 => QuotaSet { foundation: 2, current: 5, emerging: 3 },
        _ => QuotaSet { foundation: 2, current: 4, emerging: 4 },
    }
}

/// Build one battery for a category and age.
///
/// `used` is the session-scoped lower-cased text set; it is updated in place.
/// Output ordering is deterministic: tier order (foundation, current,
/// emerging), bank entries before progression entries within a tier, filler
/// last.
pub fn build_question_set(
    category: ConcernCategory,
    age: u8,
    bank: &[BankQuestion],
    used: &mut HashSet<String>,
) -> Vec<Question> {
    let quota = quota_for_age(age);
    let mut selected: Vec<Question> = Vec::with_capacity(quota.total());

    for tier in SkillTier::ORDER {
        let mut tier_count = 0;
        let tier_quota = quota.for_tier(tier);

        // Bank-sourced candidates first
        for candidate in bank.iter().filter(|q| q.tier == tier && q.min_age <= age) {
            if tier_count >= tier_quota {
                break;
            }
            let key = candidate.text.to_lowercase();
            if used.contains(&key) {
                continue;
            }
            used.insert(key);
            selected.push(Question::new(
                candidate.text.clone(),
                category,
                tier,
                QuestionSource::Bank,
            ));
            tier_count += 1;
        }

        // Static progression entries fill what the bank could not
        for entry in progression_for(category)
            .iter()
            .filter(|e| e.tier == tier && e.min_age <= age)
        {
            if tier_count >= tier_quota {
                break;
            }
            let key = entry.text.to_lowercase();
            if used.contains(&key) {
                continue;
            }
            used.insert(key);
            selected.push(Question::new(entry.text, category, tier, QuestionSource::Generated));
            tier_count += 1;
        }

        if tier_count < tier_quota {
            debug!(
                "Tier {} short for {}: {}/{} after bank and progressions",
                tier, category, tier_count, tier_quota
            );
        }
    }

    // Templated filler tops the battery up to the target size. The loop
    // terminates as soon as a synthesized text would duplicate an existing
    // one.
    let target = quota.total();
    let mut n = 1;
    while selected.len() < target {
        let text = format!("Can your child perform {} task {}?", category.display_name(), n);
        let key = text.to_lowercase();
        if used.contains(&key) {
            warn!("Filler synthesis stopped at duplicate for {}", category);
            break;
        }
        used.insert(key);
        selected.push(Question::new(text, category, SkillTier::Current, QuestionSource::Generated));
        n += 1;
    }

    selected
}

/// Bank-free battery, used when bank retrieval exceeds its time budget
pub fn build_static_fallback_set(
    category: ConcernCategory,
    age: u8,
    used: &mut HashSet<String>,
) -> Vec<Question> {
    build_question_set(category, age, &[], used)
}
