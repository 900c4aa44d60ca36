//! Tiered intent resolver.
//!
//! Answers cheaply before answering expensively, in strict cost order:
//! in-process cache, exact persisted match, fuzzy persisted match, keyword
//! rules, external classifier. Every successful fallback result is written
//! back to the pattern store, so each expensive call permanently reduces
//! future expensive calls for similar input.
//!
//! `classify` never fails: cache and store errors degrade to the next tier,
//! adapter errors degrade to the neutral unknown classification.

pub mod cache;
pub mod keywords;
pub mod similarity;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use willow_common::{normalize_text, Classification, MessagePattern, PatternStore, SourceTier};

use crate::classifier::{classify_remote, ClassifierContext, TextCompletion};
use crate::config::ResolverConfig;
use cache::ClassificationCache;

/// Orchestrates the five resolution tiers
pub struct TieredResolver {
    cache: ClassificationCache,
    store: Arc<PatternStore>,
    completion: Arc<dyn TextCompletion>,
    config: ResolverConfig,
}

impl TieredResolver {
    pub fn new(
        store: Arc<PatternStore>,
        completion: Arc<dyn TextCompletion>,
        config: ResolverConfig,
    ) -> Self {
        let cache = ClassificationCache::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        );
        Self {
            cache,
            store,
            completion,
            config,
        }
    }

    /// Classify a message, short-circuiting on the first acceptable hit.
    pub async fn classify(&self, message: &str, context: &ClassifierContext) -> Classification {
        let normalized = normalize_text(message);
        if normalized.is_empty() {
            return Classification::unknown();
        }

        // Tier 1: exact cache
        if let Some(hit) = self.cache.get(&normalized).await {
            debug!("Resolver: cache hit for '{}'", normalized);
            return hit;
        }

        // Tier 2: exact persisted match
        match self.store.find_exact(&normalized) {
            Ok(Some(pattern)) => {
                info!("Resolver: exact match for '{}'", normalized);
                if let Err(e) = self.store.record_usage(&pattern.id) {
                    warn!("Usage counter update failed: {}", e);
                }
                let classification = Classification {
                    intent: pattern.intent,
                    confidence: 1.0,
                    response_type: pattern.response_type,
                    source_tier: SourceTier::ExactMatch,
                };
                self.cache.put(&normalized, classification.clone()).await;
                return classification;
            }
            Ok(None) => {}
            Err(e) => warn!("Exact lookup failed, falling through: {}", e),
        }

        // Tier 3: fuzzy persisted match
        match self
            .store
            .find_candidates(&normalized, self.config.fuzzy_candidate_limit)
        {
            Ok(candidates) if !candidates.is_empty() => {
                if let Some(best) = similarity::rank_candidates(&normalized, candidates) {
                    if best.weighted >= self.config.fuzzy_threshold {
                        info!(
                            "Resolver: fuzzy match '{}' (similarity {:.2}, weighted {:.2})",
                            best.pattern.normalized_text, best.similarity, best.weighted
                        );
                        if let Err(e) = self.store.record_usage(&best.pattern.id) {
                            warn!("Usage counter update failed: {}", e);
                        }
                        let classification = Classification {
                            intent: best.pattern.intent,
                            confidence: best.weighted.min(1.0) as f32,
                            response_type: best.pattern.response_type,
                            source_tier: SourceTier::FuzzyMatch,
                        };
                        self.cache.put(&normalized, classification.clone()).await;
                        return classification;
                    }
                    debug!(
                        "Resolver: best fuzzy candidate below threshold ({:.2} < {:.2})",
                        best.weighted, self.config.fuzzy_threshold
                    );
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Candidate lookup failed, falling through: {}", e),
        }

        // Tier 4: keyword rules
        if let Some(rule) = keywords::match_rules(&normalized) {
            info!("Resolver: keyword rule hit, intent={}", rule.intent);
            let classification = Classification {
                intent: rule.intent.to_string(),
                confidence: self.config.keyword_confidence,
                response_type: rule.response_type.to_string(),
                source_tier: SourceTier::KeywordRule,
            };
            self.write_back(&normalized, &classification);
            self.cache.put(&normalized, classification.clone()).await;
            return classification;
        }

        // Tier 5: external classifier fallback. The result is persisted but
        // deliberately not cached: the next identical message should hit the
        // exact persisted tier at full confidence.
        info!("Resolver: falling back to external classifier");
        let classification = classify_remote(self.completion.as_ref(), message, context).await;
        if !classification.is_unknown() {
            self.write_back(&normalized, &classification);
        }
        classification
    }

    /// Persist a resolution as a new pattern; failures are logged, not raised
    fn write_back(&self, normalized: &str, classification: &Classification) {
        let pattern = MessagePattern::new(
            normalized,
            &classification.intent,
            &classification.response_type,
            classification.confidence,
        );
        if let Err(e) = self.store.insert(&pattern) {
            warn!("Pattern write-back failed: {}", e);
        }
    }

    /// Expose the cache for maintenance tasks
    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }
}
