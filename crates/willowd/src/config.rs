//! Configuration management for willowd.
//!
//! Loads settings from /etc/willow/config.toml or uses defaults.
//! The fuzzy-match threshold and escalation count are deliberately
//! configuration, not code: the shipped defaults match observed behavior and
//! carry no derived rationale.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/willow/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/willow/config.toml";

/// Tiered resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum weighted similarity for a fuzzy match to be accepted
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Maximum candidates retrieved from the store per fuzzy lookup
    #[serde(default = "default_fuzzy_candidate_limit")]
    pub fuzzy_candidate_limit: usize,

    /// Fixed confidence assigned to keyword-rule matches
    #[serde(default = "default_keyword_confidence")]
    pub keyword_confidence: f32,

    /// Cache entry time-to-live in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum cached classifications before eviction
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_fuzzy_threshold() -> f64 {
    0.8
}

fn default_fuzzy_candidate_limit() -> usize {
    25
}

fn default_keyword_confidence() -> f32 {
    0.7
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_cache_capacity() -> usize {
    512
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: default_fuzzy_threshold(),
            fuzzy_candidate_limit: default_fuzzy_candidate_limit(),
            keyword_confidence: default_keyword_confidence(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// External classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model for the fallback classifier - fast, small
    #[serde(default = "default_classifier_model")]
    pub model: String,

    /// Completion endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in seconds; a single attempt, no retry
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
}

fn default_classifier_model() -> String {
    "qwen2.5:0.5b-instruct".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_classifier_timeout() -> u64 {
    8
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_classifier_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_classifier_timeout(),
        }
    }
}

/// Assessment engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Target question-battery size
    #[serde(default = "default_question_set_size")]
    pub question_set_size: usize,

    /// Budget for building a question set before the static fallback is used
    #[serde(default = "default_question_build_timeout")]
    pub question_build_timeout_secs: u64,

    /// Consecutive unresolved turns before hand-off to a human
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: u32,

    /// Category percentage a full-contribution answer must clear to count as a strength
    #[serde(default = "default_strength_floor")]
    pub strength_percentage_floor: u8,
}

fn default_question_set_size() -> usize {
    10
}

fn default_question_build_timeout() -> u64 {
    5
}

fn default_escalation_threshold() -> u32 {
    3
}

fn default_strength_floor() -> u8 {
    70
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_set_size: default_question_set_size(),
            question_build_timeout_secs: default_question_build_timeout(),
            escalation_threshold: default_escalation_threshold(),
            strength_percentage_floor: default_strength_floor(),
        }
    }
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    fn load_from_path(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path);
        Ok(config)
    }
}
