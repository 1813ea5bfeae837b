//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub quiz: QuizConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub outbox: OutboxConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Fraction of a content's duration (inclusive) that marks it completed
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuizConfig {
    /// Reject submissions until every content of the chapter is completed
    #[serde(default)]
    pub require_unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxConfig {
    /// Records claimed per drain pass
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delivery attempts before a record is parked as failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Claim lease in seconds
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,

    #[serde(default = "default_worker_id")]
    pub worker_id: String,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            lease_secs: default_lease_secs(),
            worker_id: default_worker_id(),
        }
    }
}

// Defaults
fn default_threshold() -> f64 { 0.95 }
fn default_ttl_secs() -> u64 { 5 }
fn default_batch_size() -> usize { 10 }
fn default_max_attempts() -> u32 { 3 }
fn default_lease_secs() -> u64 { 60 }
fn default_worker_id() -> String { "progress-engine".to_string() }

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.completion.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "completion.threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        if self.outbox.batch_size == 0 {
            return Err(ConfigError::Invalid("outbox.batch_size must be positive".into()));
        }
        if self.outbox.max_attempts == 0 {
            return Err(ConfigError::Invalid("outbox.max_attempts must be positive".into()));
        }
        Ok(())
    }
}
