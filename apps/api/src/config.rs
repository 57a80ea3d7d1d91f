use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::vocabulary::Vocabulary;
use crate::pipeline::collaborators::RetryPolicy;
use crate::recommendation::engine::RecommendationWeights;
use crate::recommendation::strategy::StrategyThresholds;
use crate::scoring::config::ScoringConfig;

/// Application configuration loaded from environment variables.
/// Only infrastructure settings come from the environment; backends fall back
/// to in-process implementations when their URL is unset.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub template_cache_ttl: Duration,
    pub batch_concurrency: usize,
    pub version_retention: usize,
    pub pass_threshold: f64,
    pub generation_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            port: parse_env("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            template_cache_ttl: Duration::from_secs(parse_env("TEMPLATE_CACHE_TTL_SECS", 7200u64)?),
            batch_concurrency: parse_env("BATCH_CONCURRENCY", 3usize)?.max(1),
            version_retention: parse_env("VERSION_RETENTION", 10usize)?.max(1),
            pass_threshold: parse_env("PASS_THRESHOLD", 75.0f64)?,
            generation_max_attempts: parse_env("GENERATION_MAX_ATTEMPTS", 3u32)?.max(1),
        })
    }

    /// Builds the engine configuration, applying env-level overrides on top of defaults.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut engine = EngineConfig::default();
        engine.scoring.pass_threshold = self.pass_threshold;
        engine.strategy.pass_threshold = self.pass_threshold;
        engine.retry.max_attempts = self.generation_max_attempts;
        engine
            .scoring
            .weights
            .validate()
            .map_err(anyhow::Error::msg)?;
        Ok(engine)
    }
}

/// All static tables and thresholds used by the engine, bundled so callers and
/// tests can substitute their own.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub vocabulary: Vocabulary,
    pub scoring: ScoringConfig,
    pub recommendation: RecommendationWeights,
    pub strategy: StrategyThresholds,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocabulary: Vocabulary::default(),
            scoring: ScoringConfig::default(),
            recommendation: RecommendationWeights::default(),
            strategy: StrategyThresholds::default(),
            retry: RetryPolicy::default(),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
