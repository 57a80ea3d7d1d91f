//! Narrow interfaces to the outside world: content generation, rendering and
//! delivery. The engine never produces document text on its own; it validates
//! what a `ContentGenerator` returns before scoring it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::extractor::JobRequirements;
use crate::analysis::text::{contains_term, normalize, word_count};
use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::recommendation::strategy::OptimizationStrategy;
use crate::scoring::config::LengthRules;

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator returned empty output")]
    EmptyOutput,

    #[error("generator output rejected: {0}")]
    InvalidOutput(String),

    #[error("no template or base document to generate from")]
    NoSource,

    #[error("generator unavailable: {message}")]
    Unavailable { message: String, retryable: bool },
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Unavailable { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Everything a generator gets to work with for one document.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub kind: DocumentKind,
    pub strategy: OptimizationStrategy,
    pub requirements: JobRequirements,
    pub company: String,
    /// Recommended template content, or the caller's base document.
    pub source: Option<String>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Local placeholder substitution over the source text.
///
/// Placeholders: `{{company}}`, `{{job_title}}`, `{{skills}}`, `{{role}}`.
/// A full regeneration additionally appends the profile's technical skills
/// the source does not mention yet.
pub struct TemplateFillGenerator {
    pub max_listed_skills: usize,
}

impl Default for TemplateFillGenerator {
    fn default() -> Self {
        Self { max_listed_skills: 8 }
    }
}

impl TemplateFillGenerator {
    fn skills(&self, requirements: &JobRequirements) -> Vec<String> {
        requirements
            .technical_skills
            .iter()
            .map(|(_, s)| s.to_string())
            .take(self.max_listed_skills)
            .collect()
    }
}

#[async_trait]
impl ContentGenerator for TemplateFillGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let source = request.source.as_deref().ok_or(GenerationError::NoSource)?;
        let req = &request.requirements;
        let skills = self.skills(req);

        let mut text = source
            .replace("{{company}}", &request.company)
            .replace("{{job_title}}", &req.title)
            .replace("{{skills}}", &skills.join(", "))
            .replace("{{role}}", &req.role_category.replace('_', " "));

        if request.strategy == OptimizationStrategy::FullRegeneration {
            let lower = normalize(&text);
            let missing: Vec<&str> = skills
                .iter()
                .map(String::as_str)
                .filter(|s| !contains_term(&lower, s))
                .collect();
            if !missing.is_empty() {
                text.push_str("\n\nRelevant skills: ");
                text.push_str(&missing.join(", "));
                text.push('\n');
            }
        }

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyOutput);
        }
        Ok(text)
    }
}

/// Rejects empty text and text far outside the kind's length window:
/// fewer than half the minimum or more than twice the maximum words.
pub fn validate_candidate(text: &str, kind: DocumentKind, rules: &LengthRules) -> Result<(), GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyOutput);
    }
    let range = rules.range(kind);
    let words = word_count(text);
    let lower = range.min / 2;
    let upper = range.max * 2;
    if words < lower || words > upper {
        return Err(GenerationError::InvalidOutput(format!(
            "{words} words is outside the accepted {lower}–{upper} for a {kind}"
        )));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Retry policy
// ────────────────────────────────────────────────────────────────────────────

/// Bounded retries with exponential backoff (base, 2×base, 4×base, ...).
/// Only retryable `GenerationError`s are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "Generation attempt {}/{} failed ({e}), retrying after {}ms...",
                        attempt,
                        attempts,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub bytes: Bytes,
    pub content_type: String,
    pub valid: bool,
}

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, text: &str, kind: DocumentKind) -> Result<RenderedArtifact, AppError>;
}

/// UTF-8 plain text. Typesetting lives outside this service.
pub struct PlainTextRenderer;

#[async_trait]
impl DocumentRenderer for PlainTextRenderer {
    async fn render(&self, text: &str, _kind: DocumentKind) -> Result<RenderedArtifact, AppError> {
        Ok(RenderedArtifact {
            bytes: Bytes::copy_from_slice(text.as_bytes()),
            content_type: "text/plain; charset=utf-8".to_string(),
            valid: !text.trim().is_empty(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Delivery
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub recipient: String,
    #[serde(default)]
    pub subject: Option<String>,
}

#[async_trait]
pub trait DocumentDelivery: Send + Sync {
    /// `Ok(false)` means the destination refused the artifact.
    async fn deliver(&self, artifact: &RenderedArtifact, destination: &Destination) -> Result<bool, AppError>;
}

/// Logs the hand-off and reports success.
pub struct LogDelivery;

#[async_trait]
impl DocumentDelivery for LogDelivery {
    async fn deliver(&self, artifact: &RenderedArtifact, destination: &Destination) -> Result<bool, AppError> {
        info!(
            recipient = %destination.recipient,
            subject = destination.subject.as_deref().unwrap_or(""),
            bytes = artifact.bytes.len(),
            content_type = %artifact.content_type,
            "Document handed off for delivery"
        );
        Ok(true)
    }
}
