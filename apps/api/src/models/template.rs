use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::document::DocumentKind;

/// A reusable document body with rolling performance aggregates.
/// Aggregates are written only by `TemplateStore::record_performance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub kind: DocumentKind,
    pub name: String,
    pub keywords: Vec<String>,
    pub role_categories: Vec<String>,
    pub usage_count: i64,
    pub success_rate: f64,
    pub average_score: f64,
    pub last_used: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn new(
        kind: DocumentKind,
        name: impl Into<String>,
        initial_content: &str,
        keywords: Vec<String>,
        role_categories: Vec<String>,
    ) -> Self {
        Self {
            id: template_id(kind, initial_content),
            kind,
            name: name.into(),
            keywords: normalize_tags(keywords),
            role_categories: normalize_tags(role_categories),
            usage_count: 0,
            success_rate: 0.0,
            average_score: 0.0,
            last_used: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Deterministic id: `<kind>_<first 16 hex chars of sha256(kind || content)>`.
pub fn template_id(kind: DocumentKind, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("{}_{}", kind.as_str(), hex)
}

/// Lower-cased, trimmed, deduplicated, first occurrence kept.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Immutable content snapshot. Versions start at 1 and never skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub template_id: String,
    pub version: i32,
    pub content: String,
    pub performance_score: Option<f64>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// The three sub-scores kept with every produced document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScores {
    pub overall: f64,
    pub keyword: f64,
    pub format: f64,
    pub structure: f64,
}

/// One row per document actually produced. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub id: Uuid,
    pub template_id: String,
    pub job_title: String,
    pub company: String,
    pub overall_score: f64,
    pub keyword_score: f64,
    pub format_score: f64,
    pub structure_score: f64,
    pub success: bool,
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceRecord {
    pub fn new(
        template_id: &str,
        job_title: &str,
        company: &str,
        scores: PerformanceScores,
        success: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: template_id.to_string(),
            job_title: job_title.to_string(),
            company: company.to_string(),
            overall_score: scores.overall,
            keyword_score: scores.keyword,
            format_score: scores.format,
            structure_score: scores.structure,
            success,
            recorded_at: Utc::now(),
        }
    }
}

/// Rolling aggregates recomputed from the full performance history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemplateAggregates {
    pub usage_count: i64,
    pub success_rate: f64,
    pub average_score: f64,
    pub last_used: Option<DateTime<Utc>>,
}

impl TemplateAggregates {
    /// usage = count, success_rate = 100 × successes / count, average = mean(overall).
    pub fn from_records(records: &[PerformanceRecord]) -> Self {
        if records.is_empty() {
            return Self {
                usage_count: 0,
                success_rate: 0.0,
                average_score: 0.0,
                last_used: None,
            };
        }
        let count = records.len() as f64;
        let successes = records.iter().filter(|r| r.success).count() as f64;
        let total: f64 = records.iter().map(|r| r.overall_score).sum();
        Self {
            usage_count: records.len() as i64,
            success_rate: 100.0 * successes / count,
            average_score: total / count,
            last_used: records.iter().map(|r| r.recorded_at).max(),
        }
    }
}

/// What `TemplateStore::get_latest` returns: the template record plus its newest content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateWithContent {
    pub template: Template,
    pub latest: TemplateVersion,
}
