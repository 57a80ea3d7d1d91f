//! Compatibility Scorer — how well a document matches a requirement profile
//! and generic applicant-tracking format rules.
//!
//! Algorithm:
//! 1. Compute the five sub-scores (keyword match, format, content structure,
//!    readability, length), each in [0, 100]
//! 2. overall = Σ(weight × sub-score) with `ScoreWeights` (sums to 1.0)
//! 3. Recommendations are bucketed by the sub-score that produced them:
//!    < critical_below first, then < improve_below, then < polish_below;
//!    sub-score order is kept inside a bucket, truncated to `max_recommendations`
//! 4. passed = overall ≥ pass_threshold
//!
//! `AppState` holds an `Arc<dyn DocumentScorer>`; `AtsScorer` is the default.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::extractor::JobRequirements;
use crate::analysis::text::{normalize, word_count};
use crate::analysis::vocabulary::Vocabulary;
use crate::config::EngineConfig;
use crate::models::document::DocumentKind;
use crate::scoring::checks::{score_format, score_length, score_readability, score_structure, SubScore};
use crate::scoring::config::ScoringConfig;
use crate::scoring::keywords::score_keywords;

pub const KEYWORD_MATCH: &str = "keyword_match";
pub const FORMAT: &str = "format";
pub const CONTENT_STRUCTURE: &str = "content_structure";
pub const READABILITY: &str = "readability";
pub const LENGTH: &str = "length";

/// How many missing keywords are spelled out as recommendations.
const MISSING_KEYWORD_ADVICE: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub overall: f64,
    pub sub_scores: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
    pub critical_issues: Vec<String>,
    pub passed: bool,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub word_count: usize,
}

impl CompatibilityScore {
    pub fn sub_score(&self, name: &str) -> f64 {
        self.sub_scores.get(name).copied().unwrap_or(0.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Scores `text` against `requirements`. Pure and deterministic.
pub fn score_document(
    text: &str,
    requirements: &JobRequirements,
    kind: DocumentKind,
    vocabulary: &Vocabulary,
    config: &ScoringConfig,
) -> CompatibilityScore {
    let lower = normalize(text);

    let keywords = score_keywords(&lower, requirements, vocabulary, &config.keywords);
    let mut keyword_sub = SubScore {
        score: keywords.score,
        ..SubScore::default()
    };
    for missing in keywords.missing.iter().take(MISSING_KEYWORD_ADVICE) {
        keyword_sub
            .recommendations
            .push(format!("Work the keyword '{}' into the document", missing.keyword));
    }
    keyword_sub.critical_issues = keywords
        .critical_missing
        .iter()
        .map(|k| format!("Missing critical keyword: {k}"))
        .collect();

    let format = score_format(text, &config.format);
    let structure = score_structure(text, kind, &config.structure);
    let readability = score_readability(text, &config.readability);
    let (length, _) = score_length(text, kind, &config.length);

    let w = &config.weights;
    // Fixed order so the weighted sum is reproducible bit for bit.
    let parts: [(&str, f64, SubScore); 5] = [
        (KEYWORD_MATCH, w.keyword_match, keyword_sub),
        (FORMAT, w.format, format),
        (CONTENT_STRUCTURE, w.content_structure, structure),
        (READABILITY, w.readability, readability),
        (LENGTH, w.length, length),
    ];

    let mut overall = 0.0;
    let mut sub_scores = BTreeMap::new();
    let mut buckets: [Vec<String>; 3] = Default::default();
    let mut critical_issues = Vec::new();

    for (name, weight, sub) in parts {
        let score = sub.score.clamp(0.0, 100.0);
        overall += weight * score;
        sub_scores.insert(name.to_string(), score);
        critical_issues.extend(sub.critical_issues);

        let bucket = if score < config.critical_below {
            Some(0)
        } else if score < config.improve_below {
            Some(1)
        } else if score < config.polish_below {
            Some(2)
        } else {
            None
        };
        if let Some(i) = bucket {
            buckets[i].extend(sub.recommendations);
        }
    }

    let recommendations: Vec<String> = buckets
        .into_iter()
        .flatten()
        .take(config.max_recommendations)
        .collect();

    let overall = overall.clamp(0.0, 100.0);
    CompatibilityScore {
        overall,
        sub_scores,
        recommendations,
        critical_issues,
        passed: overall >= config.pass_threshold,
        matched_keywords: keywords.matched,
        missing_keywords: keywords.missing.into_iter().map(|k| k.keyword).collect(),
        word_count: word_count(text),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Scoring backend seam. Implement this to swap scorers without touching
/// the optimizer or handlers.
pub trait DocumentScorer: Send + Sync {
    fn score(&self, text: &str, requirements: &JobRequirements, kind: DocumentKind) -> CompatibilityScore;
}

/// Rule-based applicant-tracking scorer over the configured tables.
pub struct AtsScorer {
    engine: Arc<EngineConfig>,
}

impl AtsScorer {
    pub fn new(engine: Arc<EngineConfig>) -> Self {
        Self { engine }
    }
}

impl DocumentScorer for AtsScorer {
    fn score(&self, text: &str, requirements: &JobRequirements, kind: DocumentKind) -> CompatibilityScore {
        score_document(
            text,
            requirements,
            kind,
            &self.engine.vocabulary,
            &self.engine.scoring,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extractor::extract_text;
    use crate::scoring::checks::{assess_length, LengthBand};

    const POSTING: &str = "We are hiring a Backend Engineer to build services in Rust and Python.\n\
        You will work with PostgreSQL, Docker and Kubernetes on AWS.\n\
        Strong communication and teamwork skills. Agile environment.\n\
        - Design and operate APIs\n\
        - Improve reliability of our platform";

    const CV: &str = "# Jane Doe\n\
        jane.doe@example.com | +44 7700 900123\n\
        \n\
        ## EXPERIENCE\n\
        - **Led** a team of 6 engineers building Rust services on AWS\n\
        - Reduced latency by 40% by migrating Python workers to Rust\n\
        - Designed PostgreSQL schemas serving 2 million users\n\
        - Automated Docker and Kubernetes deployments, saving 10 hours per week\n\
        - Improved API reliability and mentored new hires\n\
        \n\
        ## SKILLS\n\
        Rust, Python, PostgreSQL, Docker, Kubernetes, AWS, Agile, communication, teamwork\n\
        \n\
        ## EDUCATION\n\
        BSc Computer Science\n";

    fn requirements() -> JobRequirements {
        extract_text(POSTING, "Backend Engineer", &Vocabulary::default())
    }

    fn score(text: &str, kind: DocumentKind) -> CompatibilityScore {
        score_document(
            text,
            &requirements(),
            kind,
            &Vocabulary::default(),
            &ScoringConfig::default(),
        )
    }

    #[test]
    fn test_scores_are_bounded() {
        let long = "word ".repeat(3000);
        for text in ["", "x", CV, long.as_str()] {
            for kind in [DocumentKind::Cv, DocumentKind::CoverLetter] {
                let result = score(text, kind);
                assert!((0.0..=100.0).contains(&result.overall));
                assert_eq!(result.sub_scores.len(), 5);
                for value in result.sub_scores.values() {
                    assert!((0.0..=100.0).contains(value));
                }
            }
        }
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let config = ScoringConfig::default();
        let result = score(CV, DocumentKind::Cv);
        let w = &config.weights;
        let expected = w.keyword_match * result.sub_score(KEYWORD_MATCH)
            + w.format * result.sub_score(FORMAT)
            + w.content_structure * result.sub_score(CONTENT_STRUCTURE)
            + w.readability * result.sub_score(READABILITY)
            + w.length * result.sub_score(LENGTH);
        assert!((result.overall - expected).abs() < 1e-9);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let first = score(CV, DocumentKind::Cv);
        for _ in 0..5 {
            let again = score(CV, DocumentKind::Cv);
            assert_eq!(again.overall, first.overall);
            assert_eq!(again.sub_scores, first.sub_scores);
            assert_eq!(again.recommendations, first.recommendations);
        }
    }

    #[test]
    fn test_pass_flag_follows_threshold() {
        let mut config = ScoringConfig::default();
        let req = requirements();
        let vocab = Vocabulary::default();
        let result = score_document(CV, &req, DocumentKind::Cv, &vocab, &config);
        assert_eq!(result.passed, result.overall >= 75.0);

        config.pass_threshold = 0.0;
        assert!(score_document("", &req, DocumentKind::Cv, &vocab, &config).passed);
    }

    #[test]
    fn test_tailored_cv_beats_unrelated_text() {
        let tailored = score(CV, DocumentKind::Cv);
        let unrelated = score("I like gardening and long walks.", DocumentKind::Cv);
        assert!(tailored.overall > unrelated.overall);
        assert!(tailored.sub_score(KEYWORD_MATCH) > unrelated.sub_score(KEYWORD_MATCH));
        assert!(tailored.sub_score(FORMAT) > unrelated.sub_score(FORMAT));
    }

    #[test]
    fn test_missing_critical_keyword_reported() {
        let result = score("Docker and Kubernetes only", DocumentKind::Cv);
        assert!(result
            .critical_issues
            .iter()
            .any(|c| c == "Missing critical keyword: rust"));
        assert!(result.missing_keywords.contains(&"rust".to_string()));
    }

    #[test]
    fn test_recommendations_are_capped_and_prioritized() {
        let result = score("", DocumentKind::Cv);
        assert!(result.recommendations.len() <= 10);
        // Empty text fails keyword advice first; it comes from the first bucket.
        assert!(result.recommendations[0].starts_with("Work the keyword"));
    }

    #[test]
    fn test_exact_length_boundaries() {
        let config = ScoringConfig::default();
        let cv = config.length.cv;

        let optimal = assess_length(cv.optimal, DocumentKind::Cv, &config.length);
        assert_eq!(optimal.band, LengthBand::Optimal);
        assert_eq!(optimal.score, 100.0);

        let text = vec!["word"; cv.min - 1].join(" ");
        let (sub, assessment) = score_length(&text, DocumentKind::Cv, &config.length);
        assert_eq!(assessment.band, LengthBand::TooShort);
        assert_eq!(assessment.gap, 1);
        assert!(sub.recommendations[0].contains("1 word below the minimum of 400"));
    }

    #[test]
    fn test_ats_scorer_uses_engine_tables() {
        let scorer = AtsScorer::new(Arc::new(EngineConfig::default()));
        let direct = score(CV, DocumentKind::Cv);
        let via_trait = scorer.score(CV, &requirements(), DocumentKind::Cv);
        assert_eq!(direct.overall, via_trait.overall);
    }
}
