//! Recommendation Engine — ranks stored templates for a requirement profile.
//!
//! Algorithm (per active template of the requested kind):
//!   relevance = 0.3 × success_rate
//!             + 0.2 × average_score
//!             + 0.3 × (100 × overlap / template keyword count)
//!             + 20 if the role category is one of the template's
//!             + min(10, 0.1 × usage_count)
//!
//! Highest relevance wins; ties go to the lexicographically smallest id so
//! identical calls always pick the same template. Confidence is the winner's
//! `average_score`, or 0 when nothing qualifies.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::extractor::JobRequirements;
use crate::errors::AppError;
use crate::models::document::DocumentKind;
use crate::models::template::Template;
use crate::templates::store::TemplateStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationWeights {
    pub success_rate: f64,
    pub average_score: f64,
    pub keyword_overlap: f64,
    pub role_match_bonus: f64,
    pub usage_factor: f64,
    pub usage_cap: f64,
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self {
            success_rate: 0.3,
            average_score: 0.2,
            keyword_overlap: 0.3,
            role_match_bonus: 20.0,
            usage_factor: 0.1,
            usage_cap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedTemplate {
    pub template_id: String,
    pub relevance: f64,
    pub keyword_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub template: Option<Template>,
    pub confidence: f64,
    pub relevance: f64,
    /// Every candidate, best first.
    pub ranking: Vec<RankedTemplate>,
}

/// Number of template keywords present in the profile's keyword set.
fn keyword_overlap(requirements_keywords: &std::collections::BTreeSet<String>, template: &Template) -> usize {
    template
        .keywords
        .iter()
        .filter(|k| requirements_keywords.contains(k.as_str()))
        .count()
}

pub fn relevance(
    template: &Template,
    overlap: usize,
    role_category: &str,
    weights: &RecommendationWeights,
) -> f64 {
    let overlap_pct = if template.keywords.is_empty() {
        0.0
    } else {
        100.0 * overlap as f64 / template.keywords.len() as f64
    };
    let role_bonus = if template.role_categories.iter().any(|r| r == role_category) {
        weights.role_match_bonus
    } else {
        0.0
    };
    let usage = (weights.usage_factor * template.usage_count as f64).min(weights.usage_cap);

    weights.success_rate * template.success_rate
        + weights.average_score * template.average_score
        + weights.keyword_overlap * overlap_pct
        + role_bonus
        + usage
}

/// Picks the best active template of `kind`. Pure over the given candidates.
pub fn recommend(
    requirements: &JobRequirements,
    kind: DocumentKind,
    role_category: &str,
    templates: &[Template],
    weights: &RecommendationWeights,
) -> Recommendation {
    let keywords = requirements.keyword_set();

    let mut ranked: Vec<(&Template, RankedTemplate)> = templates
        .iter()
        .filter(|t| t.kind == kind && t.is_active)
        .map(|t| {
            let overlap = keyword_overlap(&keywords, t);
            let entry = RankedTemplate {
                template_id: t.id.clone(),
                relevance: relevance(t, overlap, role_category, weights),
                keyword_overlap: overlap,
            };
            (t, entry)
        })
        .collect();

    ranked.sort_by(|(_, a), (_, b)| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });

    let best = ranked.first().map(|(t, r)| ((*t).clone(), r.relevance));
    let ranking = ranked.into_iter().map(|(_, r)| r).collect();

    match best {
        Some((template, relevance)) => Recommendation {
            confidence: template.average_score,
            template: Some(template),
            relevance,
            ranking,
        },
        None => Recommendation {
            template: None,
            confidence: 0.0,
            relevance: 0.0,
            ranking,
        },
    }
}

/// Loads candidates of `kind` from the store and ranks them.
pub async fn recommend_from_store(
    store: &TemplateStore,
    requirements: &JobRequirements,
    kind: DocumentKind,
    role_category: &str,
    weights: &RecommendationWeights,
) -> Result<Recommendation, AppError> {
    let templates = store.list(Some(kind)).await?;
    let recommendation = recommend(requirements, kind, role_category, &templates, weights);
    tracing::debug!(
        kind = %kind,
        candidates = recommendation.ranking.len(),
        best = ?recommendation.template.as_ref().map(|t| t.id.as_str()),
        confidence = recommendation.confidence,
        "Template recommendation computed"
    );
    Ok(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extractor::extract_text;
    use crate::analysis::vocabulary::Vocabulary;

    fn requirements() -> JobRequirements {
        extract_text(
            "Backend role using Rust, PostgreSQL and Docker.",
            "Backend Engineer",
            &Vocabulary::default(),
        )
    }

    fn template(content: &str, keywords: &[&str], roles: &[&str], success: f64, average: f64, usage: i64) -> Template {
        let mut t = Template::new(
            DocumentKind::Cv,
            content,
            content,
            keywords.iter().map(|s| s.to_string()).collect(),
            roles.iter().map(|s| s.to_string()).collect(),
        );
        t.success_rate = success;
        t.average_score = average;
        t.usage_count = usage;
        t
    }

    #[test]
    fn test_relevance_formula() {
        let weights = RecommendationWeights::default();
        let t = template("a", &["rust", "go"], &["software_development"], 50.0, 80.0, 30);
        // 0.3×50 + 0.2×80 + 0.3×50 + 20 + min(10, 3)
        let expected = 15.0 + 16.0 + 15.0 + 20.0 + 3.0;
        assert!((relevance(&t, 1, "software_development", &weights) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_usage_bonus_is_capped() {
        let weights = RecommendationWeights::default();
        let t = template("a", &[], &[], 0.0, 0.0, 5000);
        assert!((relevance(&t, 0, "x", &weights) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_templates_means_no_recommendation() {
        let rec = recommend(
            &requirements(),
            DocumentKind::Cv,
            "software_development",
            &[],
            &RecommendationWeights::default(),
        );
        assert!(rec.template.is_none());
        assert_eq!(rec.confidence, 0.0);
    }

    #[test]
    fn test_best_template_wins_and_confidence_is_its_average() {
        let req = requirements();
        let strong = template("strong", &["rust", "postgresql"], &[req.role_category.as_str()], 90.0, 88.0, 12);
        let weak = template("weak", &["java"], &[], 40.0, 60.0, 2);
        let rec = recommend(
            &req,
            DocumentKind::Cv,
            &req.role_category,
            &[weak, strong.clone()],
            &RecommendationWeights::default(),
        );
        assert_eq!(rec.template.unwrap().id, strong.id);
        assert_eq!(rec.confidence, 88.0);
        assert_eq!(rec.ranking.len(), 2);
    }

    #[test]
    fn test_inactive_and_other_kinds_are_skipped() {
        let req = requirements();
        let mut inactive = template("inactive", &["rust"], &[], 100.0, 100.0, 100);
        inactive.is_active = false;
        let letter = Template::new(DocumentKind::CoverLetter, "letter", "letter", vec![], vec![]);
        let rec = recommend(
            &req,
            DocumentKind::Cv,
            "software_development",
            &[inactive, letter],
            &RecommendationWeights::default(),
        );
        assert!(rec.template.is_none());
        assert!(rec.ranking.is_empty());
    }

    #[test]
    fn test_ties_are_broken_by_id_regardless_of_input_order() {
        let req = requirements();
        let a = template("first body", &["rust"], &[], 50.0, 50.0, 0);
        let b = template("second body", &["rust"], &[], 50.0, 50.0, 0);
        let expected = if a.id < b.id { a.id.clone() } else { b.id.clone() };
        let weights = RecommendationWeights::default();

        let forward = recommend(&req, DocumentKind::Cv, "x", &[a.clone(), b.clone()], &weights);
        let backward = recommend(&req, DocumentKind::Cv, "x", &[b, a], &weights);
        assert_eq!(forward.template.unwrap().id, expected);
        assert_eq!(backward.template.unwrap().id, expected);
    }
}
