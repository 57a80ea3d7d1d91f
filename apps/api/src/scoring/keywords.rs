//! Keyword-match sub-score.
//!
//! Algorithm:
//! 1. Required keywords = technical skills (category weight, boosted for the primary
//!    category) + soft skills + methodologies
//! 2. required_pct = matched weight / total weight × 100
//! 3. job_pct = matched job-specific keywords / job-specific keywords × 100
//! 4. score = 0.6 × required_pct + 0.4 × job_pct + role bonus, capped at 100

use serde::{Deserialize, Serialize};

use crate::analysis::extractor::JobRequirements;
use crate::analysis::text::contains_term;
use crate::analysis::vocabulary::Vocabulary;
use crate::scoring::config::KeywordRules;

/// A keyword the document is expected to contain, with its importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub keyword: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub score: f64,
    pub required_pct: f64,
    pub job_specific_pct: f64,
    pub role_bonus: f64,
    pub matched: Vec<String>,
    pub missing: Vec<WeightedKeyword>,
    pub critical_missing: Vec<String>,
}

/// Builds the weighted required-keyword list. The first occurrence of a term wins.
pub fn required_keywords(requirements: &JobRequirements, rules: &KeywordRules) -> Vec<WeightedKeyword> {
    let mut required: Vec<WeightedKeyword> = Vec::new();
    let mut push = |keyword: &str, weight: f64| {
        if !required.iter().any(|k| k.keyword == keyword) {
            required.push(WeightedKeyword {
                keyword: keyword.to_string(),
                weight,
            });
        }
    };

    for (category, term) in requirements.technical_skills.iter() {
        let mut weight = rules.category_weight(category);
        if category == requirements.primary_skill_category {
            weight *= rules.primary_multiplier;
        }
        push(term, weight);
    }
    for soft in &requirements.soft_skills {
        push(soft, rules.soft_skill_weight);
    }
    for method in &requirements.methodologies {
        push(method, rules.methodology_weight);
    }
    required
}

/// Scores an already lower-cased document against the requirement profile.
pub fn score_keywords(
    document_lower: &str,
    requirements: &JobRequirements,
    vocabulary: &Vocabulary,
    rules: &KeywordRules,
) -> KeywordAnalysis {
    let required = required_keywords(requirements, rules);

    let mut total_weight = 0.0;
    let mut matched_weight = 0.0;
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for kw in required {
        total_weight += kw.weight;
        if contains_term(document_lower, &kw.keyword) {
            matched_weight += kw.weight;
            matched.push(kw.keyword);
        } else {
            missing.push(kw);
        }
    }

    // Nothing required means nothing can be missing.
    let required_pct = if total_weight > 0.0 {
        matched_weight / total_weight * 100.0
    } else {
        100.0
    };

    let job_keywords = &requirements.job_specific_keywords;
    let job_specific_pct = if job_keywords.is_empty() {
        100.0
    } else {
        let hits = job_keywords
            .iter()
            .filter(|k| contains_term(document_lower, k))
            .count();
        hits as f64 / job_keywords.len() as f64 * 100.0
    };

    let role_bonus = vocabulary
        .role(&requirements.role_category)
        .map(|role| {
            let hits = role
                .keywords
                .iter()
                .filter(|(k, _)| contains_term(document_lower, k))
                .count();
            (hits as f64 * rules.role_bonus_per_hit).min(rules.role_bonus_cap)
        })
        .unwrap_or(0.0);

    let score = (rules.required_share * required_pct
        + rules.job_specific_share * job_specific_pct
        + role_bonus)
        .clamp(0.0, 100.0);

    // Heaviest gaps first; ties keep extraction order.
    missing.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let critical_missing = missing
        .iter()
        .filter(|k| k.weight > rules.critical_threshold)
        .map(|k| k.keyword.clone())
        .collect();

    KeywordAnalysis {
        score,
        required_pct,
        job_specific_pct,
        role_bonus,
        matched,
        missing,
        critical_missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extractor::extract_text;

    fn requirements() -> JobRequirements {
        extract_text(
            "We need Rust, PostgreSQL and Docker. Agile team, great communication.",
            "Backend Engineer",
            &Vocabulary::default(),
        )
    }

    #[test]
    fn test_full_match_scores_high() {
        let vocab = Vocabulary::default();
        let req = requirements();
        let doc = "rust postgresql docker agile communication backend engineer team need great \
                   developer programming api";
        let analysis = score_keywords(doc, &req, &vocab, &KeywordRules::default());
        assert!((analysis.required_pct - 100.0).abs() < 1e-9);
        assert!(analysis.missing.is_empty());
        assert!(analysis.score <= 100.0);
    }

    #[test]
    fn test_missing_language_is_critical() {
        let vocab = Vocabulary::default();
        let req = requirements();
        let analysis = score_keywords("postgresql docker", &req, &vocab, &KeywordRules::default());
        assert!(analysis.critical_missing.contains(&"rust".to_string()));
        // tooling weight 1.5 is below the critical threshold
        assert!(!analysis.critical_missing.contains(&"docker".to_string()));
        assert_eq!(analysis.missing[0].keyword, "rust");
    }

    #[test]
    fn test_primary_category_is_boosted() {
        let req = requirements();
        let rules = KeywordRules::default();
        let required = required_keywords(&req, &rules);
        let rust = required.iter().find(|k| k.keyword == "rust").unwrap();
        assert!((rust.weight - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_profile_scores_full() {
        let vocab = Vocabulary::default();
        let req = extract_text("", "", &vocab);
        let analysis = score_keywords("anything", &req, &vocab, &KeywordRules::default());
        assert!((analysis.required_pct - 100.0).abs() < 1e-9);
        assert!((analysis.job_specific_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_adding_present_keyword_never_decreases_score() {
        let vocab = Vocabulary::default();
        let rules = KeywordRules::default();
        let doc = "rust and kafka experience";
        let req = requirements();
        let before = score_keywords(doc, &req, &vocab, &rules);

        let mut extended = req.clone();
        extended.technical_skills.tooling.insert("kafka".to_string());
        let after = score_keywords(doc, &extended, &vocab, &rules);

        assert!(after.score >= before.score);
        assert!(after.required_pct >= before.required_pct);
    }

    #[test]
    fn test_role_bonus_is_capped() {
        let vocab = Vocabulary::default();
        let rules = KeywordRules::default();
        let req = requirements();
        let doc = "software engineer software developer developer backend full stack \
                   programming microservices api software";
        let analysis = score_keywords(doc, &req, &vocab, &rules);
        assert!((analysis.role_bonus - rules.role_bonus_cap).abs() < 1e-9);
    }
}
