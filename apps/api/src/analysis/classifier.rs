//! Role Classifier — maps a posting onto one of the weighted role vocabularies.
//!
//! Algorithm:
//! 1. Concatenate title + description and lower-case it
//! 2. For each role, sum the weights of every keyword contained in the text
//! 3. Highest sum wins; ties go to the role declared first
//! 4. No hits at all → `Vocabulary::default_role`

use serde::{Deserialize, Serialize};

use crate::analysis::vocabulary::Vocabulary;

/// Summed keyword weight for one role category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleScore {
    pub category: String,
    pub score: f64,
    pub matched_keywords: Vec<String>,
}

/// Returns the best-matching role category for a posting. Never fails.
pub fn classify(title: &str, description: &str, vocabulary: &Vocabulary) -> String {
    let scores = role_scores(title, description, vocabulary);

    let mut best: Option<&RoleScore> = None;
    for candidate in &scores {
        // Strict comparison keeps the first-declared role on ties.
        if candidate.score > 0.0 && best.map_or(true, |b| candidate.score > b.score) {
            best = Some(candidate);
        }
    }

    best.map(|b| b.category.clone())
        .unwrap_or_else(|| vocabulary.default_role.clone())
}

/// Per-role scores in declaration order. Matching is plain case-insensitive containment.
pub fn role_scores(title: &str, description: &str, vocabulary: &Vocabulary) -> Vec<RoleScore> {
    let text = format!("{} {}", title, description).to_lowercase();

    vocabulary
        .roles
        .iter()
        .map(|role| {
            let mut score = 0.0;
            let mut matched_keywords = Vec::new();
            for (keyword, weight) in &role.keywords {
                if text.contains(keyword.as_str()) {
                    score += weight;
                    matched_keywords.push(keyword.clone());
                }
            }
            RoleScore {
                category: role.category.clone(),
                score,
                matched_keywords,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::vocabulary::{RoleVocabulary, SkillCategory};

    fn small_vocabulary() -> Vocabulary {
        Vocabulary {
            roles: vec![
                RoleVocabulary {
                    category: "alpha".to_string(),
                    primary_skill: SkillCategory::Languages,
                    keywords: vec![("widget".to_string(), 2.0)],
                },
                RoleVocabulary {
                    category: "beta".to_string(),
                    primary_skill: SkillCategory::Tooling,
                    keywords: vec![("gadget".to_string(), 2.0), ("gizmo".to_string(), 1.0)],
                },
            ],
            default_role: "fallback".to_string(),
            ..Vocabulary::default()
        }
    }

    #[test]
    fn test_data_science_posting() {
        let vocab = Vocabulary::default();
        let role = classify(
            "Data Scientist",
            "Build machine learning models and run statistics on product analytics.",
            &vocab,
        );
        assert_eq!(role, "data_science");
    }

    #[test]
    fn test_devops_posting() {
        let vocab = Vocabulary::default();
        let role = classify(
            "Site Reliability Engineer",
            "Own our infrastructure: Kubernetes, Terraform, CI/CD pipelines and monitoring.",
            &vocab,
        );
        assert_eq!(role, "devops");
    }

    #[test]
    fn test_no_keywords_returns_default() {
        let vocab = Vocabulary::default();
        let role = classify("Barista", "Pour excellent coffee for our guests.", &vocab);
        assert_eq!(role, "software_development");
    }

    #[test]
    fn test_empty_text_returns_default() {
        let vocab = small_vocabulary();
        assert_eq!(classify("", "", &vocab), "fallback");
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let vocab = small_vocabulary();
        // widget = 2.0 (alpha), gadget = 2.0 (beta)
        assert_eq!(classify("widget gadget", "", &vocab), "alpha");
    }

    #[test]
    fn test_higher_sum_wins() {
        let vocab = small_vocabulary();
        assert_eq!(classify("widget", "gadget and a gizmo", &vocab), "beta");
    }

    #[test]
    fn test_case_insensitive() {
        let vocab = small_vocabulary();
        assert_eq!(classify("GADGET", "", &vocab), "beta");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let vocab = Vocabulary::default();
        let text = "Senior backend developer working on APIs and machine learning";
        let first = classify("Engineer", text, &vocab);
        for _ in 0..10 {
            assert_eq!(classify("Engineer", text, &vocab), first);
        }
    }

    #[test]
    fn test_role_scores_report_matches() {
        let vocab = small_vocabulary();
        let scores = role_scores("gizmo gadget", "", &vocab);
        assert_eq!(scores[1].matched_keywords, vec!["gadget", "gizmo"]);
        assert!((scores[1].score - 3.0).abs() < f64::EPSILON);
        assert_eq!(scores[0].score, 0.0);
    }
}
