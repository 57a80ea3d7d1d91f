use serde::{Deserialize, Serialize};

use crate::analysis::vocabulary::SkillCategory;
use crate::models::document::DocumentKind;

/// Weight vector of the overall score. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub keyword_match: f64,
    pub format: f64,
    pub content_structure: f64,
    pub readability: f64,
    pub length: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keyword_match: 0.35,
            format: 0.25,
            content_structure: 0.20,
            readability: 0.10,
            length: 0.10,
        }
    }
}

impl ScoreWeights {
    pub const TOLERANCE: f64 = 1e-6;

    pub fn sum(&self) -> f64 {
        self.keyword_match + self.format + self.content_structure + self.readability + self.length
    }

    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.keyword_match,
            self.format,
            self.content_structure,
            self.readability,
            self.length,
        ];
        if all.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err("score weights must be finite and non-negative".to_string());
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > Self::TOLERANCE {
            return Err(format!("score weights must sum to 1.0, got {sum}"));
        }
        Ok(())
    }
}

/// Importance weights used by the keyword sub-score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRules {
    pub category_weights: Vec<(SkillCategory, f64)>,
    pub soft_skill_weight: f64,
    pub methodology_weight: f64,
    /// Applied on top of the category weight for the role's primary category.
    pub primary_multiplier: f64,
    /// Missing keywords weighing more than this are reported as critical.
    pub critical_threshold: f64,
    pub required_share: f64,
    pub job_specific_share: f64,
    pub role_bonus_per_hit: f64,
    pub role_bonus_cap: f64,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self {
            category_weights: vec![
                (SkillCategory::Languages, 3.0),
                (SkillCategory::Frameworks, 2.5),
                (SkillCategory::Datastores, 2.0),
                (SkillCategory::CloudPlatforms, 2.0),
                (SkillCategory::Tooling, 1.5),
            ],
            soft_skill_weight: 1.0,
            methodology_weight: 1.0,
            primary_multiplier: 1.5,
            critical_threshold: 2.0,
            required_share: 0.6,
            job_specific_share: 0.4,
            role_bonus_per_hit: 2.0,
            role_bonus_cap: 10.0,
        }
    }
}

impl KeywordRules {
    pub fn category_weight(&self, category: SkillCategory) -> f64 {
        self.category_weights
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, w)| *w)
            .unwrap_or(1.0)
    }
}

/// Points awarded by each format check. The sub-score is capped at 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRules {
    pub headings: f64,
    pub bullets: f64,
    pub emphasis: f64,
    pub email: f64,
    pub phone: f64,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            headings: 25.0,
            bullets: 25.0,
            emphasis: 15.0,
            email: 20.0,
            phone: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRules {
    /// Required résumé sections, each with the heading synonyms that satisfy it.
    pub cv_sections: Vec<(String, Vec<String>)>,
    pub salutations: Vec<String>,
    pub closings: Vec<String>,
    pub action_verbs: Vec<String>,
    pub section_points: f64,
    pub quantified_points: f64,
    pub action_verb_points: f64,
    pub cv_min_quantified: usize,
    pub cover_letter_min_quantified: usize,
    pub cv_min_action_verbs: usize,
    pub cover_letter_min_action_verbs: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for StructureRules {
    fn default() -> Self {
        Self {
            cv_sections: vec![
                (
                    "experience".to_string(),
                    strings(&["experience", "work history", "employment", "professional background"]),
                ),
                (
                    "skills".to_string(),
                    strings(&["skills", "competencies", "technologies", "tech stack"]),
                ),
                (
                    "education".to_string(),
                    strings(&["education", "qualifications", "academic background"]),
                ),
            ],
            salutations: strings(&["dear", "hello", "hi", "to whom it may concern", "greetings"]),
            closings: strings(&[
                "sincerely",
                "best regards",
                "kind regards",
                "warm regards",
                "regards",
                "yours faithfully",
                "yours truly",
                "respectfully",
                "thank you for your consideration",
            ]),
            action_verbs: strings(&[
                "achieved", "architected", "automated", "built", "created", "delivered",
                "designed", "developed", "drove", "engineered", "established", "implemented",
                "improved", "increased", "launched", "led", "managed", "mentored", "migrated",
                "negotiated", "optimized", "owned", "reduced", "resolved", "scaled", "shipped",
                "spearheaded", "streamlined",
            ]),
            section_points: 50.0,
            quantified_points: 25.0,
            action_verb_points: 25.0,
            cv_min_quantified: 3,
            cover_letter_min_quantified: 1,
            cv_min_action_verbs: 5,
            cover_letter_min_action_verbs: 2,
        }
    }
}

impl StructureRules {
    pub fn min_quantified(&self, kind: DocumentKind) -> usize {
        match kind {
            DocumentKind::Cv => self.cv_min_quantified,
            DocumentKind::CoverLetter => self.cover_letter_min_quantified,
        }
    }

    pub fn min_action_verbs(&self, kind: DocumentKind) -> usize {
        match kind {
            DocumentKind::Cv => self.cv_min_action_verbs,
            DocumentKind::CoverLetter => self.cover_letter_min_action_verbs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadabilityRules {
    pub long_sentence_words: f64,
    pub long_sentence_penalty: f64,
    pub very_long_sentence_words: f64,
    /// Deducted in addition to `long_sentence_penalty`.
    pub very_long_sentence_penalty: f64,
    pub long_word_chars: f64,
    pub long_word_penalty: f64,
    pub passive_ratio: f64,
    pub passive_penalty: f64,
}

impl Default for ReadabilityRules {
    fn default() -> Self {
        Self {
            long_sentence_words: 20.0,
            long_sentence_penalty: 10.0,
            very_long_sentence_words: 25.0,
            very_long_sentence_penalty: 10.0,
            long_word_chars: 6.0,
            long_word_penalty: 10.0,
            passive_ratio: 0.10,
            passive_penalty: 15.0,
        }
    }
}

/// Word-count window for one document kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min: usize,
    pub optimal: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthRules {
    pub cv: LengthRange,
    pub cover_letter: LengthRange,
    /// Fraction of `optimal` counted as "on target".
    pub optimal_tolerance: f64,
    pub optimal_score: f64,
    pub acceptable_score: f64,
    pub floor_score: f64,
}

impl Default for LengthRules {
    fn default() -> Self {
        Self {
            cv: LengthRange {
                min: 400,
                optimal: 600,
                max: 800,
            },
            cover_letter: LengthRange {
                min: 250,
                optimal: 350,
                max: 450,
            },
            optimal_tolerance: 0.10,
            optimal_score: 100.0,
            acceptable_score: 80.0,
            floor_score: 40.0,
        }
    }
}

impl LengthRules {
    pub fn range(&self, kind: DocumentKind) -> LengthRange {
        match kind {
            DocumentKind::Cv => self.cv,
            DocumentKind::CoverLetter => self.cover_letter,
        }
    }
}

/// Everything the compatibility scorer needs besides the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub keywords: KeywordRules,
    pub format: FormatRules,
    pub structure: StructureRules,
    pub readability: ReadabilityRules,
    pub length: LengthRules,
    pub pass_threshold: f64,
    pub critical_below: f64,
    pub improve_below: f64,
    pub polish_below: f64,
    pub max_recommendations: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            keywords: KeywordRules::default(),
            format: FormatRules::default(),
            structure: StructureRules::default(),
            readability: ReadabilityRules::default(),
            length: LengthRules::default(),
            pass_threshold: 75.0,
            critical_below: 60.0,
            improve_below: 75.0,
            polish_below: 85.0,
            max_recommendations: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        assert!((w.sum() - 1.0).abs() < ScoreWeights::TOLERANCE);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let w = ScoreWeights {
            keyword_match: 0.5,
            ..ScoreWeights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let w = ScoreWeights {
            keyword_match: 0.55,
            format: -0.05,
            ..ScoreWeights::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_length_ranges_are_ordered() {
        let rules = LengthRules::default();
        for kind in [DocumentKind::Cv, DocumentKind::CoverLetter] {
            let r = rules.range(kind);
            assert!(r.min < r.optimal && r.optimal < r.max);
        }
    }

    #[test]
    fn test_category_weight_lookup() {
        let rules = KeywordRules::default();
        assert_eq!(rules.category_weight(SkillCategory::Languages), 3.0);
        assert_eq!(rules.category_weight(SkillCategory::Tooling), 1.5);
    }
}
