//! Rule-based sub-scores: format, content structure, readability and length.
//!
//! Each check returns a `SubScore` carrying its own recommendations; the
//! compatibility module decides which of them surface.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::text::{contains_term, normalize, word_count};
use crate::models::document::DocumentKind;
use crate::scoring::config::{FormatRules, LengthRules, ReadabilityRules, StructureRules};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S.*|[A-Z][A-Z0-9 &/\-]{2,40}:?|[A-Z][A-Za-z &/\-]{2,40}:)[ \t]*$")
        .unwrap()
});
static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:[-*•▪]|\d+[.)])[ \t]+\S").unwrap());
static EMPHASIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*[^*\n]+\*\*|__[^_\n]+__").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{2,4}\)[ .-]?)?\d{2,4}(?:[ .-]?\d{2,4}){2,4}").unwrap());
static QUANTIFIED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)[$€£]\s?\d[\d,.]*(?:\s*(?:k|m|million|billion)\b)?|\b\d+(?:[.,]\d+)?\s*(?:%|percent\b|x\b|\+|k\b|(?:million|billion|users|customers|clients|people|engineers|projects|teams|hours|days|weeks|months|requests|transactions)\b)",
    )
    .unwrap()
});
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+|\n+").unwrap());
static PASSIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:am|is|are|was|were|be|been|being)\s+\w+(?:ed|en)\b").unwrap()
});

/// One sub-score with the advice it produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubScore {
    pub score: f64,
    pub recommendations: Vec<String>,
    pub critical_issues: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Format
// ────────────────────────────────────────────────────────────────────────────

pub fn score_format(document: &str, rules: &FormatRules) -> SubScore {
    let mut result = SubScore::default();

    let has_email = EMAIL_RE.is_match(document);
    let has_phone = PHONE_RE
        .find_iter(document)
        .any(|m| m.as_str().chars().filter(|c| c.is_ascii_digit()).count() >= 9);

    let checks: [(bool, f64, &str); 5] = [
        (
            HEADING_RE.is_match(document),
            rules.headings,
            "Add clear section headings (e.g. EXPERIENCE, SKILLS, EDUCATION)",
        ),
        (
            BULLET_RE.is_match(document),
            rules.bullets,
            "Use bullet points to list responsibilities and achievements",
        ),
        (
            EMPHASIS_RE.is_match(document),
            rules.emphasis,
            "Emphasize job titles or key results with bold text",
        ),
        (has_email, rules.email, "Include an email address in the header"),
        (has_phone, rules.phone, "Include a phone number in the header"),
    ];

    for (passed, points, advice) in checks {
        if passed {
            result.score += points;
        } else {
            result.recommendations.push(advice.to_string());
        }
    }
    result.score = result.score.min(100.0);

    if !has_email && !has_phone {
        result
            .critical_issues
            .push("No contact information (email or phone) found".to_string());
    }
    result
}

// ────────────────────────────────────────────────────────────────────────────
// Content structure
// ────────────────────────────────────────────────────────────────────────────

pub fn score_structure(document: &str, kind: DocumentKind, rules: &StructureRules) -> SubScore {
    let mut result = SubScore::default();
    let lower = normalize(document);

    // Sections
    match kind {
        DocumentKind::Cv => {
            let missing: Vec<&str> = rules
                .cv_sections
                .iter()
                .filter(|(_, synonyms)| !has_section_heading(document, synonyms))
                .map(|(name, _)| name.as_str())
                .collect();
            let total = rules.cv_sections.len().max(1) as f64;
            let found = rules.cv_sections.len() - missing.len();
            result.score += rules.section_points * found as f64 / total;
            for name in missing {
                result
                    .recommendations
                    .push(format!("Add a dedicated '{name}' section"));
                result
                    .critical_issues
                    .push(format!("Missing required section: {name}"));
            }
        }
        DocumentKind::CoverLetter => {
            let lines: Vec<String> = document
                .lines()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect();
            let has_salutation = lines
                .iter()
                .take(5)
                .any(|l| rules.salutations.iter().any(|s| starts_with_term(l, s)));
            let has_closing = lines
                .iter()
                .rev()
                .take(6)
                .any(|l| rules.closings.iter().any(|c| contains_term(l, c)));

            let half = rules.section_points / 2.0;
            if has_salutation {
                result.score += half;
            } else {
                result
                    .recommendations
                    .push("Open with a personal salutation (e.g. 'Dear Hiring Manager')".to_string());
            }
            if has_closing {
                result.score += half;
            } else {
                result
                    .recommendations
                    .push("Finish with a professional closing (e.g. 'Kind regards')".to_string());
            }
        }
    }

    // Quantified achievements
    let quantified = QUANTIFIED_RE.find_iter(document).count();
    let min_quantified = rules.min_quantified(kind).max(1);
    result.score += rules.quantified_points * (quantified.min(min_quantified) as f64 / min_quantified as f64);
    if quantified < min_quantified {
        result.recommendations.push(format!(
            "Quantify more achievements: found {quantified}, aim for at least {min_quantified} (percentages, amounts, team sizes)"
        ));
    }

    // Action verbs
    let verbs = rules
        .action_verbs
        .iter()
        .filter(|v| contains_term(&lower, v))
        .count();
    let min_verbs = rules.min_action_verbs(kind).max(1);
    result.score += rules.action_verb_points * (verbs.min(min_verbs) as f64 / min_verbs as f64);
    if verbs < min_verbs {
        result.recommendations.push(format!(
            "Start more statements with strong action verbs: found {verbs}, aim for at least {min_verbs}"
        ));
    }

    result.score = result.score.clamp(0.0, 100.0);
    result
}

/// A heading-like line (short, possibly prefixed by '#', optionally ending in ':')
/// that contains one of the synonyms.
fn has_section_heading(document: &str, synonyms: &[String]) -> bool {
    document.lines().any(|line| {
        let cleaned = line
            .trim()
            .trim_start_matches('#')
            .trim()
            .trim_end_matches(':')
            .trim()
            .to_lowercase();
        !cleaned.is_empty()
            && cleaned.chars().count() <= 40
            && synonyms.iter().any(|s| contains_term(&cleaned, s))
    })
}

fn starts_with_term(line: &str, term: &str) -> bool {
    line.strip_prefix(term)
        .is_some_and(|rest| rest.chars().next().map_or(true, |c| !c.is_alphanumeric()))
}

// ────────────────────────────────────────────────────────────────────────────
// Readability
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadabilityStats {
    pub words: usize,
    pub sentences: usize,
    pub avg_sentence_words: f64,
    pub avg_word_chars: f64,
    pub passive_ratio: f64,
}

pub fn readability_stats(document: &str) -> ReadabilityStats {
    let words: Vec<&str> = document
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .collect();
    if words.is_empty() {
        return ReadabilityStats::default();
    }

    let sentence_lengths: Vec<usize> = SENTENCE_SPLIT_RE
        .split(document)
        .map(word_count)
        .filter(|n| *n > 0)
        .collect();
    let sentences = sentence_lengths.len().max(1);
    let sentence_words: usize = sentence_lengths.iter().sum();

    let chars: usize = words
        .iter()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).count())
        .sum();
    let passive = PASSIVE_RE.find_iter(document).count();

    ReadabilityStats {
        words: words.len(),
        sentences,
        avg_sentence_words: sentence_words as f64 / sentences as f64,
        avg_word_chars: chars as f64 / words.len() as f64,
        passive_ratio: passive as f64 / words.len() as f64,
    }
}

pub fn score_readability(document: &str, rules: &ReadabilityRules) -> SubScore {
    let stats = readability_stats(document);
    let mut result = SubScore::default();

    // Nothing to penalise; length and structure already score an empty text down.
    if stats.words == 0 {
        result.score = 100.0;
        result.critical_issues.push("Document is empty".to_string());
        return result;
    }

    let mut score: f64 = 100.0;
    if stats.avg_sentence_words > rules.long_sentence_words {
        score -= rules.long_sentence_penalty;
        if stats.avg_sentence_words > rules.very_long_sentence_words {
            score -= rules.very_long_sentence_penalty;
        }
        result.recommendations.push(format!(
            "Shorten sentences: average is {:.1} words, keep it under {:.0}",
            stats.avg_sentence_words, rules.long_sentence_words
        ));
    }
    if stats.avg_word_chars > rules.long_word_chars {
        score -= rules.long_word_penalty;
        result
            .recommendations
            .push("Prefer shorter, plainer words over long jargon".to_string());
    }
    if stats.passive_ratio > rules.passive_ratio {
        score -= rules.passive_penalty;
        result
            .recommendations
            .push("Rewrite passive constructions in the active voice".to_string());
    }

    result.score = score.max(0.0);
    result
}

// ────────────────────────────────────────────────────────────────────────────
// Length
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthBand {
    Optimal,
    Acceptable,
    TooShort,
    TooLong,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthAssessment {
    pub word_count: usize,
    pub band: LengthBand,
    pub score: f64,
    /// Words below `min` (too short) or above `max` (too long); 0 otherwise.
    pub gap: usize,
}

pub fn assess_length(word_count: usize, kind: DocumentKind, rules: &LengthRules) -> LengthAssessment {
    let range = rules.range(kind);
    let optimal = range.optimal as f64;
    let distance = (word_count as f64 - optimal).abs();

    let (band, score, gap) = if distance <= optimal * rules.optimal_tolerance {
        (LengthBand::Optimal, rules.optimal_score, 0)
    } else if word_count >= range.min && word_count <= range.max {
        (LengthBand::Acceptable, rules.acceptable_score, 0)
    } else if word_count < range.min {
        let gap = range.min - word_count;
        let ratio = gap as f64 / range.min.max(1) as f64;
        let score = (rules.acceptable_score - rules.acceptable_score * ratio).max(rules.floor_score);
        (LengthBand::TooShort, score, gap)
    } else {
        let gap = word_count - range.max;
        let ratio = gap as f64 / range.max.max(1) as f64;
        let score = (rules.acceptable_score - rules.acceptable_score * ratio).max(rules.floor_score);
        (LengthBand::TooLong, score, gap)
    };

    LengthAssessment {
        word_count,
        band,
        score,
        gap,
    }
}

pub fn score_length(document: &str, kind: DocumentKind, rules: &LengthRules) -> (SubScore, LengthAssessment) {
    let assessment = assess_length(word_count(document), kind, rules);
    let range = rules.range(kind);
    let mut result = SubScore {
        score: assessment.score,
        ..SubScore::default()
    };

    match assessment.band {
        LengthBand::Optimal => {}
        LengthBand::Acceptable => result.recommendations.push(format!(
            "Length is acceptable ({} words); about {} words is ideal for a {}",
            assessment.word_count,
            range.optimal,
            kind_label(kind)
        )),
        LengthBand::TooShort => result.recommendations.push(format!(
            "Document is too short: {} words, {} below the minimum of {}",
            assessment.word_count,
            plural_words(assessment.gap),
            range.min
        )),
        LengthBand::TooLong => result.recommendations.push(format!(
            "Document is too long: {} words, {} over the maximum of {}",
            assessment.word_count,
            plural_words(assessment.gap),
            range.max
        )),
    }
    (result, assessment)
}

fn kind_label(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Cv => "CV",
        DocumentKind::CoverLetter => "cover letter",
    }
}

fn plural_words(n: usize) -> String {
    if n == 1 {
        "1 word".to_string()
    } else {
        format!("{n} words")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_format_all_checks_pass() {
        let doc = "# John Doe\njohn@example.com | +1 555 123 4567\n\n## EXPERIENCE\n- **Led** the platform team\n";
        let result = score_format(doc, &FormatRules::default());
        assert!((result.score - 100.0).abs() < 1e-9, "got {}", result.score);
        assert!(result.recommendations.is_empty());
        assert!(result.critical_issues.is_empty());
    }

    #[test]
    fn test_format_missing_contact_is_critical() {
        let result = score_format("plain text only", &FormatRules::default());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.critical_issues.len(), 1);
        assert_eq!(result.recommendations.len(), 5);
    }

    #[test]
    fn test_format_short_digit_runs_are_not_phones() {
        let result = score_format("Worked 2019 2020 on 3 teams", &FormatRules::default());
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("phone number")));
    }

    #[test]
    fn test_cv_structure_sections() {
        let doc = "EXPERIENCE\nLed migration, reduced costs by 30%, served 2 million users, saved $40k\n\
                   SKILLS\nRust\nEDUCATION\nBSc\nBuilt, designed, shipped, mentored, optimized.";
        let result = score_structure(doc, DocumentKind::Cv, &StructureRules::default());
        assert!((result.score - 100.0).abs() < 1e-9, "got {}", result.score);
        assert!(result.critical_issues.is_empty());
    }

    #[test]
    fn test_cv_missing_sections_reported() {
        let result = score_structure("SKILLS\nRust", DocumentKind::Cv, &StructureRules::default());
        assert!(result
            .critical_issues
            .contains(&"Missing required section: experience".to_string()));
        assert!(result
            .critical_issues
            .contains(&"Missing required section: education".to_string()));
        assert!(result.score < 50.0);
    }

    #[test]
    fn test_cover_letter_salutation_and_closing() {
        let doc = "Dear Hiring Manager,\n\nI led a team that grew revenue by 20% and built our platform.\n\nKind regards,\nJane";
        let result = score_structure(doc, DocumentKind::CoverLetter, &StructureRules::default());
        assert!((result.score - 100.0).abs() < 1e-9, "got {}", result.score);
    }

    #[test]
    fn test_cover_letter_without_salutation() {
        let doc = "I built things.\nSincerely, Jane";
        let result = score_structure(doc, DocumentKind::CoverLetter, &StructureRules::default());
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("salutation")));
    }

    #[test]
    fn test_readability_clean_text_scores_100() {
        let doc = "I build fast services. I lead a small team. We ship every week.";
        let result = score_readability(doc, &ReadabilityRules::default());
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_readability_long_sentences_penalized_twice() {
        let doc = format!("{}.", words(30));
        let result = score_readability(&doc, &ReadabilityRules::default());
        assert_eq!(result.score, 80.0);
    }

    #[test]
    fn test_readability_passive_voice_penalized() {
        let doc = "It was finished. It was tested. It was shipped. It was reviewed.";
        let result = score_readability(doc, &ReadabilityRules::default());
        assert_eq!(result.score, 85.0);
    }

    #[test]
    fn test_readability_empty_document() {
        let result = score_readability("   ", &ReadabilityRules::default());
        assert_eq!(result.score, 100.0);
        assert_eq!(result.critical_issues, vec!["Document is empty".to_string()]);
    }

    #[test]
    fn test_length_exact_optimal_is_100() {
        let rules = LengthRules::default();
        let a = assess_length(rules.cv.optimal, DocumentKind::Cv, &rules);
        assert_eq!(a.band, LengthBand::Optimal);
        assert_eq!(a.score, 100.0);
    }

    #[test]
    fn test_length_one_below_min_is_too_short() {
        let rules = LengthRules::default();
        let doc = words(rules.cover_letter.min - 1);
        let (sub, a) = score_length(&doc, DocumentKind::CoverLetter, &rules);
        assert_eq!(a.band, LengthBand::TooShort);
        assert_eq!(a.gap, 1);
        assert!(sub.score < 80.0 && sub.score >= 40.0);
        assert!(sub.recommendations[0].contains("1 word below the minimum of 250"));
    }

    #[test]
    fn test_length_acceptable_band() {
        let rules = LengthRules::default();
        let a = assess_length(rules.cv.min, DocumentKind::Cv, &rules);
        assert_eq!(a.band, LengthBand::Acceptable);
        assert_eq!(a.score, 80.0);
    }

    #[test]
    fn test_length_floor_is_40() {
        let rules = LengthRules::default();
        let short = assess_length(0, DocumentKind::Cv, &rules);
        assert_eq!(short.score, 40.0);
        let long = assess_length(10_000, DocumentKind::Cv, &rules);
        assert_eq!(long.band, LengthBand::TooLong);
        assert_eq!(long.score, 40.0);
        assert_eq!(long.gap, 10_000 - rules.cv.max);
    }

    #[test]
    fn test_length_decreases_linearly_when_too_long() {
        let rules = LengthRules::default();
        let a = assess_length(rules.cv.max + 80, DocumentKind::Cv, &rules);
        let b = assess_length(rules.cv.max + 160, DocumentKind::Cv, &rules);
        assert!(a.score > b.score);
        assert!((a.score - 72.0).abs() < 1e-9);
    }
}
