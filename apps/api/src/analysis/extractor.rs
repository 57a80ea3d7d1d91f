//! Requirement Extractor — turns a raw posting into a structured `JobRequirements` profile.
//!
//! Best-effort lexical pass over static dictionaries. Never fails: missing text yields
//! empty collections and unset optionals.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::classifier::classify;
use crate::analysis::text::{contains_term, matching_terms, normalize, tokens};
use crate::analysis::vocabulary::{EducationLevel, Seniority, SkillCategory, Vocabulary};
use crate::models::posting::RawPosting;

static EXPERIENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})\s*\+?\s*(?:(?:-|–|to)\s*\d{1,2}\s*\+?\s*)?(?:years?|yrs?)\b").unwrap()
});

const BULLET_MARKERS: &[char] = &['-', '*', '•', '·', '–', '▪'];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Remote,
    Hybrid,
    Onsite,
    #[default]
    Unspecified,
}

/// Technical skills found in the posting, bucketed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSkills {
    pub languages: BTreeSet<String>,
    pub frameworks: BTreeSet<String>,
    pub datastores: BTreeSet<String>,
    pub cloud_platforms: BTreeSet<String>,
    pub tooling: BTreeSet<String>,
}

impl TechnicalSkills {
    pub fn get(&self, category: SkillCategory) -> &BTreeSet<String> {
        match category {
            SkillCategory::Languages => &self.languages,
            SkillCategory::Frameworks => &self.frameworks,
            SkillCategory::Datastores => &self.datastores,
            SkillCategory::CloudPlatforms => &self.cloud_platforms,
            SkillCategory::Tooling => &self.tooling,
        }
    }

    fn get_mut(&mut self, category: SkillCategory) -> &mut BTreeSet<String> {
        match category {
            SkillCategory::Languages => &mut self.languages,
            SkillCategory::Frameworks => &mut self.frameworks,
            SkillCategory::Datastores => &mut self.datastores,
            SkillCategory::CloudPlatforms => &mut self.cloud_platforms,
            SkillCategory::Tooling => &mut self.tooling,
        }
    }

    /// All skills as (category, term) pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (SkillCategory, &str)> + '_ {
        SkillCategory::ALL
            .into_iter()
            .flat_map(move |c| self.get(c).iter().map(move |t| (c, t.as_str())))
    }

    pub fn len(&self) -> usize {
        SkillCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structured requirement profile of one posting. Read-only once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub title: String,
    pub company: Option<String>,
    pub role_category: String,
    pub primary_skill_category: SkillCategory,
    pub technical_skills: TechnicalSkills,
    pub soft_skills: Vec<String>,
    pub experience_years: Option<u32>,
    pub education: EducationLevel,
    pub seniority: Seniority,
    pub job_type: JobType,
    pub methodologies: Vec<String>,
    pub industry_keywords: Vec<String>,
    pub responsibilities: Vec<String>,
    pub culture_keywords: Vec<String>,
    pub benefits: Vec<String>,
    pub urgency_indicators: Vec<String>,
    /// Top job-specific keywords: dictionary hits first, then explicit keywords,
    /// then the most frequent remaining corpus tokens.
    pub job_specific_keywords: Vec<String>,
}

impl JobRequirements {
    /// Union of every keyword-like field, used for template overlap.
    pub fn keyword_set(&self) -> BTreeSet<String> {
        let mut set: BTreeSet<String> = self
            .technical_skills
            .iter()
            .map(|(_, t)| t.to_string())
            .collect();
        set.extend(self.soft_skills.iter().cloned());
        set.extend(self.methodologies.iter().cloned());
        set.extend(self.job_specific_keywords.iter().cloned());
        set
    }

    /// Re-applies the extractor's invariants to a profile from outside:
    /// terms lower-cased, deduplicated and capped, unknown roles mapped to the default.
    pub fn normalized(mut self, vocabulary: &Vocabulary) -> Self {
        let limits = &vocabulary.limits;

        self.title = self.title.trim().to_string();
        let role = normalize(&self.role_category).replace(' ', "_");
        self.role_category = if vocabulary.role(&role).is_some() {
            role
        } else {
            vocabulary.default_role.clone()
        };

        for category in SkillCategory::ALL {
            let bucket = self.technical_skills.get_mut(category);
            *bucket = std::mem::take(bucket)
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .take(limits.list_fields)
                .collect();
        }

        for list in [
            &mut self.soft_skills,
            &mut self.methodologies,
            &mut self.industry_keywords,
            &mut self.culture_keywords,
            &mut self.benefits,
            &mut self.urgency_indicators,
        ] {
            *list = dedup_terms(list.iter().map(|t| normalize(t)), limits.list_fields);
        }
        self.job_specific_keywords = dedup_terms(
            self.job_specific_keywords.iter().map(|t| normalize(t)),
            limits.job_specific_keywords,
        );
        self.responsibilities = dedup_terms(
            self.responsibilities.iter().map(|r| r.trim().to_string()),
            limits.responsibilities,
        );
        self
    }
}

/// Keeps the first occurrence of each non-empty term, up to `cap`.
fn dedup_terms(terms: impl Iterator<Item = String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for term in terms {
        if out.len() >= cap {
            break;
        }
        if !term.is_empty() && !out.contains(&term) {
            out.push(term);
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Convenience entry point for callers that only have free text and a title.
#[allow(dead_code)]
pub fn extract_text(posting_text: &str, posting_title: &str, vocabulary: &Vocabulary) -> JobRequirements {
    extract(&RawPosting::new(posting_title, posting_text), vocabulary)
}

/// Extracts a `JobRequirements` profile from a posting. Pure; never fails.
pub fn extract(posting: &RawPosting, vocabulary: &Vocabulary) -> JobRequirements {
    let corpus = normalize(&posting.corpus());
    let limits = &vocabulary.limits;

    let role_category = classify(&posting.title, &posting.description, vocabulary);
    let primary_skill_category = vocabulary
        .role(&role_category)
        .map(|r| r.primary_skill)
        .unwrap_or_default();

    let technical_skills = extract_technical_skills(&corpus, vocabulary);
    let job_specific_keywords = extract_job_keywords(&corpus, posting, &technical_skills, vocabulary);

    JobRequirements {
        title: posting.title.trim().to_string(),
        company: posting.company.clone(),
        role_category,
        primary_skill_category,
        soft_skills: matching_terms(&corpus, &vocabulary.soft_skills, limits.list_fields),
        experience_years: extract_experience_years(&corpus),
        education: detect_education(&corpus, vocabulary),
        seniority: detect_seniority(&corpus, vocabulary),
        job_type: detect_job_type(&corpus, vocabulary),
        methodologies: matching_terms(&corpus, &vocabulary.methodologies, limits.list_fields),
        industry_keywords: matching_terms(&corpus, &vocabulary.industry_terms, limits.list_fields),
        responsibilities: extract_responsibilities(&posting.description, vocabulary),
        culture_keywords: matching_terms(&corpus, &vocabulary.culture_terms, limits.list_fields),
        benefits: matching_terms(&corpus, &vocabulary.benefit_terms, limits.list_fields),
        urgency_indicators: matching_terms(&corpus, &vocabulary.urgency_terms, limits.list_fields),
        technical_skills,
        job_specific_keywords,
    }
}

fn extract_technical_skills(corpus: &str, vocabulary: &Vocabulary) -> TechnicalSkills {
    let mut skills = TechnicalSkills::default();
    for dict in &vocabulary.skill_dictionaries {
        let bucket = skills.get_mut(dict.category);
        for term in &dict.terms {
            if bucket.len() >= vocabulary.limits.list_fields {
                break;
            }
            if contains_term(corpus, term) {
                bucket.insert(term.clone());
            }
        }
    }
    skills
}

/// First "N years" / "N+ years" / "N-M years" in the corpus. Unset when absent.
pub fn extract_experience_years(corpus: &str) -> Option<u32> {
    EXPERIENCE_RE
        .captures(corpus)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn detect_seniority(corpus: &str, vocabulary: &Vocabulary) -> Seniority {
    vocabulary
        .seniority_levels
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| contains_term(corpus, p)))
        .map(|(level, _)| *level)
        .unwrap_or_default()
}

fn detect_education(corpus: &str, vocabulary: &Vocabulary) -> EducationLevel {
    vocabulary
        .education_levels
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| contains_term(corpus, p)))
        .map(|(level, _)| *level)
        .unwrap_or_default()
}

fn detect_job_type(corpus: &str, vocabulary: &Vocabulary) -> JobType {
    let any = |terms: &[String]| terms.iter().any(|t| contains_term(corpus, t));
    let remote = any(&vocabulary.remote_terms);
    let hybrid = any(&vocabulary.hybrid_terms);
    let onsite = any(&vocabulary.onsite_terms);

    match (remote, hybrid, onsite) {
        (_, true, _) | (true, _, true) => JobType::Hybrid,
        (true, false, false) => JobType::Remote,
        (false, false, true) => JobType::Onsite,
        _ => JobType::Unspecified,
    }
}

fn extract_job_keywords(
    corpus: &str,
    posting: &RawPosting,
    skills: &TechnicalSkills,
    vocabulary: &Vocabulary,
) -> Vec<String> {
    let limits = &vocabulary.limits;
    let mut keywords: Vec<String> = Vec::new();
    let push = |keyword: String, keywords: &mut Vec<String>| {
        if keywords.len() < limits.job_specific_keywords && !keywords.contains(&keyword) {
            keywords.push(keyword);
        }
    };

    for (_, term) in skills.iter() {
        push(term.to_string(), &mut keywords);
    }
    for explicit in &posting.keywords {
        let explicit = normalize(explicit);
        if !explicit.is_empty() {
            push(explicit, &mut keywords);
        }
    }

    // Frequency pass: count, then order by (count desc, first occurrence asc).
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (index, token) in tokens(corpus).into_iter().enumerate() {
        if token.chars().count() < limits.min_keyword_len || vocabulary.is_stop_word(&token) {
            continue;
        }
        counts.entry(token).or_insert((0, index)).0 += 1;
    }
    let mut ranked: Vec<(String, usize, usize)> =
        counts.into_iter().map(|(t, (c, i))| (t, c, i)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    for (token, _, _) in ranked {
        push(token, &mut keywords);
    }
    keywords
}

fn extract_responsibilities(description: &str, vocabulary: &Vocabulary) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for line in description.lines() {
        if found.len() >= vocabulary.limits.responsibilities {
            break;
        }
        let trimmed = line.trim();
        let stripped = trimmed.trim_start_matches(BULLET_MARKERS).trim();
        let had_marker = stripped.len() != trimmed.len();
        let lower = normalize(stripped);

        let starts_with_verb = vocabulary
            .responsibility_verbs
            .iter()
            .any(|v| lower.starts_with(&format!("{v} ")));

        if lower.chars().count() >= 10 && (had_marker || starts_with_verb) && !found.contains(&lower) {
            found.push(lower);
        }
    }
    found
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BACKEND_POSTING: &str = r#"
We are a fast-paced fintech startup looking for a Senior Backend Developer.

Responsibilities:
- Design and build microservices in Rust and Go
- Maintain PostgreSQL and Redis clusters on AWS
- Mentor junior engineers
Collaborate with product on the roadmap.

Requirements: 5+ years of backend experience, Docker, Kubernetes, strong communication.
Agile / Scrum team. Bachelor degree in Computer Science preferred.
Remote position with health insurance and stock options. Urgent hire, immediate start.
"#;

    fn backend() -> JobRequirements {
        let posting = RawPosting {
            company: Some("Ledgerly".to_string()),
            ..RawPosting::new("Senior Backend Developer", BACKEND_POSTING)
        };
        extract(&posting, &Vocabulary::default())
    }

    #[test]
    fn test_extracts_technical_skills_by_category() {
        let req = backend();
        assert!(req.technical_skills.languages.contains("rust"));
        assert!(req.technical_skills.languages.contains("go"));
        assert!(req.technical_skills.datastores.contains("postgresql"));
        assert!(req.technical_skills.datastores.contains("redis"));
        assert!(req.technical_skills.cloud_platforms.contains("aws"));
        assert!(req.technical_skills.tooling.contains("docker"));
        assert!(req.technical_skills.tooling.contains("kubernetes"));
    }

    #[test]
    fn test_extracts_experience_years() {
        assert_eq!(backend().experience_years, Some(5));
        assert_eq!(extract_experience_years("3-5 years of python"), Some(3));
        assert_eq!(extract_experience_years("at least 10 yrs"), Some(10));
    }

    #[test]
    fn test_missing_experience_is_unset_not_zero() {
        assert_eq!(extract_experience_years("lots of experience"), None);
    }

    #[test]
    fn test_seniority_first_match_in_declared_order() {
        // "junior" appears in the posting body and junior is checked first.
        assert_eq!(backend().seniority, Seniority::Junior);
        let vocab = Vocabulary::default();
        let req = extract_text("Own the platform roadmap.", "Senior Engineer", &vocab);
        assert_eq!(req.seniority, Seniority::Senior);
    }

    #[test]
    fn test_seniority_defaults_to_mid() {
        let req = extract_text("Write code.", "Engineer", &Vocabulary::default());
        assert_eq!(req.seniority, Seniority::Mid);
    }

    #[test]
    fn test_soft_skills_methodologies_and_flags() {
        let req = backend();
        assert!(req.soft_skills.contains(&"communication".to_string()));
        assert!(req.methodologies.contains(&"agile".to_string()));
        assert!(req.methodologies.contains(&"scrum".to_string()));
        assert_eq!(req.education, EducationLevel::Bachelor);
        assert_eq!(req.job_type, JobType::Remote);
        assert!(req.urgency_indicators.contains(&"urgent".to_string()));
        assert!(req.urgency_indicators.contains(&"immediate start".to_string()));
        assert!(req.benefits.contains(&"health insurance".to_string()));
        assert!(req.culture_keywords.contains(&"fast-paced".to_string()));
        assert!(req.industry_keywords.contains(&"fintech".to_string()));
    }

    #[test]
    fn test_remote_and_hybrid_combine_to_hybrid() {
        let req = extract_text("Remote friendly, hybrid schedule.", "Engineer", &Vocabulary::default());
        assert_eq!(req.job_type, JobType::Hybrid);
    }

    #[test]
    fn test_remote_and_onsite_combine_to_hybrid() {
        let req = extract_text("Remote weeks plus on-site sprints.", "Engineer", &Vocabulary::default());
        assert_eq!(req.job_type, JobType::Hybrid);
    }

    #[test]
    fn test_responsibilities_from_bullets_and_verbs() {
        let req = backend();
        assert!(req
            .responsibilities
            .contains(&"design and build microservices in rust and go".to_string()));
        assert!(req
            .responsibilities
            .contains(&"collaborate with product on the roadmap.".to_string()));
    }

    #[test]
    fn test_job_keywords_are_capped_deduped_and_lowercase() {
        let req = backend();
        assert!(req.job_specific_keywords.len() <= 25);
        let unique: BTreeSet<_> = req.job_specific_keywords.iter().collect();
        assert_eq!(unique.len(), req.job_specific_keywords.len());
        for kw in &req.job_specific_keywords {
            assert_eq!(kw, &kw.to_lowercase());
        }
        // dictionary hits lead the list
        assert_eq!(req.job_specific_keywords[0], "go");
    }

    #[test]
    fn test_explicit_keywords_are_included() {
        let posting = RawPosting {
            keywords: vec!["  Event Sourcing ".to_string()],
            ..RawPosting::new("Engineer", "Build things.")
        };
        let req = extract(&posting, &Vocabulary::default());
        assert!(req.job_specific_keywords.contains(&"event sourcing".to_string()));
    }

    #[test]
    fn test_empty_posting_returns_empty_profile() {
        let req = extract(&RawPosting::default(), &Vocabulary::default());
        assert!(req.technical_skills.is_empty());
        assert!(req.soft_skills.is_empty());
        assert!(req.job_specific_keywords.is_empty());
        assert!(req.responsibilities.is_empty());
        assert_eq!(req.experience_years, None);
        assert_eq!(req.job_type, JobType::Unspecified);
        assert_eq!(req.role_category, "software_development");
    }

    #[test]
    fn test_extract_is_deterministic() {
        assert_eq!(backend(), backend());
    }

    #[test]
    fn test_primary_category_follows_role() {
        let req = extract_text(
            "Kubernetes, Terraform and CI/CD for our infrastructure.",
            "DevOps Engineer",
            &Vocabulary::default(),
        );
        assert_eq!(req.role_category, "devops");
        assert_eq!(req.primary_skill_category, SkillCategory::Tooling);
    }

    #[test]
    fn test_extract_text_matches_extract_on_title_and_description() {
        let vocab = Vocabulary::default();
        let posting = RawPosting::new("Backend Developer", BACKEND_POSTING);
        assert_eq!(
            extract_text(BACKEND_POSTING, "Backend Developer", &vocab),
            extract(&posting, &vocab)
        );
    }

    #[test]
    fn test_normalized_restores_list_invariants() {
        let vocab = Vocabulary::default();
        let mut req = extract_text("", "  Engineer ", &vocab);
        req.role_category = "Not A Role".to_string();
        req.technical_skills.languages = ["Rust", "rust ", "  "].iter().map(|s| s.to_string()).collect();
        req.soft_skills = vec!["Teamwork".into(), "teamwork".into(), "".into()];
        req.job_specific_keywords = (0..100).map(|i| format!("Term{i}")).collect();

        let req = req.normalized(&vocab);
        assert_eq!(req.title, "Engineer");
        assert_eq!(req.role_category, vocab.default_role);
        assert_eq!(req.technical_skills.languages.iter().collect::<Vec<_>>(), vec!["rust"]);
        assert_eq!(req.soft_skills, vec!["teamwork".to_string()]);
        assert_eq!(req.job_specific_keywords.len(), vocab.limits.job_specific_keywords);
        assert_eq!(req.job_specific_keywords[0], "term0");
    }

    #[test]
    fn test_normalized_keeps_known_role() {
        let vocab = Vocabulary::default();
        let req = extract(&RawPosting::new("Backend Developer", BACKEND_POSTING), &vocab);
        assert_eq!(req.clone().normalized(&vocab).role_category, req.role_category);
    }
}
