//! Static dictionaries used by the requirement extractor, the role classifier
//! and the compatibility scorer.
//!
//! Everything here is plain data wrapped in `Vocabulary` so tests can swap in
//! a smaller table. `Vocabulary::default()` carries the production tables.

use serde::{Deserialize, Serialize};

/// Technical skill buckets of a `JobRequirements` profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    #[default]
    Languages,
    Frameworks,
    Datastores,
    CloudPlatforms,
    Tooling,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        SkillCategory::Languages,
        SkillCategory::Frameworks,
        SkillCategory::Datastores,
        SkillCategory::CloudPlatforms,
        SkillCategory::Tooling,
    ];
}

/// One named dictionary of skill terms. Several dictionaries may feed the same
/// category (frontend and backend frameworks both land in `Frameworks`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDictionary {
    pub name: String,
    pub category: SkillCategory,
    pub terms: Vec<String>,
}

/// Weighted keyword vocabulary for one role category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleVocabulary {
    pub category: String,
    pub primary_skill: SkillCategory,
    pub keywords: Vec<(String, f64)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seniority {
    Junior,
    #[default]
    Mid,
    Senior,
    Architect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationLevel {
    #[default]
    NotSpecified,
    HighSchool,
    Bachelor,
    Master,
    Doctorate,
}

/// Caps applied to every list field of an extracted profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionLimits {
    pub job_specific_keywords: usize,
    pub responsibilities: usize,
    pub list_fields: usize,
    pub min_keyword_len: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            job_specific_keywords: 25,
            responsibilities: 15,
            list_fields: 20,
            min_keyword_len: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    pub skill_dictionaries: Vec<SkillDictionary>,
    /// Declaration order is the classifier's tie-break order.
    pub roles: Vec<RoleVocabulary>,
    pub default_role: String,
    /// Checked in order; the first level with a matching phrase wins.
    pub seniority_levels: Vec<(Seniority, Vec<String>)>,
    /// Checked in order; the first level with a matching phrase wins.
    pub education_levels: Vec<(EducationLevel, Vec<String>)>,
    pub remote_terms: Vec<String>,
    pub hybrid_terms: Vec<String>,
    pub onsite_terms: Vec<String>,
    pub urgency_terms: Vec<String>,
    pub soft_skills: Vec<String>,
    pub methodologies: Vec<String>,
    pub industry_terms: Vec<String>,
    pub culture_terms: Vec<String>,
    pub benefit_terms: Vec<String>,
    pub responsibility_verbs: Vec<String>,
    pub stop_words: Vec<String>,
    pub limits: ExtractionLimits,
}

impl Vocabulary {
    pub fn role(&self, category: &str) -> Option<&RoleVocabulary> {
        self.roles.iter().find(|r| r.category == category)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.iter().any(|s| s == token)
    }
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn weighted(items: &[(&str, f64)]) -> Vec<(String, f64)> {
    items.iter().map(|(k, w)| (k.to_string(), *w)).collect()
}

fn dictionary(name: &str, category: SkillCategory, terms: &[&str]) -> SkillDictionary {
    SkillDictionary {
        name: name.to_string(),
        category,
        terms: words(terms),
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            skill_dictionaries: vec![
                dictionary(
                    "languages",
                    SkillCategory::Languages,
                    &[
                        "python", "java", "javascript", "typescript", "c++", "c#", "go", "golang",
                        "rust", "ruby", "php", "kotlin", "swift", "scala", "sql", "bash", "perl",
                        "elixir", "haskell", "dart", "matlab", "objective-c", "lua",
                    ],
                ),
                dictionary(
                    "frontend_frameworks",
                    SkillCategory::Frameworks,
                    &[
                        "react", "angular", "vue", "vue.js", "svelte", "next.js", "nuxt", "jquery",
                        "redux", "tailwind", "bootstrap",
                    ],
                ),
                dictionary(
                    "backend_frameworks",
                    SkillCategory::Frameworks,
                    &[
                        "django", "flask", "fastapi", "spring", "spring boot", "express",
                        "node.js", "rails", "ruby on rails", "laravel", ".net", "asp.net", "actix",
                        "axum", "nestjs", "graphql",
                    ],
                ),
                dictionary(
                    "datastores",
                    SkillCategory::Datastores,
                    &[
                        "postgresql", "postgres", "mysql", "mongodb", "redis", "elasticsearch",
                        "cassandra", "dynamodb", "sqlite", "oracle", "sql server", "snowflake",
                        "bigquery",
                    ],
                ),
                dictionary(
                    "cloud_platforms",
                    SkillCategory::CloudPlatforms,
                    &[
                        "aws", "azure", "gcp", "google cloud", "heroku", "digitalocean",
                        "cloudflare", "openstack",
                    ],
                ),
                dictionary(
                    "devops_tools",
                    SkillCategory::Tooling,
                    &[
                        "docker", "kubernetes", "terraform", "ansible", "jenkins",
                        "github actions", "gitlab ci", "circleci", "helm", "prometheus", "grafana",
                        "kafka", "git", "linux", "nginx",
                    ],
                ),
                dictionary(
                    "testing_frameworks",
                    SkillCategory::Tooling,
                    &[
                        "jest", "pytest", "junit", "selenium", "cypress", "mocha", "playwright",
                        "cucumber", "testng", "rspec",
                    ],
                ),
            ],
            roles: vec![
                RoleVocabulary {
                    category: "software_development".to_string(),
                    primary_skill: SkillCategory::Languages,
                    keywords: weighted(&[
                        ("software engineer", 3.0),
                        ("software developer", 3.0),
                        ("developer", 2.0),
                        ("backend", 2.0),
                        ("full stack", 2.0),
                        ("programming", 2.0),
                        ("microservices", 1.5),
                        ("api", 1.5),
                        ("software", 1.0),
                    ]),
                },
                RoleVocabulary {
                    category: "data_science".to_string(),
                    primary_skill: SkillCategory::Languages,
                    keywords: weighted(&[
                        ("data scientist", 3.0),
                        ("machine learning", 3.0),
                        ("data analysis", 2.0),
                        ("deep learning", 2.0),
                        ("statistics", 2.0),
                        ("analytics", 1.5),
                        ("pandas", 1.5),
                        ("natural language processing", 2.0),
                        ("data", 1.0),
                    ]),
                },
                RoleVocabulary {
                    category: "devops".to_string(),
                    primary_skill: SkillCategory::Tooling,
                    keywords: weighted(&[
                        ("devops", 3.0),
                        ("site reliability", 3.0),
                        ("infrastructure", 2.0),
                        ("kubernetes", 2.0),
                        ("ci/cd", 2.0),
                        ("terraform", 2.0),
                        ("monitoring", 1.5),
                        ("cloud", 1.0),
                    ]),
                },
                RoleVocabulary {
                    category: "frontend".to_string(),
                    primary_skill: SkillCategory::Frameworks,
                    keywords: weighted(&[
                        ("frontend", 3.0),
                        ("front-end", 3.0),
                        ("user interface", 2.0),
                        ("react", 2.0),
                        ("css", 2.0),
                        ("javascript", 1.5),
                        ("web", 1.0),
                    ]),
                },
                RoleVocabulary {
                    category: "mobile".to_string(),
                    primary_skill: SkillCategory::Frameworks,
                    keywords: weighted(&[
                        ("mobile", 3.0),
                        ("android", 3.0),
                        ("ios app", 3.0),
                        ("react native", 2.0),
                        ("flutter", 2.0),
                        ("kotlin", 1.5),
                        ("swift", 1.5),
                    ]),
                },
                RoleVocabulary {
                    category: "product_management".to_string(),
                    primary_skill: SkillCategory::Tooling,
                    keywords: weighted(&[
                        ("product manager", 3.0),
                        ("product management", 3.0),
                        ("product owner", 2.0),
                        ("roadmap", 2.0),
                        ("user research", 1.5),
                        ("stakeholder", 1.5),
                    ]),
                },
                RoleVocabulary {
                    category: "design".to_string(),
                    primary_skill: SkillCategory::Tooling,
                    keywords: weighted(&[
                        ("designer", 3.0),
                        ("user experience", 2.0),
                        ("visual design", 2.0),
                        ("figma", 2.0),
                        ("prototyping", 1.5),
                        ("wireframe", 1.5),
                    ]),
                },
                RoleVocabulary {
                    category: "security".to_string(),
                    primary_skill: SkillCategory::Tooling,
                    keywords: weighted(&[
                        ("security engineer", 3.0),
                        ("penetration testing", 3.0),
                        ("security operations", 2.0),
                        ("vulnerability", 2.0),
                        ("cryptography", 2.0),
                        ("siem", 2.0),
                        ("compliance", 1.5),
                    ]),
                },
            ],
            default_role: "software_development".to_string(),
            seniority_levels: vec![
                (
                    Seniority::Junior,
                    words(&["junior", "entry level", "entry-level", "graduate", "intern"]),
                ),
                (
                    Seniority::Mid,
                    words(&["mid-level", "mid level", "intermediate"]),
                ),
                (
                    Seniority::Senior,
                    words(&["senior", "sr.", "lead", "staff", "principal"]),
                ),
                (
                    Seniority::Architect,
                    words(&["architect", "head of", "director", "vp of engineering"]),
                ),
            ],
            education_levels: vec![
                (
                    EducationLevel::Doctorate,
                    words(&["phd", "ph.d", "doctorate", "doctoral"]),
                ),
                (
                    EducationLevel::Master,
                    words(&["master's", "masters", "master of", "msc", "m.sc", "mba"]),
                ),
                (
                    EducationLevel::Bachelor,
                    words(&["bachelor", "bsc", "b.sc", "b.s.", "degree in", "university degree"]),
                ),
                (
                    EducationLevel::HighSchool,
                    words(&["high school", "diploma", "ged"]),
                ),
            ],
            remote_terms: words(&["remote", "work from home", "wfh", "distributed team"]),
            hybrid_terms: words(&["hybrid", "partially remote", "days in office", "days a week in"]),
            onsite_terms: words(&["on-site", "onsite", "in office", "in-office", "on site"]),
            urgency_terms: words(&[
                "urgent",
                "urgently",
                "immediate start",
                "start immediately",
                "immediately",
                "asap",
                "as soon as possible",
            ]),
            soft_skills: words(&[
                "communication",
                "leadership",
                "teamwork",
                "collaboration",
                "problem solving",
                "problem-solving",
                "mentoring",
                "adaptability",
                "critical thinking",
                "time management",
                "creativity",
                "attention to detail",
                "stakeholder management",
                "ownership",
            ]),
            methodologies: words(&[
                "agile",
                "scrum",
                "kanban",
                "tdd",
                "bdd",
                "ci/cd",
                "lean",
                "waterfall",
                "pair programming",
                "code review",
                "domain-driven design",
            ]),
            industry_terms: words(&[
                "fintech",
                "healthcare",
                "e-commerce",
                "saas",
                "banking",
                "insurance",
                "logistics",
                "gaming",
                "edtech",
                "telecommunications",
                "automotive",
                "retail",
                "media",
                "government",
                "energy",
                "biotech",
            ]),
            culture_terms: words(&[
                "collaborative",
                "innovative",
                "fast-paced",
                "diverse",
                "inclusive",
                "flexible",
                "startup",
                "work-life balance",
                "growth mindset",
                "autonomy",
                "remote-first",
                "mission-driven",
                "transparent",
            ]),
            benefit_terms: words(&[
                "health insurance",
                "dental",
                "401k",
                "pension",
                "equity",
                "stock options",
                "bonus",
                "paid time off",
                "pto",
                "parental leave",
                "gym",
                "learning budget",
                "flexible hours",
                "company car",
            ]),
            responsibility_verbs: words(&[
                "develop", "design", "build", "lead", "manage", "collaborate", "maintain",
                "implement", "own", "drive", "create", "support", "ensure", "work with",
                "mentor", "deliver", "write",
            ]),
            stop_words: words(&[
                "the", "and", "for", "with", "you", "our", "will", "are", "this", "that",
                "have", "from", "your", "who", "what", "about", "their", "they", "them", "then",
                "than", "there", "these", "those", "been", "being", "were", "where", "when",
                "which", "while", "work", "working", "team", "role", "experience", "years",
                "year", "including", "such", "within", "also", "must", "should", "would",
                "could", "able", "ability", "strong", "skills", "knowledge", "good", "great",
                "well", "more", "other", "using", "into", "over", "across", "through", "based",
                "join", "looking", "company", "position", "requirements", "responsibilities",
                "preferred", "required", "plus", "etc.", "candidate", "candidates",
                "opportunity", "help", "make", "every", "each", "want", "like", "just", "part",
                "time", "some", "very", "most", "many", "much", "both", "only", "here",
                "apply", "offer", "benefits", "ideal", "high",
            ]),
            limits: ExtractionLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_role_is_declared() {
        let vocab = Vocabulary::default();
        assert!(vocab.role(&vocab.default_role).is_some());
        assert_eq!(vocab.roles[0].category, vocab.default_role);
    }

    #[test]
    fn test_every_category_has_a_dictionary() {
        let vocab = Vocabulary::default();
        for category in SkillCategory::ALL {
            assert!(
                vocab.skill_dictionaries.iter().any(|d| d.category == category),
                "no dictionary for {category:?}"
            );
        }
    }

    #[test]
    fn test_dictionary_terms_are_lowercase() {
        let vocab = Vocabulary::default();
        for dict in &vocab.skill_dictionaries {
            for term in &dict.terms {
                assert_eq!(term, &term.to_lowercase(), "term {term} in {}", dict.name);
            }
        }
    }

    #[test]
    fn test_seniority_default_is_mid() {
        assert_eq!(Seniority::default(), Seniority::Mid);
    }
}
