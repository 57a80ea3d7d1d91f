//! Lexical helpers shared by the extractor, classifier and scorer.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z][a-z0-9+#./\-]*[a-z0-9+#]|[a-z]").unwrap());

/// Lower-cases and collapses whitespace so phrase lookups work across line breaks.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-term match of an already lower-cased `term` inside a lower-cased `haystack`.
///
/// A boundary is only required on sides where the term itself starts or ends with an
/// alphanumeric character, so `c++`, `.net` and `node.js` still match naturally.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let needs_left = term.chars().next().is_some_and(|c| c.is_alphanumeric());
    let needs_right = term.chars().last().is_some_and(|c| c.is_alphanumeric());

    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let left_ok = !needs_left
            || haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
        let right_ok = !needs_right
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
        left_ok && right_ok
    })
}

/// Every term of `terms` present in `haystack`, in dictionary order, deduplicated.
pub fn matching_terms(haystack: &str, terms: &[String], cap: usize) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for term in terms {
        if found.len() >= cap {
            break;
        }
        if contains_term(haystack, term) && !found.contains(term) {
            found.push(term.clone());
        }
    }
    found
}

/// Lower-case word-ish tokens, keeping the punctuation that occurs inside tech names.
pub fn tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Counts whitespace-separated words that contain at least one alphanumeric character.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_term_respects_word_boundaries() {
        assert!(contains_term("we use go and rust", "go"));
        assert!(!contains_term("good google", "go"));
        assert!(!contains_term("javascript", "java"));
    }

    #[test]
    fn test_contains_term_handles_symbol_terms() {
        assert!(contains_term("strong c++ and c# skills", "c++"));
        assert!(contains_term("strong c++ and c# skills", "c#"));
        assert!(contains_term("asp.net and .net core", ".net"));
        assert!(contains_term("built with node.js.", "node.js"));
    }

    #[test]
    fn test_contains_term_multiword() {
        assert!(contains_term("experience with spring boot services", "spring boot"));
        assert!(!contains_term("springboot", "spring boot"));
    }

    #[test]
    fn test_matching_terms_dedups_and_caps() {
        let terms = vec!["rust".to_string(), "go".to_string(), "rust".to_string()];
        assert_eq!(matching_terms("rust and go", &terms, 10), vec!["rust", "go"]);
        assert_eq!(matching_terms("rust and go", &terms, 1), vec!["rust"]);
    }

    #[test]
    fn test_tokens_keep_inner_punctuation() {
        let toks = tokens("Node.js, C++ and CI/CD.");
        assert_eq!(toks, vec!["node.js", "c++", "and", "ci/cd"]);
    }

    #[test]
    fn test_word_count_ignores_bare_punctuation() {
        assert_eq!(word_count("Hello  world - again"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("Senior\n  Rust\tEngineer"), "senior rust engineer");
    }
}
