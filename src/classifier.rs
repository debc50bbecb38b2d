//! Pure, deterministic query classifier.
//!
//! No I/O, no shared state — a query string goes in, one [`QueryCategory`]
//! comes out. Matching is case-insensitive substring search over the
//! keyword lists below, checked in strict priority order: web3 beats
//! programming beats technical beats academic beats the question-style
//! heuristic, which beats the `general` fallback.

use crate::model::QueryCategory;

const WEB3_KEYWORDS: &[&str] = &[
    "blockchain",
    "ethereum",
    "web3",
    "nft",
    "smart contract",
    "crypto",
    "token",
    "defi",
    "dao",
    "wallet",
    "bitcoin",
    "solidity",
    "cryptocurrency",
    "decentralized",
    "did",
    "web 3",
    "web 3.0",
];

const PROGRAMMING_KEYWORDS: &[&str] = &[
    "code",
    "programming",
    "function",
    "api",
    "library",
    "github",
    "javascript",
    "python",
    "typescript",
    "java",
    "c++",
    "ruby",
    "php",
    "rust",
    "golang",
    "framework",
    "npm",
    "git",
    "stackoverflow",
    "compiler",
    "runtime",
    "algorithm",
    "data structure",
    "sdk",
    "ide",
    "coding",
    "developer",
    "software",
    "http",
    "react",
    "component",
];

const TECHNICAL_KEYWORDS: &[&str] = &[
    "technical",
    "technology",
    "engineering",
    "system",
    "architecture",
    "design pattern",
    "cloud",
    "aws",
    "azure",
    "gcp",
    "docker",
    "kubernetes",
    "devops",
    "ci/cd",
    "infrastructure",
    "network",
    "protocol",
    "hardware",
    "database",
    "sql",
    "nosql",
    "quantum",
    "computer",
];

const ACADEMIC_KEYWORDS: &[&str] = &[
    "research",
    "paper",
    "journal",
    "study",
    "science",
    "theory",
    "thesis",
    "academic",
    "university",
    "college",
    "professor",
    "scholar",
    "education",
    "literature",
    "analysis",
    "methodology",
    "hypothesis",
    "experiment",
    "publication",
    "peer review",
];

const QUESTION_PREFIXES: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "can", "do", "does", "is", "are",
    "will", "should",
];

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| haystack.contains(kw))
}

fn is_question_style(trimmed_lower: &str) -> bool {
    if trimmed_lower.ends_with('?') {
        return true;
    }
    QUESTION_PREFIXES.iter().any(|prefix| {
        trimmed_lower
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

/// Classify a query into one [`QueryCategory`], by strict keyword priority
/// and falling back to a question-style heuristic, then `general`.
///
/// Deterministic and allocation-light: the one owned allocation is the
/// lowercased copy of `query` used for case-insensitive matching.
#[must_use]
pub fn classify(query: &str) -> QueryCategory {
    let lower = query.to_lowercase();
    let trimmed = lower.trim();

    if contains_any(trimmed, WEB3_KEYWORDS) {
        return QueryCategory::Web3;
    }
    if contains_any(trimmed, PROGRAMMING_KEYWORDS) {
        return QueryCategory::Programming;
    }
    if contains_any(trimmed, TECHNICAL_KEYWORDS) {
        return QueryCategory::Technical;
    }
    if contains_any(trimmed, ACADEMIC_KEYWORDS) {
        return QueryCategory::Academic;
    }
    if is_question_style(trimmed) {
        return QueryCategory::Qa;
    }
    QueryCategory::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web3_beats_academic_and_programming() {
        let category = classify("blockchain research paper with code examples");
        assert_eq!(category, QueryCategory::Web3);
    }

    #[test]
    fn programming_keyword_wins_over_general() {
        assert_eq!(classify("how to use the github api"), QueryCategory::Programming);
    }

    #[test]
    fn technical_keyword_detected() {
        assert_eq!(classify("kubernetes cluster architecture"), QueryCategory::Technical);
    }

    #[test]
    fn academic_keyword_detected() {
        assert_eq!(classify("peer review process for a journal"), QueryCategory::Academic);
    }

    #[test]
    fn question_prefix_without_keyword_is_qa() {
        assert_eq!(classify("what is the capital of france"), QueryCategory::Qa);
    }

    #[test]
    fn trailing_question_mark_is_qa() {
        assert_eq!(classify("capital of france?"), QueryCategory::Qa);
    }

    #[test]
    fn question_word_as_substring_is_not_qa() {
        // "cancan dance" starts with "can" but not followed by whitespace,
        // and "whodunnit" is not "who " — neither should trip the heuristic.
        assert_eq!(classify("whodunnit novel recommendations"), QueryCategory::General);
    }

    #[test]
    fn plain_statement_is_general() {
        assert_eq!(classify("best pizza toppings"), QueryCategory::General);
    }

    #[test]
    fn case_insensitive_matching() {
        assert_eq!(classify("ETHEREUM smart contract bugs"), QueryCategory::Web3);
    }

    #[test]
    fn deterministic_across_calls() {
        let q = "docker compose vs kubernetes";
        assert_eq!(classify(q), classify(q));
    }
}
