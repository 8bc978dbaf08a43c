//! Fuzzy comparison of free-text distinguishing-mark descriptions

use crate::models::SimilarityMethod;
use strsim::{jaro_winkler, normalized_levenshtein};

/// Two words count as the same word at or above this similarity
pub const TOKEN_MATCH_THRESHOLD: f64 = 0.8;

const STOPWORDS: [&str; 16] = [
    "a", "an", "and", "the", "of", "on", "in", "at", "to", "with", "her", "his", "is", "was",
    "has", "small",
];

/// Lowercase, strip punctuation and collapse whitespace
pub fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn words(text: &str) -> Vec<String> {
    clean_text(text).split_whitespace().map(str::to_string).collect()
}

/// Content words of a description; all words when every one is a stopword
pub fn tokens(text: &str) -> Vec<String> {
    let all = words(text);
    let content: Vec<String> = all
        .iter()
        .filter(|word| !STOPWORDS.contains(&word.as_str()))
        .cloned()
        .collect();
    if content.is_empty() {
        all
    } else {
        content
    }
}

/// Split a query like "tattoo on ankle; scar on chin" into separate marks
pub fn split_descriptions(text: &str) -> Vec<&str> {
    text.split(|c| c == ',' || c == ';' || c == '\n')
        .map(str::trim)
        .filter(|part| !clean_text(part).is_empty())
        .collect()
}

/// Similarity in [0, 1] between a query phrase and a record phrase
pub fn similarity(query: &str, target: &str, method: SimilarityMethod) -> f64 {
    let score = match method {
        SimilarityMethod::TokenOverlap => token_overlap(query, target),
        SimilarityMethod::Levenshtein => normalized_levenshtein(&clean_text(query), &clean_text(target)),
        SimilarityMethod::JaroWinkler => token_sort_jaro_winkler(query, target),
    };
    score.clamp(0.0, 1.0)
}

/// Share of query content words with a close counterpart among the target's words
fn token_overlap(query: &str, target: &str) -> f64 {
    let query_tokens = tokens(query);
    let target_tokens = words(target);
    if query_tokens.is_empty() || target_tokens.is_empty() {
        return 0.0;
    }

    let found = query_tokens
        .iter()
        .filter(|word| {
            target_tokens
                .iter()
                .any(|other| normalized_levenshtein(word, other) >= TOKEN_MATCH_THRESHOLD)
        })
        .count();

    found as f64 / query_tokens.len() as f64
}

/// Jaro-Winkler over word-sorted phrases so word order does not matter
fn token_sort_jaro_winkler(query: &str, target: &str) -> f64 {
    let mut a = tokens(query);
    let mut b = tokens(target);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.sort();
    b.sort();
    jaro_winkler(&a.join(" "), &b.join(" "))
}

/// Best match of `query` against any of `candidates`, with the winning text
pub fn best_match<'a>(
    query: &str,
    candidates: &'a [String],
    method: SimilarityMethod,
) -> Option<(f64, &'a str)> {
    candidates
        .iter()
        .map(|candidate| (similarity(query, candidate, method), candidate.as_str()))
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
}
