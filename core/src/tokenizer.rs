use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}]+").expect("valid regex");
}

/// Tokenize document text into (term, position) using NFKC normalization and lowercase.
/// Positions are token ordinals, so they stay dense and start at 0.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    RE.find_iter(&normalized)
        .enumerate()
        .map(|(pos, mat)| (mat.as_str().to_string(), pos))
        .collect()
}

/// Split a query into lowercase terms on whitespace. Empty terms are dropped.
/// Terms get the same NFKC normalization as indexed text.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .nfkc()
        .collect::<String>()
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
