//! Statement similarity used for claim deduplication

use std::collections::HashSet;

/// Lowercased alphanumeric tokens of `text`
pub fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard index over token sets, in [0, 1]
///
/// Two empty token sets are identical (1.0).
pub fn jaccard(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}

/// Whether one statement contains the other, ignoring case and surrounding whitespace
pub fn contains_ignore_case(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a.contains(&b) || b.contains(&a)
}

/// Whether two statements describe the same fact
pub fn near_identical(a: &str, b: &str, threshold: f64) -> bool {
    contains_ignore_case(a, b) || jaccard(a, b) >= threshold
}
