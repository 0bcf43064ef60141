//! Text normalization for fuzzy dealer matching.

use super::patterns::{NON_ALNUM, WHITESPACE};

/// Uppercase, replace everything outside `[A-Z0-9 ]` with spaces and
/// collapse whitespace.
///
/// With `fold_digits`, OCR-confusable digits are folded to letters
/// (`0` -> `O`, `1` -> `I`) only inside words that also contain a letter,
/// so "SH0P" becomes "SHOP" while a branch code like "101" is kept.
pub fn normalize_name(text: &str, fold_digits: bool) -> String {
    let upper = text.to_uppercase();
    let cleaned = NON_ALNUM.replace_all(&upper, " ");
    let collapsed = WHITESPACE.replace_all(cleaned.trim(), " ");

    if !fold_digits {
        return collapsed.into_owned();
    }

    collapsed
        .split(' ')
        .map(fold_confusable_digits)
        .collect::<Vec<_>>()
        .join(" ")
}

fn fold_confusable_digits(word: &str) -> String {
    if !word.chars().any(|c| c.is_ascii_alphabetic()) {
        return word.to_string();
    }

    word.chars()
        .map(|c| match c {
            '0' => 'O',
            '1' => 'I',
            other => other,
        })
        .collect()
}

/// Whitespace tokens sorted and re-joined, so word order does not matter.
pub fn token_sort(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

/// Order-insensitive similarity in [0, 1]: normalized Levenshtein over the
/// token-sorted strings.
pub fn token_sort_similarity(a: &str, b: &str) -> f32 {
    strsim::normalized_levenshtein(&token_sort(a), &token_sort(b)) as f32
}
