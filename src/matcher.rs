//! Fuzzy comparison of free-text guesses against a question's accepted answers.

use strsim::normalized_levenshtein;

/// Default similarity ratio below which a guess is rejected.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Whether `guess` is close enough to any of the accepted answers.
///
/// Comparison is a normalized Levenshtein ratio over trimmed, case-folded
/// strings, so exact answers always match and minor misspellings are
/// tolerated. An empty answer set rejects every guess.
pub fn matches_any(guess: &str, answers: &[String], threshold: f64) -> bool {
    let guess = normalize(guess);
    answers
        .iter()
        .any(|answer| normalized_levenshtein(&guess, &normalize(answer)) >= threshold)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
