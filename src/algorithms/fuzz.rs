//! RapidFuzz-compatible scorers for name matching.
//!
//! All functions return a percentage in `[0, 100]` built on the normalized
//! Indel similarity (see [`super::lcs`]):
//! - `ratio`: plain Indel ratio
//! - `partial_ratio`: best substring match ratio
//! - `token_sort_ratio`: order-insensitive comparison (matcher default)
//! - `token_set_ratio`: set-based comparison
//! - `wratio`: weighted auto-selection of best method
//!
//! No preprocessing is applied: case and surrounding whitespace are the
//! caller's concern, as in RapidFuzz.
//!
//! # Performance
//!
//! `partial_ratio` compares directly against char slices of the longer
//! string instead of allocating a `String` per window.

use super::lcs::{indel_similarity, indel_similarity_chars};
use super::{Scorer, MAX_SCORE};

/// Basic Indel ratio, `fuzz.ratio` in RapidFuzz.
///
/// # Examples
/// ```
/// use heatmatch::algorithms::fuzz::ratio;
/// assert_eq!(ratio("jane doe", "jane doe"), 100.0);
/// ```
#[must_use]
pub fn ratio(s1: &str, s2: &str) -> f64 {
    indel_similarity(s1, s2) * MAX_SCORE
}

/// Compute the best partial match ratio between two strings.
///
/// Slides the shorter string across the longer string and returns the
/// maximum ratio found. Useful when one name is contained in the other.
///
/// # Examples
/// ```
/// use heatmatch::algorithms::fuzz::partial_ratio;
/// assert_eq!(partial_ratio("smith", "jane smith"), 100.0);
/// ```
#[must_use]
pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() && s2.is_empty() {
        return MAX_SCORE;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let chars1: Vec<char> = s1.chars().collect();
    let chars2: Vec<char> = s2.chars().collect();
    // Shorter string is the needle
    let (needle, haystack) = if chars1.len() <= chars2.len() {
        (chars1, chars2)
    } else {
        (chars2, chars1)
    };

    if needle.len() == haystack.len() {
        return indel_similarity_chars(&needle, &haystack) * MAX_SCORE;
    }

    let mut best = 0.0f64;
    for window in haystack.windows(needle.len()) {
        best = best.max(indel_similarity_chars(&needle, window));
        if best >= 1.0 {
            break;
        }
    }

    best * MAX_SCORE
}

/// Tokenize a string into words, sort them, and rejoin.
fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Ratio after tokenizing and sorting both strings.
///
/// "Doe Jane" and "Jane Doe" are identical under this scorer.
///
/// # Examples
/// ```
/// use heatmatch::algorithms::fuzz::token_sort_ratio;
/// assert_eq!(token_sort_ratio("Doe Jane", "Jane Doe"), 100.0);
/// ```
#[must_use]
pub fn token_sort_ratio(s1: &str, s2: &str) -> f64 {
    ratio(&sorted_tokens(s1), &sorted_tokens(s2))
}

/// Unique tokens of a string, sorted.
fn token_set(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.dedup();
    tokens
}

/// Set-based token similarity.
///
/// Splits both token sets into their intersection and the two differences.
/// When one set contains the other the score is 100; otherwise the best of
/// comparing the intersection against each side and the two sides against
/// each other.
///
/// # Examples
/// ```
/// use heatmatch::algorithms::fuzz::token_set_ratio;
/// assert_eq!(token_set_ratio("Sarah Jane Brown", "Sarah Brown"), 100.0);
/// ```
#[must_use]
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let tokens1 = token_set(s1);
    let tokens2 = token_set(s2);

    if tokens1.is_empty() || tokens2.is_empty() {
        return if tokens1.is_empty() && tokens2.is_empty() {
            MAX_SCORE
        } else {
            0.0
        };
    }

    let intersection: Vec<&str> = tokens1
        .iter()
        .filter(|t| tokens2.binary_search(t).is_ok())
        .copied()
        .collect();
    let diff1: Vec<&str> = tokens1
        .iter()
        .filter(|t| tokens2.binary_search(t).is_err())
        .copied()
        .collect();
    let diff2: Vec<&str> = tokens2
        .iter()
        .filter(|t| tokens1.binary_search(t).is_err())
        .copied()
        .collect();

    if !intersection.is_empty() && (diff1.is_empty() || diff2.is_empty()) {
        return MAX_SCORE;
    }

    let sect = intersection.join(" ");
    let join = |diff: &[&str]| {
        if sect.is_empty() {
            diff.join(" ")
        } else {
            format!("{sect} {}", diff.join(" "))
        }
    };
    let combined1 = join(&diff1);
    let combined2 = join(&diff2);

    let mut best = ratio(&combined1, &combined2);
    if !sect.is_empty() {
        best = best
            .max(ratio(&sect, &combined1))
            .max(ratio(&sect, &combined2));
    }
    best
}

// =============================================================================
// WRatio Weight Constants
// =============================================================================

/// Weight applied to `partial_ratio` when lengths differ noticeably.
pub const DEFAULT_PARTIAL_WEIGHT: f64 = 0.9;

/// Weight applied to token-based ratios.
pub const DEFAULT_TOKEN_WEIGHT: f64 = 0.95;

/// Partial weight for very different lengths (ratio > 8.0).
const LONG_PARTIAL_WEIGHT: f64 = 0.6;

/// Weighted ratio using the best method for the input.
///
/// - Similar lengths (ratio < 1.5): max of `ratio` and the token ratios
///   scaled by [`DEFAULT_TOKEN_WEIGHT`]
/// - Otherwise `partial_ratio` also competes, scaled by
///   [`DEFAULT_PARTIAL_WEIGHT`] (0.6 past an 8x length ratio)
///
/// # Examples
/// ```
/// use heatmatch::algorithms::fuzz::wratio;
/// assert!(wratio("Jane Doe", "Jane Elizabeth Doe") > 80.0);
/// ```
#[must_use]
pub fn wratio(s1: &str, s2: &str) -> f64 {
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let len1 = s1.chars().count();
    let len2 = s2.chars().count();
    let len_ratio = len1.max(len2) as f64 / len1.min(len2) as f64;

    let base = ratio(s1, s2);
    let token = token_sort_ratio(s1, s2).max(token_set_ratio(s1, s2)) * DEFAULT_TOKEN_WEIGHT;

    if len_ratio < 1.5 {
        return base.max(token);
    }

    let partial_weight = if len_ratio > 8.0 {
        LONG_PARTIAL_WEIGHT
    } else {
        DEFAULT_PARTIAL_WEIGHT
    };
    let partial = partial_ratio(s1, s2) * partial_weight;

    base.max(partial).max(token * partial_weight)
}

/// [`ratio`] as a [`Scorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ratio;

/// [`partial_ratio`] as a [`Scorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

/// [`token_sort_ratio`] as a [`Scorer`]; the default for every matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSortRatio;

/// [`token_set_ratio`] as a [`Scorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetRatio;

/// [`wratio`] as a [`Scorer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WRatio;

macro_rules! impl_scorer {
    ($ty:ty, $func:path, $name:literal) => {
        impl Scorer for $ty {
            #[inline]
            fn score(&self, a: &str, b: &str) -> f64 {
                $func(a, b)
            }

            fn name(&self) -> &'static str {
                $name
            }
        }
    };
}

impl_scorer!(Ratio, ratio, "ratio");
impl_scorer!(PartialRatio, partial_ratio, "partial_ratio");
impl_scorer!(TokenSortRatio, token_sort_ratio, "token_sort_ratio");
impl_scorer!(TokenSetRatio, token_set_ratio, "token_set_ratio");
impl_scorer!(WRatio, wratio, "wratio");

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_basic() {
        assert_eq!(ratio("hello", "hello"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
        // LCS("jon", "john") = 3 -> 2 * 3 / 7
        assert!(approx(ratio("jon", "john"), 600.0 / 7.0));
    }

    #[test]
    fn test_ratio_is_case_sensitive() {
        assert!(ratio("jane", "JANE") < 100.0);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("test", "this is a test"), 100.0);
    }

    #[test]
    fn test_partial_ratio_empty() {
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "hello"), 0.0);
        assert_eq!(partial_ratio("hello", ""), 0.0);
    }

    #[test]
    fn test_token_sort_ratio_reordered() {
        assert_eq!(token_sort_ratio("Smith John", "John Smith"), 100.0);
        assert_eq!(token_sort_ratio("  John   Smith ", "John Smith"), 100.0);
    }

    #[test]
    fn test_token_sort_ratio_different() {
        let score = token_sort_ratio("Jane Doe", "Sarah Jane Brown");
        assert!(score > 0.0);
        assert!(score < 80.0);
    }

    #[test]
    fn test_token_set_ratio_subset() {
        assert_eq!(token_set_ratio("fuzzy fuzzy", "fuzzy"), 100.0);
        assert_eq!(token_set_ratio("Jane Doe", "Jane Mary Doe"), 100.0);
    }

    #[test]
    fn test_token_set_ratio_disjoint_uses_ratio() {
        assert!(approx(token_set_ratio("abc", "abd"), ratio("abc", "abd")));
    }

    #[test]
    fn test_wratio_identical() {
        assert_eq!(wratio("hello", "hello"), 100.0);
        assert_eq!(wratio("", "hello"), 0.0);
    }

    #[test]
    fn test_wratio_never_below_ratio() {
        for (a, b) in [("jane", "jayne"), ("jo", "joanna smith"), ("x y", "y x")] {
            assert!(wratio(a, b) >= ratio(a, b));
        }
    }

    #[test]
    fn test_scorer_names() {
        assert_eq!(TokenSortRatio.name(), "token_sort_ratio");
        assert_eq!(WRatio.name(), "wratio");
        assert_eq!(TokenSortRatio.score("Doe Jane", "Jane Doe"), 100.0);
    }

    #[test]
    fn test_scorer_cutoff() {
        assert_eq!(Ratio.score_cutoff("abc", "xyz", 50.0), None);
        assert_eq!(Ratio.score_cutoff("abc", "abc", 50.0), Some(100.0));
    }
}
