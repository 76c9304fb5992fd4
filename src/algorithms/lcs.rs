//! Longest Common Subsequence and Indel similarity
//!
//! The Indel distance only allows insertions and deletions, so
//! `indel(a, b) = len(a) + len(b) - 2 * lcs(a, b)`. Normalizing it by the
//! combined length gives the classic `ratio` used by RapidFuzz.
//!
//! # Complexity
//! - Time: O(m*n)
//! - Space: O(n), single DP row kept on the stack for short strings

use smallvec::SmallVec;

/// Length of the Longest Common Subsequence of two char slices.
#[must_use]
pub fn lcs_length_chars(a: &[char], b: &[char]) -> usize {
    let (m, n) = (a.len(), b.len());
    if m == 0 || n == 0 {
        return 0;
    }

    // Keep the shorter string on the column axis
    let (rows, cols) = if m < n { (b, a) } else { (a, b) };
    let width = cols.len();

    let mut prev: SmallVec<[usize; 64]> = SmallVec::from_elem(0, width + 1);
    let mut curr: SmallVec<[usize; 64]> = SmallVec::from_elem(0, width + 1);

    for &rc in rows {
        curr[0] = 0;
        for j in 1..=width {
            curr[j] = if rc == cols[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(curr[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[width]
}

/// Length of the Longest Common Subsequence.
#[must_use]
pub fn lcs_length(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    lcs_length_chars(&a_chars, &b_chars)
}

/// Indel distance (insertions + deletions).
#[must_use]
pub fn indel_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    a_chars.len() + b_chars.len() - 2 * lcs_length_chars(&a_chars, &b_chars)
}

/// Normalized Indel similarity of char slices (0.0 to 1.0).
///
/// Two empty inputs are identical.
#[must_use]
pub fn indel_similarity_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_length_chars(a, b) as f64 / total as f64
}

/// Normalized Indel similarity (0.0 to 1.0): `2 * LCS / (len(a) + len(b))`.
#[must_use]
pub fn indel_similarity(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    indel_similarity_chars(&a_chars, &b_chars)
}
