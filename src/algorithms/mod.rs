//! String similarity scorers
//!
//! The matchers never name an algorithm directly: they take a [`Scorer`].
//! RapidFuzz-compatible implementations live in [`fuzz`]; any
//! `Fn(&str, &str) -> f64` closure is a scorer as well.

pub mod fuzz;
pub mod lcs;
pub mod normalize;

pub use fuzz::{PartialRatio, Ratio, TokenSetRatio, TokenSortRatio, WRatio};

/// Perfect similarity score.
pub const MAX_SCORE: f64 = 100.0;

/// Trait for similarity scorers.
/// Scores are percentages: 0.0 (completely different) to 100.0 (identical).
pub trait Scorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> f64;

    /// Score, or `None` when it falls below `cutoff`.
    fn score_cutoff(&self, a: &str, b: &str, cutoff: f64) -> Option<f64> {
        let score = self.score(a, b);
        (score >= cutoff).then_some(score)
    }

    /// Best candidate for `query` scoring at least `cutoff`.
    ///
    /// Returns the candidate's position and score. On exact ties the first
    /// candidate wins, so the result follows candidate order.
    fn best_match(&self, query: &str, candidates: &[&str], cutoff: f64) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (pos, candidate) in candidates.iter().enumerate() {
            let floor = best.map_or(cutoff, |(_, score)| score);
            let Some(score) = self.score_cutoff(query, candidate, floor) else {
                continue;
            };
            if best.map_or(true, |(_, current)| score > current) {
                best = Some((pos, score));
                if score >= MAX_SCORE {
                    break; // Can't do better than perfect match
                }
            }
        }
        best
    }

    /// Name of the algorithm for logging
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> Scorer for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn score(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Round a score to two decimal places for reporting.
#[inline]
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
