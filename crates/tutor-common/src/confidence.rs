//! Synthetic confidence scores attached to generated candidates.
//!
//! None of these values are calibrated probabilities. Remote candidates get a
//! fixed score and local candidates get a linearly decaying rank score; they
//! only communicate ordering to clients.

/// Score given to the single candidate returned by the remote provider.
pub const REMOTE_CONFIDENCE: f32 = 0.95;

/// Rank decrement applied to each subsequent local candidate.
pub const LOCAL_SCORE_DECREMENT: f32 = 0.1;

/// Text returned when every provider failed.
pub const DEGRADED_PLACEHOLDER: &str = "Error generating answer";

/// Rank scores for `n` local candidates: 1.0, 1.0 - d, 1.0 - 2d, …
/// Returns values in [0.0, 1.0].
pub fn ranked_scores(n: usize, decrement: f32) -> Vec<f32> {
    (0..n)
        .map(|i| (1.0 - i as f32 * decrement).clamp(0.0, 1.0))
        .collect()
}
