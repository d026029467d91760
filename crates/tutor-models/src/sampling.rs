//! Decoding parameters for local seq2seq generation.

use candle_transformers::generation::Sampling;
use tutor_config::SamplingConfig;

/// Per-call decoding settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: usize,
    /// 0.0 selects greedy decoding.
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,
    /// 0 disables the constraint.
    pub no_repeat_ngram_size: usize,
    pub num_return_sequences: usize,
    pub max_input_tokens: usize,
    pub seed: u64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::from_config(&SamplingConfig::default())
    }
}

impl SamplingParams {
    pub fn from_config(config: &SamplingConfig) -> Self {
        Self {
            max_new_tokens: 200,
            temperature: 0.7,
            top_k: config.top_k,
            top_p: config.top_p,
            no_repeat_ngram_size: config.no_repeat_ngram_size,
            num_return_sequences: config.num_return_sequences.max(1),
            max_input_tokens: config.max_input_tokens,
            seed: config.seed,
        }
    }

    /// Same settings with a call-specific budget and temperature.
    pub fn with_budget(mut self, max_new_tokens: usize, temperature: f64) -> Self {
        self.max_new_tokens = max_new_tokens.max(1);
        self.temperature = temperature.max(0.0);
        self
    }

    /// Deterministic single-sequence decoding.
    pub fn greedy(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens.max(1);
        self.temperature = 0.0;
        self.num_return_sequences = 1;
        self
    }

    pub fn sampling(&self) -> Sampling {
        if self.temperature <= 0.0 {
            Sampling::ArgMax
        } else {
            Sampling::TopKThenTopP {
                k: self.top_k.max(1),
                p: self.top_p,
                temperature: self.temperature,
            }
        }
    }
}

/// Tokens that would complete an n-gram already present in `generated`.
pub fn banned_ngram_tokens(generated: &[u32], n: usize) -> Vec<u32> {
    if n == 0 || generated.len() < n {
        return Vec::new();
    }
    let prefix = &generated[generated.len() - (n - 1)..];
    let mut banned: Vec<u32> = generated
        .windows(n)
        .filter(|w| &w[..n - 1] == prefix)
        .map(|w| w[n - 1])
        .collect();
    banned.sort_unstable();
    banned.dedup();
    banned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigram_repeat_is_banned() {
        // "1 2 3 ... 1 2" must not be followed by 3 again
        assert_eq!(banned_ngram_tokens(&[1, 2, 3, 4, 1, 2], 3), vec![3]);
    }

    #[test]
    fn test_multiple_continuations() {
        assert_eq!(banned_ngram_tokens(&[7, 8, 9, 7, 8, 5, 7, 8], 3), vec![5, 9]);
    }

    #[test]
    fn test_short_history_bans_nothing() {
        assert!(banned_ngram_tokens(&[1, 2], 3).is_empty());
        assert!(banned_ngram_tokens(&[1, 2, 3], 0).is_empty());
    }

    #[test]
    fn test_unigram_bans_everything_seen() {
        assert_eq!(banned_ngram_tokens(&[4, 2, 4], 1), vec![2, 4]);
    }

    #[test]
    fn test_zero_temperature_is_argmax() {
        let params = SamplingParams::default().with_budget(10, 0.0);
        assert!(matches!(params.sampling(), Sampling::ArgMax));
    }

    #[test]
    fn test_sampling_uses_top_k_then_top_p() {
        let params = SamplingParams::default().with_budget(10, 0.7);
        match params.sampling() {
            Sampling::TopKThenTopP { k, p, temperature } => {
                assert_eq!(k, 50);
                assert!((p - 0.9).abs() < 1e-9);
                assert!((temperature - 0.7).abs() < 1e-9);
            }
            _ => panic!("expected top-k then top-p sampling"),
        }
    }

    #[test]
    fn test_greedy_forces_single_sequence() {
        let params = SamplingParams { num_return_sequences: 3, ..SamplingParams::default() }.greedy(0);
        assert_eq!(params.num_return_sequences, 1);
        assert_eq!(params.max_new_tokens, 1);
    }
}
