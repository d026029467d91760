//! T5-family encoder-decoder model used for local generation and translation.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::cell::ModelLoader;
use crate::hub::{fetch_model_files, select_device, var_builder};
use crate::sampling::{banned_ngram_tokens, SamplingParams};
use crate::{InferencePool, ModelError, ModelSpec, Result};

/// Blocking text-to-text generation.
pub trait TextGenerator: Send + Sync {
    fn model_id(&self) -> &str;

    /// Produce `params.num_return_sequences` outputs for `prompt`.
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Vec<String>>;
}

pub struct Seq2SeqModel {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
    model_id: String,
}

impl std::fmt::Debug for Seq2SeqModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seq2SeqModel")
            .field("model_id", &self.model_id)
            .field("device", &self.device)
            .finish()
    }
}

impl Seq2SeqModel {
    /// Download (if needed) and instantiate the model. Blocking.
    pub fn load(spec: &ModelSpec) -> Result<Self> {
        let start = Instant::now();
        let device = select_device(spec.use_gpu)?;
        debug!("Using device: {:?}", device);

        let files = fetch_model_files(spec)?;
        let mut config: t5::Config = serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;
        config.use_cache = true;

        let tokenizer = Tokenizer::from_file(&files.tokenizer)?;
        let vb = var_builder(&files.weights, &device)?;
        let model = T5ForConditionalGeneration::load(vb, &config)
            .map_err(|e| ModelError::ModelLoad(format!("T5: {}", e)))?;

        info!(
            model_id = %spec.model_id,
            "Seq2seq model loaded in {:.2}s",
            start.elapsed().as_secs_f32()
        );

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            model_id: spec.model_id.clone(),
        })
    }

    fn encode_prompt(&self, prompt: &str, max_input_tokens: usize) -> Result<Vec<u32>> {
        let encoding = self.tokenizer.encode(prompt, true)?;
        let mut ids = encoding.get_ids().to_vec();
        if max_input_tokens > 0 && ids.len() > max_input_tokens {
            debug!(tokens = ids.len(), max_input_tokens, "Truncating prompt");
            ids.truncate(max_input_tokens - 1);
            ids.push(self.config.eos_token_id as u32);
        }
        Ok(ids)
    }

    fn decode_sequence(
        &self,
        model: &mut T5ForConditionalGeneration,
        encoder_out: &Tensor,
        params: &SamplingParams,
        seed: u64,
    ) -> Result<Vec<u32>> {
        let start_token = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let eos = self.config.eos_token_id as u32;

        let mut processor = LogitsProcessor::from_sampling(seed, params.sampling());
        let mut tokens = vec![start_token];

        model.clear_kv_cache();
        while tokens.len() <= params.max_new_tokens {
            let step = if tokens.len() == 1 || !self.config.use_cache {
                &tokens[..]
            } else {
                &tokens[tokens.len() - 1..]
            };
            let step_input = Tensor::new(step, &self.device)?.unsqueeze(0)?;
            let logits = model.decode(&step_input, encoder_out)?.squeeze(0)?;

            let banned = banned_ngram_tokens(&tokens[1..], params.no_repeat_ngram_size);
            let logits = mask_tokens(&logits, &banned)?;

            let next = processor.sample(&logits)?;
            if next == eos {
                break;
            }
            tokens.push(next);
        }
        model.clear_kv_cache();

        Ok(tokens.split_off(1))
    }
}

/// Set the logits of `banned` token ids to negative infinity.
fn mask_tokens(logits: &Tensor, banned: &[u32]) -> Result<Tensor> {
    if banned.is_empty() {
        return Ok(logits.clone());
    }
    let mut values = logits.to_dtype(DType::F32)?.to_vec1::<f32>()?;
    for &token in banned {
        if let Some(v) = values.get_mut(token as usize) {
            *v = f32::NEG_INFINITY;
        }
    }
    let len = values.len();
    Ok(Tensor::from_vec(values, len, logits.device())?)
}

impl TextGenerator for Seq2SeqModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Vec<String>> {
        let start = Instant::now();
        let ids = self.encode_prompt(prompt, params.max_input_tokens)?;

        let mut model = self
            .model
            .lock()
            .map_err(|_| ModelError::Worker("seq2seq model lock poisoned".to_string()))?;

        let input = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let encoder_out = model.encode(&input)?;

        let n = params.num_return_sequences.max(1);
        let mut outputs = Vec::with_capacity(n);
        for i in 0..n {
            let tokens =
                self.decode_sequence(&mut model, &encoder_out, params, params.seed.wrapping_add(i as u64))?;
            outputs.push(self.tokenizer.decode(&tokens, true)?.trim().to_string());
        }

        debug!(
            input_tokens = ids.len(),
            sequences = n,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Local generation finished"
        );
        Ok(outputs)
    }
}

/// Loads a [`Seq2SeqModel`] on the inference pool.
#[derive(Debug, Clone)]
pub struct Seq2SeqLoader {
    spec: ModelSpec,
    pool: InferencePool,
}

impl Seq2SeqLoader {
    pub fn new(spec: ModelSpec, pool: InferencePool) -> Self {
        Self { spec, pool }
    }

    pub(crate) fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub(crate) async fn load_model(&self) -> Result<Arc<Seq2SeqModel>> {
        let spec = self.spec.clone();
        let model = self.pool.run(move || Seq2SeqModel::load(&spec)).await?;
        Ok(Arc::new(model))
    }
}

#[async_trait]
impl ModelLoader<dyn TextGenerator> for Seq2SeqLoader {
    fn model_id(&self) -> &str {
        &self.spec().model_id
    }

    async fn load(&self) -> Result<Arc<dyn TextGenerator>> {
        let model: Arc<dyn TextGenerator> = self.load_model().await?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_tokens() {
        let logits = Tensor::new(&[0.5f32, 1.0, 2.0, -1.0], &Device::Cpu).unwrap();
        let masked = mask_tokens(&logits, &[2, 9]).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(masked[0], 0.5);
        assert_eq!(masked[2], f32::NEG_INFINITY);
        assert_eq!(masked.len(), 4);
    }

    #[test]
    fn test_mask_nothing_is_identity() {
        let logits = Tensor::new(&[0.5f32, 1.0], &Device::Cpu).unwrap();
        let masked = mask_tokens(&logits, &[]).unwrap().to_vec1::<f32>().unwrap();
        assert_eq!(masked, vec![0.5, 1.0]);
    }

    #[test]
    #[ignore = "downloads google/flan-t5-small from the hub"]
    fn test_generate_with_real_model() {
        let spec = ModelSpec::default().cpu();
        let model = Seq2SeqModel::load(&spec).unwrap();
        let params = SamplingParams::default().greedy(16);
        let out = model.generate("Translate English to German: Good morning", &params).unwrap();
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_empty());
    }
}
