//! Question intent classification with a BERT sequence classifier.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config, HiddenAct, PositionEmbeddingType};
use serde::Serialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info, warn};
use tutor_config::ModelsConfig;

use crate::cell::{ModelCell, ModelFamily, ModelLoader};
use crate::hub::{fetch_model_files, read_json, select_device, var_builder};
use crate::{InferencePool, ModelError, ModelSpec, Result};

/// Intent labels, in classifier output order.
pub const INTENT_LABELS: [&str; 7] = [
    "definition",
    "concept",
    "numerical",
    "comparison",
    "explanation",
    "example",
    "other",
];

/// Label reported for blank input.
pub const FALLBACK_INTENT: &str = "other";

/// Blocking text classifier over [`INTENT_LABELS`].
pub trait SequenceClassifier: Send + Sync {
    fn model_id(&self) -> &str;

    /// Probability for each label, in [`INTENT_LABELS`] order.
    fn probabilities(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentPrediction {
    pub intent: String,
    pub confidence: f64,
    pub all_scores: BTreeMap<String, f64>,
}

impl IntentPrediction {
    /// Prediction for input with nothing to classify.
    pub fn empty() -> Self {
        Self {
            intent: FALLBACK_INTENT.to_string(),
            confidence: 0.0,
            all_scores: INTENT_LABELS.iter().map(|l| (l.to_string(), 0.0)).collect(),
        }
    }

    /// Pick the most probable label.
    pub fn from_probabilities(probs: &[f32]) -> Result<Self> {
        if probs.len() != INTENT_LABELS.len() {
            return Err(ModelError::Inference(format!(
                "classifier returned {} scores for {} labels",
                probs.len(),
                INTENT_LABELS.len()
            )));
        }

        let (best, confidence) = probs
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc });

        Ok(Self {
            intent: INTENT_LABELS[best].to_string(),
            confidence: confidence as f64,
            all_scores: INTENT_LABELS
                .iter()
                .zip(probs)
                .map(|(l, &p)| (l.to_string(), p as f64))
                .collect(),
        })
    }
}

/// BERT encoder + optional pooler + linear head.
pub struct BertIntentClassifier {
    model: BertModel,
    pooler: Option<Linear>,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    model_id: String,
}

impl BertIntentClassifier {
    /// Download (if needed) and instantiate the classifier. Blocking.
    pub fn load(spec: &ModelSpec, max_length: usize) -> Result<Self> {
        let start = Instant::now();
        let device = select_device(spec.use_gpu)?;
        debug!("Using device: {:?}", device);

        let files = fetch_model_files(spec)?;
        let bert_config = bert_config(&read_json(&files.config)?);
        let hidden = bert_config.hidden_size;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)?;
        tokenizer.with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))?;

        let vb = var_builder(&files.weights, &device)?;

        // Try to load BertModel with different prefixes
        let model = BertModel::load(vb.clone(), &bert_config)
            .or_else(|_| BertModel::load(vb.pp("bert"), &bert_config))
            .or_else(|_| BertModel::load(vb.pp("roberta"), &bert_config))
            .map_err(|e| ModelError::ModelLoad(format!("BertModel: {}", e)))?;

        let pooler = candle_nn::linear(hidden, hidden, vb.pp("bert.pooler.dense"))
            .or_else(|_| candle_nn::linear(hidden, hidden, vb.pp("pooler.dense")))
            .ok();

        let classifier = match classifier_head(&vb, hidden) {
            Ok(head) => head,
            Err(e) => {
                warn!(model_id = %spec.model_id, error = %e, "No intent head in checkpoint, scores will be uniform");
                zero_head(hidden, &device)?
            }
        };

        info!(
            model_id = %spec.model_id,
            "Intent classifier loaded in {:.2}s",
            start.elapsed().as_secs_f32()
        );

        Ok(Self {
            model,
            pooler,
            classifier,
            tokenizer,
            device,
            model_id: spec.model_id.clone(),
        })
    }
}

fn classifier_head(vb: &VarBuilder, hidden: usize) -> Result<Linear> {
    let n = INTENT_LABELS.len();
    candle_nn::linear(hidden, n, vb.pp("classifier"))
        .or_else(|_| candle_nn::linear(hidden, n, vb.pp("bert").pp("classifier")))
        .map_err(|e| ModelError::ModelLoad(format!("Classifier: {}", e)))
}

fn zero_head(hidden: usize, device: &Device) -> Result<Linear> {
    let n = INTENT_LABELS.len();
    let weight = Tensor::zeros((n, hidden), DType::F32, device)?;
    let bias = Tensor::zeros(n, DType::F32, device)?;
    Ok(Linear::new(weight, Some(bias)))
}

/// Build a candle BERT config from a hub `config.json`.
pub fn bert_config(json: &serde_json::Value) -> Config {
    let usize_field = |key: &str, default: u64| json.get(key).and_then(|v| v.as_u64()).unwrap_or(default) as usize;
    let f64_field = |key: &str, default: f64| json.get(key).and_then(|v| v.as_f64()).unwrap_or(default);

    let hidden_act = match json.get("hidden_act").and_then(|v| v.as_str()) {
        Some("relu") => HiddenAct::Relu,
        Some("gelu_new") | Some("gelu_approximate") => HiddenAct::GeluApproximate,
        _ => HiddenAct::Gelu,
    };

    Config {
        vocab_size: usize_field("vocab_size", 119_547),
        hidden_size: usize_field("hidden_size", 768),
        num_hidden_layers: usize_field("num_hidden_layers", 12),
        num_attention_heads: usize_field("num_attention_heads", 12),
        intermediate_size: usize_field("intermediate_size", 3072),
        hidden_act,
        hidden_dropout_prob: f64_field("hidden_dropout_prob", 0.1),
        max_position_embeddings: usize_field("max_position_embeddings", 512),
        type_vocab_size: usize_field("type_vocab_size", 2),
        initializer_range: f64_field("initializer_range", 0.02),
        layer_norm_eps: f64_field("layer_norm_eps", 1e-12),
        pad_token_id: usize_field("pad_token_id", 0),
        position_embedding_type: PositionEmbeddingType::Absolute,
        use_cache: true,
        classifier_dropout: None,
        model_type: json.get("model_type").and_then(|v| v.as_str()).map(str::to_string),
    }
}

impl SequenceClassifier for BertIntentClassifier {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn probabilities(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenizer.encode(text, true)?;
        let ids = encoding.get_ids();

        let input_ids = Tensor::new(ids, &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = input_ids.ones_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        // [CLS] position
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = match &self.pooler {
            Some(dense) => dense.forward(&cls)?.tanh()?,
            None => cls,
        };

        let logits = self.classifier.forward(&pooled)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()?;
        Ok(probs)
    }
}

/// Loads a [`BertIntentClassifier`] on the inference pool.
#[derive(Debug, Clone)]
pub struct BertIntentLoader {
    spec: ModelSpec,
    pool: InferencePool,
    max_length: usize,
}

impl BertIntentLoader {
    pub fn new(spec: ModelSpec, pool: InferencePool, max_length: usize) -> Self {
        Self { spec, pool, max_length }
    }
}

#[async_trait]
impl ModelLoader<dyn SequenceClassifier> for BertIntentLoader {
    fn model_id(&self) -> &str {
        &self.spec.model_id
    }

    async fn load(&self) -> Result<Arc<dyn SequenceClassifier>> {
        let spec = self.spec.clone();
        let max_length = self.max_length;
        let model = self
            .pool
            .run(move || BertIntentClassifier::load(&spec, max_length))
            .await?;
        let model: Arc<dyn SequenceClassifier> = Arc::new(model);
        Ok(model)
    }
}

pub struct IntentService {
    cell: ModelCell<dyn SequenceClassifier>,
    pool: InferencePool,
}

impl IntentService {
    pub fn new(cell: ModelCell<dyn SequenceClassifier>, pool: InferencePool) -> Self {
        Self { cell, pool }
    }

    pub fn from_config(models: &ModelsConfig, max_length: usize, pool: InferencePool) -> Self {
        let spec = ModelSpec::from_config(models, ModelFamily::Intent);
        let cell: ModelCell<dyn SequenceClassifier> =
            ModelCell::new(ModelFamily::Intent, BertIntentLoader::new(spec, pool.clone(), max_length));
        Self::new(cell, pool)
    }

    /// Classify `text`. Blank input returns [`IntentPrediction::empty`]
    /// without touching the model.
    pub async fn classify(&self, text: &str) -> Result<IntentPrediction> {
        if text.trim().is_empty() {
            return Ok(IntentPrediction::empty());
        }

        let model = self.cell.get().await?;
        let text = text.to_string();
        let probs = self.pool.run(move || model.probabilities(&text)).await?;
        let prediction = IntentPrediction::from_probabilities(&probs)?;

        debug!(intent = %prediction.intent, confidence = prediction.confidence, "Intent classified");
        Ok(prediction)
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.is_loaded()
    }

    pub fn model_id(&self) -> &str {
        self.cell.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier(Vec<f32>);

    impl SequenceClassifier for FixedClassifier {
        fn model_id(&self) -> &str {
            "fixed"
        }

        fn probabilities(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct FixedLoader {
        probs: Vec<f32>,
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelLoader<dyn SequenceClassifier> for FixedLoader {
        fn model_id(&self) -> &str {
            "fixed"
        }

        async fn load(&self) -> Result<Arc<dyn SequenceClassifier>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FixedClassifier(self.probs.clone())))
        }
    }

    fn service(probs: Vec<f32>) -> (IntentService, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let cell = ModelCell::new(ModelFamily::Intent, FixedLoader { probs, loads: loads.clone() });
        (IntentService::new(cell, InferencePool::new(1)), loads)
    }

    #[tokio::test]
    async fn test_blank_input_is_other_without_model() {
        let (svc, loads) = service(vec![1.0; 7]);
        let p = svc.classify("   ").await.unwrap();
        assert_eq!(p.intent, "other");
        assert_eq!(p.confidence, 0.0);
        assert_eq!(p.all_scores.len(), 7);
        assert!(p.all_scores.values().all(|&v| v == 0.0));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_label_selected() {
        let (svc, _) = service(vec![0.05, 0.05, 0.6, 0.1, 0.1, 0.05, 0.05]);
        let p = svc.classify("What is 12 times 7?").await.unwrap();
        assert_eq!(p.intent, "numerical");
        assert!((p.confidence - 0.6).abs() < 1e-6);
        assert!((p.all_scores["comparison"] - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_wrong_score_count_is_error() {
        let (svc, _) = service(vec![0.5, 0.5]);
        assert!(matches!(svc.classify("hello").await, Err(ModelError::Inference(_))));
    }

    #[test]
    fn test_bert_config_defaults() {
        let cfg = bert_config(&serde_json::json!({"hidden_size": 384, "model_type": "bert"}));
        assert_eq!(cfg.hidden_size, 384);
        assert_eq!(cfg.num_hidden_layers, 12);
        assert_eq!(cfg.model_type.as_deref(), Some("bert"));
    }

    #[test]
    fn test_zero_head_is_uniform() {
        let head = zero_head(8, &Device::Cpu).unwrap();
        let x = Tensor::ones((1, 8), DType::F32, &Device::Cpu).unwrap();
        let probs = candle_nn::ops::softmax(&head.forward(&x).unwrap(), D::Minus1)
            .unwrap()
            .squeeze(0)
            .unwrap()
            .to_vec1::<f32>()
            .unwrap();
        assert_eq!(probs.len(), 7);
        assert!(probs.iter().all(|p| (p - 1.0 / 7.0).abs() < 1e-6));
    }
}
