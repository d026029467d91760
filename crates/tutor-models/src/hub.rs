//! Hugging Face hub access and device selection.
//!
//! All functions here block on network or disk and are meant to be called
//! from inside [`crate::InferencePool::run`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use crate::{ModelError, ModelSpec, Result};

/// Select the best available device.
pub fn select_device(use_gpu: bool) -> Result<Device> {
    if !use_gpu {
        return Ok(Device::Cpu);
    }

    #[cfg(feature = "cuda")]
    {
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("CUDA device available");
                return Ok(device);
            }
            Err(e) => {
                debug!("CUDA not available: {}, falling back to CPU", e);
            }
        }
    }

    #[cfg(feature = "metal")]
    {
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Metal device available");
                return Ok(device);
            }
            Err(e) => {
                debug!("Metal not available: {}, falling back to CPU", e);
            }
        }
    }

    Ok(Device::Cpu)
}

/// Local paths of everything needed to instantiate a model.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: Vec<PathBuf>,
}

fn open_repo(spec: &ModelSpec) -> Result<ApiRepo> {
    let mut builder = ApiBuilder::new().with_progress(false);
    if let Some(dir) = &spec.cache_dir {
        builder = builder.with_cache_dir(PathBuf::from(dir));
    }
    let api = builder
        .build()
        .map_err(|e| ModelError::Download(format!("API init: {}", e)))?;
    Ok(api.repo(Repo::new(spec.model_id.clone(), RepoType::Model)))
}

/// Download (or reuse from cache) config, tokenizer and weights for `spec`.
pub fn fetch_model_files(spec: &ModelSpec) -> Result<ModelFiles> {
    let repo = open_repo(spec)?;

    info!(model_id = %spec.model_id, "Fetching config.json");
    let config = repo
        .get("config.json")
        .map_err(|e| ModelError::Download(format!("config.json: {}", e)))?;

    let tokenizer = repo
        .get("tokenizer.json")
        .map_err(|e| ModelError::Download(format!("tokenizer.json: {}", e)))?;

    let weights = match repo.get("model.safetensors") {
        Ok(path) => vec![path],
        Err(single_err) => {
            debug!("model.safetensors missing ({}), trying sharded index", single_err);
            let index = repo
                .get("model.safetensors.index.json")
                .map_err(|e| ModelError::Download(format!("model weights: {}", e)))?;
            let shards = shard_files(&std::fs::read_to_string(&index)?)?;
            info!(shards = shards.len(), "Fetching sharded weights");
            shards
                .iter()
                .map(|name| {
                    repo.get(name)
                        .map_err(|e| ModelError::Download(format!("{}: {}", name, e)))
                })
                .collect::<Result<Vec<_>>>()?
        }
    };

    Ok(ModelFiles { config, tokenizer, weights })
}

/// Distinct shard file names listed in a safetensors index, sorted.
pub fn shard_files(index_json: &str) -> Result<Vec<String>> {
    let index: serde_json::Value = serde_json::from_str(index_json)?;
    let map = index
        .get("weight_map")
        .and_then(|m| m.as_object())
        .ok_or_else(|| ModelError::ModelLoad("index has no weight_map".to_string()))?;

    let files: BTreeSet<String> = map
        .values()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect();

    if files.is_empty() {
        return Err(ModelError::ModelLoad("weight_map is empty".to_string()));
    }
    Ok(files.into_iter().collect())
}

/// Memory-map safetensors weights into a `VarBuilder`.
pub fn var_builder(weights: &[PathBuf], device: &Device) -> Result<VarBuilder<'static>> {
    // SAFETY: the files are hub cache entries that are not modified while mapped.
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(weights, DType::F32, device) }
        .map_err(|e| ModelError::ModelLoad(e.to_string()))?;
    Ok(vb)
}

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_files_dedup_and_sort() {
        let index = r#"{
            "metadata": {"total_size": 10},
            "weight_map": {
                "shared.weight": "model-00002-of-00002.safetensors",
                "encoder.block.0.layer.0.SelfAttention.q.weight": "model-00001-of-00002.safetensors",
                "encoder.block.0.layer.0.SelfAttention.k.weight": "model-00001-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_files(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors".to_string(),
                "model-00002-of-00002.safetensors".to_string(),
            ]
        );
    }

    #[test]
    fn test_shard_files_requires_weight_map() {
        assert!(matches!(shard_files("{}"), Err(ModelError::ModelLoad(_))));
        assert!(matches!(shard_files("not json"), Err(ModelError::Json(_))));
    }

    #[test]
    fn test_cpu_when_gpu_disabled() {
        assert!(matches!(select_device(false).unwrap(), Device::Cpu));
    }
}
