//! Configuration loading for the tutor service.
//! Reads tutor.toml from the current directory or the path in TUTOR_CONFIG,
//! then applies environment overrides (a `.env` file is honoured).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ── Server ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound on concurrent local model jobs.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Deadline applied to every request handler.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bind()            -> String { "0.0.0.0:8000".to_string() }
fn default_workers()         -> usize  { 4 }
fn default_request_timeout() -> u64    { 300 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            workers: default_workers(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// ── CORS ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> { vec!["*".to_string()] }

impl Default for CorsConfig {
    fn default() -> Self {
        Self { allowed_origins: default_allowed_origins() }
    }
}

/// Resolved cross-origin policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    Any,
    List(Vec<String>),
}

impl CorsConfig {
    pub fn policy(&self) -> OriginPolicy {
        if self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o.trim() == "*") {
            OriginPolicy::Any
        } else {
            OriginPolicy::List(self.allowed_origins.clone())
        }
    }
}

/// Parse a comma-separated origin list; `*` alone means any origin.
pub fn parse_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return default_allowed_origins();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Remote provider ───────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Inline key; the environment variable wins when both are set.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    #[serde(default = "default_remote_model")]
    pub model: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_remote_top_p")]
    pub top_p: f32,
}

fn default_api_key_env()     -> String { "GROQ_API_KEY".to_string() }
fn default_remote_base_url() -> String { "https://api.groq.com/openai".to_string() }
fn default_remote_model()    -> String { "llama-3.3-70b-versatile".to_string() }
fn default_remote_timeout()  -> u64    { 60 }
fn default_remote_top_p()    -> f32    { 0.95 }

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_key: None,
            base_url: default_remote_base_url(),
            model: default_remote_model(),
            timeout_secs: default_remote_timeout(),
            top_p: default_remote_top_p(),
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl RemoteConfig {
    /// The configured key, if it is non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

// ── Local models ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Seq2seq model shared by answer, notes and quiz generation.
    #[serde(default = "default_generation_model")]
    pub generation: String,
    /// Multilingual seq2seq model used for every language pair.
    #[serde(default = "default_translation_model")]
    pub translation: String,
    /// BERT sequence-classification checkpoint with an intent head.
    #[serde(default = "default_intent_model")]
    pub intent: String,
    /// Hugging Face cache directory; hub default when unset.
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default = "bool_true")]
    pub use_gpu: bool,
}

fn default_generation_model()  -> String { "google/flan-t5-small".to_string() }
fn default_translation_model() -> String { "jbochi/madlad400-3b-mt".to_string() }
fn default_intent_model()      -> String { "bert-base-multilingual-cased".to_string() }
fn bool_true()                 -> bool   { true }

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            generation: default_generation_model(),
            translation: default_translation_model(),
            intent: default_intent_model(),
            cache_dir: None,
            use_gpu: true,
        }
    }
}

// ── Local sampling ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_no_repeat_ngram")]
    pub no_repeat_ngram_size: usize,
    #[serde(default = "default_num_return_sequences")]
    pub num_return_sequences: usize,
    /// Prompts are truncated to this many tokens before encoding.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    #[serde(default = "default_translation_max_tokens")]
    pub translation_max_tokens: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_top_p()                  -> f64   { 0.9 }
fn default_top_k()                  -> usize { 50 }
fn default_no_repeat_ngram()        -> usize { 3 }
fn default_num_return_sequences()   -> usize { 1 }
fn default_max_input_tokens()       -> usize { 512 }
fn default_translation_max_tokens() -> usize { 200 }
fn default_seed()                   -> u64   { 299_792_458 }

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            top_p: default_top_p(),
            top_k: default_top_k(),
            no_repeat_ngram_size: default_no_repeat_ngram(),
            num_return_sequences: default_num_return_sequences(),
            max_input_tokens: default_max_input_tokens(),
            translation_max_tokens: default_translation_max_tokens(),
            seed: default_seed(),
        }
    }
}

// ── Language detection ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Reported when the detector cannot decide.
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,
    /// Detections scoring below this are treated as undecidable. 0 disables.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_fallback_language()   -> String { "en".to_string() }
fn default_fallback_confidence() -> f64    { 0.5 }
fn default_min_confidence()      -> f64    { 0.0 }

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            fallback_language: default_fallback_language(),
            fallback_confidence: default_fallback_confidence(),
            min_confidence: default_min_confidence(),
        }
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "tutor_web=debug,tutor_llm=debug,tutor_models=debug,info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Load configuration from tutor.toml (optional) plus environment overrides.
    /// Checks TUTOR_CONFIG env var first, then the current directory.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        let path = std::env::var("TUTOR_CONFIG")
            .unwrap_or_else(|_| "tutor.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            Self::from_toml_str(&content)?
        } else {
            tracing::info!(path = %path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(&self.remote.api_key_env) {
            self.remote.api_key = Some(key);
        }
        if let Some(raw) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = parse_origins(&raw);
        }
        if let Some(bind) = lookup("TUTOR_BIND") {
            self.server.bind = bind;
        }
        if let Some(dir) = lookup("TUTOR_MODEL_CACHE_DIR") {
            self.models.cache_dir = Some(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::Invalid("server.workers must be at least 1".to_string()));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("server.request_timeout_secs must be positive".to_string()));
        }
        if self.sampling.num_return_sequences == 0 {
            return Err(ConfigError::Invalid("sampling.num_return_sequences must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.sampling.top_p) {
            return Err(ConfigError::Invalid("sampling.top_p must be within [0, 1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.language.min_confidence) {
            return Err(ConfigError::Invalid("language.min_confidence must be within [0, 1]".to_string()));
        }
        Ok(())
    }
}
