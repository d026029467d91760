//! Shared application state for the web server.

use std::sync::Arc;
use std::time::Duration;

use tutor_config::{Config, OriginPolicy};
use tutor_llm::{GenerationService, ProviderState};
use tutor_models::{InferencePool, IntentService, LanguageDetector, TranslationService};

/// Services injected into every handler. Built once at startup; local
/// models inside the services load lazily on first use.
pub struct AppState {
    pub detector: LanguageDetector,
    pub intents: IntentService,
    pub translator: TranslationService,
    pub generator: GenerationService,
    pub providers: ProviderState,
    pub pool: InferencePool,
    pub request_timeout: Duration,
    pub origins: OriginPolicy,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let pool = InferencePool::new(config.server.workers);
        let providers = ProviderState::from_config(&config.remote);

        Self {
            detector: LanguageDetector::new(&config.language),
            intents: IntentService::from_config(&config.models, config.sampling.max_input_tokens, pool.clone()),
            translator: TranslationService::from_config(&config.models, &config.sampling, pool.clone()),
            generator: GenerationService::from_config(config, &providers, pool.clone()),
            providers,
            pool,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            origins: config.cors.policy(),
        }
    }
}

pub type SharedState = Arc<AppState>;
