//! Process-wide remote provider availability, decided once at startup.

use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};
use tutor_config::RemoteConfig;

use crate::backend::{GenerationBackend, GroqBackend};

/// Whether a remote provider is usable, and the backend if so.
#[derive(Clone)]
pub struct ProviderState {
    remote: Option<Arc<dyn GenerationBackend>>,
    model: String,
}

impl std::fmt::Debug for ProviderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderState")
            .field("available", &self.is_available())
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderState {
    /// Build from configuration. Never fails: a missing key or a client
    /// that cannot be constructed just leaves the remote path disabled.
    pub fn from_config(config: &RemoteConfig) -> Self {
        let Some(key) = config.credential() else {
            warn!(env = %config.api_key_env, "Remote API key not found - will use local models");
            return Self::disabled();
        };

        match GroqBackend::new(SecretString::from(key.to_string()), config) {
            Ok(backend) => {
                info!(model = %config.model, "Remote API key loaded");
                Self {
                    remote: Some(Arc::new(backend)),
                    model: config.model.clone(),
                }
            }
            Err(e) => {
                warn!(error = %e, "Remote client initialization failed - will use local models");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { remote: None, model: String::new() }
    }

    /// Use an already-constructed remote backend.
    pub fn with_backend(backend: Arc<dyn GenerationBackend>, model: impl Into<String>) -> Self {
        Self { remote: Some(backend), model: model.into() }
    }

    pub fn is_available(&self) -> bool {
        self.remote.is_some()
    }

    pub fn remote(&self) -> Option<Arc<dyn GenerationBackend>> {
        self.remote.clone()
    }

    /// Remote model name, if available.
    pub fn model(&self) -> Option<&str> {
        self.remote.as_ref().map(|_| self.model.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_disables_remote() {
        let state = ProviderState::from_config(&RemoteConfig::default());
        assert!(!state.is_available());
        assert!(state.remote().is_none());
        assert!(state.model().is_none());
    }

    #[test]
    fn test_blank_key_disables_remote() {
        let config = RemoteConfig { api_key: Some("  ".to_string()), ..RemoteConfig::default() };
        assert!(!ProviderState::from_config(&config).is_available());
    }

    #[test]
    fn test_key_enables_remote() {
        let config = RemoteConfig { api_key: Some("gsk-test".to_string()), ..RemoteConfig::default() };
        let state = ProviderState::from_config(&config);
        assert!(state.is_available());
        assert_eq!(state.model(), Some("llama-3.3-70b-versatile"));
        assert_eq!(state.remote().map(|b| b.name().to_string()).as_deref(), Some("groq"));
    }
}
