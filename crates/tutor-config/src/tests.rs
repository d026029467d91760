use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_defaults_without_file() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:8000");
    assert_eq!(config.server.workers, 4);
    assert_eq!(config.cors.policy(), OriginPolicy::Any);
    assert_eq!(config.remote.api_key_env, "GROQ_API_KEY");
    assert!(config.remote.credential().is_none());
    assert_eq!(config.sampling.top_k, 50);
    assert_eq!(config.sampling.no_repeat_ngram_size, 3);
    assert_eq!(config.language.fallback_language, "en");
    assert_eq!(config.language.min_confidence, 0.0);
}

#[test]
fn test_partial_sections_keep_defaults() {
    let config = Config::from_toml_str(
        r#"
        [server]
        bind = "127.0.0.1:9000"

        [models]
        generation = "google/flan-t5-base"
        use_gpu = false
        "#,
    )
    .unwrap();
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.server.request_timeout_secs, 300);
    assert_eq!(config.models.generation, "google/flan-t5-base");
    assert_eq!(config.models.translation, "jbochi/madlad400-3b-mt");
    assert!(!config.models.use_gpu);
}

#[test]
fn test_env_overrides() {
    let vars = env(&[
        ("GROQ_API_KEY", "gsk-test"),
        ("ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
        ("TUTOR_BIND", "127.0.0.1:7000"),
    ]);
    let mut config = Config::default();
    config.apply_env_overrides(|k| vars.get(k).cloned());

    assert_eq!(config.remote.credential(), Some("gsk-test"));
    assert_eq!(config.server.bind, "127.0.0.1:7000");
    assert_eq!(
        config.cors.policy(),
        OriginPolicy::List(vec!["https://a.example".to_string(), "https://b.example".to_string()])
    );
}

#[test]
fn test_custom_key_variable() {
    let vars = env(&[("MY_KEY", "k"), ("GROQ_API_KEY", "ignored")]);
    let mut config = Config::from_toml_str("[remote]\napi_key_env = \"MY_KEY\"\n").unwrap();
    config.apply_env_overrides(|k| vars.get(k).cloned());
    assert_eq!(config.remote.credential(), Some("k"));
}

#[test]
fn test_blank_key_is_not_a_credential() {
    let mut config = Config::default();
    config.remote.api_key = Some("   ".to_string());
    assert!(config.remote.credential().is_none());
}

#[test]
fn test_wildcard_origins() {
    assert_eq!(parse_origins(" * "), vec!["*".to_string()]);
    let cors = CorsConfig { allowed_origins: parse_origins("*") };
    assert_eq!(cors.policy(), OriginPolicy::Any);
}

#[test]
fn test_debug_redacts_key() {
    let mut remote = RemoteConfig::default();
    remote.api_key = Some("gsk-secret".to_string());
    let printed = format!("{:?}", remote);
    assert!(!printed.contains("gsk-secret"));
    assert!(printed.contains("<redacted>"));
}

#[test]
fn test_validate_rejects_zero_workers() {
    let mut config = Config::default();
    config.server.workers = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_language_floor_from_file() {
    let config = Config::from_toml_str(
        r#"
        [language]
        min_confidence = 0.4
        "#,
    )
    .unwrap();
    assert_eq!(config.language.min_confidence, 0.4);
    assert_eq!(config.language.fallback_confidence, 0.5);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_floor_above_one() {
    let mut config = Config::default();
    config.language.min_confidence = 1.5;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_parse_error_surfaces() {
    let err = Config::from_toml_str("[server\nbind = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
