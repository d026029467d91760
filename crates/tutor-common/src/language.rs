//! Languages supported by the translation service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hindi,
    Telugu,
    Tamil,
    Kannada,
    English,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unsupported language pair: {source_lang} -> {target_lang}")]
pub struct UnsupportedLanguage {
    pub source_lang: String,
    pub target_lang: String,
}

impl Language {
    /// All supported languages, in display order.
    pub const ALL: [Language; 5] = [
        Language::Hindi,
        Language::Telugu,
        Language::Tamil,
        Language::Kannada,
        Language::English,
    ];

    /// ISO 639-1 code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hindi   => "hi",
            Language::Telugu  => "te",
            Language::Tamil   => "ta",
            Language::Kannada => "kn",
            Language::English => "en",
        }
    }

    /// Language + script code (FLORES-200 style).
    pub fn model_code(&self) -> &'static str {
        match self {
            Language::Hindi   => "hin_Deva",
            Language::Telugu  => "tel_Telu",
            Language::Tamil   => "tam_Taml",
            Language::Kannada => "kan_Knda",
            Language::English => "eng_Latn",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Hindi   => "hindi",
            Language::Telugu  => "telugu",
            Language::Tamil   => "tamil",
            Language::Kannada => "kannada",
            Language::English => "english",
        }
    }

    /// Parse a wire code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == code)
    }

    /// Resolve a (source, target) pair, failing if either side is unknown.
    pub fn resolve_pair(source: &str, target: &str) -> Result<(Self, Self), UnsupportedLanguage> {
        match (Self::from_code(source), Self::from_code(target)) {
            (Some(s), Some(t)) => Ok((s, t)),
            _ => Err(UnsupportedLanguage {
                source_lang: source.trim().to_ascii_lowercase(),
                target_lang: target.trim().to_ascii_lowercase(),
            }),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_case_insensitive() {
        assert_eq!(Language::from_code("HI"), Some(Language::Hindi));
        assert_eq!(Language::from_code(" kn "), Some(Language::Kannada));
        assert_eq!(Language::from_code("xx"), None);
    }

    #[test]
    fn test_resolve_pair_rejects_unknown_target() {
        let err = Language::resolve_pair("en", "xx").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported language pair: en -> xx");
    }

    #[test]
    fn test_model_codes() {
        assert_eq!(Language::Telugu.model_code(), "tel_Telu");
        assert_eq!(Language::English.model_code(), "eng_Latn");
    }
}
