//! Statistical language identification.

use serde::Serialize;
use tracing::debug;
use tutor_config::LanguageConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedLanguage {
    pub language: String,
    pub confidence: f64,
}

/// Trigram-based detector reporting ISO 639-1 codes.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    fallback_language: String,
    fallback_confidence: f64,
    min_confidence: f64,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(&LanguageConfig::default())
    }
}

impl LanguageDetector {
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            fallback_language: config.fallback_language.clone(),
            fallback_confidence: config.fallback_confidence,
            min_confidence: config.min_confidence,
        }
    }

    /// Most probable language of `text`, or the fallback when undecidable.
    ///
    /// Unreliable detections are reported as-is unless they score below
    /// the configured `min_confidence`.
    pub fn detect(&self, text: &str) -> DetectedLanguage {
        match whatlang::detect(text) {
            Some(info) => {
                debug!(
                    detected = info.lang().code(),
                    confidence = info.confidence(),
                    reliable = info.is_reliable(),
                    "Language detected"
                );
                self.resolve(info.lang().code(), info.confidence())
            }
            None => self.fallback(),
        }
    }

    fn resolve(&self, code: &str, confidence: f64) -> DetectedLanguage {
        if confidence < self.min_confidence {
            debug!(
                detected = code,
                confidence,
                floor = self.min_confidence,
                "Detection below confidence floor, using fallback"
            );
            return self.fallback();
        }
        DetectedLanguage {
            language: canonicalize(iso639_1(code)).to_string(),
            confidence,
        }
    }

    fn fallback(&self) -> DetectedLanguage {
        DetectedLanguage {
            language: self.fallback_language.clone(),
            confidence: self.fallback_confidence,
        }
    }
}

/// Fold related Indic languages onto the supported set.
pub fn canonicalize(code: &str) -> &str {
    match code {
        "mr" | "gu" | "bn" => "hi",
        other => other,
    }
}

/// Two-letter code for a three-letter ISO 639-3 code; unknown codes pass through.
pub fn iso639_1(code: &str) -> &str {
    match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}
