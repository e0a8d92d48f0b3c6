/*!
 * Provider clients for the external services the pipeline depends on.
 *
 * Each client wraps exactly one endpoint and performs one bounded network
 * call per invocation:
 * - `google_vision`: image -> text (OCR)
 * - `google_translate`: text -> text (primary translation)
 * - `libre_translate`: text -> text (fallback translation)
 * - `google_tts`: text -> audio bytes (speech synthesis)
 *
 * Clients never retry and never substitute data; retries happen by moving
 * down the fallback chain. Terminal stand-ins live in `offline`.
 */

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

use crate::errors::ProviderError;

/// External capability a provider serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Ocr,
    Translation,
    Speech,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Ocr => write!(f, "ocr"),
            Capability::Translation => write!(f, "translation"),
            Capability::Speech => write!(f, "speech"),
        }
    }
}

/// OCR input: the raw image plus the reference it was loaded from
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub image: Bytes,
    pub reference: String,
}

/// Text recognized in an image
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    pub text: String,
    /// Script label, only when the provider reports one
    pub detected_script: Option<String>,
    /// Whatever the winning provider reports; not comparable across providers
    pub confidence: f64,
}

/// Translation input; the source language is always left to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
}

/// Translated text
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedText {
    pub translated_text: String,
}

/// Speech synthesis input
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_locale: String,
}

/// Synthesized audio ready to be stored
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Bytes,
    /// File extension of the encoding (e.g. "mp3")
    pub extension: String,
    pub content_type: String,
}

/// Common trait for all provider clients
///
/// Implementations map every transport and parsing failure to one
/// `ProviderErrorKind`, so the fallback chain can treat them uniformly.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Input: Send + Sync;

    /// The response type for this provider
    type Output: Send + Sync;

    /// Stable provider name used in logs and attempt records
    fn name(&self) -> &str;

    /// Capability this provider serves
    fn capability(&self) -> Capability;

    /// Perform one call against the provider
    async fn invoke(&self, input: &Self::Input) -> Result<Self::Output, ProviderError>;
}

pub type OcrProvider = dyn Provider<Input = OcrRequest, Output = RecognizedText>;
pub type TranslateProvider = dyn Provider<Input = TranslationRequest, Output = TranslatedText>;
pub type SpeechProvider = dyn Provider<Input = SpeechRequest, Output = SynthesizedAudio>;

pub mod http;
pub mod google_vision;
pub mod google_translate;
pub mod libre_translate;
pub mod google_tts;
pub mod offline;
pub mod mock;

pub use google_translate::GoogleTranslate;
pub use google_tts::GoogleTts;
pub use google_vision::GoogleVision;
pub use libre_translate::LibreTranslate;
