/*!
 * Chain registry.
 *
 * Builds the three fallback chains once, at process start, from the
 * configuration file and the credentials found in the environment. A
 * provider whose credential is missing, or which is disabled, is simply not
 * in its chain; nothing downstream checks for it again.
 */

use std::sync::Arc;

use log::info;

use crate::app_config::Config;
use crate::chain::FallbackChain;
use crate::pipeline::{Chains, OcrChain, SpeechChain, TranslationChain};
use crate::providers::offline::{OfflineOcr, OfflineTranslator};
use crate::providers::{Capability, GoogleTranslate, GoogleTts, GoogleVision, LibreTranslate};

/// Environment variable holding the Google Cloud API key (Vision, Translate, TTS)
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Environment variable holding the optional LibreTranslate key
pub const LIBRETRANSLATE_API_KEY_VAR: &str = "LIBRETRANSLATE_API_KEY";

/// Provider secrets, read from the environment only
#[derive(Clone, Default)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub libretranslate_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "<redacted>"))
            .field("libretranslate_api_key", &self.libretranslate_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment; blank values count as absent
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            google_api_key: read(GOOGLE_API_KEY_VAR),
            libretranslate_api_key: read(LIBRETRANSLATE_API_KEY_VAR),
        }
    }
}

/// Build the OCR, translation and speech chains
///
/// OCR and translation always end in an offline generator; speech has none.
pub fn build_chains(config: &Config, credentials: &Credentials) -> Chains {
    let providers = &config.providers;
    let google_key = credentials.google_api_key.as_deref();

    let mut ocr: OcrChain = FallbackChain::new(Capability::Ocr);
    match (providers.google_vision.enabled, google_key) {
        (true, Some(key)) => {
            let vision = GoogleVision::new(key, &providers.google_vision.endpoint, providers.google_vision.timeout());
            ocr = ocr.with_provider(Arc::new(vision), providers.google_vision.timeout());
        }
        (true, None) => info!("{} not set, Google Vision left out of the OCR chain", GOOGLE_API_KEY_VAR),
        (false, _) => info!("Google Vision disabled in configuration"),
    }
    let ocr = ocr.with_offline(Arc::new(OfflineOcr::new()));

    let mut translation: TranslationChain = FallbackChain::new(Capability::Translation);
    match (providers.google_translate.enabled, google_key) {
        (true, Some(key)) => {
            let client = GoogleTranslate::new(
                key,
                &providers.google_translate.endpoint,
                providers.google_translate.timeout(),
            );
            translation = translation.with_provider(Arc::new(client), providers.google_translate.timeout());
        }
        (true, None) => info!("{} not set, Google Translate left out of the translation chain", GOOGLE_API_KEY_VAR),
        (false, _) => info!("Google Translate disabled in configuration"),
    }
    if providers.libre_translate.enabled {
        let client = LibreTranslate::new(
            &providers.libre_translate.endpoint,
            credentials.libretranslate_api_key.clone(),
            providers.libre_translate.timeout(),
        );
        translation = translation.with_provider(Arc::new(client), providers.libre_translate.timeout());
    } else {
        info!("LibreTranslate disabled in configuration");
    }
    let translation = translation.with_offline(Arc::new(OfflineTranslator));

    let mut speech: SpeechChain = FallbackChain::new(Capability::Speech);
    let tts = &providers.google_tts;
    match (tts.endpoint.enabled, google_key) {
        (true, Some(key)) => {
            let client = GoogleTts::new(key, &tts.endpoint.endpoint, tts.endpoint.timeout(), tts.audio.clone());
            speech = speech.with_provider(Arc::new(client), tts.endpoint.timeout());
        }
        (true, None) => info!("{} not set, speech synthesis has no provider", GOOGLE_API_KEY_VAR),
        (false, _) => info!("Google TTS disabled in configuration"),
    }

    let chains = Chains { ocr, translation, speech };
    info!(
        "Chains: ocr {:?}, translation {:?}, speech {:?}",
        chains.ocr.provider_names(),
        chains.translation.provider_names(),
        chains.speech.provider_names()
    );
    chains
}
