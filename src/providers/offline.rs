/*!
 * Offline terminal generators.
 *
 * These stand in for the network providers when every configured provider
 * of a capability failed, or none was configured. They never fail.
 */

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{OcrRequest, RecognizedText, TranslatedText, TranslationRequest};
use crate::chain::OfflineGenerator;

/// Heritage inscription sample served by the offline OCR generator
#[derive(Debug, Clone, Copy)]
pub struct InscriptionSample {
    pub text: &'static str,
    pub script: &'static str,
    pub confidence: f64,
}

pub const INSCRIPTION_SAMPLES: [InscriptionSample; 5] = [
    InscriptionSample {
        text: "வாழ்க தமிழ் மொழி வாழ்க அறிவுடைமை",
        script: "Tamil",
        confidence: 0.94,
    },
    InscriptionSample {
        text: "ಭಾರತ ದೇಶದ ಪ್ರಾಚೀನ ಲಿಪಿ",
        script: "Kannada",
        confidence: 0.89,
    },
    InscriptionSample {
        text: "प्राचीन भारतीय लिपि संस्कृत",
        script: "Devanagari",
        confidence: 0.92,
    },
    InscriptionSample {
        text: "ಬ್ರಾಹ್ಮೀ ಲಿಪಿಯ ಪ್ರಾಚೀನ ಗ್ರಂಥ",
        script: "Brahmi-Kannada",
        confidence: 0.87,
    },
    InscriptionSample {
        text: "Ancient Tamil inscription from heritage site",
        script: "Brahmi-Tamil",
        confidence: 0.95,
    },
];

#[derive(Debug)]
enum Selection {
    Random,
    Seeded(Mutex<StdRng>),
    Fixed(usize),
}

/// Offline OCR stand-in returning one of the heritage samples
#[derive(Debug)]
pub struct OfflineOcr {
    selection: Selection,
}

impl OfflineOcr {
    /// Pick a sample at random on every call
    pub fn new() -> Self {
        Self {
            selection: Selection::Random,
        }
    }

    /// Reproducible sequence of samples
    pub fn seeded(seed: u64) -> Self {
        Self {
            selection: Selection::Seeded(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Always return the sample at `index` (wrapped into range)
    pub fn fixed(index: usize) -> Self {
        Self {
            selection: Selection::Fixed(index % INSCRIPTION_SAMPLES.len()),
        }
    }

    fn pick(&self) -> InscriptionSample {
        let index = match &self.selection {
            Selection::Random => rand::rng().random_range(0..INSCRIPTION_SAMPLES.len()),
            Selection::Seeded(rng) => rng.lock().random_range(0..INSCRIPTION_SAMPLES.len()),
            Selection::Fixed(index) => *index,
        };
        INSCRIPTION_SAMPLES[index]
    }
}

impl Default for OfflineOcr {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineGenerator<OcrRequest, RecognizedText> for OfflineOcr {
    fn name(&self) -> &str {
        "offline-ocr"
    }

    fn generate(&self, _input: &OcrRequest) -> RecognizedText {
        let sample = self.pick();
        RecognizedText {
            text: sample.text.to_string(),
            detected_script: Some(sample.script.to_string()),
            confidence: sample.confidence,
        }
    }
}

/// Offline translation stand-in
///
/// Tags the source text with the target language so an offline result can
/// never be mistaken for a real translation.
#[derive(Debug, Default)]
pub struct OfflineTranslator;

impl OfflineGenerator<TranslationRequest, TranslatedText> for OfflineTranslator {
    fn name(&self) -> &str {
        "offline-translation"
    }

    fn generate(&self, input: &TranslationRequest) -> TranslatedText {
        TranslatedText {
            translated_text: format!("[{}] {}", input.target_language, input.text),
        }
    }
}
