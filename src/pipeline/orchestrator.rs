/*!
 * Pipeline orchestrator for the two request flows.
 *
 * Each call runs one flow start to finish: stages execute strictly in
 * order, each one's output feeding the next. The only writes are the
 * translation insert at the end of ExtractAndTranslate and, for
 * SynthesizeAudio, the audio object followed by the audio update. Dropping
 * the returned future between stages leaves no partial record behind.
 */

use std::sync::Arc;

use log::{error, info};

use crate::chain::FallbackChain;
use crate::database::{NewTranslation, RecordStore, TranslationRecord};
use crate::errors::{PipelineError, StageFailure};
use crate::identity::Identity;
use crate::language_utils::{normalize_target_language, voice_locale};
use crate::providers::{
    OcrRequest, RecognizedText, SpeechRequest, SynthesizedAudio, TranslatedText, TranslationRequest,
};
use crate::storage::{BlobStore, ScopedKey};

use super::stages::{Flow, Stage, StageMachine};

/// Script label stored when the OCR winner does not report one
pub const AUTO_DETECTED_SCRIPT: &str = "Auto-detected";

pub type OcrChain = FallbackChain<OcrRequest, RecognizedText>;
pub type TranslationChain = FallbackChain<TranslationRequest, TranslatedText>;
pub type SpeechChain = FallbackChain<SpeechRequest, SynthesizedAudio>;

/// One fallback chain per capability, fixed for the process lifetime
#[derive(Debug)]
pub struct Chains {
    pub ocr: OcrChain,
    pub translation: TranslationChain,
    pub speech: SpeechChain,
}

/// Result of a successful SynthesizeAudio run
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    /// Translation after the audio update
    pub translation: TranslationRecord,
    pub audio_reference: String,
    /// Provider that produced the audio
    pub provider: String,
}

/// Runs the pipeline flows against the configured chains and stores
#[derive(Clone, Debug)]
pub struct Orchestrator {
    chains: Arc<Chains>,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl Orchestrator {
    pub fn new(chains: Arc<Chains>, records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { chains, records, blobs }
    }

    pub fn chains(&self) -> &Chains {
        &self.chains
    }

    /// OCR the upload's image, translate the text, and persist a new translation
    ///
    /// Every call inserts a new record, even for the same upload and language.
    pub async fn extract_and_translate(
        &self,
        identity: &Identity,
        upload_id: &str,
        target_language: &str,
    ) -> Result<TranslationRecord, StageFailure> {
        self.run_extract_and_translate(identity, upload_id, target_language)
            .await
            .inspect_err(|failure| error!("{} for upload {}: {}", Flow::ExtractAndTranslate, upload_id, failure))
    }

    /// Synthesize speech for a translation and attach the stored audio to it
    ///
    /// Calling it again re-synthesizes and replaces the reference; the
    /// earlier audio object is left in the store.
    pub async fn synthesize_audio(
        &self,
        identity: &Identity,
        translation_id: &str,
    ) -> Result<SynthesisOutcome, StageFailure> {
        self.run_synthesize_audio(identity, translation_id)
            .await
            .inspect_err(|failure| error!("{} for translation {}: {}", Flow::SynthesizeAudio, translation_id, failure))
    }

    async fn run_extract_and_translate(
        &self,
        identity: &Identity,
        upload_id: &str,
        target_language: &str,
    ) -> Result<TranslationRecord, StageFailure> {
        let target_language = normalize_target_language(target_language).map_err(|e| {
            StageFailure::new(Stage::Request, PipelineError::InvalidInput(e.to_string()))
        })?;
        let owner = identity.user_id();

        let mut machine = StageMachine::start(Flow::ExtractAndTranslate);

        // Fetching
        let upload = self
            .records
            .find_upload(owner, upload_id)
            .await
            .map_err(|e| machine.fail(e))?
            .ok_or_else(|| PipelineError::not_found("upload", upload_id))
            .map_err(|e| machine.fail(e))?;
        let image = self
            .blobs
            .get(&upload.storage_reference)
            .await
            .map_err(|e| machine.fail(e))?;

        // Recognizing
        machine.advance();
        let recognized = self
            .chains
            .ocr
            .execute(&OcrRequest {
                image,
                reference: upload.storage_reference.clone(),
            })
            .await
            .map_err(|e| machine.fail(e))?;
        info!(
            "Recognized {} chars via {} (confidence {:.2})",
            recognized.value.text.chars().count(),
            recognized.source,
            recognized.value.confidence
        );
        let RecognizedText {
            text: source_text,
            detected_script,
            confidence,
        } = recognized.value;

        // Translating
        machine.advance();
        let translated = self
            .chains
            .translation
            .execute(&TranslationRequest {
                text: source_text.clone(),
                target_language: target_language.clone(),
            })
            .await
            .map_err(|e| machine.fail(e))?;
        info!("Translated to {} via {}", target_language, translated.source);

        // Persisting
        machine.advance();
        let record = self
            .records
            .create_translation(NewTranslation {
                owner: owner.to_string(),
                upload_id: Some(upload.id),
                source_text,
                translated_text: translated.value.translated_text,
                target_language,
                detected_script: Some(detected_script.unwrap_or_else(|| AUTO_DETECTED_SCRIPT.to_string())),
                confidence,
            })
            .await
            .map_err(|e| machine.fail(e))?;

        machine.advance();
        info!("Stored translation {} for upload {}", record.id, upload_id);
        Ok(record)
    }

    async fn run_synthesize_audio(
        &self,
        identity: &Identity,
        translation_id: &str,
    ) -> Result<SynthesisOutcome, StageFailure> {
        let owner = identity.user_id();
        let mut machine = StageMachine::start(Flow::SynthesizeAudio);

        // Loading
        let translation = self
            .records
            .find_translation(owner, translation_id)
            .await
            .map_err(|e| machine.fail(e))?
            .ok_or_else(|| PipelineError::not_found("translation", translation_id))
            .map_err(|e| machine.fail(e))?;

        // Synthesizing
        machine.advance();
        let audio = self
            .chains
            .speech
            .execute(&SpeechRequest {
                text: translation.translated_text.clone(),
                voice_locale: voice_locale(&translation.target_language),
            })
            .await
            .map_err(|e| machine.fail(e))?;
        let provider = audio.source.name().to_string();
        let SynthesizedAudio {
            bytes,
            extension,
            content_type,
        } = audio.value;

        // Storing
        machine.advance();
        let key = ScopedKey::generate(owner, &extension);
        let audio_reference = self
            .blobs
            .put(&key, bytes, &content_type)
            .await
            .map_err(|e| machine.fail(e))?;

        // Updating
        machine.advance();
        if let Some(previous) = translation.audio_reference.as_deref() {
            info!("Replacing audio {} of translation {}", previous, translation_id);
        }
        let updated = self
            .records
            .update_audio(owner, translation_id, &audio_reference)
            .await
            .map_err(|e| machine.fail(e))?
            .ok_or_else(|| PipelineError::not_found("translation", translation_id))
            .map_err(|e| machine.fail(e))?;

        machine.advance();
        info!("Attached audio {} to translation {}", audio_reference, translation_id);
        Ok(SynthesisOutcome {
            translation: updated,
            audio_reference,
            provider,
        })
    }
}
