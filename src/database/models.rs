/*!
 * Database entity models.
 *
 * These structures map directly to the `uploads` and `translations` tables.
 */

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp format used for every stored time; fixed width so it sorts as text
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A submitted image; immutable after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub owner: String,
    /// Original filename as submitted
    pub filename: String,
    /// Reference returned by the binary object store
    pub storage_reference: String,
    pub upload_time: String,
}

impl UploadRecord {
    pub fn new(owner: impl Into<String>, filename: impl Into<String>, storage_reference: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner: owner.into(),
            filename: filename.into(),
            storage_reference: storage_reference.into(),
            upload_time: timestamp_now(),
        }
    }
}

/// Persisted result of one OCR + translation pass
///
/// Only `audio_generated` and `audio_reference` change after creation, and
/// they change together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub id: String,
    pub owner: String,
    /// Upload the text was recognized from; cleared if the upload is deleted
    pub upload_id: Option<String>,
    pub source_text: String,
    pub translated_text: String,
    pub target_language: String,
    pub detected_script: Option<String>,
    /// OCR confidence as reported by the winning OCR provider
    pub confidence: f64,
    pub audio_generated: bool,
    pub audio_reference: Option<String>,
    pub created_time: String,
}

impl TranslationRecord {
    /// Whether the audio flag and reference agree
    pub fn audio_is_consistent(&self) -> bool {
        match (self.audio_generated, self.audio_reference.as_deref()) {
            (true, Some(reference)) => !reference.is_empty(),
            (false, None) => true,
            _ => false,
        }
    }
}

/// Fields supplied by the pipeline when creating a translation
///
/// The id, creation time and audio state are assigned by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTranslation {
    pub owner: String,
    pub upload_id: Option<String>,
    pub source_text: String,
    pub translated_text: String,
    pub target_language: String,
    pub detected_script: Option<String>,
    pub confidence: f64,
}

impl NewTranslation {
    pub(crate) fn into_record(self) -> TranslationRecord {
        TranslationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner: self.owner,
            upload_id: self.upload_id,
            source_text: self.source_text,
            translated_text: self.translated_text,
            target_language: self.target_language,
            detected_script: self.detected_script,
            confidence: self.confidence.clamp(0.0, 1.0),
            audio_generated: false,
            audio_reference: None,
            created_time: timestamp_now(),
        }
    }
}

/// Translation joined with the upload it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub translation: TranslationRecord,
    pub upload: Option<UploadRecord>,
}
