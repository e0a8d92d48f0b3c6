/*!
 * Inbound pipeline API.
 *
 * The operations a presentation layer calls. Each takes the caller's raw
 * user id, turns it into an `Identity` (blank ids are rejected before
 * anything else runs) and hands it to the orchestrator or the stores.
 */

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use log::{debug, info, warn};

use crate::app_config::Config;
use crate::database::{DatabaseConnection, HistoryEntry, RecordStore, Repository, TranslationRecord, UploadRecord};
use crate::errors::{PipelineError, StageFailure};
use crate::identity::Identity;
use crate::language_utils::{self, LanguageOption};
use crate::pipeline::{Chains, Orchestrator, Stage, SynthesisOutcome};
use crate::registry::{self, Credentials};
use crate::storage::{BlobStore, FileSystemBlobStore, ScopedKey};

/// Largest accepted image
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content type for an image filename, `None` when it is not a supported image
pub fn image_content_type(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename).extension()?.to_string_lossy().to_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Pipeline entry points plus the upload and history helpers around them
#[derive(Clone, Debug)]
pub struct PipelineService {
    orchestrator: Orchestrator,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl PipelineService {
    pub fn new(chains: Chains, records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let orchestrator = Orchestrator::new(Arc::new(chains), Arc::clone(&records), Arc::clone(&blobs));
        Self {
            orchestrator,
            records,
            blobs,
        }
    }

    /// Wire the service from configuration: SQLite records, filesystem
    /// objects, and chains built from the given credentials
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let db_path = config.resolved_database_path()?;
        let db = DatabaseConnection::new(&db_path)
            .with_context(|| format!("Failed to open database at {:?}", db_path))?;
        debug!("Opened {:?}: {}", db_path, db.stats()?);
        let records: Arc<dyn RecordStore> = Arc::new(Repository::new(db));
        let blobs: Arc<dyn BlobStore> =
            Arc::new(FileSystemBlobStore::new(&config.storage_dir, config.public_base_url.clone()));
        let chains = registry::build_chains(config, credentials);

        Ok(Self::new(chains, records, blobs))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Store an image and create its upload record
    pub async fn register_upload(&self, user_id: &str, filename: &str, bytes: Bytes) -> Result<UploadRecord, PipelineError> {
        let identity = Identity::new(user_id)?;

        let filename = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let content_type = image_content_type(&filename)
            .ok_or_else(|| PipelineError::InvalidInput(format!("Unsupported image file: '{}'", filename)))?;
        if bytes.is_empty() {
            return Err(PipelineError::InvalidInput("Image is empty".to_string()));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(PipelineError::InvalidInput(format!(
                "Image is {} bytes, the limit is {}",
                bytes.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let key = ScopedKey::for_filename(identity.user_id(), &filename);
        let reference = self.blobs.put(&key, bytes, content_type).await?;
        let upload = UploadRecord::new(identity.user_id(), filename, reference);
        if let Err(e) = self.records.create_upload(&upload).await {
            warn!("Upload record not created, object {} is orphaned: {}", upload.storage_reference, e);
            return Err(e.into());
        }

        info!("Registered upload {} ({})", upload.id, upload.filename);
        Ok(upload)
    }

    /// ExtractAndTranslate for one of the caller's uploads
    pub async fn process(
        &self,
        user_id: &str,
        upload_id: &str,
        target_language: &str,
    ) -> Result<TranslationRecord, StageFailure> {
        let identity = Identity::new(user_id).map_err(|e| StageFailure::new(Stage::Request, e))?;
        self.orchestrator
            .extract_and_translate(&identity, upload_id, target_language)
            .await
    }

    /// SynthesizeAudio for one of the caller's translations
    pub async fn synthesize(&self, user_id: &str, translation_id: &str) -> Result<SynthesisOutcome, StageFailure> {
        let identity = Identity::new(user_id).map_err(|e| StageFailure::new(Stage::Request, e))?;
        self.orchestrator.synthesize_audio(&identity, translation_id).await
    }

    /// The caller's translations, newest first
    pub async fn history(&self, user_id: &str) -> Result<Vec<HistoryEntry>, PipelineError> {
        let identity = Identity::new(user_id)?;
        Ok(self.records.list_translations(identity.user_id()).await?)
    }

    /// Target languages offered in the language menu
    pub fn supported_languages(&self) -> Vec<LanguageOption> {
        language_utils::supported_languages()
    }
}
