/*!
 * Common test utilities for the inscriptor test suite
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use inscriptor::chain::FallbackChain;
use inscriptor::database::{HistoryEntry, NewTranslation, RecordStore, Repository, TranslationRecord, UploadRecord};
use inscriptor::errors::{ProviderErrorKind, StoreError};
use inscriptor::pipeline::{Chains, OcrChain, SpeechChain, TranslationChain};
use inscriptor::providers::mock::MockProvider;
use inscriptor::providers::offline::{OfflineOcr, OfflineTranslator};
use inscriptor::providers::{
    Capability, OcrRequest, RecognizedText, SpeechRequest, SynthesizedAudio, TranslatedText, TranslationRequest,
};
use inscriptor::service::PipelineService;
use inscriptor::storage::{BlobStore, MemoryBlobStore, ScopedKey};

pub const OWNER: &str = "U1";
pub const OTHER_OWNER: &str = "U2";

pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

pub type MockOcr = MockProvider<OcrRequest, RecognizedText>;
pub type MockTranslator = MockProvider<TranslationRequest, TranslatedText>;
pub type MockSpeech = MockProvider<SpeechRequest, SynthesizedAudio>;

/// Route library logs through env_logger (`RUST_LOG=debug cargo test`)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Stand-in image bytes; nothing in the pipeline decodes them
pub fn sample_image() -> Bytes {
    Bytes::from_static(b"\x89PNG\r\n\x1a\ninscription")
}

pub fn recognized(text: &str, confidence: f64) -> RecognizedText {
    RecognizedText {
        text: text.to_string(),
        detected_script: None,
        confidence,
    }
}

pub fn translated(text: &str) -> TranslatedText {
    TranslatedText {
        translated_text: text.to_string(),
    }
}

pub fn mp3(payload: &'static [u8]) -> SynthesizedAudio {
    SynthesizedAudio {
        bytes: Bytes::from_static(payload),
        extension: "mp3".to_string(),
        content_type: "audio/mpeg".to_string(),
    }
}

pub fn working_ocr(text: &str) -> MockOcr {
    MockProvider::working("mock-vision", Capability::Ocr, recognized(text, 0.9))
}

pub fn failing_ocr(kind: ProviderErrorKind) -> MockOcr {
    MockProvider::failing("mock-vision", Capability::Ocr, kind)
}

pub fn working_translator(text: &str) -> MockTranslator {
    MockProvider::working("mock-translate", Capability::Translation, translated(text))
}

pub fn failing_translator(name: &str, kind: ProviderErrorKind) -> MockTranslator {
    MockProvider::failing(name, Capability::Translation, kind)
}

pub fn working_speech() -> MockSpeech {
    MockProvider::working("mock-tts", Capability::Speech, mp3(b"ID3 spoken translation"))
}

pub fn failing_speech(kind: ProviderErrorKind) -> MockSpeech {
    MockProvider::failing("mock-tts", Capability::Speech, kind)
}

/// OCR chain: the given mock, then an offline generator pinned to `sample`
pub fn ocr_chain(provider: MockOcr, sample: usize) -> OcrChain {
    let chain: OcrChain = FallbackChain::new(Capability::Ocr);
    chain
        .with_provider(Arc::new(provider), PROVIDER_TIMEOUT)
        .with_offline(Arc::new(OfflineOcr::fixed(sample)))
}

/// Translation chain: the given mocks in order, then the offline translator
pub fn translation_chain(providers: Vec<MockTranslator>) -> TranslationChain {
    let mut chain: TranslationChain = FallbackChain::new(Capability::Translation);
    for provider in providers {
        chain = chain.with_provider(Arc::new(provider), PROVIDER_TIMEOUT);
    }
    chain.with_offline(Arc::new(OfflineTranslator))
}

/// Speech chain without offline generator
pub fn speech_chain(provider: MockSpeech) -> SpeechChain {
    let chain: SpeechChain = FallbackChain::new(Capability::Speech);
    chain.with_provider(Arc::new(provider), PROVIDER_TIMEOUT)
}

/// Record store that counts every write before delegating to SQLite
#[derive(Debug)]
pub struct CountingRecordStore {
    inner: Repository,
    writes: AtomicUsize,
    reject_writes: AtomicBool,
}

impl CountingRecordStore {
    pub fn new() -> Self {
        Self {
            inner: Repository::new_in_memory().unwrap(),
            writes: AtomicUsize::new(0),
            reject_writes: AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every later insert or update fail
    pub fn reject_writes(&self) {
        self.reject_writes.store(true, Ordering::SeqCst);
    }

    fn count_write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Record("database is locked".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for CountingRecordStore {
    async fn create_upload(&self, upload: &UploadRecord) -> Result<(), StoreError> {
        self.count_write()?;
        self.inner.create_upload(upload).await
    }

    async fn find_upload(&self, owner: &str, id: &str) -> Result<Option<UploadRecord>, StoreError> {
        self.inner.find_upload(owner, id).await
    }

    async fn create_translation(&self, translation: NewTranslation) -> Result<TranslationRecord, StoreError> {
        self.count_write()?;
        self.inner.create_translation(translation).await
    }

    async fn find_translation(&self, owner: &str, id: &str) -> Result<Option<TranslationRecord>, StoreError> {
        self.inner.find_translation(owner, id).await
    }

    async fn update_audio(
        &self,
        owner: &str,
        id: &str,
        audio_reference: &str,
    ) -> Result<Option<TranslationRecord>, StoreError> {
        self.count_write()?;
        self.inner.update_audio(owner, id, audio_reference).await
    }

    async fn list_translations(&self, owner: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.list_translations(owner).await
    }
}

/// In-memory object store whose writes can be switched off
#[derive(Debug, Default)]
pub struct FlakyBlobStore {
    inner: MemoryBlobStore,
    reject_puts: AtomicBool,
}

impl FlakyBlobStore {
    pub fn reject_puts(&self) {
        self.reject_puts.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &ScopedKey, bytes: Bytes, content_type: &str) -> Result<String, StoreError> {
        if self.reject_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Object(format!("bucket unavailable for {}", key)));
        }
        self.inner.put(key, bytes, content_type).await
    }

    async fn get(&self, reference: &str) -> Result<Bytes, StoreError> {
        self.inner.get(reference).await
    }
}

/// Service wired to in-memory stores, with handles kept for assertions
pub struct Harness {
    pub service: PipelineService,
    pub records: Arc<CountingRecordStore>,
    pub blobs: Arc<FlakyBlobStore>,
}

impl Harness {
    pub fn new(chains: Chains) -> Self {
        init_logging();
        let records = Arc::new(CountingRecordStore::new());
        let blobs = Arc::new(FlakyBlobStore::default());
        let service = PipelineService::new(chains, records.clone(), blobs.clone());
        Self { service, records, blobs }
    }

    /// Register the sample image for `owner` and return the upload id
    pub async fn upload(&self, owner: &str) -> String {
        self.service
            .register_upload(owner, "stone.png", sample_image())
            .await
            .unwrap()
            .id
    }
}

/// Chains that always succeed on their first provider
pub fn happy_chains() -> Chains {
    Chains {
        ocr: ocr_chain(working_ocr("Ancient text"), 0),
        translation: translation_chain(vec![working_translator("Texto antiguo")]),
        speech: speech_chain(working_speech()),
    }
}
