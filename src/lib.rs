/*!
 * # Inscriptor - heritage inscription reader
 *
 * A Rust library that turns photographs of inscriptions into translated text
 * and, on request, spoken audio.
 *
 * ## Features
 *
 * - Text extraction from inscription images (Google Vision)
 * - Translation into any ISO 639-1 language:
 *   - Google Translate
 *   - LibreTranslate as fallback
 * - Speech synthesis of translations (Google Text-to-Speech)
 * - Ordered fallback chains per capability, ending in offline stand-ins for
 *   OCR and translation so those flows always produce a result
 * - Owner-scoped SQLite history of uploads and translations
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `providers`: One client per external endpoint plus offline generators
 * - `chain`: Fallback chain executor
 * - `registry`: Builds the chains from configuration and credentials
 * - `pipeline`: Stage machines and the orchestrator for both flows
 * - `database`: SQLite result store
 * - `storage`: Binary object store for images and audio
 * - `identity`: Explicit caller identity
 * - `service`: Inbound operations (upload, process, synthesize, history)
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod chain;
pub mod database;
pub mod errors;
pub mod identity;
pub mod language_utils;
pub mod pipeline;
pub mod providers;
pub mod registry;
pub mod service;
pub mod storage;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chain::{ChainOutput, FallbackChain, OfflineGenerator};
pub use database::{HistoryEntry, RecordStore, Repository, TranslationRecord, UploadRecord};
pub use errors::{AppError, ChainError, ErrorKind, PipelineError, ProviderError, ProviderErrorKind, StageFailure, StoreError};
pub use identity::Identity;
pub use language_utils::{get_language_name, normalize_target_language, supported_languages};
pub use pipeline::{Orchestrator, Stage};
pub use service::PipelineService;
pub use storage::{BlobStore, FileSystemBlobStore, MemoryBlobStore, ScopedKey};
