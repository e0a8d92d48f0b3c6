/*!
 * Database module for persistent storage of uploads and translations.
 *
 * SQLite-backed implementation of the record store the pipeline writes to:
 * - `uploads`: one row per submitted image
 * - `translations`: one row per OCR + translation pass, with audio state
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

pub use connection::DatabaseConnection;
pub use models::{HistoryEntry, NewTranslation, TranslationRecord, UploadRecord};
pub use repository::{RecordStore, Repository};
