/*!
 * Repository layer for database operations.
 *
 * `RecordStore` is the contract the pipeline persists through; `Repository`
 * implements it over SQLite. Every lookup is scoped by owner: a record that
 * belongs to someone else is indistinguishable from a missing one.
 *
 * Reads run on the blocking pool. Writes run on the caller's task under the
 * connection lock, so a write either commits while the caller is still
 * polling or never starts: a dropped request cannot commit after it is gone.
 */

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::connection::DatabaseConnection;
use super::models::{HistoryEntry, NewTranslation, TranslationRecord, UploadRecord};
use crate::errors::StoreError;

/// Persistence contract for uploads and translations
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Insert an upload record
    async fn create_upload(&self, upload: &UploadRecord) -> Result<(), StoreError>;

    /// Point lookup of an upload owned by `owner`
    async fn find_upload(&self, owner: &str, id: &str) -> Result<Option<UploadRecord>, StoreError>;

    /// Insert a new translation; never touches existing rows
    async fn create_translation(&self, translation: NewTranslation) -> Result<TranslationRecord, StoreError>;

    /// Point lookup of a translation owned by `owner`
    async fn find_translation(&self, owner: &str, id: &str) -> Result<Option<TranslationRecord>, StoreError>;

    /// Mark audio as generated with the given reference
    ///
    /// Only the audio columns change. Returns `None` when no translation
    /// with that id belongs to `owner`.
    async fn update_audio(
        &self,
        owner: &str,
        id: &str,
        audio_reference: &str,
    ) -> Result<Option<TranslationRecord>, StoreError>;

    /// The owner's translations, newest first, each with its upload
    async fn list_translations(&self, owner: &str) -> Result<Vec<HistoryEntry>, StoreError>;
}

const TRANSLATION_COLUMNS: &str = "t.id, t.owner, t.upload_id, t.source_text, t.translated_text, \
     t.target_language, t.detected_script, t.confidence, t.audio_generated, t.audio_reference, t.created_time";

fn translation_from_row(row: &Row<'_>) -> rusqlite::Result<TranslationRecord> {
    Ok(TranslationRecord {
        id: row.get(0)?,
        owner: row.get(1)?,
        upload_id: row.get(2)?,
        source_text: row.get(3)?,
        translated_text: row.get(4)?,
        target_language: row.get(5)?,
        detected_script: row.get(6)?,
        confidence: row.get(7)?,
        audio_generated: row.get(8)?,
        audio_reference: row.get(9)?,
        created_time: row.get(10)?,
    })
}

/// Upload columns start at `offset`; `None` when the LEFT JOIN found nothing
fn upload_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<UploadRecord>> {
    let id: Option<String> = row.get(offset)?;
    let Some(id) = id else {
        return Ok(None);
    };

    Ok(Some(UploadRecord {
        id,
        owner: row.get(offset + 1)?,
        filename: row.get(offset + 2)?,
        storage_reference: row.get(offset + 3)?,
        upload_time: row.get(offset + 4)?,
    }))
}

/// SQLite-backed record store
#[derive(Clone, Debug)]
pub struct Repository {
    db: DatabaseConnection,
}

impl Repository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn find_translation_sync(conn: &Connection, owner: &str, id: &str) -> Result<Option<TranslationRecord>> {
        let sql = format!(
            "SELECT {} FROM translations t WHERE t.id = ?1 AND t.owner = ?2",
            TRANSLATION_COLUMNS
        );
        let result = conn
            .query_row(&sql, params![id, owner], translation_from_row)
            .optional()?;

        Ok(result)
    }
}

#[async_trait]
impl RecordStore for Repository {
    async fn create_upload(&self, upload: &UploadRecord) -> Result<(), StoreError> {
        self.db
            .execute(|conn| {
                conn.execute(
                    r#"
                    INSERT INTO uploads (id, owner, filename, storage_reference, upload_time)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        upload.id,
                        upload.owner,
                        upload.filename,
                        upload.storage_reference,
                        upload.upload_time,
                    ],
                )?;
                debug!("Inserted upload {}", upload.id);
                Ok(())
            })
            .map_err(StoreError::from)
    }

    async fn find_upload(&self, owner: &str, id: &str) -> Result<Option<UploadRecord>, StoreError> {
        let owner = owner.to_string();
        let id = id.to_string();

        self.db
            .execute_async(move |conn| {
                let result = conn
                    .query_row(
                        r#"
                        SELECT id, owner, filename, storage_reference, upload_time
                        FROM uploads WHERE id = ?1 AND owner = ?2
                        "#,
                        params![id, owner],
                        |row| upload_from_row(row, 0),
                    )
                    .optional()?;

                Ok(result.flatten())
            })
            .await
            .map_err(StoreError::from)
    }

    async fn create_translation(&self, translation: NewTranslation) -> Result<TranslationRecord, StoreError> {
        let record = translation.into_record();

        self.db
            .execute(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translations (
                        id, owner, upload_id, source_text, translated_text, target_language,
                        detected_script, confidence, audio_generated, audio_reference, created_time
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    "#,
                    params![
                        record.id,
                        record.owner,
                        record.upload_id,
                        record.source_text,
                        record.translated_text,
                        record.target_language,
                        record.detected_script,
                        record.confidence,
                        record.audio_generated,
                        record.audio_reference,
                        record.created_time,
                    ],
                )?;
                debug!("Inserted translation {}", record.id);
                Ok(record)
            })
            .map_err(StoreError::from)
    }

    async fn find_translation(&self, owner: &str, id: &str) -> Result<Option<TranslationRecord>, StoreError> {
        let owner = owner.to_string();
        let id = id.to_string();

        self.db
            .execute_async(move |conn| Self::find_translation_sync(conn, &owner, &id))
            .await
            .map_err(StoreError::from)
    }

    async fn update_audio(
        &self,
        owner: &str,
        id: &str,
        audio_reference: &str,
    ) -> Result<Option<TranslationRecord>, StoreError> {
        if audio_reference.trim().is_empty() {
            return Err(StoreError::Record("audio reference must not be empty".to_string()));
        }

        self.db
            .execute(|conn| {
                let updated = conn.execute(
                    r#"
                    UPDATE translations
                    SET audio_generated = 1, audio_reference = ?1
                    WHERE id = ?2 AND owner = ?3
                    "#,
                    params![audio_reference, id, owner],
                )?;

                if updated == 0 {
                    return Ok(None);
                }

                Self::find_translation_sync(conn, owner, id)
            })
            .map_err(StoreError::from)
    }

    async fn list_translations(&self, owner: &str) -> Result<Vec<HistoryEntry>, StoreError> {
        let owner = owner.to_string();

        self.db
            .execute_async(move |conn| {
                let sql = format!(
                    r#"
                    SELECT {}, u.id, u.owner, u.filename, u.storage_reference, u.upload_time
                    FROM translations t
                    LEFT JOIN uploads u ON u.id = t.upload_id AND u.owner = t.owner
                    WHERE t.owner = ?1
                    ORDER BY t.created_time DESC, t.rowid DESC
                    "#,
                    TRANSLATION_COLUMNS
                );

                let mut stmt = conn.prepare(&sql)?;
                let entries = stmt
                    .query_map([&owner], |row| {
                        Ok(HistoryEntry {
                            translation: translation_from_row(row)?,
                            upload: upload_from_row(row, 11)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(entries)
            })
            .await
            .map_err(StoreError::from)
    }
}
