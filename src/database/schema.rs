/*!
 * Database schema definitions.
 *
 * Two collections: `uploads` (one row per submitted image, immutable) and
 * `translations` (one row per OCR+translate pass; only the audio columns
 * are ever updated).
 */

use anyhow::{Context, Result, bail};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    // Per-connection setting, so it is applied on every open
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    match get_schema_version(conn)? {
        0 => {
            info!("Initializing database schema v{}", SCHEMA_VERSION);
            create_all_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)?;
        }
        SCHEMA_VERSION => debug!("Database schema is up to date (v{})", SCHEMA_VERSION),
        other => bail!("Unsupported database schema v{} (this build uses v{})", other, SCHEMA_VERSION),
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .optional()?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

fn create_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS uploads (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            filename TEXT NOT NULL,
            storage_reference TEXT NOT NULL,
            upload_time TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_uploads_owner ON uploads(owner, upload_time);
        "#,
    )?;

    // The CHECK keeps audio_generated and audio_reference in lockstep
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translations (
            id TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            upload_id TEXT REFERENCES uploads(id) ON DELETE SET NULL,
            source_text TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            target_language TEXT NOT NULL,
            detected_script TEXT,
            confidence REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
            audio_generated INTEGER NOT NULL DEFAULT 0,
            audio_reference TEXT,
            created_time TEXT NOT NULL,
            CHECK (
                (audio_generated = 1 AND audio_reference IS NOT NULL AND audio_reference <> '')
                OR (audio_generated = 0 AND audio_reference IS NULL)
            )
        );

        CREATE INDEX IF NOT EXISTS idx_translations_owner ON translations(owner, created_time);
        CREATE INDEX IF NOT EXISTS idx_translations_upload ON translations(upload_id);
        "#,
    )?;

    info!("Database schema created successfully");
    Ok(())
}
