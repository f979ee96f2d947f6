//! SQLite storage
//!
//! Categories and notes each get a table, a save replaces both inside one transaction

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::sqlite::SqliteRow;

use crate::crypto::EncryptedBlob;
use crate::notes::Category;
use crate::notes::ContentType;
use crate::notes::UNCATEGORIZED;

use super::NoteRecord;
use super::Result;
use super::Snapshot;
use super::SnapshotStore;
use super::connection_error;

/// Migrator to run migrations on startup
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// SQLite storage
#[derive(Clone, Debug)]
pub struct Sqlite {
    /// Pool of connections
    connection_pool: SqlitePool,
}

impl Sqlite {
    /// Connect to a database URL like `sqlite://notebox.db`
    ///
    /// The database file is created when missing, migrations will be run
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(connection_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let connection_pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await
            .map_err(connection_error)?;

        Self::with_pool(connection_pool).await
    }

    /// Create SQLite storage with an existing pool
    ///
    /// Migrations will be run
    pub async fn with_pool(connection_pool: SqlitePool) -> Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(Self { connection_pool })
    }
}

#[async_trait]
impl SnapshotStore for Sqlite {
    async fn load(&self) -> Result<Snapshot> {
        let categories = sqlx::query(
            r"
            SELECT id, name, is_system
            FROM categories
            ORDER BY rowid
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?
        .iter()
        .map(category_from_row)
        .collect::<Result<Vec<Category>>>()?;

        let notes = sqlx::query(
            r"
            SELECT
                id,
                title,
                content,
                encrypted_json,
                category_id,
                is_private,
                is_deleted,
                original_category_id,
                updated_at,
                last_modified,
                content_type
            FROM notes
            ORDER BY rowid
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?
        .iter()
        .map(note_from_row)
        .collect::<Result<Vec<NoteRecord>>>()?;

        Ok(Snapshot { categories, notes })
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let mut transaction = self
            .connection_pool
            .begin()
            .await
            .map_err(connection_error)?;

        // notes first, they reference the categories
        sqlx::query("DELETE FROM notes")
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;

        sqlx::query("DELETE FROM categories")
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;

        for category in &snapshot.categories {
            sqlx::query(
                r"
                INSERT INTO categories (id, name, is_system)
                VALUES (?, ?, ?)
                ",
            )
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.is_system)
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;
        }

        for note in &snapshot.notes {
            let encrypted_json = note
                .encrypted
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(connection_error)?;

            sqlx::query(
                r"
                INSERT INTO notes (
                    id,
                    title,
                    content,
                    encrypted_json,
                    category_id,
                    is_private,
                    is_deleted,
                    original_category_id,
                    updated_at,
                    last_modified,
                    content_type
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(&note.id)
            .bind(&note.title)
            .bind(&note.content)
            .bind(encrypted_json)
            .bind(note.category_id.as_deref().unwrap_or(UNCATEGORIZED))
            .bind(note.is_private)
            .bind(note.is_deleted)
            .bind(&note.original_category_id)
            .bind(note.updated_at)
            .bind(&note.last_modified)
            .bind(note.content_type.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(connection_error)?;
        }

        transaction.commit().await.map_err(connection_error)?;

        Ok(())
    }
}

/// Create category from a row
fn category_from_row(row: &SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.try_get("id").map_err(connection_error)?,
        name: row.try_get("name").map_err(connection_error)?,
        is_system: row.try_get("is_system").map_err(connection_error)?,
    })
}

/// Create note record from a row
fn note_from_row(row: &SqliteRow) -> Result<NoteRecord> {
    let encrypted = row
        .try_get::<Option<String>, _>("encrypted_json")
        .map_err(connection_error)?
        .map(|encrypted_json| serde_json::from_str::<EncryptedBlob>(&encrypted_json))
        .transpose()
        .map_err(connection_error)?;

    let content_type = row
        .try_get::<Option<String>, _>("content_type")
        .map_err(connection_error)?
        .as_deref()
        .map_or(ContentType::Plain, ContentType::parse);

    Ok(NoteRecord {
        id: row.try_get("id").map_err(connection_error)?,
        title: row.try_get("title").map_err(connection_error)?,
        content: row.try_get("content").map_err(connection_error)?,
        encrypted,
        category_id: row.try_get("category_id").map_err(connection_error)?,
        is_private: row.try_get("is_private").map_err(connection_error)?,
        is_deleted: row.try_get("is_deleted").map_err(connection_error)?,
        original_category_id: row
            .try_get("original_category_id")
            .map_err(connection_error)?,
        updated_at: row.try_get("updated_at").map_err(connection_error)?,
        last_modified: row.try_get("last_modified").map_err(connection_error)?,
        content_type,
    })
}
