//! All things related to the storage of snapshots
//!
//! A snapshot is the full set of categories and notes, it is always loaded and replaced as a
//! whole

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

pub use memory::Memory;
pub use remote::Remote;
pub use sqlite::Sqlite;

use crate::crypto::EncryptedBlob;
use crate::notes::Category;
use crate::notes::ContentType;

mod memory;
mod remote;
mod sqlite;

/// Storage errors
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Convert any error to a storage connection error
pub(crate) fn connection_error<E>(err: E) -> Error
where
    E: std::fmt::Display,
{
    Error::Connection(err.to_string())
}

/// The full set of categories and notes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub categories: Vec<Category>,

    #[serde(default)]
    pub notes: Vec<NoteRecord>,
}

/// Stored version of a note
///
/// Most fields are optional, older stores did not always have them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub encrypted: Option<EncryptedBlob>,

    #[serde(default)]
    pub category_id: Option<String>,

    #[serde(default)]
    pub is_private: bool,

    #[serde(default)]
    pub is_deleted: bool,

    #[serde(default)]
    pub original_category_id: Option<String>,

    /// Epoch millis
    #[serde(default)]
    pub updated_at: Option<i64>,

    #[serde(default)]
    pub last_modified: Option<String>,

    #[serde(default)]
    pub content_type: ContentType,
}

/// Snapshot storage
#[async_trait]
pub trait SnapshotStore: Clone + Send + Sync + 'static {
    /// Load the full snapshot
    async fn load(&self) -> Result<Snapshot>;

    /// Replace everything stored with the given snapshot
    ///
    /// Either everything is replaced or nothing is
    async fn save(&self, snapshot: &Snapshot) -> Result<()>;
}
