//! Errors of notebook operations

use thiserror::Error;

use crate::crypto;
use crate::storage;

/// Everything that can block a notebook operation
///
/// Validation errors leave the notebook untouched, the caller is expected to re-prompt
#[derive(Debug, Error)]
pub enum Error {
    /// Decryption failed, the note stays locked
    #[error("Wrong password")]
    WrongPassword,

    /// A private note without encrypted data, the stored state is corrupt
    #[error("Private note `{0}` has no encrypted data")]
    MissingCiphertext(String),

    /// System categories can not be renamed or deleted
    #[error("Category `{0}` is protected")]
    ProtectedCategory(String),

    /// Another note in the category already has this title
    #[error("A note titled `{0}` already exists in this category")]
    DuplicateTitle(String),

    /// Blank category name or note title
    #[error("Name can not be empty")]
    EmptyName,

    /// Another category already has this name
    #[error("Category `{0}` already exists")]
    DuplicateCategoryName(String),

    #[error("Note `{0}` not found")]
    NoteNotFound(String),

    #[error("Category `{0}` not found")]
    CategoryNotFound(String),

    /// Only notes in trash can be deleted permanently or restored
    #[error("Note `{0}` is not in trash")]
    NotDeleted(String),

    /// Notes in trash are read-only
    #[error("Note `{0}` is in trash")]
    InTrash(String),

    #[error("Note `{0}` is not private")]
    NotPrivate(String),

    /// Private notes are edited through their unlocked payload
    #[error("Note `{0}` is private")]
    PrivateNote(String),

    #[error("A password is required")]
    PasswordRequired,

    #[error("No note selected")]
    NoSelection,

    #[error("Encryption failed")]
    Encryption,

    /// Loading or saving the snapshot failed
    #[error("Sync failed: {0}")]
    Sync(#[from] storage::Error),
}

impl From<crypto::Error> for Error {
    fn from(err: crypto::Error) -> Self {
        match err {
            crypto::Error::Encryption => Error::Encryption,
            crypto::Error::Decryption => Error::WrongPassword,
        }
    }
}

/// Result type for all notebook operations
pub type Result<T> = core::result::Result<T, Error>;
