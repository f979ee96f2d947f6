#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

//! Notebox: categorized notes with trash, password protected private notes, search and
//! snapshot sync
//!
//! A [`Workspace`] loads a [`Notebook`] from a [`SnapshotStore`], tracks navigation and queues a
//! full snapshot save after every change. The same stores can be served over HTTP with
//! [`api::app`].

pub use config::Config;
pub use crypto::Crypto;
pub use crypto::EncryptedBlob;
pub use error::Error;
pub use error::Result;
pub use locale::Locale;
pub use notebook::Notebook;
pub use notes::Category;
pub use notes::ContentType;
pub use notes::Note;
pub use notes::SecretPayload;
pub use search::NoteSummary;
pub use search::SortMode;
pub use storage::Snapshot;
pub use storage::SnapshotStore;
pub use sync::SyncCoordinator;
pub use sync::SyncStatus;
pub use unlock::UnlockCache;
pub use unlock::Unlocked;
pub use workspace::NoteDraft;
pub use workspace::NoteView;
pub use workspace::Workspace;

pub mod api;
pub mod config;
pub mod crypto;
pub mod graceful_shutdown;
pub mod locale;
pub mod notebook;
pub mod notes;
pub mod search;
pub mod storage;
pub mod sync;
pub mod unlock;
pub mod utils;
pub mod workspace;

mod error;
