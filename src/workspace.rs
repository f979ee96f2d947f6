//! A notebook session
//!
//! The workspace tracks what is being looked at: the current category, the current note and the
//! sort order. Navigation relocks private notes, every successful change is queued for saving.

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::locale::Locale;
use crate::notebook::Notebook;
use crate::notes::ALL;
use crate::notes::Category;
use crate::notes::ContentType;
use crate::notes::Note;
use crate::notes::PRIVATE;
use crate::notes::SecretPayload;
use crate::notes::TRASH;
use crate::notes::UNCATEGORIZED;
use crate::search;
use crate::search::NoteSummary;
use crate::search::SortMode;
use crate::storage::SnapshotStore;
use crate::sync::SyncCoordinator;
use crate::sync::SyncStatus;
use crate::unlock::Unlocked;

/// What the editor submits on save
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,

    /// Where to file the note, ignored for private notes
    pub category_id: String,

    /// Save as private note
    pub private: bool,

    /// Needed when the note is not unlocked yet
    pub password: Option<String>,
}

/// A note as opened in the editor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    pub category_id: String,
    pub is_private: bool,
    pub is_deleted: bool,

    /// Private note without plaintext, title and content are placeholders
    pub is_locked: bool,

    pub updated_at: i64,
    pub last_modified: String,
}

/// Notebook, navigation state and sync
#[derive(Debug)]
pub struct Workspace {
    notebook: Notebook,
    sync: SyncCoordinator,
    current_category: String,
    current_note: Option<String>,
    sort_mode: SortMode,
}

impl Workspace {
    /// Load the notebook from the store
    ///
    /// # Errors
    ///
    /// Will return `Err` when the snapshot can not be loaded
    pub async fn load<S>(store: S, config: &Config) -> Result<Self>
    where
        S: SnapshotStore,
    {
        let snapshot = store.load().await?;

        tracing::debug!(
            categories = snapshot.categories.len(),
            notes = snapshot.notes.len(),
            "Snapshot loaded"
        );

        let notebook = Notebook::from_snapshot(snapshot, config.locale, config.crypto());

        Ok(Self::new(notebook, SyncCoordinator::new(store)))
    }

    /// Load the notebook from the store, start empty when that fails
    pub async fn load_or_default<S>(store: S, config: &Config) -> Self
    where
        S: SnapshotStore,
    {
        match store.load().await {
            Ok(snapshot) => Self::new(
                Notebook::from_snapshot(snapshot, config.locale, config.crypto()),
                SyncCoordinator::new(store),
            ),
            Err(err) => {
                tracing::warn!("Could not load snapshot, starting with an empty notebook: {err}");

                Self::new(
                    Notebook::new(config.locale, config.crypto()),
                    SyncCoordinator::new(store),
                )
            }
        }
    }

    /// Create a workspace viewing all notes
    pub fn new(notebook: Notebook, sync: SyncCoordinator) -> Self {
        Self {
            notebook,
            sync,
            current_category: ALL.to_string(),
            current_note: None,
            sort_mode: SortMode::default(),
        }
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    pub fn current_category(&self) -> &str {
        &self.current_category
    }

    pub fn current_note(&self) -> Option<&str> {
        self.current_note.as_deref()
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// View a category
    ///
    /// The editor closes and leaving `private` locks every private note again
    pub fn select_category(&mut self, category_id: &str) -> Result<()> {
        if self.notebook.category(category_id).is_none() {
            return Err(Error::CategoryNotFound(category_id.to_string()));
        }

        let leaving_private = self.current_category == PRIVATE && category_id != PRIVATE;

        self.current_category = category_id.to_string();
        self.current_note = None;

        if leaving_private {
            self.notebook.relock();
        }

        if !self.sort_mode.available_in(category_id) {
            self.sort_mode = SortMode::Modified;
        }

        Ok(())
    }

    /// Change the note order, returns the order in effect
    ///
    /// Sorting by category is only possible while viewing all notes
    pub fn set_sort_mode(&mut self, sort_mode: SortMode) -> SortMode {
        if sort_mode.available_in(&self.current_category) {
            self.sort_mode = sort_mode;
        }

        self.sort_mode
    }

    /// Open a note in the editor
    ///
    /// Switching away from an unlocked note locks every private note again. Private notes are
    /// unlocked with the password, unless they already are.
    pub async fn select_note(&mut self, note_id: &str, password: Option<&str>) -> Result<NoteView> {
        let is_private = self
            .notebook
            .note(note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))?
            .is_private;

        self.leave_note(note_id);

        if is_private {
            self.notebook
                .unlock(note_id, password.unwrap_or_default())
                .await?;
        }

        self.current_note = Some(note_id.to_string());

        self.note_view(note_id)
    }

    /// Create a note in the current category and open it
    ///
    /// While viewing `private` the note is private and sealed with the password right away
    pub async fn create_note(&mut self, password: Option<&str>) -> Result<NoteView> {
        let is_private = self.current_category == PRIVATE;
        let locale = self.notebook.locale();

        let note_id = if is_private {
            let password = password
                .filter(|password| !password.is_empty())
                .ok_or(Error::PasswordRequired)?;

            // opening the new note is a switch like any other
            self.leave_note("");

            let title = locale.new_private_note_title();
            let note_id = self.notebook.create_note(title, PRIVATE, true)?.id.clone();

            let payload = SecretPayload::new(title, "", ContentType::Plain);
            if let Err(err) = self
                .notebook
                .set_private(&note_id, password, payload.clone())
                .await
            {
                self.notebook.remove_note(&note_id);
                return Err(err);
            }

            self.notebook
                .remember(&note_id, Unlocked::new(payload, password));

            note_id
        } else {
            let category_id = if self.current_category == ALL || self.current_category == TRASH {
                UNCATEGORIZED
            } else {
                self.current_category.as_str()
            };

            let note_id = self
                .notebook
                .create_note(locale.new_note_title(), category_id, false)?
                .id
                .clone();

            self.leave_note(&note_id);

            note_id
        };

        self.persist();
        self.current_note = Some(note_id.clone());

        self.note_view(&note_id)
    }

    /// Save the editor content to the current note
    ///
    /// Private drafts are sealed with the cached password, or with the one in the draft. The
    /// plaintext is only kept while viewing `private`. Making a still locked note non-private
    /// unlocks it first.
    pub async fn save_note(&mut self, draft: NoteDraft) -> Result<NoteView> {
        let note_id = self.current_note.clone().ok_or(Error::NoSelection)?;
        let note = self
            .notebook
            .note(&note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.clone()))?;

        if note.is_deleted {
            return Err(Error::InTrash(note_id));
        }

        let is_private = note.is_private;

        if draft.title.trim().is_empty() {
            return Err(Error::EmptyName);
        }

        if draft.private {
            let password = self
                .notebook
                .unlocked(&note_id)
                .map(|unlocked| unlocked.password().to_string())
                .or_else(|| draft.password.clone().filter(|password| !password.is_empty()))
                .ok_or(Error::PasswordRequired)?;

            let payload = SecretPayload::new(draft.title.trim(), draft.content, draft.content_type);
            self.notebook
                .set_private(&note_id, &password, payload.clone())
                .await?;

            if self.current_category == PRIVATE {
                self.notebook
                    .remember(&note_id, Unlocked::new(payload, password));
            }
        } else if is_private {
            if !self.notebook.is_unlocked(&note_id) {
                self.notebook
                    .unlock(&note_id, draft.password.as_deref().unwrap_or_default())
                    .await?;
            }

            self.notebook.clear_private_into(
                &note_id,
                SecretPayload::new(draft.title, draft.content, draft.content_type),
                &draft.category_id,
            )?;
        } else {
            self.notebook.update_note(
                &note_id,
                &draft.title,
                &draft.content,
                draft.content_type,
                &draft.category_id,
            )?;
        }

        self.persist();

        self.note_view(&note_id)
    }

    /// Move the current note to trash, or delete it for good when it already is
    ///
    /// The editor closes
    pub fn delete_note(&mut self) -> Result<()> {
        let note_id = self.current_note.clone().ok_or(Error::NoSelection)?;
        let note = self
            .notebook
            .note(&note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.clone()))?;

        if note.is_deleted {
            self.notebook.hard_delete(&note_id)?;
        } else {
            self.notebook.soft_delete(&note_id)?;
        }

        self.current_note = None;
        self.persist();

        Ok(())
    }

    /// Move the current note out of trash
    pub fn restore_note(&mut self) -> Result<NoteView> {
        let note_id = self.current_note.clone().ok_or(Error::NoSelection)?;

        self.notebook.restore(&note_id)?;
        self.persist();

        self.note_view(&note_id)
    }

    /// File the current note under another category
    pub fn move_note(&mut self, category_id: &str) -> Result<()> {
        let note_id = self.current_note.clone().ok_or(Error::NoSelection)?;

        self.notebook.move_to_category(&note_id, category_id)?;
        self.persist();

        Ok(())
    }

    pub fn create_category(&mut self, name: &str) -> Result<Category> {
        let category = self.notebook.create_category(name)?.clone();
        self.persist();

        Ok(category)
    }

    pub fn rename_category(&mut self, category_id: &str, name: &str) -> Result<()> {
        self.notebook.rename_category(category_id, name)?;
        self.persist();

        Ok(())
    }

    /// Delete a category, viewing it falls back to all notes
    pub fn delete_category(&mut self, category_id: &str) -> Result<Category> {
        let category = self.notebook.delete_category(category_id)?;

        if self.current_category == category_id {
            self.current_category = ALL.to_string();
        }

        self.persist();

        Ok(category)
    }

    /// Switch the language of system category names and placeholders
    pub fn set_locale(&mut self, locale: Locale) {
        self.notebook.set_locale(locale);
    }

    /// Notes of the current category, in the current order
    pub fn visible_notes(&self) -> Vec<NoteSummary> {
        self.summaries(self.notebook.notes_in_view(&self.current_category))
    }

    /// Notes of the current category matching a term, in the current order
    pub fn search(&self, term: &str) -> Vec<NoteSummary> {
        let scope = self.notebook.notes_in_view(&self.current_category);

        self.summaries(search::search(&self.notebook, scope, term))
    }

    /// Wait until every queued save is done
    pub async fn flush(&self) {
        self.sync.flush().await;
    }

    fn summaries(&self, mut notes: Vec<&Note>) -> Vec<NoteSummary> {
        search::sort(&self.notebook, &mut notes, self.sort_mode);

        notes
            .into_iter()
            .map(|note| NoteSummary::new(&self.notebook, note))
            .collect()
    }

    /// Relock when the focus moves away from a different, unlocked note
    fn leave_note(&mut self, next_note_id: &str) {
        let leaving_unlocked = self.current_note.as_deref().is_some_and(|current_note| {
            current_note != next_note_id && self.notebook.is_unlocked(current_note)
        });

        if leaving_unlocked {
            self.notebook.relock();
        }
    }

    fn note_view(&self, note_id: &str) -> Result<NoteView> {
        let note = self
            .notebook
            .note(note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))?;

        let (title, content, content_type, is_locked) = match self.notebook.unlocked(note_id) {
            Some(unlocked) if note.is_private => (
                unlocked.title.clone(),
                unlocked.content.clone(),
                unlocked.content_type,
                false,
            ),
            _ => (
                note.title.clone(),
                note.content.clone(),
                note.content_type,
                note.is_private,
            ),
        };

        Ok(NoteView {
            id: note.id.clone(),
            title,
            content,
            content_type,
            category_id: note.category_id.clone(),
            is_private: note.is_private,
            is_deleted: note.is_deleted,
            is_locked,
            updated_at: note.updated_at,
            last_modified: note.last_modified.clone(),
        })
    }

    fn persist(&self) {
        // outcome shows in the sync status
        drop(self.sync.enqueue(self.notebook.to_snapshot()));
    }
}
