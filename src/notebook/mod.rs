//! The notebook: categories and notes kept consistent with each other
//!
//! Every mutation validates first and changes state second, a failed operation leaves the
//! notebook as it was. After each structural change the category membership is recomputed from
//! the notes.

use std::collections::HashSet;

use uuid::Uuid;

pub use membership::Membership;
pub use membership::membership;

use crate::crypto::Crypto;
use crate::error::Error;
use crate::error::Result;
use crate::locale::Locale;
use crate::notes::ALL;
use crate::notes::Category;
use crate::notes::ContentType;
use crate::notes::Note;
use crate::notes::PRIVATE;
use crate::notes::SYSTEM_CATEGORY_IDS;
use crate::notes::SecretPayload;
use crate::notes::TRASH;
use crate::notes::UNCATEGORIZED;
use crate::notes::is_system_category;
use crate::notes::is_virtual_category;
use crate::storage::Snapshot;
use crate::unlock::UnlockCache;
use crate::unlock::Unlocked;
use crate::utils::now_millis;

mod membership;

/// Categories, notes and the plaintext of unlocked private notes
#[derive(Debug)]
pub struct Notebook {
    categories: Vec<Category>,
    notes: Vec<Note>,

    /// Derived from `notes`, never edited directly
    membership: Membership,

    locale: Locale,
    crypto: Crypto,
    unlocked: UnlockCache,
}

impl Notebook {
    /// Create an empty notebook with only the system categories
    pub fn new(locale: Locale, crypto: Crypto) -> Self {
        Self::from_snapshot(Snapshot::default(), locale, crypto)
    }

    /// Create a notebook from a loaded snapshot
    ///
    /// Missing system categories are added and notes are normalized, so whatever was stored the
    /// notebook starts out consistent
    pub fn from_snapshot(snapshot: Snapshot, locale: Locale, crypto: Crypto) -> Self {
        let mut categories: Vec<Category> = Vec::with_capacity(snapshot.categories.len() + 4);
        for mut category in snapshot.categories {
            if category.id.is_empty() || categories.iter().any(|known| known.id == category.id) {
                tracing::warn!("Skipping invalid or duplicate category `{}`", category.id);
                continue;
            }

            category.is_system = is_system_category(&category.id);
            categories.push(category);
        }

        for category_id in SYSTEM_CATEGORY_IDS {
            if categories.iter().any(|category| category.id == category_id) {
                continue;
            }

            let category = Category::system(category_id, locale);
            if category_id == ALL {
                categories.insert(0, category);
            } else {
                categories.push(category);
            }
        }

        let mut seen = HashSet::new();
        let notes = snapshot
            .notes
            .into_iter()
            .filter(|record| {
                let first = seen.insert(record.id.clone());
                if !first {
                    tracing::warn!("Skipping duplicate note `{}`", record.id);
                }
                first
            })
            .map(|record| {
                let mut note = Note::from_record(record, locale);
                // undeleted private notes are pinned
                if note.is_private && !note.is_deleted {
                    note.category_id = PRIVATE.to_string();
                }
                note
            })
            .collect();

        let mut notebook = Self {
            categories,
            notes,
            membership: Membership::new(),
            locale,
            crypto,
            unlocked: UnlockCache::new(),
        };

        notebook.apply_locale();
        notebook.rebuild();

        notebook
    }

    /// Create the snapshot to store, membership is not part of it
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            categories: self.categories.clone(),
            notes: self.notes.iter().map(Note::to_record).collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    pub fn category(&self, category_id: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
    }

    /// IDs of the notes filed under a category, empty for `all` and unknown categories
    pub fn members(&self, category_id: &str) -> &[String] {
        self.membership
            .get(category_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    /// Switch the locale, system category names follow
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
        self.apply_locale();
    }

    fn apply_locale(&mut self) {
        for category in &mut self.categories {
            if let Some(name) = self.locale.system_category_name(&category.id) {
                category.name = name.to_string();
            }
        }
    }

    /// Recompute the category membership
    ///
    /// Notes pointing to `all` or to a category that does not exist are moved to
    /// `uncategorized`. Running it twice changes nothing.
    pub fn rebuild(&mut self) {
        let categories = &self.categories;
        for note in &mut self.notes {
            if note.category_id == ALL
                || !categories
                    .iter()
                    .any(|category| category.id == note.category_id)
            {
                tracing::debug!(
                    "Note {} points to unknown category `{}`, using `{UNCATEGORIZED}`",
                    note.id,
                    note.category_id
                );
                note.category_id = UNCATEGORIZED.to_string();
            }
        }

        self.membership = membership(&self.notes, &self.categories);
    }

    /// Does a visible, non-private note in the category already use this title?
    pub fn is_title_duplicate(
        &self,
        title: &str,
        category_id: &str,
        exclude_note_id: Option<&str>,
    ) -> bool {
        let title = title.trim();

        self.notes.iter().any(|note| {
            !note.is_private
                && !note.is_deleted
                && Some(note.id.as_str()) != exclude_note_id
                && note.category_id == category_id
                && note.title == title
        })
    }

    /// First free title in the category: `base`, `base (2)`, `base (3)`, ...
    pub fn unique_title(&self, base_title: &str, category_id: &str) -> String {
        let base_title = match base_title.trim() {
            "" => self.locale.new_note_title(),
            base_title => base_title,
        };

        if !self.is_title_duplicate(base_title, category_id, None) {
            return base_title.to_string();
        }

        (2..)
            .map(|suffix| format!("{base_title} ({suffix})"))
            .find(|title| !self.is_title_duplicate(title, category_id, None))
            .unwrap_or_default()
    }

    /// Create a note
    ///
    /// Non-private notes get a unique title in the target, which falls back to `uncategorized`
    /// for the views. Private notes keep the placeholder title and are filed under `private`, the
    /// real title only exists once [`Notebook::set_private`] sealed it.
    pub fn create_note(
        &mut self,
        base_title: &str,
        category_id: &str,
        is_private: bool,
    ) -> Result<&Note> {
        let (category_id, title) = if is_private {
            (
                PRIVATE.to_string(),
                self.locale.private_note_title().to_string(),
            )
        } else {
            let category_id = self.concrete_category(category_id)?;
            let title = self.unique_title(base_title, &category_id);
            (category_id, title)
        };

        let updated_at = now_millis();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title,
            content: String::new(),
            content_type: ContentType::Plain,
            category_id: category_id.clone(),
            is_private,
            is_deleted: false,
            original_category_id: Some(category_id),
            encrypted: None,
            updated_at,
            last_modified: self.locale.format_timestamp(updated_at),
        };

        tracing::debug!("Created note {} in `{}`", note.id, note.category_id);

        let index = self.notes.len();
        self.notes.push(note);
        self.rebuild();

        Ok(&self.notes[index])
    }

    /// Save a non-private note
    ///
    /// Private notes go through [`Notebook::set_private`] and [`Notebook::clear_private_into`],
    /// notes in trash are read-only
    pub fn update_note(
        &mut self,
        note_id: &str,
        title: &str,
        content: &str,
        content_type: ContentType,
        category_id: &str,
    ) -> Result<()> {
        let index = self.note_index(note_id)?;

        let note = &self.notes[index];
        if note.is_private {
            return Err(Error::PrivateNote(note_id.to_string()));
        }
        if note.is_deleted {
            return Err(Error::InTrash(note_id.to_string()));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(Error::EmptyName);
        }

        let category_id = self.concrete_category(category_id)?;
        if self.is_title_duplicate(title, &category_id, Some(note_id)) {
            return Err(Error::DuplicateTitle(title.to_string()));
        }

        let locale = self.locale;
        let note = &mut self.notes[index];
        note.title = title.to_string();
        note.content = content.to_string();
        note.content_type = content_type;
        note.touch(locale);

        tracing::debug!("Updated note {note_id}");

        self.move_to_category(note_id, &category_id)
    }

    /// Seal a note's payload with a password and make it private
    ///
    /// The stored title becomes the placeholder and the content is cleared. A note in trash
    /// stays there, it is pinned to `private` when restored.
    pub async fn set_private(
        &mut self,
        note_id: &str,
        password: &str,
        payload: SecretPayload,
    ) -> Result<()> {
        let index = self.note_index(note_id)?;

        if password.is_empty() {
            return Err(Error::PasswordRequired);
        }

        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::EmptyName);
        }

        let payload = SecretPayload::new(title, payload.content, payload.content_type);
        let encrypted = self.crypto.encrypt(&payload, password).await?;

        let locale = self.locale;
        let note = &mut self.notes[index];
        note.is_private = true;
        note.encrypted = Some(encrypted);
        note.title = locale.private_note_title().to_string();
        note.content.clear();
        note.content_type = payload.content_type;
        note.touch(locale);

        let is_deleted = note.is_deleted;

        // cached plaintext is stale now
        self.unlocked.remove(note_id);

        tracing::debug!("Sealed note {note_id}");

        if is_deleted {
            self.rebuild();
            Ok(())
        } else {
            self.move_to_category(note_id, PRIVATE)
        }
    }

    /// Make a private note plain again, filed under `uncategorized`
    pub fn clear_private(&mut self, note_id: &str, payload: SecretPayload) -> Result<()> {
        self.clear_private_into(note_id, payload, UNCATEGORIZED)
    }

    /// Make a private note plain again, filed under a category
    ///
    /// The note must be unlocked with [`Notebook::unlock`] first, a locked note stays sealed. A
    /// note in trash stays there and will be restored to the category.
    pub fn clear_private_into(
        &mut self,
        note_id: &str,
        payload: SecretPayload,
        category_id: &str,
    ) -> Result<()> {
        let index = self.note_index(note_id)?;

        if !self.notes[index].is_private {
            return Err(Error::NotPrivate(note_id.to_string()));
        }

        if !self.unlocked.contains(note_id) {
            return Err(Error::PasswordRequired);
        }

        let title = payload.title.trim();
        if title.is_empty() {
            return Err(Error::EmptyName);
        }

        let category_id = self.concrete_category(category_id)?;
        if self.is_title_duplicate(title, &category_id, Some(note_id)) {
            return Err(Error::DuplicateTitle(title.to_string()));
        }

        let locale = self.locale;
        let note = &mut self.notes[index];
        note.is_private = false;
        note.encrypted = None;
        note.title = title.to_string();
        note.content = payload.content;
        note.content_type = payload.content_type;
        note.touch(locale);

        let is_deleted = note.is_deleted;
        if is_deleted {
            note.original_category_id = Some(category_id.clone());
        }

        self.unlocked.remove(note_id);

        tracing::debug!("Unsealed note {note_id}");

        if is_deleted {
            self.rebuild();
            Ok(())
        } else {
            self.move_to_category(note_id, &category_id)
        }
    }

    /// File a note under a category
    ///
    /// Moving to `trash` deletes the note and remembers where it came from, unless that is
    /// already known. Any other target undeletes it and becomes the place to restore to.
    ///
    /// A private note that is not deleted always lands in `private`, the requested target is
    /// ignored.
    pub fn move_to_category(&mut self, note_id: &str, category_id: &str) -> Result<()> {
        let index = self.note_index(note_id)?;

        if self.category(category_id).is_none() {
            return Err(Error::CategoryNotFound(category_id.to_string()));
        }

        let note = &mut self.notes[index];
        let previous = std::mem::take(&mut note.category_id);

        let target = if category_id == TRASH {
            TRASH
        } else if note.is_private {
            PRIVATE
        } else if is_virtual_category(category_id) {
            UNCATEGORIZED
        } else {
            category_id
        };

        if target == TRASH {
            if note.original_category_id.is_none() {
                note.original_category_id = Some(if previous == TRASH {
                    UNCATEGORIZED.to_string()
                } else {
                    previous.clone()
                });
            }
            note.is_deleted = true;
        } else {
            note.is_deleted = false;
            note.original_category_id = Some(target.to_string());
        }

        note.category_id = target.to_string();

        tracing::debug!("Moved note {note_id} from `{previous}` to `{target}`");

        self.rebuild();

        Ok(())
    }

    /// Move a note to trash
    pub fn soft_delete(&mut self, note_id: &str) -> Result<()> {
        self.move_to_category(note_id, TRASH)
    }

    /// Move a note out of trash, back to where it was deleted from
    ///
    /// Without a known origin, or when the origin is gone, private notes go to `private` and
    /// others to `uncategorized`
    pub fn restore(&mut self, note_id: &str) -> Result<()> {
        let note = self
            .note(note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))?;

        if !note.is_deleted {
            return Err(Error::NotDeleted(note_id.to_string()));
        }

        let target = note
            .original_category_id
            .clone()
            .filter(|category_id| category_id != TRASH && self.category(category_id).is_some())
            .unwrap_or_else(|| {
                if note.is_private {
                    PRIVATE.to_string()
                } else {
                    UNCATEGORIZED.to_string()
                }
            });

        tracing::debug!("Restoring note {note_id} to `{target}`");

        self.move_to_category(note_id, &target)
    }

    /// Remove a note from trash for good, its unlocked plaintext goes with it
    pub fn hard_delete(&mut self, note_id: &str) -> Result<Note> {
        let index = self.note_index(note_id)?;

        if !self.notes[index].is_deleted {
            return Err(Error::NotDeleted(note_id.to_string()));
        }

        let note = self.notes.remove(index);
        self.unlocked.remove(note_id);
        self.rebuild();

        tracing::debug!("Deleted note {note_id} permanently");

        Ok(note)
    }

    /// Remove a note without any checks
    pub(crate) fn remove_note(&mut self, note_id: &str) -> Option<Note> {
        let index = self.note_index(note_id).ok()?;
        let note = self.notes.remove(index);

        self.unlocked.remove(note_id);
        self.rebuild();

        Some(note)
    }

    /// Create a user category
    pub fn create_category(&mut self, name: &str) -> Result<&Category> {
        let name = self.validate_category_name(name, None)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name,
            is_system: false,
        };

        tracing::debug!("Created category {} `{}`", category.id, category.name);

        let index = self.categories.len();
        self.categories.push(category);
        self.rebuild();

        Ok(&self.categories[index])
    }

    /// Rename a user category
    pub fn rename_category(&mut self, category_id: &str, name: &str) -> Result<()> {
        if is_system_category(category_id) {
            return Err(Error::ProtectedCategory(category_id.to_string()));
        }

        let name = self.validate_category_name(name, Some(category_id))?;

        let category = self
            .categories
            .iter_mut()
            .find(|category| category.id == category_id)
            .ok_or_else(|| Error::CategoryNotFound(category_id.to_string()))?;

        tracing::debug!("Renamed category {category_id} `{}` to `{name}`", category.name);

        category.name = name;

        Ok(())
    }

    /// Delete a user category, its notes move to `uncategorized`
    ///
    /// Notes in trash that would be restored to the category are restored to `uncategorized`
    /// instead
    pub fn delete_category(&mut self, category_id: &str) -> Result<Category> {
        if is_system_category(category_id) {
            return Err(Error::ProtectedCategory(category_id.to_string()));
        }

        let index = self
            .categories
            .iter()
            .position(|category| category.id == category_id)
            .ok_or_else(|| Error::CategoryNotFound(category_id.to_string()))?;

        for note in &mut self.notes {
            if note.category_id == category_id {
                note.category_id = UNCATEGORIZED.to_string();
            }

            if note.original_category_id.as_deref() == Some(category_id) {
                note.original_category_id = Some(UNCATEGORIZED.to_string());
            }
        }

        let category = self.categories.remove(index);
        self.rebuild();

        tracing::debug!("Deleted category {category_id} `{}`", category.name);

        Ok(category)
    }

    /// Notes shown when viewing a category
    ///
    /// `all` shows every note not in trash, `trash` the deleted ones and `private` the private
    /// ones not in trash. A user category shows its non-private notes.
    pub fn notes_in_view(&self, category_id: &str) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|note| match category_id {
                ALL => !note.is_deleted,
                TRASH => note.is_deleted,
                PRIVATE => !note.is_deleted && note.is_private,
                _ => !note.is_deleted && !note.is_private && note.category_id == category_id,
            })
            .collect()
    }

    /// Number of notes shown when viewing a category
    pub fn note_count(&self, category_id: &str) -> usize {
        self.notes_in_view(category_id).len()
    }

    /// Name of a category as shown, unknown categories show as `uncategorized`
    pub fn category_display_name(&self, category_id: &str) -> &str {
        if let Some(name) = self.locale.system_category_name(category_id) {
            return name;
        }

        match self.category(category_id) {
            Some(category) => &category.name,
            None => self
                .locale
                .system_category_name(UNCATEGORIZED)
                .unwrap_or(UNCATEGORIZED),
        }
    }

    /// Title of a note as shown
    ///
    /// Private notes show their real title only while unlocked
    pub fn display_title<'a>(&'a self, note: &'a Note) -> &'a str {
        if note.is_private {
            return self
                .unlocked
                .get(&note.id)
                .map(|unlocked| unlocked.title.as_str())
                .filter(|title| !title.is_empty())
                .unwrap_or(self.locale.private_note_title());
        }

        if note.title.is_empty() {
            self.locale.untitled_note_title()
        } else {
            &note.title
        }
    }

    /// Decrypt a private note into the session cache
    ///
    /// Notes already unlocked need no password
    pub async fn unlock(&mut self, note_id: &str, password: &str) -> Result<&Unlocked> {
        let index = self.note_index(note_id)?;
        let crypto = self.crypto;

        self.unlocked
            .unlock(&self.notes[index], password, &crypto)
            .await
    }

    /// Plaintext of an unlocked private note
    pub fn unlocked(&self, note_id: &str) -> Option<&Unlocked> {
        self.unlocked.get(note_id)
    }

    pub fn is_unlocked(&self, note_id: &str) -> bool {
        self.unlocked.contains(note_id)
    }

    /// Keep the plaintext of a note that was just sealed
    pub fn remember(&mut self, note_id: &str, unlocked: Unlocked) {
        if self.note(note_id).is_some_and(|note| note.is_private) {
            self.unlocked.insert(note_id, unlocked);
        }
    }

    /// Lock a single note again
    pub fn forget(&mut self, note_id: &str) {
        self.unlocked.remove(note_id);
    }

    /// Lock every private note again
    pub fn relock(&mut self) {
        self.unlocked.clear();
    }

    pub fn unlock_cache(&self) -> &UnlockCache {
        &self.unlocked
    }

    fn note_index(&self, note_id: &str) -> Result<usize> {
        self.notes
            .iter()
            .position(|note| note.id == note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))
    }

    /// The category a non-private note is actually filed under
    fn concrete_category(&self, category_id: &str) -> Result<String> {
        if is_virtual_category(category_id) {
            return Ok(UNCATEGORIZED.to_string());
        }

        if self.category(category_id).is_none() {
            return Err(Error::CategoryNotFound(category_id.to_string()));
        }

        Ok(category_id.to_string())
    }

    /// Trimmed name, if it is not blank and not used by another category
    fn validate_category_name(&self, name: &str, exclude_id: Option<&str>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        if self
            .categories
            .iter()
            .any(|category| category.name == name && Some(category.id.as_str()) != exclude_id)
        {
            return Err(Error::DuplicateCategoryName(name.to_string()));
        }

        Ok(name.to_string())
    }
}
