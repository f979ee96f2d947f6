//! Session cache of decrypted private notes
//!
//! Plaintext only lives here while a private note is unlocked. The owner clears it explicitly on
//! navigation, nothing is evicted implicitly.

use std::collections::HashMap;
use std::fmt;

use crate::crypto::Crypto;
use crate::error::Error;
use crate::error::Result;
use crate::notes::ContentType;
use crate::notes::Note;
use crate::notes::SecretPayload;

/// A decrypted private note
#[derive(Clone, PartialEq, Eq)]
pub struct Unlocked {
    pub title: String,
    pub content: String,
    pub content_type: ContentType,

    /// Kept to re-encrypt on save without asking again
    password: String,
}

impl Unlocked {
    pub fn new<P>(payload: SecretPayload, password: P) -> Self
    where
        P: Into<String>,
    {
        Self {
            title: payload.title,
            content: payload.content,
            content_type: payload.content_type,
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn payload(&self) -> SecretPayload {
        SecretPayload::new(self.title.clone(), self.content.clone(), self.content_type)
    }
}

impl fmt::Debug for Unlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unlocked")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Unlocked private notes by note ID
#[derive(Debug, Default)]
pub struct UnlockCache {
    entries: HashMap<String, Unlocked>,
}

impl UnlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrypt a private note into the cache
    ///
    /// A note that is already unlocked is returned as is, the password is not checked again
    pub async fn unlock(
        &mut self,
        note: &Note,
        password: &str,
        crypto: &Crypto,
    ) -> Result<&Unlocked> {
        if !note.is_private {
            return Err(Error::NotPrivate(note.id.clone()));
        }

        if self.entries.contains_key(&note.id) {
            return Ok(&self.entries[&note.id]);
        }

        let Some(encrypted) = &note.encrypted else {
            return Err(Error::MissingCiphertext(note.id.clone()));
        };

        if password.is_empty() {
            return Err(Error::PasswordRequired);
        }

        let payload: SecretPayload = crypto
            .decrypt(encrypted, password)
            .await
            .map_err(|_| Error::WrongPassword)?;

        tracing::debug!("Unlocked note {}", note.id);

        Ok(&*self
            .entries
            .entry(note.id.clone())
            .or_insert(Unlocked::new(payload, password)))
    }

    pub fn get(&self, note_id: &str) -> Option<&Unlocked> {
        self.entries.get(note_id)
    }

    pub fn contains(&self, note_id: &str) -> bool {
        self.entries.contains_key(note_id)
    }

    /// Store plaintext that was just encrypted
    pub fn insert<I>(&mut self, note_id: I, unlocked: Unlocked)
    where
        I: Into<String>,
    {
        self.entries.insert(note_id.into(), unlocked);
    }

    /// Lock a single note again
    pub fn remove(&mut self, note_id: &str) -> Option<Unlocked> {
        self.entries.remove(note_id)
    }

    /// Lock every note again
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!("Relocking {} private notes", self.entries.len());
        }

        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
