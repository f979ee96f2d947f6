//! Notes, categories and their stored shape

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::crypto::EncryptedBlob;
use crate::locale::Locale;
use crate::storage::NoteRecord;
use crate::utils::now_millis;

/// Virtual aggregate of every note that is not deleted
pub const ALL: &str = "all";

/// Default bucket for notes
pub const UNCATEGORIZED: &str = "uncategorized";

/// Virtual aggregate of private notes
pub const PRIVATE: &str = "private";

/// Virtual aggregate of soft-deleted notes
pub const TRASH: &str = "trash";

/// The reserved category IDs, in their default order
pub const SYSTEM_CATEGORY_IDS: [&str; 4] = [ALL, UNCATEGORIZED, PRIVATE, TRASH];

/// Is the ID one of the reserved categories?
pub fn is_system_category(category_id: &str) -> bool {
    SYSTEM_CATEGORY_IDS.contains(&category_id)
}

/// Is the ID a view over other notes instead of a place to file them?
pub fn is_virtual_category(category_id: &str) -> bool {
    matches!(category_id, ALL | PRIVATE | TRASH)
}

/// A category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, alias = "is_system")]
    pub is_system: bool,
}

impl Category {
    /// Create a system category with its localized name
    pub fn system(category_id: &str, locale: Locale) -> Self {
        Self {
            id: category_id.to_string(),
            name: locale
                .system_category_name(category_id)
                .unwrap_or(category_id)
                .to_string(),
            is_system: true,
        }
    }
}

/// How the content of a note is encoded
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Plain,
    Html,
    Markdown,
}

impl ContentType {
    /// Parse a stored content type, anything unknown is plain text
    pub fn parse(value: &str) -> Self {
        match value {
            "html" => ContentType::Html,
            "markdown" => ContentType::Markdown,
            _ => ContentType::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Plain => "plain",
            ContentType::Html => "html",
            ContentType::Markdown => "markdown",
        }
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;

        Ok(value.as_deref().map_or(ContentType::Plain, ContentType::parse))
    }
}

/// The part of a private note that only lives encrypted
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretPayload {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub content_type: ContentType,
}

impl SecretPayload {
    pub fn new<T, C>(title: T, content: C, content_type: ContentType) -> Self
    where
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            title: title.into(),
            content: content.into(),
            content_type,
        }
    }
}

/// A note
///
/// Private notes keep a placeholder title and empty content, the real values are in `encrypted`
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,

    /// The one category the note is filed under
    pub category_id: String,

    pub is_private: bool,
    pub is_deleted: bool,

    /// Where a restored note goes back to
    pub original_category_id: Option<String>,

    pub encrypted: Option<EncryptedBlob>,

    /// Epoch millis of the last save
    pub updated_at: i64,

    /// `updated_at`, human readable
    pub last_modified: String,
}

impl Note {
    /// Create a note from its stored version
    ///
    /// Older records can miss fields or carry flags that disagree with the category; the
    /// category wins: `trash` means deleted, `private` means private
    pub fn from_record(record: NoteRecord, locale: Locale) -> Self {
        let category_id = record
            .category_id
            .filter(|category_id| !category_id.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let is_deleted = record.is_deleted || category_id == TRASH;
        let is_private = record.is_private || category_id == PRIVATE;

        let original_category_id = record
            .original_category_id
            .filter(|category_id| !category_id.is_empty())
            .unwrap_or_else(|| {
                if category_id == TRASH {
                    UNCATEGORIZED.to_string()
                } else {
                    category_id.clone()
                }
            });

        let updated_at = record
            .updated_at
            .filter(|updated_at| *updated_at > 0)
            .or_else(|| {
                record
                    .last_modified
                    .as_deref()
                    .and_then(|last_modified| {
                        chrono::DateTime::parse_from_rfc3339(last_modified).ok()
                    })
                    .map(|moment| moment.timestamp_millis())
            })
            .unwrap_or_else(now_millis);

        let last_modified = record
            .last_modified
            .filter(|last_modified| !last_modified.is_empty())
            .unwrap_or_else(|| locale.format_timestamp(updated_at));

        Self {
            id: record.id,
            title: record.title.unwrap_or_default(),
            content: record.content.unwrap_or_default(),
            content_type: record.content_type,
            category_id: if is_deleted {
                TRASH.to_string()
            } else {
                category_id
            },
            is_private,
            is_deleted,
            original_category_id: Some(original_category_id),
            encrypted: record.encrypted,
            updated_at,
            last_modified,
        }
    }

    /// Create the stored version of the note
    pub fn to_record(&self) -> NoteRecord {
        NoteRecord {
            id: self.id.clone(),
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            encrypted: self.encrypted.clone(),
            category_id: Some(self.category_id.clone()),
            is_private: self.is_private,
            is_deleted: self.is_deleted,
            original_category_id: self.original_category_id.clone(),
            updated_at: Some(self.updated_at),
            last_modified: Some(self.last_modified.clone()),
            content_type: self.content_type,
        }
    }

    /// Stamp the note as saved right now
    pub fn touch(&mut self, locale: Locale) {
        // keep it strictly increasing, two saves can land in the same millisecond
        self.updated_at = now_millis().max(self.updated_at.saturating_add(1));
        self.last_modified = locale.format_timestamp(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category_id: Option<&str>) -> NoteRecord {
        NoteRecord {
            id: "note-1".to_string(),
            title: Some("Plan".to_string()),
            content: None,
            encrypted: None,
            category_id: category_id.map(ToString::to_string),
            is_private: false,
            is_deleted: false,
            original_category_id: None,
            updated_at: Some(1_700_000_000_000),
            last_modified: None,
            content_type: ContentType::Plain,
        }
    }

    #[test]
    fn test_trash_category_means_deleted() {
        let note = Note::from_record(record(Some(TRASH)), Locale::En);

        assert!(note.is_deleted);
        assert_eq!(TRASH, note.category_id);
        assert_eq!(Some(UNCATEGORIZED.to_string()), note.original_category_id);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let note = Note::from_record(record(None), Locale::En);

        assert_eq!(UNCATEGORIZED, note.category_id);
        assert_eq!("", note.content);
        assert_eq!(1_700_000_000_000, note.updated_at);
        assert!(!note.last_modified.is_empty());
    }

    #[test]
    fn test_touch_keeps_increasing() {
        let mut note = Note::from_record(record(None), Locale::En);
        let before = note.updated_at;

        note.touch(Locale::En);
        assert!(note.updated_at > before);

        // a stored timestamp at the very end of the range is kept
        let mut far_future = record(None);
        far_future.updated_at = Some(i64::MAX);
        let mut note = Note::from_record(far_future, Locale::En);

        note.touch(Locale::En);
        assert_eq!(i64::MAX, note.updated_at);
    }

    #[test]
    fn test_unknown_content_type_is_plain() {
        let payload: SecretPayload =
            serde_json::from_str(r#"{"title":"a","content":"b","contentType":"rtf"}"#).unwrap();
        assert_eq!(ContentType::Plain, payload.content_type);

        let payload: SecretPayload =
            serde_json::from_str(r#"{"title":"a","content":"b","contentType":null}"#).unwrap();
        assert_eq!(ContentType::Plain, payload.content_type);

        let payload: SecretPayload =
            serde_json::from_str(r#"{"title":"a","contentType":"markdown"}"#).unwrap();
        assert_eq!(ContentType::Markdown, payload.content_type);
    }

    #[test]
    fn test_legacy_category_key() {
        let category: Category =
            serde_json::from_str(r#"{"id":"trash","name":"Trash","is_system":true}"#).unwrap();
        assert!(category.is_system);

        let value = serde_json::to_value(&category).unwrap();
        assert_eq!(Some(true), value["isSystem"].as_bool());
    }
}
