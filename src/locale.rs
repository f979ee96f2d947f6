//! Locale dependent names
//!
//! Only the strings that end up in stored data live here: system category names, placeholder
//! titles and the human readable modification time.

use std::str::FromStr;

use chrono::Local;
use chrono::TimeZone;

use crate::notes::ALL;
use crate::notes::PRIVATE;
use crate::notes::TRASH;
use crate::notes::UNCATEGORIZED;

/// Supported locales
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    /// English
    #[default]
    En,

    /// Simplified Chinese
    Zh,
}

impl Locale {
    /// Display name of a system category, `None` for user categories
    pub fn system_category_name(self, category_id: &str) -> Option<&'static str> {
        let name = match (self, category_id) {
            (Locale::En, ALL) => "All Notes",
            (Locale::En, UNCATEGORIZED) => "Uncategorized",
            (Locale::En, PRIVATE) => "Private Notes",
            (Locale::En, TRASH) => "Recently Deleted",
            (Locale::Zh, ALL) => "全部笔记",
            (Locale::Zh, UNCATEGORIZED) => "未分类",
            (Locale::Zh, PRIVATE) => "私密笔记",
            (Locale::Zh, TRASH) => "最近删除",
            _ => return None,
        };

        Some(name)
    }

    /// Title stored on a private note instead of the real one
    pub fn private_note_title(self) -> &'static str {
        match self {
            Locale::En => "Private Note",
            Locale::Zh => "私密笔记",
        }
    }

    /// Base title of a new note
    pub fn new_note_title(self) -> &'static str {
        match self {
            Locale::En => "New Note",
            Locale::Zh => "新笔记",
        }
    }

    /// Base title of a new private note
    pub fn new_private_note_title(self) -> &'static str {
        match self {
            Locale::En => "New Private Note",
            Locale::Zh => "新私密笔记",
        }
    }

    /// Title shown for a note without one
    pub fn untitled_note_title(self) -> &'static str {
        match self {
            Locale::En => "Untitled Note",
            Locale::Zh => "无标题笔记",
        }
    }

    /// Render epoch millis in local time
    pub fn format_timestamp(self, millis: i64) -> String {
        let Some(moment) = Local.timestamp_millis_opt(millis).single() else {
            return String::new();
        };

        match self {
            Locale::En => moment.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            Locale::Zh => moment.format("%Y/%-m/%-d %H:%M:%S").to_string(),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts language tags like `en`, `en-US`, `zh` and `zh-CN`
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let language = value
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        match language.as_str() {
            "en" => Ok(Locale::En),
            "zh" => Ok(Locale::Zh),
            _ => Err(format!("Unsupported locale: {value}")),
        }
    }
}
