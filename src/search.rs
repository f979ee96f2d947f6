//! Searching and sorting notes
//!
//! Search runs over a plain text projection of the content, so markup never matches. Private
//! notes only take part through the plaintext of the unlock cache, locked ones never match.

use std::cmp::Ordering;
use std::str::FromStr;

use pulldown_cmark::Event;
use pulldown_cmark::Parser;
use pulldown_cmark::TagEnd;
use serde::Deserialize;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::notebook::Notebook;
use crate::notes::ALL;
use crate::notes::ContentType;
use crate::notes::Note;
use crate::notes::PRIVATE;
use crate::notes::TRASH;

/// Characters kept in a snippet
pub const SNIPPET_LEN: usize = 60;

/// Elements that end a line of text when closed
const BLOCK_ELEMENTS: [&str; 15] = [
    "p",
    "div",
    "li",
    "ul",
    "ol",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "tr",
    "table",
    "blockquote",
    "pre",
];

/// Order of the note list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Most recently saved first
    #[default]
    Modified,

    Title,

    /// By category name, only offered when viewing all notes
    Category,
}

impl SortMode {
    /// Can the mode be used while viewing a category?
    pub fn available_in(self, category_id: &str) -> bool {
        self != SortMode::Category || category_id == ALL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Modified => "modified",
            SortMode::Title => "title",
            SortMode::Category => "category",
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "modified" => Ok(SortMode::Modified),
            "title" => Ok(SortMode::Title),
            "category" => Ok(SortMode::Category),
            _ => Err(format!("Unknown sort mode: {value}")),
        }
    }
}

/// A note as listed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSummary {
    pub id: String,
    pub title: String,

    /// Start of the content as plain text, empty while locked
    pub snippet: String,

    /// Category shown next to the note
    pub tag: String,

    pub updated_at: i64,
    pub last_modified: String,
    pub is_private: bool,
    pub is_locked: bool,
}

impl NoteSummary {
    pub fn new(notebook: &Notebook, note: &Note) -> Self {
        let (snippet, is_locked) = if note.is_private {
            notebook.unlocked(&note.id).map_or((String::new(), true), |unlocked| {
                (
                    snippet(
                        &content_text(&unlocked.content, unlocked.content_type),
                        SNIPPET_LEN,
                    ),
                    false,
                )
            })
        } else {
            (
                snippet(&content_text(&note.content, note.content_type), SNIPPET_LEN),
                false,
            )
        };

        let tag = if note.is_deleted {
            notebook.category_display_name(TRASH)
        } else if note.is_private {
            notebook.category_display_name(PRIVATE)
        } else {
            notebook.category_display_name(&note.category_id)
        };

        Self {
            id: note.id.clone(),
            title: notebook.display_title(note).to_string(),
            snippet,
            tag: tag.to_string(),
            updated_at: note.updated_at,
            last_modified: note.last_modified.clone(),
            is_private: note.is_private,
            is_locked,
        }
    }
}

/// Plain text of a note's content
pub fn content_text(content: &str, content_type: ContentType) -> String {
    match content_type {
        ContentType::Plain => content.to_string(),
        ContentType::Html => strip_html(content),
        ContentType::Markdown => markdown_text(content),
    }
}

/// Text of an HTML fragment
///
/// Tags are dropped, line breaks and closed blocks become newlines and entities are decoded.
/// Scripts and styles have no text.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut skipping: Option<String> = None;
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        let Some(length) = rest[start..].find('>') else {
            break;
        };

        if skipping.is_none() {
            push_decoded(&mut text, &rest[..start]);
        }

        let (is_closing, name) = tag_name(&rest[start + 1..start + length]);

        if let Some(skipped) = skipping.as_deref() {
            if is_closing && name == skipped {
                skipping = None;
            }
        } else if !is_closing && (name == "script" || name == "style") {
            skipping = Some(name);
        } else if name == "br" || (is_closing && BLOCK_ELEMENTS.contains(&name.as_str())) {
            text.push('\n');
        }

        rest = &rest[start + length + 1..];
    }

    if skipping.is_none() {
        push_decoded(&mut text, rest);
    }

    text.trim().to_string()
}

/// Lowercase element name of a tag body like `/p` or `a href="..."`
fn tag_name(tag: &str) -> (bool, String) {
    let tag = tag.trim_start();
    let (is_closing, tag) = match tag.strip_prefix('/') {
        Some(tag) => (true, tag),
        None => (false, tag),
    };

    let name = tag
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect();

    (is_closing, name)
}

fn push_decoded(text: &mut String, raw: &str) {
    let mut rest = raw;

    while let Some(start) = rest.find('&') {
        text.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));

        if let Some((ch, end)) = decoded {
            text.push(ch);
            rest = &rest[end + 1..];
        } else {
            text.push('&');
            rest = &rest[1..];
        }
    }

    text.push_str(rest);
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };

            char::from_u32(code)
        }
    }
}

/// Text of a markdown document, as it reads once rendered
pub fn markdown_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(value) | Event::Code(value) => text.push_str(&value),
            Event::Html(html) => text.push_str(&strip_html(&html)),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock,
            ) => text.push('\n'),
            _ => {}
        }
    }

    text.trim().to_string()
}

/// Single line preview of a text, cut after `len` characters
pub fn snippet(text: &str, len: usize) -> String {
    let clean = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let clean = clean.trim();

    if clean.chars().count() > len {
        let mut snippet: String = clean.chars().take(len).collect();
        snippet.push_str("...");
        snippet
    } else {
        clean.to_string()
    }
}

/// Key for locale friendly ordering: compatibility decomposed, accents dropped, lowercase
pub fn collation_key(text: &str) -> String {
    text.nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compare two texts by collation key, ties fall back to the raw text
pub fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Sort notes in place, equal notes keep their order
pub fn sort(notebook: &Notebook, notes: &mut [&Note], mode: SortMode) {
    match mode {
        SortMode::Modified => notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortMode::Title => notes.sort_by(|a, b| {
            compare_text(notebook.display_title(a), notebook.display_title(b))
        }),
        SortMode::Category => notes.sort_by(|a, b| {
            compare_text(
                notebook.category_display_name(&a.category_id),
                notebook.category_display_name(&b.category_id),
            )
        }),
    }
}

/// Notes of the scope whose title or content contains the term, ignoring case
///
/// A blank term matches everything
pub fn search<'a>(notebook: &'a Notebook, scope: Vec<&'a Note>, term: &str) -> Vec<&'a Note> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return scope;
    }

    scope
        .into_iter()
        .filter(|note| matches(notebook, note, &term))
        .collect()
}

fn matches(notebook: &Notebook, note: &Note, term: &str) -> bool {
    let (title, content) = if note.is_private {
        let Some(unlocked) = notebook.unlocked(&note.id) else {
            return false;
        };

        (
            unlocked.title.as_str(),
            content_text(&unlocked.content, unlocked.content_type),
        )
    } else {
        (
            note.title.as_str(),
            content_text(&note.content, note.content_type),
        )
    };

    title.to_lowercase().contains(term) || content.to_lowercase().contains(term)
}
