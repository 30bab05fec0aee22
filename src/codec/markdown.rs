//! Markdown files with a leading `---` frontmatter block.
//!
//! Import never fails: a missing or unterminated frontmatter block just means
//! the whole text is the note body and the file name is the title.
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, trace};

use crate::{Note, NoteOverrides, Tag, DEFAULT_NOTE_TITLE};

const FRONTMATTER_DELIMITER: &str = "---";

/// Characters replaced with `-` when a title becomes a file name.
const UNSAFE_FILENAME_CHARS: [char; 10] = ['/', '\\', '?', '%', '*', ':', '|', '"', '<', '>'];

/// The fields decoded from one markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedNote {
    pub title: String,
    pub content: String,
    /// Tag display names listed in the frontmatter
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImportedNote {
    /// Overrides for `NoteStore::create_note`, with tag names already resolved to ids.
    pub fn into_overrides(self, tag_ids: Vec<String>) -> NoteOverrides {
        NoteOverrides {
            title: Some(self.title),
            content: Some(self.content),
            tags: Some(tag_ids),
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            ..Default::default()
        }
    }
}

/// Decodes a markdown file. Timestamps are always the import time.
pub fn import_markdown(file_name: &str, text: &str) -> ImportedNote {
    let now = Utc::now();
    let mut title = title_from_file_name(file_name);
    let mut tags = Vec::new();

    let content = match split_frontmatter(text) {
        Some((frontmatter, body)) => {
            debug!("Found frontmatter in {}", file_name);
            for line in frontmatter.lines() {
                let Some((key, value)) = line.split_once(':') else {
                    continue;
                };
                match key.trim() {
                    "title" => {
                        let value = unquote(value.trim());
                        if !value.is_empty() {
                            title = value;
                        }
                    }
                    "tags" => tags = parse_inline_list(value.trim()),
                    other => trace!("Ignoring frontmatter key '{}'", other),
                }
            }
            body.trim().to_string()
        }
        None => text.to_string(),
    };

    ImportedNote {
        title,
        content,
        tags,
        created_at: now,
        updated_at: now,
    }
}

/// Encodes a note as markdown with frontmatter. Tag ids not found in `tags`
/// are left out.
pub fn export_markdown(note: &Note, tags: &[Tag]) -> String {
    let mut out = String::new();
    out.push_str(FRONTMATTER_DELIMITER);
    out.push('\n');
    out.push_str(&format!("title: {}\n", frontmatter_value(note.display_title(), false)));
    out.push_str(&format!("created: {}\n", iso(&note.created_at)));
    out.push_str(&format!("updated: {}\n", iso(&note.updated_at)));

    let names: Vec<String> = tag_names(note, tags)
        .iter()
        .map(|name| frontmatter_value(name, true))
        .collect();
    if !names.is_empty() {
        out.push_str(&format!("tags: [{}]\n", names.join(", ")));
    }

    out.push_str(FRONTMATTER_DELIMITER);
    out.push_str("\n\n");
    out.push_str(&note.content);
    out
}

/// Replaces characters that are unsafe in file names with `-`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_FILENAME_CHARS.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// `<sanitized title>.<extension>` for a note.
pub fn note_file_name(note: &Note, extension: &str) -> String {
    format!("{}.{}", sanitize_filename(note.display_title()), extension)
}

/// Names of the note's tags that exist in `tags`, in the note's order.
pub(crate) fn tag_names(note: &Note, tags: &[Tag]) -> Vec<String> {
    note.tags
        .iter()
        .filter_map(|id| tags.iter().find(|t| &t.id == id))
        .map(|t| t.name.clone())
        .filter(|name| !name.is_empty())
        .collect()
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn title_from_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string())
}

/// Splits `---\n<frontmatter>\n---\n<body>`. `None` unless both delimiter
/// lines are present.
fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(FRONTMATTER_DELIMITER)?;
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Writes `value` bare when it reads back unchanged, otherwise as a
/// double-quoted string with `\\`, `\"` and `\n` escapes. List items also
/// quote on list punctuation and any quote character.
fn frontmatter_value(value: &str, list_item: bool) -> String {
    let needs_quotes = value.starts_with(['"', '\''])
        || value.trim() != value
        || value.contains(['\n', '\r'])
        || (list_item && value.contains([',', '[', ']', '"', '\'']));
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Splits `[a, "b, c", 'd']` on the commas outside quotes.
fn parse_inline_list(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    let mut items = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in inner.char_indices() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ',' => {
                items.push(unquote(inner[start..i].trim()));
                start = i + 1;
            }
            None => {}
        }
    }
    items.push(unquote(inner[start..].trim()));

    items.retain(|s| !s.is_empty());
    items
}

fn unquote(value: &str) -> String {
    if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        return out;
    }
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
        .to_string()
}
