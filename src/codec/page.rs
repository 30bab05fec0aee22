//! Printable single-note pages.
//!
//! A page is a header (title, tag names, dates) followed by the rendered note
//! body. [`PageRenderer`] turns the two into file bytes; the bundled
//! [`HtmlPageRenderer`] produces a standalone HTML page meant for printing to
//! PDF.
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, error, info};

use crate::{
    codec::{
        markdown::{note_file_name, tag_names},
        render::{escape_html, render_html},
    },
    Note, NotesError, Result, Tag,
};

/// The text printed above the note body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub title: String,
    /// `Tags: a, b` when the note has any resolvable tags
    pub tags_line: Option<String>,
    pub created: String,
    pub updated: String,
}

impl PageHeader {
    pub fn for_note(note: &Note, tags: &[Tag]) -> Self {
        let names = tag_names(note, tags);
        Self {
            title: note.display_title().to_string(),
            tags_line: (!names.is_empty()).then(|| format!("Tags: {}", names.join(", "))),
            created: format!("Created: {}", note.created_at.format("%Y-%m-%d")),
            updated: format!("Updated: {}", note.updated_at.format("%Y-%m-%d")),
        }
    }
}

/// Composes a page from its header and rendered body.
pub trait PageRenderer {
    /// File extension of the rendered output, without the dot.
    fn extension(&self) -> &str;

    fn render(&self, header: &PageHeader, body_html: &str) -> Result<Vec<u8>>;
}

/// Renders a self-contained HTML document.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPageRenderer;

impl PageRenderer for HtmlPageRenderer {
    fn extension(&self) -> &str {
        "html"
    }

    fn render(&self, header: &PageHeader, body_html: &str) -> Result<Vec<u8>> {
        let title = escape_html(&header.title);
        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        page.push_str(&format!("<title>{}</title>\n", title));
        page.push_str(
            "<style>body{font-family:sans-serif;max-width:190mm;margin:10mm auto}\
             .meta{color:#646464;font-size:10pt}.dates{font-size:8pt}</style>\n",
        );
        page.push_str("</head>\n<body>\n<header>\n");
        page.push_str(&format!("<h1>{}</h1>\n", title));
        if let Some(tags_line) = &header.tags_line {
            page.push_str(&format!("<p class=\"meta\">{}</p>\n", escape_html(tags_line)));
        }
        page.push_str(&format!(
            "<p class=\"dates\">{}<br>{}</p>\n",
            escape_html(&header.created),
            escape_html(&header.updated)
        ));
        page.push_str("</header>\n<main>\n");
        page.push_str(body_html);
        page.push_str("</main>\n</body>\n</html>\n");
        Ok(page.into_bytes())
    }
}

/// Renders `note` with `renderer` into `dir`, returning the written path.
pub fn export_page<R: PageRenderer + ?Sized>(
    renderer: &R,
    note: &Note,
    tags: &[Tag],
    dir: &Path,
) -> Result<PathBuf> {
    let header = PageHeader::for_note(note, tags);
    let bytes = renderer.render(&header, &render_html(&note.content))?;

    let path = dir.join(note_file_name(note, renderer.extension()));
    debug!("Writing page for note {} to {}", note.id, path.display());
    fs::write(&path, bytes).map_err(|e| {
        error!("Failed to write page {}: {}", path.display(), e);
        NotesError::Io(e)
    })?;

    info!("Exported note {} to {}", note.id, path.display());
    Ok(path)
}
