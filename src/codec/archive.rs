//! ZIP bundles of markdown notes.
use std::{
    collections::HashSet,
    io::{Read, Seek, Write},
    path::Path,
};

use log::{debug, info, warn};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{
    codec::markdown::{export_markdown, import_markdown, sanitize_filename, ImportedNote},
    Note, NotesError, Result, Tag,
};

/// Directory inside the archive holding the notes.
pub const ARCHIVE_DIR: &str = "markdown-notes";

/// Default file name for a full export.
pub const ARCHIVE_FILE_NAME: &str = "markdown-notes-export.zip";

/// Writes every note as `markdown-notes/<title>.md` and returns the finished writer.
///
/// A name already in the archive gets the lowest free ` (n)` suffix, compared
/// case-insensitively.
pub fn export_zip<W: Write + Seek>(writer: W, notes: &[Note], tags: &[Tag]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut used: HashSet<String> = HashSet::new();
    for note in notes {
        let stem = sanitize_filename(note.display_title());
        let mut file_name = format!("{}/{}.md", ARCHIVE_DIR, stem);
        let mut n = 1;
        while !used.insert(file_name.to_lowercase()) {
            n += 1;
            file_name = format!("{}/{} ({}).md", ARCHIVE_DIR, stem, n);
        }

        debug!("Adding {} to archive", file_name);
        zip.start_file(file_name, options)?;
        zip.write_all(export_markdown(note, tags).as_bytes())
            .map_err(|e| NotesError::ApplicationError {
                message: format!("Failed to write note {} to archive: {}", note.id, e),
            })?;
    }

    let writer = zip.finish()?;
    info!("Exported {} notes to archive", notes.len());
    Ok(writer)
}

/// Decodes every `.md` entry of an archive. Other entries are skipped.
pub fn import_zip<R: Read + Seek>(reader: R) -> Result<Vec<ImportedNote>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut imported = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if !name.to_lowercase().ends_with(".md") {
            debug!("Skipping non-markdown entry {}", name);
            continue;
        }

        let mut text = String::new();
        if let Err(e) = entry.read_to_string(&mut text) {
            warn!("Skipping unreadable entry {}: {}", name, e);
            continue;
        }

        let file_name = Path::new(&name)
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.clone());
        imported.push(import_markdown(&file_name, &text));
    }

    info!("Decoded {} notes from archive", imported.len());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_tags;
    use chrono::Utc;
    use std::io::Cursor;

    fn note(id: &str, title: &str, content: &str, tags: &[&str]) -> Note {
        let now = Utc::now();
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            folder_id: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn entry_names(bytes: Vec<u8>) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_export_names_entries_by_title() {
        let notes = vec![
            note("1", "Plan: Q3", "a", &[]),
            note("2", "Plan: Q3", "b", &[]),
            note("3", "", "c", &[]),
        ];
        let cursor = export_zip(Cursor::new(Vec::new()), &notes, &seed_tags()).unwrap();

        assert_eq!(
            entry_names(cursor.into_inner()),
            vec![
                "markdown-notes/Plan- Q3.md",
                "markdown-notes/Plan- Q3 (2).md",
                "markdown-notes/Untitled Note.md",
            ]
        );
    }

    #[test]
    fn test_suffix_skips_names_taken_by_real_titles() {
        let notes = vec![
            note("1", "Plan (2)", "a", &[]),
            note("2", "Plan", "b", &[]),
            note("3", "plan", "c", &[]),
            note("4", "Plan", "d", &[]),
        ];
        let cursor = export_zip(Cursor::new(Vec::new()), &notes, &seed_tags()).unwrap();

        assert_eq!(
            entry_names(cursor.into_inner()),
            vec![
                "markdown-notes/Plan (2).md",
                "markdown-notes/Plan.md",
                "markdown-notes/plan (3).md",
                "markdown-notes/Plan (4).md",
            ]
        );
    }

    #[test]
    fn test_archive_imports_back() {
        let notes = vec![
            note("1", "First", "one", &["tag2"]),
            note("2", "Second", "two", &[]),
        ];
        let cursor = export_zip(Cursor::new(Vec::new()), &notes, &seed_tags()).unwrap();

        let imported = import_zip(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].title, "First");
        assert_eq!(imported[0].content, "one");
        assert_eq!(imported[0].tags, vec!["Work".to_string()]);
        assert_eq!(imported[1].title, "Second");
    }

    #[test]
    fn test_import_rejects_non_zip() {
        let err = import_zip(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, NotesError::ZipError(_)));
    }
}
