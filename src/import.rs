//! Reading import sources off disk.
//!
//! Files are read and decoded as independent tokio tasks. A task yields a
//! fully decoded payload or an error; nothing touches the store until the
//! caller applies a successful payload, so a failed import leaves no trace.
use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use globset::{GlobBuilder, GlobMatcher};
use log::{debug, error, info, warn};
use tokio::task::JoinSet;
use walkdir::WalkDir;

use crate::{
    codec::{import_markdown, import_zip, parse_backup, BackupContents, ImportedNote},
    KeyValueStore, NewTag, Note, NoteStore, NotesError, Result,
};

/// What a file on disk decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportKind {
    Markdown,
    Zip,
    Backup,
}

impl ImportKind {
    /// Classifies a path by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" => Ok(Self::Markdown),
            "zip" => Ok(Self::Zip),
            "json" => Ok(Self::Backup),
            _ => Err(NotesError::UnsupportedFile {
                file_path: path.display().to_string(),
            }),
        }
    }
}

/// Notes decoded from one markdown file or archive.
pub async fn read_notes(path: &Path) -> Result<Vec<ImportedNote>> {
    match ImportKind::from_path(path)? {
        ImportKind::Markdown => {
            let text = tokio::fs::read_to_string(path).await?;
            let file_name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(vec![import_markdown(&file_name, &text)])
        }
        ImportKind::Zip => {
            let bytes = tokio::fs::read(path).await?;
            import_zip(Cursor::new(bytes))
        }
        ImportKind::Backup => Err(NotesError::UnsupportedFile {
            file_path: format!("{} (use restore for backups)", path.display()),
        }),
    }
}

/// Reads and validates a JSON backup.
pub async fn read_backup(path: &Path) -> Result<BackupContents> {
    if ImportKind::from_path(path)? != ImportKind::Backup {
        return Err(NotesError::UnsupportedFile {
            file_path: path.display().to_string(),
        });
    }
    let text = tokio::fs::read_to_string(path).await?;
    parse_backup(&text)
}

/// Reads every path concurrently. Results arrive in completion order.
pub async fn read_all(paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<Vec<ImportedNote>>)> {
    let mut tasks = JoinSet::new();
    for path in paths {
        tasks.spawn(async move {
            let result = read_notes(&path).await;
            (path, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => error!("Import task failed: {}", e),
        }
    }
    results
}

/// Lists importable files under `dir`, optionally filtered by a glob on the file name.
pub fn collect_files(dir: &Path, pattern: Option<&str>, recursive: bool) -> Result<Vec<PathBuf>> {
    let matcher: Option<GlobMatcher> = pattern
        .map(|p| {
            GlobBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map(|g| g.compile_matcher())
                .map_err(|e| NotesError::ApplicationError {
                    message: format!("Invalid pattern: {}", e),
                })
        })
        .transpose()?;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        if !matches!(
            ImportKind::from_path(path),
            Ok(ImportKind::Markdown) | Ok(ImportKind::Zip)
        ) {
            continue;
        }
        if let Some(matcher) = &matcher {
            let name = path.file_name().map(Path::new).unwrap_or(path);
            if !matcher.is_match(name) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    debug!("Found {} importable files in {}", files.len(), dir.display());
    Ok(files)
}

/// Adds decoded notes to the store, one `create_note` each.
///
/// Tag names are matched to existing tags case-insensitively; unknown names
/// become new tags. The last note added ends up as the current note.
pub fn apply_imported<S: KeyValueStore>(
    store: &mut NoteStore<S>,
    folder_id: Option<&str>,
    imported: Vec<ImportedNote>,
    extra_tags: &[String],
) -> Result<Vec<Note>> {
    let mut created = Vec::with_capacity(imported.len());
    for note in imported {
        let mut tag_ids = Vec::new();
        for name in note.tags.iter().chain(extra_tags) {
            let id = match store.tag_by_name(name) {
                Some(tag) => tag.id.clone(),
                None => {
                    warn!("Creating missing tag '{}' for imported note", name);
                    store.create_tag(NewTag::named(name.clone()))?.id
                }
            };
            tag_ids.push(id);
        }

        let overrides = note.into_overrides(tag_ids);
        created.push(store.create_note(folder_id, overrides)?);
    }
    info!("Imported {} notes", created.len());
    Ok(created)
}
