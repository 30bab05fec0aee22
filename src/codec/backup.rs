//! JSON backups of the whole store.
//!
//! A backup is `{ notes, folders, tags, exportDate, version }`. Parsing is
//! strict about `notes` and `tags`; `folders` may be absent.
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{Folder, Note, NotesError, Result, Tag};

/// Format tag written into every backup.
pub const BACKUP_VERSION: &str = "1.0";

/// A complete backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub tags: Vec<Tag>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

impl Backup {
    pub fn new(notes: &[Note], folders: &[Folder], tags: &[Tag]) -> Self {
        Self {
            notes: notes.to_vec(),
            folders: folders.to_vec(),
            tags: tags.to_vec(),
            export_date: Utc::now(),
            version: BACKUP_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `markdown-notes-backup-YYYY-MM-DD.json`, dated by the export date.
    pub fn file_name(&self) -> String {
        format!(
            "markdown-notes-backup-{}.json",
            self.export_date.format("%Y-%m-%d")
        )
    }
}

/// The collections recovered from a backup, ready for `restore_from_backup`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupContents {
    pub notes: Vec<Note>,
    pub folders: Vec<Folder>,
    pub tags: Vec<Tag>,
}

#[derive(Deserialize)]
struct RawBackup {
    notes: Option<Vec<Note>>,
    folders: Option<Vec<Folder>>,
    tags: Option<Vec<Tag>>,
    version: Option<String>,
}

/// Parses a backup document, failing if `notes` or `tags` are missing.
pub fn parse_backup(text: &str) -> Result<BackupContents> {
    let raw: RawBackup = serde_json::from_str(text).map_err(|e| NotesError::InvalidBackup {
        message: e.to_string(),
    })?;

    let notes = raw.notes.ok_or_else(|| NotesError::InvalidBackup {
        message: "missing \"notes\"".to_string(),
    })?;
    let tags = raw.tags.ok_or_else(|| NotesError::InvalidBackup {
        message: "missing \"tags\"".to_string(),
    })?;

    match raw.version.as_deref() {
        Some(BACKUP_VERSION) => {}
        Some(other) => warn!("Backup version {} differs from {}", other, BACKUP_VERSION),
        None => warn!("Backup has no version tag"),
    }

    let contents = BackupContents {
        notes,
        folders: raw.folders.unwrap_or_default(),
        tags,
    };
    info!(
        "Parsed backup: {} notes, {} folders, {} tags",
        contents.notes.len(),
        contents.folders.len(),
        contents.tags.len()
    );
    Ok(contents)
}
