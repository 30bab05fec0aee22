//! Error types for the marknotes application.
//!
//! This module defines the error type shared by the store, the persistence
//! adapters, the codecs and the CLI.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the marknotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to zip operations.
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// The key-value storage rejected a read or write.
    #[error("Storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    /// Note was not found when the caller required it to exist.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Folder was not found when the caller required it to exist.
    #[error("Folder not found: {id}")]
    FolderNotFound { id: String },

    /// Tag was not found when the caller required it to exist.
    #[error("Tag not found: {id}")]
    TagNotFound { id: String },

    /// A backup document is missing required collections.
    #[error("Invalid backup file format: {message}")]
    InvalidBackup { message: String },

    /// A folder move would create a cycle.
    #[error("Invalid move: {message}")]
    InvalidMove { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    /// A dropped or imported file has a type we cannot read.
    #[error("Unsupported file: {file_path}")]
    UnsupportedFile { file_path: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}

impl NotesError {
    /// Returns a short message suitable for a transient notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidBackup { .. } => "Failed to import backup".to_string(),
            Self::UnsupportedFile { file_path } => format!("Unsupported file: {file_path}"),
            Self::NoteNotFound { .. } => "Note no longer exists".to_string(),
            Self::InvalidMove { message } => message.clone(),
            Self::Storage { .. } | Self::Io(_) => format!("Failed to save: {self}"),
            other => other.to_string(),
        }
    }
}
