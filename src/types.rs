//! Shared result type and the command-line surface.
use std::path::PathBuf;

use clap::Subcommand;

use crate::NotesError;

/// A specialized Result type for marknotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Outcome of importing a batch of files.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Files that decoded successfully
    pub files_read: usize,
    /// Notes added to the store
    pub notes_imported: usize,
    /// Files that failed, with the reason
    pub failures: Vec<(PathBuf, String)>,
}

/// Available subcommands for the marknotes application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note and make it current
    New {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the note's content
        #[clap(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Tag names or ids (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Folder name or id
        #[clap(short = 'F', long)]
        folder: Option<String>,

        /// Write the content in the configured editor
        #[clap(short, long, conflicts_with_all = ["content", "file"])]
        edit: bool,
    },

    /// List notes, newest first
    List {
        /// Case-insensitive text to look for in titles and content
        #[clap(short, long)]
        search: Option<String>,

        /// Only notes in this folder (name or id)
        #[clap(short = 'F', long, conflicts_with = "tag")]
        folder: Option<String>,

        /// Only notes with this tag (name or id)
        #[clap(short, long)]
        tag: Option<String>,

        /// Maximum number of notes to show, 0 for all
        #[clap(short = 'n', long, default_value_t = 0)]
        limit: usize,

        /// Sort order
        #[clap(long, value_parser = ["created", "updated", "title", "id"])]
        sort: Option<String>,

        /// Reverse the sort order
        #[clap(short, long)]
        descending: bool,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Only show note IDs and titles
        #[clap(short, long)]
        brief: bool,
    },

    /// Show a note; defaults to the current note
    View {
        /// ID of the note to view
        id: Option<String>,

        /// Format output as raw JSON
        #[clap(short, long, conflicts_with = "html")]
        json: bool,

        /// Render the content to HTML
        #[clap(long)]
        html: bool,

        /// Print word, character and reading-time counts
        #[clap(short, long)]
        stats: bool,
    },

    /// Make a note current
    Select {
        /// ID of the note
        id: String,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit; defaults to the current note
        id: Option<String>,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the new note content
        #[clap(short, long, conflicts_with = "content")]
        file: Option<PathBuf>,

        /// Replace the tags (comma-separated names or ids)
        #[clap(short, long)]
        tags: Option<String>,

        /// Move to this folder (name or id)
        #[clap(short = 'F', long, conflicts_with = "unfile")]
        folder: Option<String>,

        /// Remove the note from its folder
        #[clap(long)]
        unfile: bool,

        /// Edit the content in the configured editor
        #[clap(short, long, conflicts_with_all = ["content", "file"])]
        edit: bool,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Folder operations
    #[clap(subcommand)]
    Folder(FolderCommands),

    /// Tag operations
    #[clap(subcommand)]
    Tag(TagCommands),

    /// Import markdown files, archives or directories of markdown files
    Import {
        /// Files or directories to import
        #[clap(required = true)]
        paths: Vec<PathBuf>,

        /// Folder (name or id) for the imported notes
        #[clap(short = 'F', long)]
        folder: Option<String>,

        /// Extra tag names applied to every imported note (comma-separated)
        #[clap(short, long)]
        tags: Option<String>,

        /// Glob on file names when importing a directory
        #[clap(short, long)]
        pattern: Option<String>,

        /// Descend into subdirectories
        #[clap(short, long)]
        recursive: bool,
    },

    /// Export notes
    #[clap(subcommand)]
    Export(ExportCommands),

    /// Replace all notes, folders and tags with a backup
    Restore {
        /// Path to the backup file
        backup_file: PathBuf,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a setting, e.g. `editor_command=code --wait`
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// List folders as a tree
    List,

    /// Create a folder
    Create {
        name: String,

        /// Parent folder (name or id)
        #[clap(short, long)]
        parent: Option<String>,
    },

    /// Rename a folder
    Rename { folder: String, name: String },

    /// Move a folder under another, or to the top level
    Move {
        folder: String,

        /// New parent (name or id); omit for top level
        #[clap(short, long)]
        parent: Option<String>,
    },

    /// Delete a folder; its notes become unfiled and its subfolders move up
    Delete {
        folder: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// List tags with their note counts
    List,

    /// Create a tag
    Create {
        name: String,

        /// Hex color; random from the palette when omitted
        #[clap(short, long)]
        color: Option<String>,
    },

    /// Rename or recolor a tag
    Update {
        tag: String,

        #[clap(short, long)]
        name: Option<String>,

        #[clap(short, long)]
        color: Option<String>,
    },

    /// Delete a tag and remove it from every note
    Delete {
        tag: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Add a tag to a note
    Add { note: String, tag: String },

    /// Remove a tag from a note
    Remove { note: String, tag: String },
}

#[derive(Subcommand)]
pub enum ExportCommands {
    /// Write one note as a markdown file with frontmatter
    Markdown {
        /// Note ID; defaults to the current note
        id: Option<String>,

        /// Output directory
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Write every note into a zip archive
    Zip {
        /// Output file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a JSON backup of notes, folders and tags
    Backup {
        /// Output file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a printable HTML page for one note
    Page {
        /// Note ID; defaults to the current note
        id: Option<String>,

        /// Output directory
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}
