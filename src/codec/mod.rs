//! Import and export codecs: pure transforms between notes and bytes.

pub mod archive;
pub mod backup;
pub mod markdown;
pub mod page;
pub mod render;

pub use archive::{export_zip, import_zip, ARCHIVE_DIR, ARCHIVE_FILE_NAME};
pub use backup::{parse_backup, Backup, BackupContents, BACKUP_VERSION};
pub use markdown::{
    export_markdown, import_markdown, note_file_name, sanitize_filename, ImportedNote,
};
pub use page::{export_page, HtmlPageRenderer, PageHeader, PageRenderer};
pub use render::{escape_html, render_html};
