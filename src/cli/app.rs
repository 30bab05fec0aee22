//! CLI module for the marknotes application
//!
//! This module handles the command-line interface for interacting with the
//! note store. Each invocation opens the store from the configured data
//! directory, runs one command and prints the notifications it produced.
use std::{
    fs::{self, read_to_string, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    process::Command,
};

use console::style;
use log::{debug, error, info, warn};
use shell_words::split;
use tempfile::Builder;

use crate::{
    apply_imported, collect_files, confirm, content_preview,
    codec::{
        export_markdown, export_page, export_zip, note_file_name, render_html, Backup,
        HtmlPageRenderer, ARCHIVE_FILE_NAME,
    },
    parse_tags, read_all, read_backup, strip_comment_lines, Commands, Config, DocumentStats,
    EventLog, ExportCommands, FileStore, FolderCommands, ImportSummary, KeyValueStore,
    LogObserver, NewTag, Note, NoteOverrides, NotePatch, NoteStore, NotesError, Result,
    TagCommands, TagPatch, DEFAULT_NOTE_TITLE,
};

/// Storage key for the note left open between invocations.
const SESSION_KEY: &str = "session";

/// CLI Application handler - processes CLI commands and interfaces with NoteStore
pub struct App {
    /// The note store, persisted to the data directory
    store: NoteStore<FileStore>,

    /// Application configuration
    config: Config,

    /// Where `config --set` and `config --reset` write
    config_path: Option<PathBuf>,

    /// Collects store events for printing after each command
    events: EventLog,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Opens the store in the configured data directory.
    pub fn new(config: Config, config_path: Option<PathBuf>, verbose: bool) -> Result<Self> {
        let storage = FileStore::open(&config.data_dir)?;
        let mut store = NoteStore::open(storage);

        let report = store.load_report();
        if report.any_corrupted() {
            warn!("Stored data could not be read: {:?}", report);
            eprintln!(
                "{} some stored data could not be read and was reset to defaults",
                style("Warning:").yellow().bold()
            );
        } else if report.is_first_run() {
            info!("First run, seeded folders and tags");
        }

        let events = EventLog::new();
        store.subscribe(Box::new(events.clone()));
        store.subscribe(Box::new(LogObserver));

        let mut app = Self {
            store,
            config,
            config_path,
            events,
            verbose,
        };
        app.restore_session();
        Ok(app)
    }

    pub fn store(&self) -> &NoteStore<FileStore> {
        &self.store
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                title,
                content,
                file,
                tags,
                folder,
                edit,
            } => self.create_note(title, content, file, tags, folder, edit)?,

            Commands::List {
                search,
                folder,
                tag,
                limit,
                sort,
                descending,
                json,
                brief,
            } => self.list_notes(search, folder, tag, limit, sort, descending, json, brief)?,

            Commands::View {
                id,
                json,
                html,
                stats,
            } => self.view_note(id, json, html, stats)?,

            Commands::Select { id } => {
                let id = self.resolve_note_id(Some(&id))?;
                if let Some(note) = self.store.select_note(Some(&id)) {
                    println!("Current note: {} ({})", note.display_title(), note.id);
                }
            }

            Commands::Edit {
                id,
                title,
                content,
                file,
                tags,
                folder,
                unfile,
                edit,
            } => self.edit_note(id, title, content, file, tags, folder, unfile, edit)?,

            Commands::Delete { id, force } => self.handle_delete(id, force)?,

            Commands::Folder(command) => self.handle_folder(command)?,

            Commands::Tag(command) => self.handle_tag(command)?,

            Commands::Import {
                paths,
                folder,
                tags,
                pattern,
                recursive,
            } => {
                let summary = self
                    .handle_import(paths, folder, tags, pattern, recursive)
                    .await?;
                self.print_import_summary(&summary);
            }

            Commands::Export(command) => self.handle_export(command)?,

            Commands::Restore { backup_file, force } => {
                self.handle_restore(backup_file, force).await?
            }

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset)?,
        }

        self.save_session()?;
        self.print_notifications();
        Ok(())
    }

    // ---- notes ----

    fn create_note(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        folder: Option<String>,
        edit: bool,
    ) -> Result<()> {
        let folder_id = folder.map(|f| self.resolve_folder(&f)).transpose()?;
        let tag_ids = self.resolve_tag_names(parse_tags(tags))?;

        let note_content = match (content, file) {
            (Some(c), _) => Some(c),
            (_, Some(file_path)) => Some(read_content_from_file(&file_path)?),
            (None, None) if edit => {
                let heading = title.as_deref().unwrap_or(DEFAULT_NOTE_TITLE);
                Some(self.open_editor(heading, "")?)
            }
            (None, None) => None,
        };

        let mut overrides = NoteOverrides::default().tags(tag_ids);
        if let Some(title) = title {
            overrides = overrides.title(title);
        }
        if let Some(content) = note_content {
            overrides = overrides.content(content);
        }

        let note = self.store.create_note(folder_id.as_deref(), overrides)?;
        println!("Note created with ID: {}", note.id);
        Ok(())
    }

    /// List notes according to provided filters and options
    #[allow(clippy::too_many_arguments)]
    fn list_notes(
        &mut self,
        search: Option<String>,
        folder: Option<String>,
        tag: Option<String>,
        limit: usize,
        sort: Option<String>,
        descending: bool,
        json: bool,
        brief: bool,
    ) -> Result<()> {
        self.store.clear_filters();
        if let Some(query) = search {
            self.store.set_search_query(query);
        }
        if let Some(folder) = folder {
            let folder_id = self.resolve_folder(&folder)?;
            self.store.select_folder(Some(&folder_id));
        }
        if let Some(tag) = tag {
            let tag_id = self.resolve_tag(&tag)?;
            self.store.select_tag(Some(&tag_id));
        }

        let notes: Vec<Note> = self.store.filtered_notes().into_iter().cloned().collect();
        let mut notes = sort_notes(notes, sort.as_deref(), descending);
        if limit > 0 {
            notes.truncate(limit);
        }

        if json {
            self.display_notes_json(&notes, brief)
        } else {
            self.display_notes_text(&notes, brief);
            Ok(())
        }
    }

    /// Display notes in JSON format
    fn display_notes_json(&self, notes: &[Note], brief: bool) -> Result<()> {
        if brief {
            let simplified: Vec<serde_json::Value> = notes
                .iter()
                .map(|note| {
                    serde_json::json!({
                        "id": note.id,
                        "title": note.title,
                        "folderId": note.folder_id,
                        "tags": self.store.tag_names(note),
                        "updatedAt": note.updated_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&simplified)?);
        } else {
            println!("{}", serde_json::to_string_pretty(notes)?);
        }
        Ok(())
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[Note], brief: bool) {
        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return;
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let current = self.store.current_note_id();

        for (i, note) in notes.iter().enumerate() {
            let marker = if current == Some(note.id.as_str()) { "*" } else { " " };

            if brief {
                println!("{} {}  {}", marker, note.id, note.display_title());
                continue;
            }

            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            println!(
                "{} ID: {} | Updated: {}",
                marker,
                note.id,
                note.updated_at.format("%Y-%m-%d %H:%M")
            );
            println!("  Title: {}", style(note.display_title()).bold());

            if let Some(folder) = note.folder_id.as_deref().and_then(|id| self.store.folder(id)) {
                println!("  Folder: {}", folder.name);
            }

            let tags = self.store.tag_names(note);
            if !tags.is_empty() {
                let tags = tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("  Tags: {}", style(tags).cyan());
            }

            let preview = content_preview(&note.content, term_width.saturating_sub(4).min(100));
            if !preview.is_empty() {
                println!("  {}", style(preview).dim());
            }
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
    }

    fn view_note(&mut self, id: Option<String>, json: bool, html: bool, stats: bool) -> Result<()> {
        let id = self.resolve_note_id(id.as_deref())?;
        self.store.select_note(Some(&id));
        let note = self.note_by_id(&id)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&note)?);
        } else if html {
            println!("{}", render_html(&note.content));
        } else {
            println!("{}", style(note.display_title()).bold());
            println!(
                "ID: {} | Created: {} | Updated: {}",
                note.id,
                note.created_at.format("%Y-%m-%d %H:%M"),
                note.updated_at.format("%Y-%m-%d %H:%M")
            );
            if let Some(folder) = note.folder_id.as_deref().and_then(|id| self.store.folder(id)) {
                println!("Folder: {}", folder.name);
            }
            let tags = self.store.tag_names(&note);
            if !tags.is_empty() {
                println!("Tags: {}", style(tags.join(", ")).cyan());
            }
            println!("\n{}", note.content);
        }

        if stats {
            let stats = DocumentStats::for_text(&note.content);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "\n{} words | {} characters | {} min read",
                    stats.word_count, stats.char_count, stats.reading_time
                );
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn edit_note(
        &mut self,
        id: Option<String>,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        folder: Option<String>,
        unfile: bool,
        edit: bool,
    ) -> Result<()> {
        let id = self.resolve_note_id(id.as_deref())?;
        let note = self.note_by_id(&id)?;

        let mut patch = NotePatch::default();
        if let Some(title) = title {
            patch = patch.title(title);
        }

        let new_content = match (content, file) {
            (Some(c), _) => Some(c),
            (_, Some(file_path)) => Some(read_content_from_file(&file_path)?),
            (None, None) if edit => Some(self.open_editor(note.display_title(), &note.content)?),
            (None, None) => None,
        };
        if let Some(content) = new_content {
            patch = patch.content(content);
        }

        if let Some(tags) = tags {
            patch = patch.tags(self.resolve_tag_names(parse_tags(Some(tags)))?);
        }

        if unfile {
            patch = patch.folder(None);
        } else if let Some(folder) = folder {
            patch = patch.folder(Some(self.resolve_folder(&folder)?));
        }

        if patch.is_empty() {
            return Err(NotesError::ApplicationError {
                message: "Nothing to change. Use --title, --content, --file, --tags, --folder, --unfile or --edit"
                    .to_string(),
            });
        }

        self.store.update_note(&id, patch)?;
        self.store.select_note(Some(&id));
        println!("Note {} updated.", id);
        Ok(())
    }

    fn handle_delete(&mut self, id: String, force: bool) -> Result<()> {
        let id = self.resolve_note_id(Some(&id))?;
        let note = self.note_by_id(&id)?;

        if !force {
            println!("You are about to delete the following note:");
            println!("ID:     {}", note.id);
            println!("Title:  {}", note.display_title());
            println!("Tags:   {}", self.store.tag_names(&note).join(", "));
            println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));

            if !note.content.is_empty() {
                let preview = note.content.lines().take(2).collect::<Vec<_>>().join("\n");
                println!("\nContent preview:");
                println!(
                    "{}{}",
                    preview,
                    if note.content.lines().count() > 2 { "..." } else { "" }
                );
            }

            println!("\nThis action cannot be undone!");
            if !confirm("Are you sure you want to delete this note?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_note(&id)
    }

    // ---- folders ----

    fn handle_folder(&mut self, command: FolderCommands) -> Result<()> {
        match command {
            FolderCommands::List => self.print_folders(),

            FolderCommands::Create { name, parent } => {
                let parent_id = parent.map(|p| self.resolve_folder(&p)).transpose()?;
                let folder = self.store.create_folder(&name, parent_id.as_deref())?;
                println!("Folder created with ID: {}", folder.id);
            }

            FolderCommands::Rename { folder, name } => {
                let folder_id = self.resolve_folder(&folder)?;
                self.store.update_folder(&folder_id, &name)?;
            }

            FolderCommands::Move { folder, parent } => {
                let folder_id = self.resolve_folder(&folder)?;
                let parent_id = parent.map(|p| self.resolve_folder(&p)).transpose()?;
                self.store.move_folder(&folder_id, parent_id.as_deref())?;
                println!("Folder moved.");
            }

            FolderCommands::Delete { folder, force } => {
                let folder_id = self.resolve_folder(&folder)?;
                if !force {
                    let notes = self
                        .store
                        .notes()
                        .iter()
                        .filter(|n| n.folder_id.as_deref() == Some(folder_id.as_str()))
                        .count();
                    let children = self
                        .store
                        .folders()
                        .iter()
                        .filter(|f| f.parent_id.as_deref() == Some(folder_id.as_str()))
                        .count();
                    println!(
                        "{} notes will be moved to the root and {} subfolders moved up one level.",
                        notes, children
                    );
                    if !confirm("Delete this folder?")? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }
                self.store.delete_folder(&folder_id)?;
            }
        }
        Ok(())
    }

    fn print_folders(&self) {
        let folders = self.store.folders();
        let roots: Vec<&str> = folders
            .iter()
            .filter(|f| {
                f.parent_id
                    .as_deref()
                    .map_or(true, |p| self.store.folder(p).is_none())
            })
            .map(|f| f.id.as_str())
            .collect();

        for root in roots {
            self.print_folder_branch(root, 0);
        }

        let unfiled = self
            .store
            .notes()
            .iter()
            .filter(|n| n.folder_id.is_none())
            .count();
        println!("{} ({})", style("Unfiled").dim(), unfiled);
    }

    fn print_folder_branch(&self, folder_id: &str, depth: usize) {
        let Some(folder) = self.store.folder(folder_id) else {
            return;
        };
        if depth > self.store.folders().len() {
            return;
        }

        let count = self
            .store
            .notes()
            .iter()
            .filter(|n| n.folder_id.as_deref() == Some(folder_id))
            .count();
        println!(
            "{}{} ({})  {}",
            "  ".repeat(depth),
            style(&folder.name).bold(),
            count,
            style(&folder.id).dim()
        );

        for child in self
            .store
            .folders()
            .iter()
            .filter(|f| f.parent_id.as_deref() == Some(folder_id))
        {
            self.print_folder_branch(&child.id, depth + 1);
        }
    }

    // ---- tags ----

    fn handle_tag(&mut self, command: TagCommands) -> Result<()> {
        match command {
            TagCommands::List => {
                for tag in self.store.tags() {
                    let count = self.store.notes().iter().filter(|n| n.has_tag(&tag.id)).count();
                    println!(
                        "{} {} ({})  {}",
                        style(&tag.name).cyan().bold(),
                        tag.color,
                        count,
                        style(&tag.id).dim()
                    );
                }
            }

            TagCommands::Create { name, color } => {
                let tag = self.store.create_tag(NewTag {
                    name: Some(name),
                    color,
                })?;
                println!("Tag created with ID: {} ({})", tag.id, tag.color);
            }

            TagCommands::Update { tag, name, color } => {
                if name.is_none() && color.is_none() {
                    return Err(NotesError::ApplicationError {
                        message: "Nothing to change. Use --name or --color".to_string(),
                    });
                }
                let tag_id = self.resolve_tag(&tag)?;
                self.store.update_tag(&tag_id, TagPatch { name, color })?;
            }

            TagCommands::Delete { tag, force } => {
                let tag_id = self.resolve_tag(&tag)?;
                if !force {
                    let count = self.store.notes().iter().filter(|n| n.has_tag(&tag_id)).count();
                    println!("The tag will be removed from {} notes.", count);
                    if !confirm("Delete this tag?")? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }
                self.store.delete_tag(&tag_id)?;
            }

            TagCommands::Add { note, tag } => {
                let note_id = self.resolve_note_id(Some(&note))?;
                let tag_id = self.resolve_tag(&tag)?;
                self.store.tag_note(&note_id, &tag_id)?;
                println!("Tagged note {}.", note_id);
            }

            TagCommands::Remove { note, tag } => {
                let note_id = self.resolve_note_id(Some(&note))?;
                let tag_id = self.resolve_tag(&tag)?;
                self.store.untag_note(&note_id, &tag_id)?;
                println!("Untagged note {}.", note_id);
            }
        }
        Ok(())
    }

    // ---- import, export, restore ----

    /// Handle importing notes from external sources
    async fn handle_import(
        &mut self,
        paths: Vec<PathBuf>,
        folder: Option<String>,
        tags: Option<String>,
        pattern: Option<String>,
        recursive: bool,
    ) -> Result<ImportSummary> {
        let folder_id = folder.map(|f| self.resolve_folder(&f)).transpose()?;
        let extra_tags = parse_tags(tags);

        let mut files = Vec::new();
        for path in paths {
            if path.is_dir() {
                files.extend(collect_files(&path, pattern.as_deref(), recursive)?);
            } else {
                files.push(path);
            }
        }

        let mut summary = ImportSummary::default();
        if files.is_empty() {
            return Ok(summary);
        }

        info!("Importing {} files", files.len());
        for (path, result) in read_all(files).await {
            match result {
                Ok(imported) => {
                    summary.files_read += 1;
                    let created =
                        apply_imported(&mut self.store, folder_id.as_deref(), imported, &extra_tags)?;
                    if self.verbose {
                        for note in &created {
                            println!("Imported: {} ({})", note.title, path.display());
                        }
                    }
                    summary.notes_imported += created.len();
                }
                Err(e) => {
                    warn!("Failed to import {}: {}", path.display(), e);
                    summary.failures.push((path, e.to_string()));
                }
            }
        }
        Ok(summary)
    }

    fn print_import_summary(&self, summary: &ImportSummary) {
        if summary.files_read == 0 && summary.failures.is_empty() {
            println!("No importable files found.");
            return;
        }

        println!(
            "Imported {} notes from {} files.",
            summary.notes_imported, summary.files_read
        );
        for (path, message) in &summary.failures {
            eprintln!("{} {}: {}", style("Failed:").red(), path.display(), message);
        }
    }

    fn handle_export(&self, command: ExportCommands) -> Result<()> {
        let tags = self.store.tags();
        let path = match command {
            ExportCommands::Markdown { id, output } => {
                let note = self.note_by_id(&self.resolve_note_id(id.as_deref())?)?;
                let dir = output.unwrap_or_else(|| self.config.export_dir.clone());
                ensure_dir(&dir)?;
                let path = dir.join(note_file_name(&note, "md"));
                fs::write(&path, export_markdown(&note, tags))?;
                path
            }

            ExportCommands::Zip { output } => {
                let path = output.unwrap_or_else(|| self.config.export_dir.join(ARCHIVE_FILE_NAME));
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                let file = File::create(&path)?;
                export_zip(file, self.store.notes(), tags)?;
                path
            }

            ExportCommands::Backup { output } => {
                let backup = Backup::new(self.store.notes(), self.store.folders(), tags);
                let path = output.unwrap_or_else(|| self.config.export_dir.join(backup.file_name()));
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                fs::write(&path, backup.to_json()?)?;
                path
            }

            ExportCommands::Page { id, output } => {
                let note = self.note_by_id(&self.resolve_note_id(id.as_deref())?)?;
                let dir = output.unwrap_or_else(|| self.config.export_dir.clone());
                ensure_dir(&dir)?;
                export_page(&HtmlPageRenderer, &note, tags, &dir)?
            }
        };

        println!("Exported to {}", path.display());
        Ok(())
    }

    async fn handle_restore(&mut self, backup_file: PathBuf, force: bool) -> Result<()> {
        if !backup_file.exists() {
            return Err(NotesError::FileNotFound {
                file_path: backup_file.display().to_string(),
            });
        }

        let contents = read_backup(&backup_file).await?;

        if !force {
            println!(
                "The backup contains {} notes, {} folders and {} tags.",
                contents.notes.len(),
                contents.folders.len(),
                contents.tags.len()
            );
            println!(
                "Restoring replaces all {} current notes. This action cannot be undone!",
                self.store.notes().len()
            );
            if !confirm("Restore this backup?")? {
                println!("Restore cancelled.");
                return Ok(());
            }
        }

        self.store
            .restore_from_backup(contents.notes, contents.folders, contents.tags)
    }

    // ---- config ----

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        let show = show || (set.is_none() && !reset);
        let path = self
            .config_path
            .clone()
            .or_else(Config::default_path)
            .ok_or_else(|| NotesError::ConfigError {
                message: "No config location available; pass --config".to_string(),
            })?;

        if reset {
            self.config = Config::default();
            self.config.save(&path)?;
            println!("Configuration reset to defaults.");
        }

        if let Some(setting) = set {
            let (key, value) = setting.split_once('=').ok_or_else(|| NotesError::ConfigError {
                message: format!("Expected key=value, got '{}'", setting),
            })?;
            let value = value.trim();
            match key.trim() {
                "data_dir" => self.config.data_dir = PathBuf::from(value),
                "export_dir" => self.config.export_dir = PathBuf::from(value),
                "editor_command" => {
                    self.config.editor_command = (!value.is_empty()).then(|| value.to_string())
                }
                other => {
                    return Err(NotesError::ConfigError {
                        message: format!("Unknown setting '{}'", other),
                    })
                }
            }
            self.config.save(&path)?;
            println!("Updated {}.", key.trim());
        }

        if show {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
            println!("Config file: {}", path.display());
        }
        Ok(())
    }

    // ---- editor ----

    fn open_editor(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().prefix("marknotes-").suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).truncate(true).open(&temp_path)?;
            writeln!(file, "<!--")?;
            writeln!(file, "Editing: {}", title)?;
            writeln!(file, "Markdown is supported. Comment blocks like this one are removed.")?;
            writeln!(file, "Save and exit the editor when you're done.")?;
            writeln!(file, "-->")?;
            if !existing_content.is_empty() {
                writeln!(file)?;
                write!(file, "{}", existing_content)?;
            }
        }

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor to write note content. Save and exit when done...");
        launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_comment_lines(&content))
    }

    // ---- lookups ----

    /// Exact id, then unique id prefix. `None` means the current note.
    fn resolve_note_id(&self, id: Option<&str>) -> Result<String> {
        let Some(id) = id else {
            return self
                .store
                .current_note_id()
                .map(str::to_string)
                .ok_or_else(|| NotesError::ApplicationError {
                    message: "No note is open. Pass a note ID".to_string(),
                });
        };

        if self.store.note(id).is_some() {
            return Ok(id.to_string());
        }

        let matches: Vec<&Note> = self
            .store
            .notes()
            .iter()
            .filter(|n| n.id.starts_with(id))
            .collect();
        match matches.as_slice() {
            [note] => Ok(note.id.clone()),
            [] => Err(NotesError::NoteNotFound { id: id.to_string() }),
            _ => Err(NotesError::ApplicationError {
                message: format!("Note ID prefix '{}' matches {} notes", id, matches.len()),
            }),
        }
    }

    fn note_by_id(&self, id: &str) -> Result<Note> {
        self.store
            .note(id)
            .cloned()
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })
    }

    /// Folder id, or a unique case-insensitive folder name.
    fn resolve_folder(&self, key: &str) -> Result<String> {
        if let Some(folder) = self.store.folder(key) {
            return Ok(folder.id.clone());
        }

        let name = key.trim().to_lowercase();
        let matches: Vec<_> = self
            .store
            .folders()
            .iter()
            .filter(|f| f.name.to_lowercase() == name)
            .collect();
        match matches.as_slice() {
            [folder] => Ok(folder.id.clone()),
            [] => Err(NotesError::FolderNotFound {
                id: key.to_string(),
            }),
            _ => Err(NotesError::ApplicationError {
                message: format!("Folder name '{}' is ambiguous; use its ID", key),
            }),
        }
    }

    fn resolve_tag(&self, key: &str) -> Result<String> {
        self.store
            .tag(key)
            .or_else(|| self.store.tag_by_name(key))
            .map(|t| t.id.clone())
            .ok_or_else(|| NotesError::TagNotFound {
                id: key.to_string(),
            })
    }

    /// Resolves tag ids or names, creating tags for unknown names.
    fn resolve_tag_names(&mut self, keys: Vec<String>) -> Result<Vec<String>> {
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let id = match self.resolve_tag(&key) {
                Ok(id) => id,
                Err(_) => self.store.create_tag(NewTag::named(key))?.id,
            };
            ids.push(id);
        }
        Ok(ids)
    }

    // ---- session ----

    fn restore_session(&mut self) {
        let stored = match self.store.storage().get(SESSION_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read session: {}", e);
                return;
            }
        };

        let current = stored
            .and_then(|text| serde_json::from_str::<Option<String>>(&text).ok())
            .flatten();
        if let Some(id) = current {
            if self.store.select_note(Some(&id)).is_none() {
                debug!("Previously open note {} no longer exists", id);
            }
        }
    }

    fn save_session(&mut self) -> Result<()> {
        let value = serde_json::to_string(&self.store.current_note_id())?;
        self.store.storage_mut().set(SESSION_KEY, &value)
    }

    fn print_notifications(&self) {
        for event in self.events.drain() {
            println!("{}", style(event.message()).green());
        }
    }
}

/// Sort notes by `created`, `updated`, `title` or `id`; `None` keeps store order.
fn sort_notes(mut notes: Vec<Note>, sort_by: Option<&str>, descending: bool) -> Vec<Note> {
    match sort_by {
        Some("title") => notes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase())),
        Some("id") => notes.sort_by(|a, b| a.id.cmp(&b.id)),
        Some("updated") => notes.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        Some(_) => notes.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        None => {}
    }

    if descending {
        notes.reverse();
    }
    notes
}

fn read_content_from_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(NotesError::FileNotFound {
            file_path: path.display().to_string(),
        });
    }

    if !path.is_file() {
        return Err(NotesError::ApplicationError {
            message: format!("Not a file: {}", path.display()),
        });
    }

    read_to_string(path).map_err(NotesError::Io)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        error!("Failed to create directory {}: {}", dir.display(), e);
        NotesError::DirectoryError {
            path: dir.to_path_buf(),
        }
    })
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| NotesError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(NotesError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program)
        .args(rest)
        .arg(file_path)
        .status()
        .map_err(|e| NotesError::EditorError {
            message: format!("Failed to launch editor '{}': {}", program, e),
        })?;

    if !status.success() {
        return Err(NotesError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TagCommands;
    use tempfile::TempDir;

    fn app(temp: &TempDir) -> App {
        let config = Config {
            data_dir: temp.path().join("data"),
            export_dir: temp.path().join("exports"),
            editor_command: None,
        };
        App::new(config, Some(temp.path().join("config.json")), false).unwrap()
    }

    fn new_note(title: &str, tags: Option<&str>, folder: Option<&str>) -> Commands {
        Commands::New {
            title: Some(title.to_string()),
            content: Some(format!("About {}", title)),
            file: None,
            tags: tags.map(str::to_string),
            folder: folder.map(str::to_string),
            edit: false,
        }
    }

    #[tokio::test]
    async fn test_new_note_resolves_names_and_persists_selection() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);

        app.run(new_note("Plan", Some("work, ideas"), Some("main")))
            .await
            .unwrap();

        let note = app.store().current_note().unwrap().clone();
        assert_eq!(note.title, "Plan");
        assert_eq!(note.folder_id.as_deref(), Some("default"));
        assert_eq!(note.tags[0], "tag2");
        assert!(app.store().tag_by_name("ideas").is_some());

        drop(app);
        let reopened = super::tests::app(&temp);
        assert_eq!(reopened.store().current_note_id(), Some(note.id.as_str()));
    }

    #[tokio::test]
    async fn test_edit_defaults_to_current_note() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);
        app.run(new_note("Draft", None, Some("Main"))).await.unwrap();

        app.run(Commands::Edit {
            id: None,
            title: Some("Final".to_string()),
            content: None,
            file: None,
            tags: None,
            folder: None,
            unfile: true,
            edit: false,
        })
        .await
        .unwrap();

        let note = app.store().current_note().unwrap();
        assert_eq!(note.title, "Final");
        assert_eq!(note.folder_id, None);
    }

    #[tokio::test]
    async fn test_edit_without_changes_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);
        app.run(new_note("Draft", None, None)).await.unwrap();

        let result = app
            .run(Commands::Edit {
                id: None,
                title: None,
                content: None,
                file: None,
                tags: None,
                folder: None,
                unfile: false,
                edit: false,
            })
            .await;
        assert!(matches!(result, Err(NotesError::ApplicationError { .. })));
    }

    #[tokio::test]
    async fn test_note_id_prefix_lookup() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);
        app.run(new_note("Only", None, None)).await.unwrap();
        let id = app.store().notes()[0].id.clone();

        assert_eq!(app.resolve_note_id(Some(&id[..8])).unwrap(), id);
        assert!(matches!(
            app.resolve_note_id(Some("zzzz-not-an-id")),
            Err(NotesError::NoteNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_folder_and_tag_commands() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);

        app.run(Commands::Folder(FolderCommands::Create {
            name: "Projects".to_string(),
            parent: Some("Main".to_string()),
        }))
        .await
        .unwrap();
        app.run(new_note("Roadmap", Some("Work"), Some("Projects")))
            .await
            .unwrap();

        // Moving Main under its own child is refused.
        let result = app
            .run(Commands::Folder(FolderCommands::Move {
                folder: "Main".to_string(),
                parent: Some("Projects".to_string()),
            }))
            .await;
        assert!(matches!(result, Err(NotesError::InvalidMove { .. })));

        app.run(Commands::Folder(FolderCommands::Delete {
            folder: "Projects".to_string(),
            force: true,
        }))
        .await
        .unwrap();
        app.run(Commands::Tag(TagCommands::Delete {
            tag: "work".to_string(),
            force: true,
        }))
        .await
        .unwrap();

        let note = &app.store().notes()[0];
        assert_eq!(note.folder_id, None);
        assert!(note.tags.is_empty());
        assert!(app.events.drain().is_empty());
    }

    #[tokio::test]
    async fn test_import_directory_then_backup_and_restore() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.md"), "---\ntitle: Alpha\ntags: [Personal]\n---\nalpha").unwrap();
        fs::write(source.join("b.md"), "beta").unwrap();
        fs::write(source.join("skip.txt"), "not markdown").unwrap();

        let mut app = app(&temp);
        app.run(Commands::Import {
            paths: vec![source],
            folder: Some("Main".to_string()),
            tags: Some("imported".to_string()),
            pattern: None,
            recursive: false,
        })
        .await
        .unwrap();
        assert_eq!(app.store().notes().len(), 2);
        let imported_tag = app.store().tag_by_name("imported").unwrap().id.clone();
        assert!(app.store().notes().iter().all(|n| n.has_tag(&imported_tag)));

        let backup_path = temp.path().join("backup.json");
        app.run(Commands::Export(ExportCommands::Backup {
            output: Some(backup_path.clone()),
        }))
        .await
        .unwrap();

        app.run(new_note("Later", None, None)).await.unwrap();
        assert_eq!(app.store().notes().len(), 3);

        app.run(Commands::Restore {
            backup_file: backup_path,
            force: true,
        })
        .await
        .unwrap();
        assert_eq!(app.store().notes().len(), 2);
        assert!(app.store().current_note().is_none());
    }

    #[tokio::test]
    async fn test_exports_write_files() {
        let temp = TempDir::new().unwrap();
        let mut app = app(&temp);
        app.run(new_note("Weekly: review", Some("Work"), None))
            .await
            .unwrap();

        app.run(Commands::Export(ExportCommands::Markdown {
            id: None,
            output: None,
        }))
        .await
        .unwrap();
        app.run(Commands::Export(ExportCommands::Page {
            id: None,
            output: None,
        }))
        .await
        .unwrap();
        app.run(Commands::Export(ExportCommands::Zip { output: None }))
            .await
            .unwrap();

        let exports = temp.path().join("exports");
        let markdown = fs::read_to_string(exports.join("Weekly- review.md")).unwrap();
        assert!(markdown.contains("title: Weekly: review"));
        assert!(markdown.contains("tags: [Work]"));
        assert!(exports.join("Weekly- review.html").exists());
        assert!(exports.join(ARCHIVE_FILE_NAME).exists());
    }

    #[test]
    fn test_sort_notes() {
        let temp = TempDir::new().unwrap();
        let mut store = NoteStore::open(FileStore::open(temp.path()).unwrap());
        store
            .create_note(None, NoteOverrides::default().title("beta"))
            .unwrap();
        store
            .create_note(None, NoteOverrides::default().title("Alpha"))
            .unwrap();

        let notes = store.notes().to_vec();
        let by_title = sort_notes(notes.clone(), Some("title"), false);
        assert_eq!(by_title[0].title, "Alpha");

        let reversed = sort_notes(notes, None, true);
        assert_eq!(reversed[0].title, "beta");
    }
}
