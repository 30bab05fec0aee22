//! The note store: the single source of truth for notes, folders, tags and
//! the current selection.
//!
//! Every structural mutation keeps references consistent:
//!
//! - deleting a folder moves its notes to the root and promotes its child
//!   folders to the deleted folder's parent,
//! - deleting a tag removes it from every note,
//! - a note never holds a folder or tag id that is not in the store.
//!
//! Each successful mutation writes the whole affected collection to the
//! injected [`KeyValueStore`]. Unknown ids passed to mutations are ignored.
//!
//! Mutations apply in memory before they persist. A failed write returns the
//! storage error but keeps the in-memory change, and the mutation's event is
//! not emitted. The next successful write of that collection saves it.
use std::collections::HashSet;

use chrono::Utc;
use log::{debug, info, trace, warn};
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::{folder::creates_cycle, note::dedup_tags, tag::random_color};
use crate::{
    filter_notes, seed_folders, seed_tags, Folder, KeyValueStore, NewTag, Note, NoteFilter,
    NoteOverrides, NotePatch, NotesError, Result, StoreEvent, StoreObserver, Tag, TagPatch,
    DEFAULT_NOTE_CONTENT, DEFAULT_NOTE_TITLE, DEFAULT_TAG_NAME, FOLDERS_KEY, NOTES_KEY, TAGS_KEY,
};

/// Where a collection came from when the store was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from storage.
    Stored,
    /// Nothing stored yet; the seed was used.
    Missing,
    /// The stored value could not be read or parsed; the seed was used.
    Corrupted,
}

/// Per-collection outcome of [`NoteStore::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub notes: LoadSource,
    pub folders: LoadSource,
    pub tags: LoadSource,
}

impl LoadReport {
    pub fn any_corrupted(&self) -> bool {
        [self.notes, self.folders, self.tags].contains(&LoadSource::Corrupted)
    }

    pub fn is_first_run(&self) -> bool {
        [self.notes, self.folders, self.tags]
            .iter()
            .all(|s| *s == LoadSource::Missing)
    }
}

/// Owns the note collections, the selection state and the storage they persist to.
pub struct NoteStore<S: KeyValueStore> {
    storage: S,
    notes: Vec<Note>,
    folders: Vec<Folder>,
    tags: Vec<Tag>,
    current_note_id: Option<String>,
    filter: NoteFilter,
    rng: StdRng,
    observers: Vec<Box<dyn StoreObserver>>,
    load_report: LoadReport,
}

impl<S: KeyValueStore> NoteStore<S> {
    /// Loads the three collections from `storage`, seeding whatever is
    /// missing or unreadable. Opening never fails.
    pub fn open(storage: S) -> Self {
        let (notes, notes_source) = load_collection(&storage, NOTES_KEY, Vec::new);
        let (folders, folders_source) = load_collection(&storage, FOLDERS_KEY, seed_folders);
        let (tags, tags_source) = load_collection(&storage, TAGS_KEY, seed_tags);

        let mut store = Self {
            storage,
            notes,
            folders,
            tags,
            current_note_id: None,
            filter: NoteFilter::default(),
            rng: StdRng::from_entropy(),
            observers: Vec::new(),
            load_report: LoadReport {
                notes: notes_source,
                folders: folders_source,
                tags: tags_source,
            },
        };

        let repaired = store.repair_references();
        if repaired > 0 {
            warn!("Repaired ids or references on {} loaded notes", repaired);
        }

        info!(
            "Note store opened: {} notes, {} folders, {} tags",
            store.notes.len(),
            store.folders.len(),
            store.tags.len()
        );
        store
    }

    /// Replaces the randomness source used for default tag colors.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Registers an observer for store events.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    pub fn load_report(&self) -> LoadReport {
        self.load_report
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Direct access for keys the store does not own.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    // ---- reads ----

    /// Notes, most recently created first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn note(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// Finds a tag by case-insensitive name.
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        let name = name.trim().to_lowercase();
        self.tags.iter().find(|t| t.name.to_lowercase() == name)
    }

    /// The note open in the editor. Always reflects the latest update.
    pub fn current_note(&self) -> Option<&Note> {
        self.current_note_id.as_deref().and_then(|id| self.note(id))
    }

    pub fn current_note_id(&self) -> Option<&str> {
        self.current_note_id.as_deref()
    }

    /// Display names of the note's tags, in the note's order.
    pub fn tag_names(&self, note: &Note) -> Vec<String> {
        note.tags
            .iter()
            .filter_map(|id| self.tag(id).map(|t| t.name.clone()))
            .collect()
    }

    // ---- selection and filters ----

    /// Opens a note in the editor, or closes it with `None`. Unknown ids close it.
    pub fn select_note(&mut self, id: Option<&str>) -> Option<&Note> {
        self.current_note_id = id.filter(|id| self.note(id).is_some()).map(str::to_string);
        self.current_note()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.filter.search_query = query.into();
    }

    /// Sets the folder filter. Folder and tag filters are exclusive, so this
    /// clears the tag filter.
    pub fn select_folder(&mut self, folder_id: Option<&str>) {
        self.filter.folder_id = folder_id.map(str::to_string);
        if self.filter.folder_id.is_some() {
            self.filter.tag_id = None;
        }
    }

    /// Sets the tag filter, clearing the folder filter.
    pub fn select_tag(&mut self, tag_id: Option<&str>) {
        self.filter.tag_id = tag_id.map(str::to_string);
        if self.filter.tag_id.is_some() {
            self.filter.folder_id = None;
        }
    }

    pub fn clear_filters(&mut self) {
        self.filter = NoteFilter::default();
    }

    pub fn filter(&self) -> &NoteFilter {
        &self.filter
    }

    /// Notes matching the active search and filters, in collection order.
    pub fn filtered_notes(&self) -> Vec<&Note> {
        filter_notes(&self.notes, &self.filter)
    }

    // ---- notes ----

    /// Creates a note from defaults overlaid with `overrides`, puts it first
    /// and makes it the current note.
    ///
    /// If the storage write fails the note stays in memory and current, the
    /// error is returned and no `NoteCreated` event is emitted.
    pub fn create_note(
        &mut self,
        folder_id: Option<&str>,
        overrides: NoteOverrides,
    ) -> Result<Note> {
        let now = Utc::now();

        let id = match overrides.id {
            Some(id) if !id.is_empty() && self.note(&id).is_none() => id,
            Some(id) => {
                warn!("Note id '{}' is empty or taken, assigning a fresh id", id);
                new_id()
            }
            None => new_id(),
        };

        let title = overrides
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string());
        let content = overrides
            .content
            .unwrap_or_else(|| DEFAULT_NOTE_CONTENT.to_string());
        let created_at = overrides.created_at.unwrap_or(now);
        let updated_at = overrides.updated_at.unwrap_or(now).max(created_at);

        let note = Note {
            id,
            title,
            content,
            folder_id: self.known_folder(folder_id.map(str::to_string)),
            tags: self.known_tags(overrides.tags.unwrap_or_default()),
            created_at,
            updated_at,
        };

        debug!("Creating note {} in folder {:?}", note.id, note.folder_id);
        self.notes.insert(0, note.clone());
        self.current_note_id = Some(note.id.clone());
        self.persist_notes()?;

        info!("Note created: {}", note.id);
        self.emit(StoreEvent::NoteCreated {
            id: note.id.clone(),
            title: note.title.clone(),
        });
        Ok(note)
    }

    /// Merges `patch` into the note and stamps `updated_at`. Unknown ids are ignored.
    pub fn update_note(&mut self, id: &str, patch: NotePatch) -> Result<()> {
        let Some(index) = self.notes.iter().position(|n| n.id == id) else {
            debug!("update_note: no note with id {}", id);
            return Ok(());
        };

        let patch = NotePatch {
            folder_id: patch.folder_id.map(|f| self.known_folder(f)),
            tags: patch.tags.map(|t| self.known_tags(t)),
            ..patch
        };

        self.notes[index].apply(patch, Utc::now());
        trace!("Note {} updated at {}", id, self.notes[index].updated_at);
        self.persist_notes()
    }

    /// Removes a note; closes it if it was the current note.
    pub fn delete_note(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.notes.iter().position(|n| n.id == id) else {
            debug!("delete_note: no note with id {}", id);
            return Ok(());
        };

        self.notes.remove(index);
        if self.current_note_id.as_deref() == Some(id) {
            self.current_note_id = None;
        }
        self.persist_notes()?;

        info!("Note deleted: {}", id);
        self.emit(StoreEvent::NoteDeleted { id: id.to_string() });
        Ok(())
    }

    /// Attaches a tag to a note. Unknown notes or tags are ignored.
    pub fn tag_note(&mut self, note_id: &str, tag_id: &str) -> Result<()> {
        let Some(note) = self.note(note_id) else {
            return Ok(());
        };
        if self.tag(tag_id).is_none() || note.has_tag(tag_id) {
            return Ok(());
        }
        let mut tags = note.tags.clone();
        tags.push(tag_id.to_string());
        self.update_note(note_id, NotePatch::default().tags(tags))
    }

    /// Detaches a tag from a note.
    pub fn untag_note(&mut self, note_id: &str, tag_id: &str) -> Result<()> {
        let Some(note) = self.note(note_id) else {
            return Ok(());
        };
        if !note.has_tag(tag_id) {
            return Ok(());
        }
        let tags = note.tags.iter().filter(|t| *t != tag_id).cloned().collect();
        self.update_note(note_id, NotePatch::default().tags(tags))
    }

    // ---- folders ----

    /// Creates a folder. An unknown parent places it at the top level.
    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> Result<Folder> {
        let folder = Folder {
            id: new_id(),
            name: name.to_string(),
            parent_id: self.known_folder(parent_id.map(str::to_string)),
        };

        self.folders.push(folder.clone());
        self.persist_folders()?;

        info!("Folder created: {} ({})", folder.name, folder.id);
        self.emit(StoreEvent::FolderCreated {
            id: folder.id.clone(),
            name: folder.name.clone(),
        });
        Ok(folder)
    }

    /// Renames a folder. Notes are not touched.
    pub fn update_folder(&mut self, id: &str, name: &str) -> Result<()> {
        let Some(folder) = self.folders.iter_mut().find(|f| f.id == id) else {
            debug!("update_folder: no folder with id {}", id);
            return Ok(());
        };

        folder.name = name.to_string();
        self.persist_folders()?;

        self.emit(StoreEvent::FolderRenamed {
            id: id.to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    /// Moves a folder under `parent_id`, or to the top level with `None`.
    pub fn move_folder(&mut self, id: &str, parent_id: Option<&str>) -> Result<()> {
        if self.folder(id).is_none() {
            debug!("move_folder: no folder with id {}", id);
            return Ok(());
        }

        if let Some(parent) = parent_id {
            if self.folder(parent).is_none() {
                return Err(NotesError::FolderNotFound {
                    id: parent.to_string(),
                });
            }
            if creates_cycle(&self.folders, id, parent) {
                return Err(NotesError::InvalidMove {
                    message: "A folder cannot be moved into itself or its own subfolder"
                        .to_string(),
                });
            }
        }

        if let Some(folder) = self.folders.iter_mut().find(|f| f.id == id) {
            folder.parent_id = parent_id.map(str::to_string);
        }
        self.persist_folders()
    }

    /// Deletes a folder, unfiling its notes and promoting its subfolders.
    pub fn delete_folder(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.folders.iter().position(|f| f.id == id) else {
            debug!("delete_folder: no folder with id {}", id);
            return Ok(());
        };

        let removed = self.folders.remove(index);
        for child in self.folders.iter_mut() {
            if child.parent_id.as_deref() == Some(id) {
                child.parent_id = removed.parent_id.clone();
            }
        }

        let now = Utc::now();
        let mut unfiled = 0;
        for note in self.notes.iter_mut() {
            if note.folder_id.as_deref() == Some(id) {
                note.folder_id = None;
                note.touch(now);
                unfiled += 1;
            }
        }

        if self.filter.folder_id.as_deref() == Some(id) {
            self.filter.folder_id = None;
        }

        if unfiled > 0 {
            self.persist_notes()?;
        }
        self.persist_folders()?;

        info!("Folder deleted: {} ({} notes moved to root)", id, unfiled);
        self.emit(StoreEvent::FolderDeleted { id: id.to_string() });
        Ok(())
    }

    // ---- tags ----

    /// Creates a tag. Without a color, one is drawn from the palette.
    pub fn create_tag(&mut self, data: NewTag) -> Result<Tag> {
        let color = match data.color.filter(|c| !c.trim().is_empty()) {
            Some(color) => color,
            None => random_color(&mut self.rng),
        };

        let tag = Tag {
            id: new_id(),
            name: data
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TAG_NAME.to_string()),
            color,
        };

        self.tags.push(tag.clone());
        self.persist_tags()?;

        info!("Tag created: {} ({})", tag.name, tag.id);
        self.emit(StoreEvent::TagCreated {
            id: tag.id.clone(),
            name: tag.name.clone(),
        });
        Ok(tag)
    }

    /// Merges name and color into a tag. Notes keep referring to it by id.
    pub fn update_tag(&mut self, id: &str, patch: TagPatch) -> Result<()> {
        let Some(tag) = self.tags.iter_mut().find(|t| t.id == id) else {
            debug!("update_tag: no tag with id {}", id);
            return Ok(());
        };

        tag.apply(patch);
        self.persist_tags()?;

        self.emit(StoreEvent::TagUpdated { id: id.to_string() });
        Ok(())
    }

    /// Deletes a tag and strips it from every note.
    pub fn delete_tag(&mut self, id: &str) -> Result<()> {
        let Some(index) = self.tags.iter().position(|t| t.id == id) else {
            debug!("delete_tag: no tag with id {}", id);
            return Ok(());
        };

        self.tags.remove(index);

        let now = Utc::now();
        let mut stripped = 0;
        for note in self.notes.iter_mut() {
            if note.has_tag(id) {
                note.tags.retain(|t| t != id);
                note.touch(now);
                stripped += 1;
            }
        }

        if self.filter.tag_id.as_deref() == Some(id) {
            self.filter.tag_id = None;
        }

        if stripped > 0 {
            self.persist_notes()?;
        }
        self.persist_tags()?;

        info!("Tag deleted: {} (removed from {} notes)", id, stripped);
        self.emit(StoreEvent::TagDeleted { id: id.to_string() });
        Ok(())
    }

    // ---- backup ----

    /// Replaces all three collections wholesale and resets the selection.
    ///
    /// Callers confirm with the user first; prior state is discarded.
    pub fn restore_from_backup(
        &mut self,
        notes: Vec<Note>,
        folders: Vec<Folder>,
        tags: Vec<Tag>,
    ) -> Result<()> {
        info!(
            "Restoring backup: {} notes, {} folders, {} tags",
            notes.len(),
            folders.len(),
            tags.len()
        );

        self.notes = notes;
        self.folders = folders;
        self.tags = tags;
        self.current_note_id = None;
        self.filter = NoteFilter::default();

        let repaired = self.repair_references();
        if repaired > 0 {
            warn!("Backup contained {} notes with duplicate ids or dangling references", repaired);
        }

        self.persist_notes()?;
        self.persist_folders()?;
        self.persist_tags()?;

        self.emit(StoreEvent::BackupRestored {
            notes: self.notes.len(),
            folders: self.folders.len(),
            tags: self.tags.len(),
        });
        Ok(())
    }

    // ---- internals ----

    fn known_folder(&self, folder_id: Option<String>) -> Option<String> {
        match folder_id {
            Some(id) if self.folder(&id).is_some() => Some(id),
            Some(id) => {
                warn!("Folder '{}' does not exist, using root", id);
                None
            }
            None => None,
        }
    }

    fn known_tags(&self, tags: Vec<String>) -> Vec<String> {
        dedup_tags(tags)
            .into_iter()
            .filter(|id| {
                let known = self.tag(id).is_some();
                if !known {
                    warn!("Tag '{}' does not exist, dropping it", id);
                }
                known
            })
            .collect()
    }

    /// Makes ids unique, nulls dangling folder references and drops dangling
    /// tag ids. Returns the number of notes changed.
    ///
    /// A repeated note id is replaced with a fresh one so no note is lost.
    /// Repeated folder and tag ids keep the first entry.
    fn repair_references(&mut self) -> usize {
        let mut repaired = 0;

        let mut note_ids = HashSet::new();
        for note in self.notes.iter_mut() {
            if !note_ids.insert(note.id.clone()) {
                let fresh = new_id();
                warn!("Duplicate note id '{}', reassigned to {}", note.id, fresh);
                note.id = fresh.clone();
                note_ids.insert(fresh);
                repaired += 1;
            }
        }

        let mut seen = HashSet::new();
        self.folders.retain(|f| {
            let first = seen.insert(f.id.clone());
            if !first {
                warn!("Dropping folder '{}' with duplicate id {}", f.name, f.id);
            }
            first
        });

        seen.clear();
        self.tags.retain(|t| {
            let first = seen.insert(t.id.clone());
            if !first {
                warn!("Dropping tag '{}' with duplicate id {}", t.name, t.id);
            }
            first
        });

        let folder_ids: Vec<String> = self.folders.iter().map(|f| f.id.clone()).collect();
        let tag_ids: Vec<String> = self.tags.iter().map(|t| t.id.clone()).collect();

        for folder in self.folders.iter_mut() {
            if folder
                .parent_id
                .as_ref()
                .is_some_and(|p| !folder_ids.contains(p))
            {
                folder.parent_id = None;
            }
        }

        for note in self.notes.iter_mut() {
            let mut changed = false;
            if note
                .folder_id
                .as_ref()
                .is_some_and(|f| !folder_ids.contains(f))
            {
                note.folder_id = None;
                changed = true;
            }
            let before = note.tags.len();
            note.tags.retain(|t| tag_ids.contains(t));
            changed |= note.tags.len() != before;
            if note.updated_at < note.created_at {
                note.updated_at = note.created_at;
                changed = true;
            }
            if changed {
                repaired += 1;
            }
        }
        repaired
    }

    fn persist_notes(&mut self) -> Result<()> {
        persist(&mut self.storage, NOTES_KEY, &self.notes)
    }

    fn persist_folders(&mut self) -> Result<()> {
        persist(&mut self.storage, FOLDERS_KEY, &self.folders)
    }

    fn persist_tags(&mut self) -> Result<()> {
        persist(&mut self.storage, TAGS_KEY, &self.tags)
    }

    fn emit(&self, event: StoreEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn persist<S: KeyValueStore, T: Serialize>(storage: &mut S, key: &str, items: &[T]) -> Result<()> {
    let json = serde_json::to_string(items)?;
    storage.set(key, &json)?;
    trace!("Persisted {} items under '{}'", items.len(), key);
    Ok(())
}

fn load_collection<S, T, F>(storage: &S, key: &str, seed: F) -> (Vec<T>, LoadSource)
where
    S: KeyValueStore,
    T: DeserializeOwned,
    F: FnOnce() -> Vec<T>,
{
    match storage.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                debug!("Loaded {} items from '{}'", items.len(), key);
                (items, LoadSource::Stored)
            }
            Err(e) => {
                warn!("Stored '{}' could not be parsed, using defaults: {}", key, e);
                (seed(), LoadSource::Corrupted)
            }
        },
        Ok(None) => {
            debug!("Nothing stored under '{}', using defaults", key);
            (seed(), LoadSource::Missing)
        }
        Err(e) => {
            warn!("Failed to read '{}', using defaults: {}", key, e);
            (seed(), LoadSource::Corrupted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventLog, FileStore, MemoryStore, TAG_PALETTE};
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn store() -> NoteStore<MemoryStore> {
        NoteStore::open(MemoryStore::new()).with_rng(StdRng::seed_from_u64(1))
    }

    /// Simulates a process restart by reopening the same storage.
    fn restart(store: NoteStore<MemoryStore>) -> NoteStore<MemoryStore> {
        NoteStore::open(store.into_storage())
    }

    /// A storage whose writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<()> {
            Err(NotesError::Storage {
                key: key.to_string(),
                message: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_first_run_uses_seeds() {
        let store = store();
        assert!(store.notes().is_empty());
        assert_eq!(store.folders().len(), 1);
        assert_eq!(store.folders()[0].name, "Main");
        assert_eq!(store.tags().len(), 3);
        assert!(store.load_report().is_first_run());
        assert!(!store.load_report().any_corrupted());
    }

    #[test]
    fn test_corrupted_storage_falls_back_to_seed() {
        let mut storage = MemoryStore::new();
        storage.set(NOTES_KEY, "{not json").unwrap();
        storage.set(TAGS_KEY, "[]").unwrap();

        let store = NoteStore::open(storage);
        assert!(store.notes().is_empty());
        assert!(store.tags().is_empty());
        assert_eq!(store.folders()[0].id, "default");

        let report = store.load_report();
        assert_eq!(report.notes, LoadSource::Corrupted);
        assert_eq!(report.tags, LoadSource::Stored);
        assert_eq!(report.folders, LoadSource::Missing);
        assert!(report.any_corrupted());
    }

    #[test]
    fn test_create_note_defaults_and_ordering() {
        let mut store = store();
        let first = store.create_note(None, NoteOverrides::default()).unwrap();
        let second = store
            .create_note(Some("default"), NoteOverrides::default().title("Second"))
            .unwrap();

        assert_eq!(first.title, DEFAULT_NOTE_TITLE);
        assert_eq!(first.content, DEFAULT_NOTE_CONTENT);
        assert!(first.tags.is_empty());
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(second.folder_id.as_deref(), Some("default"));

        let ids: Vec<&str> = store.notes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
        assert_eq!(store.current_note().map(|n| n.id.as_str()), Some(second.id.as_str()));
    }

    #[test]
    fn test_create_note_keeps_override_id_and_timestamps() {
        let mut store = store();
        let created = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let updated = created + Duration::days(1);

        let note = store
            .create_note(
                None,
                NoteOverrides::default()
                    .id("imported-1")
                    .timestamps(created, updated),
            )
            .unwrap();
        assert_eq!(note.id, "imported-1");
        assert_eq!(note.created_at, created);
        assert_eq!(note.updated_at, updated);

        // A taken id is replaced rather than duplicated.
        let again = store
            .create_note(None, NoteOverrides::default().id("imported-1"))
            .unwrap();
        assert_ne!(again.id, "imported-1");
    }

    #[test]
    fn test_create_note_with_unknown_folder_is_unfiled() {
        let mut store = store();
        let note = store
            .create_note(Some("ghost"), NoteOverrides::default().tags(vec!["tag1".into(), "nope".into()]))
            .unwrap();
        assert!(note.folder_id.is_none());
        assert_eq!(note.tags, vec!["tag1".to_string()]);
    }

    #[test]
    fn test_update_note_refreshes_current_note() {
        let mut store = store();
        let note = store.create_note(None, NoteOverrides::default()).unwrap();

        store
            .update_note(&note.id, NotePatch::default().title("Renamed").content("new"))
            .unwrap();

        let current = store.current_note().unwrap();
        assert_eq!(current.title, "Renamed");
        assert_eq!(current.content, "new");
        assert_eq!(current.created_at, note.created_at);
    }

    #[test]
    fn test_update_note_timestamps_are_monotonic() {
        let mut store = store();
        let note = store.create_note(None, NoteOverrides::default()).unwrap();
        let mut previous = note.updated_at;

        for i in 0..5 {
            store
                .update_note(&note.id, NotePatch::default().content(format!("v{}", i)))
                .unwrap();
            let current = store.note(&note.id).unwrap();
            assert!(current.updated_at >= previous);
            assert!(current.updated_at >= current.created_at);
            previous = current.updated_at;
        }
    }

    #[test]
    fn test_update_note_future_created_at_keeps_invariant() {
        let mut store = store();
        let future = Utc::now() + Duration::days(30);
        let note = store
            .create_note(None, NoteOverrides::default().timestamps(future, future))
            .unwrap();
        store
            .update_note(&note.id, NotePatch::default().title("x"))
            .unwrap();
        assert!(store.note(&note.id).unwrap().updated_at >= future);
    }

    #[test]
    fn test_update_unknown_note_is_noop() {
        let mut store = store();
        store.create_note(None, NoteOverrides::default()).unwrap();
        let before = store.notes().to_vec();
        store
            .update_note("missing", NotePatch::default().title("x"))
            .unwrap();
        assert_eq!(store.notes(), before.as_slice());
    }

    #[test]
    fn test_delete_current_note_clears_selection() {
        let mut store = store();
        let keep = store.create_note(None, NoteOverrides::default()).unwrap();
        let doomed = store.create_note(None, NoteOverrides::default()).unwrap();

        store.delete_note(&doomed.id).unwrap();
        assert!(store.current_note().is_none());
        assert_eq!(store.notes().len(), 1);

        store.select_note(Some(&keep.id));
        store.delete_note("missing").unwrap();
        assert_eq!(store.current_note_id(), Some(keep.id.as_str()));
    }

    #[test]
    fn test_select_unknown_note_clears_selection() {
        let mut store = store();
        store.create_note(None, NoteOverrides::default()).unwrap();
        assert!(store.select_note(Some("nope")).is_none());
        assert!(store.current_note_id().is_none());
    }

    #[test]
    fn test_delete_folder_unfiles_notes() {
        let mut store = store();
        let work = store.create_folder("Work", None).unwrap();
        let a = store.create_note(Some(&work.id), NoteOverrides::default()).unwrap();
        let b = store.create_note(Some("default"), NoteOverrides::default()).unwrap();
        store.select_folder(Some(&work.id));

        store.delete_folder(&work.id).unwrap();

        assert!(store.folder(&work.id).is_none());
        assert!(store.note(&a.id).unwrap().folder_id.is_none());
        assert_eq!(store.note(&b.id).unwrap().folder_id.as_deref(), Some("default"));
        assert!(store.filter().folder_id.is_none());

        // No note references a missing folder.
        for note in store.notes() {
            if let Some(folder_id) = &note.folder_id {
                assert!(store.folder(folder_id).is_some());
            }
        }
    }

    #[test]
    fn test_delete_folder_promotes_children() {
        let mut store = store();
        let parent = store.create_folder("Parent", Some("default")).unwrap();
        let child = store.create_folder("Child", Some(&parent.id)).unwrap();

        store.delete_folder(&parent.id).unwrap();
        assert_eq!(
            store.folder(&child.id).unwrap().parent_id.as_deref(),
            Some("default")
        );
    }

    #[test]
    fn test_rename_folder_does_not_touch_notes() {
        let mut store = store();
        let note = store.create_note(Some("default"), NoteOverrides::default()).unwrap();
        store.update_folder("default", "Inbox").unwrap();
        assert_eq!(store.folder("default").unwrap().name, "Inbox");
        assert_eq!(store.note(&note.id).unwrap(), &note);
    }

    #[test]
    fn test_move_folder_rejects_cycles() {
        let mut store = store();
        let a = store.create_folder("A", None).unwrap();
        let b = store.create_folder("B", Some(&a.id)).unwrap();

        let err = store.move_folder(&a.id, Some(&b.id)).unwrap_err();
        assert!(matches!(err, NotesError::InvalidMove { .. }));
        assert!(store.folder(&a.id).unwrap().parent_id.is_none());

        let err = store.move_folder(&a.id, Some("ghost")).unwrap_err();
        assert!(matches!(err, NotesError::FolderNotFound { .. }));

        store.move_folder(&b.id, None).unwrap();
        assert!(store.folder(&b.id).unwrap().parent_id.is_none());
    }

    #[test]
    fn test_create_tag_random_color_is_from_palette() {
        let mut store = store();
        let tag = store.create_tag(NewTag::named("X")).unwrap();
        assert_eq!(tag.name, "X");
        assert!(TAG_PALETTE.contains(&tag.color.as_str()));

        let explicit = store.create_tag(NewTag::named("Y").color("#000000")).unwrap();
        assert_eq!(explicit.color, "#000000");

        let unnamed = store.create_tag(NewTag::default()).unwrap();
        assert_eq!(unnamed.name, DEFAULT_TAG_NAME);
    }

    #[test]
    fn test_update_tag_keeps_note_references() {
        let mut store = store();
        let note = store
            .create_note(None, NoteOverrides::default().tags(vec!["tag2".into()]))
            .unwrap();
        store
            .update_tag(
                "tag2",
                TagPatch {
                    name: Some("Job".to_string()),
                    color: None,
                },
            )
            .unwrap();
        let note = store.note(&note.id).unwrap();
        assert_eq!(note.tags, vec!["tag2".to_string()]);
        assert_eq!(store.tag_names(note), vec!["Job".to_string()]);
    }

    #[test]
    fn test_delete_tag_strips_notes() {
        let mut store = store();
        let a = store
            .create_note(None, NoteOverrides::default().tags(vec!["tag1".into(), "tag2".into()]))
            .unwrap();
        let b = store
            .create_note(None, NoteOverrides::default().tags(vec!["tag2".into()]))
            .unwrap();
        store.select_tag(Some("tag2"));

        store.delete_tag("tag2").unwrap();

        assert_eq!(store.note(&a.id).unwrap().tags, vec!["tag1".to_string()]);
        assert!(store.note(&b.id).unwrap().tags.is_empty());
        assert!(store.filter().tag_id.is_none());
        for note in store.notes() {
            for tag_id in &note.tags {
                assert!(store.tag(tag_id).is_some());
            }
        }
    }

    #[test]
    fn test_tag_and_untag_note() {
        let mut store = store();
        let note = store.create_note(None, NoteOverrides::default()).unwrap();

        store.tag_note(&note.id, "tag1").unwrap();
        store.tag_note(&note.id, "tag1").unwrap();
        store.tag_note(&note.id, "ghost").unwrap();
        assert_eq!(store.note(&note.id).unwrap().tags, vec!["tag1".to_string()]);

        store.untag_note(&note.id, "tag1").unwrap();
        assert!(store.note(&note.id).unwrap().tags.is_empty());
    }

    #[test]
    fn test_folder_and_tag_filters_are_exclusive() {
        let mut store = store();
        store.select_tag(Some("tag1"));
        store.select_folder(Some("default"));
        assert_eq!(store.filter().folder_id.as_deref(), Some("default"));
        assert!(store.filter().tag_id.is_none());

        store.select_tag(Some("tag1"));
        assert!(store.filter().folder_id.is_none());
        assert_eq!(store.filter().tag_id.as_deref(), Some("tag1"));
    }

    #[test]
    fn test_filtered_notes_follow_state() {
        let mut store = store();
        let work = store.create_folder("Work", None).unwrap();
        let a = store
            .create_note(Some(&work.id), NoteOverrides::default().title("Budget").content("q3 numbers"))
            .unwrap();
        store
            .create_note(None, NoteOverrides::default().title("Diary").content("budget cuts"))
            .unwrap();

        store.set_search_query("BUDGET");
        assert_eq!(store.filtered_notes().len(), 2);

        store.select_folder(Some(&work.id));
        let filtered = store.filtered_notes();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, a.id);

        store.update_note(&a.id, NotePatch::default().folder(None)).unwrap();
        assert!(store.filtered_notes().is_empty());

        store.clear_filters();
        assert_eq!(store.filtered_notes().len(), 2);
    }

    #[test]
    fn test_persistence_round_trip() {
        let mut store = store();
        let folder = store.create_folder("Projects", None).unwrap();
        let tag = store.create_tag(NewTag::named("Draft")).unwrap();
        store
            .create_note(
                Some(&folder.id),
                NoteOverrides::default().title("Plan").tags(vec![tag.id.clone()]),
            )
            .unwrap();
        store.create_note(None, NoteOverrides::default()).unwrap();

        let notes = store.notes().to_vec();
        let folders = store.folders().to_vec();
        let tags = store.tags().to_vec();

        let reopened = restart(store);
        assert_eq!(reopened.notes(), notes.as_slice());
        assert_eq!(reopened.folders(), folders.as_slice());
        assert_eq!(reopened.tags(), tags.as_slice());
        assert_eq!(reopened.load_report().notes, LoadSource::Stored);
        // Selection is not persisted.
        assert!(reopened.current_note().is_none());
    }

    #[test]
    fn test_persistence_round_trip_on_disk() {
        let temp = TempDir::new().unwrap();
        let note = {
            let mut store = NoteStore::open(FileStore::open(temp.path()).unwrap());
            store
                .create_note(None, NoteOverrides::default().title("On disk"))
                .unwrap()
        };

        let reopened = NoteStore::open(FileStore::open(temp.path()).unwrap());
        assert_eq!(reopened.notes(), &[note]);
    }

    #[test]
    fn test_restore_replaces_rather_than_merges() {
        let mut store = store();
        for _ in 0..5 {
            store.create_note(None, NoteOverrides::default()).unwrap();
        }
        assert!(store.current_note().is_some());
        store.set_search_query("x");
        store.select_tag(Some("tag1"));

        let mut donor = NoteStore::open(MemoryStore::new());
        donor.create_note(None, NoteOverrides::default().title("one")).unwrap();
        donor.create_note(None, NoteOverrides::default().title("two")).unwrap();

        store
            .restore_from_backup(
                donor.notes().to_vec(),
                donor.folders().to_vec(),
                donor.tags().to_vec(),
            )
            .unwrap();

        assert_eq!(store.notes().len(), 2);
        assert!(store.current_note().is_none());
        assert!(store.filter().is_empty());

        let reopened = restart(store);
        assert_eq!(reopened.notes().len(), 2);
    }

    #[test]
    fn test_restore_repairs_dangling_references() {
        let mut store = store();
        let now = Utc::now();
        let note = Note {
            id: "n".to_string(),
            title: "t".to_string(),
            content: String::new(),
            folder_id: Some("gone".to_string()),
            tags: vec!["tag1".to_string(), "gone".to_string()],
            created_at: now,
            updated_at: now,
        };
        store
            .restore_from_backup(vec![note], seed_folders(), seed_tags())
            .unwrap();
        let restored = store.note("n").unwrap();
        assert!(restored.folder_id.is_none());
        assert_eq!(restored.tags, vec!["tag1".to_string()]);
    }

    #[test]
    fn test_restore_makes_ids_unique() {
        let mut store = store();
        let now = Utc::now();
        let note = |title: &str| Note {
            id: "dup".to_string(),
            title: title.to_string(),
            content: String::new(),
            folder_id: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let mut folders = seed_folders();
        folders.push(Folder {
            id: "default".to_string(),
            name: "Shadow".to_string(),
            parent_id: None,
        });
        let mut tags = seed_tags();
        tags.push(seed_tags().remove(0));

        store
            .restore_from_backup(vec![note("first"), note("second")], folders, tags)
            .unwrap();

        assert_eq!(store.notes().len(), 2);
        assert_eq!(store.note("dup").unwrap().title, "first");
        assert_ne!(store.notes()[1].id, "dup");
        assert_eq!(store.folders().len(), 1);
        assert_eq!(store.folders()[0].name, "Main");
        assert_eq!(store.tags().len(), 3);

        store.delete_note("dup").unwrap();
        assert_eq!(store.notes().len(), 1);
        assert!(store.note("dup").is_none());
        assert_eq!(store.notes()[0].title, "second");
    }

    #[test]
    fn test_open_makes_stored_ids_unique() {
        let mut storage = MemoryStore::new();
        let note = Note {
            id: "same".to_string(),
            title: "a".to_string(),
            content: String::new(),
            folder_id: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let notes = vec![note.clone(), note];
        storage
            .set(NOTES_KEY, &serde_json::to_string(&notes).unwrap())
            .unwrap();

        let store = NoteStore::open(storage);
        assert_eq!(store.notes().len(), 2);
        assert_ne!(store.notes()[0].id, store.notes()[1].id);
    }

    #[test]
    fn test_events_are_emitted() {
        let mut store = store();
        let log = EventLog::new();
        store.subscribe(Box::new(log.clone()));

        let note = store.create_note(None, NoteOverrides::default()).unwrap();
        store.delete_note(&note.id).unwrap();
        store.create_folder("Work", None).unwrap();
        // No-ops stay quiet.
        store.delete_note("missing").unwrap();

        let messages: Vec<String> = log.drain().iter().map(|e| e.message()).collect();
        assert_eq!(
            messages,
            vec!["New note created", "Note deleted", "Folder \"Work\" created"]
        );
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut store = NoteStore::open(ReadOnlyStore);
        let log = EventLog::new();
        store.subscribe(Box::new(log.clone()));

        let err = store.create_note(None, NoteOverrides::default()).unwrap_err();
        assert!(matches!(err, NotesError::Storage { .. }));

        // The change stays in memory, unannounced.
        assert_eq!(store.notes().len(), 1);
        assert!(store.current_note().is_some());
        assert!(log.drain().is_empty());
    }
}
