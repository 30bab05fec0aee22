//! Notifications emitted by the note store after successful mutations.
use std::{cell::RefCell, rc::Rc};

use log::info;

/// Something the user may want to be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NoteCreated { id: String, title: String },
    NoteDeleted { id: String },
    FolderCreated { id: String, name: String },
    FolderRenamed { id: String, name: String },
    FolderDeleted { id: String },
    TagCreated { id: String, name: String },
    TagUpdated { id: String },
    TagDeleted { id: String },
    BackupRestored { notes: usize, folders: usize, tags: usize },
}

impl StoreEvent {
    /// The short message shown to the user for this event.
    pub fn message(&self) -> String {
        match self {
            Self::NoteCreated { .. } => "New note created".to_string(),
            Self::NoteDeleted { .. } => "Note deleted".to_string(),
            Self::FolderCreated { name, .. } => format!("Folder \"{}\" created", name),
            Self::FolderRenamed { name, .. } => format!("Folder renamed to \"{}\"", name),
            Self::FolderDeleted { .. } => "Folder deleted".to_string(),
            Self::TagCreated { name, .. } => format!("Tag \"{}\" created", name),
            Self::TagUpdated { .. } => "Tag updated".to_string(),
            Self::TagDeleted { .. } => "Tag deleted".to_string(),
            Self::BackupRestored { notes, .. } => {
                format!("Backup restored ({} notes)", notes)
            }
        }
    }
}

/// Receives store events.
pub trait StoreObserver {
    fn notify(&self, event: &StoreEvent);
}

/// Writes every event to the log at info level.
#[derive(Debug, Default)]
pub struct LogObserver;

impl StoreObserver for LogObserver {
    fn notify(&self, event: &StoreEvent) {
        info!("{}", event.message());
    }
}

/// Keeps every event it sees; the CLI drains it to print notifications.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<StoreEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the events recorded so far.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

impl StoreObserver for EventLog {
    fn notify(&self, event: &StoreEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let created = StoreEvent::FolderCreated {
            id: "f".to_string(),
            name: "Work".to_string(),
        };
        assert_eq!(created.message(), "Folder \"Work\" created");
        assert_eq!(
            StoreEvent::NoteDeleted { id: "n".to_string() }.message(),
            "Note deleted"
        );
    }

    #[test]
    fn test_event_log_shares_state_between_clones() {
        let log = EventLog::new();
        let handle = log.clone();
        handle.notify(&StoreEvent::TagDeleted { id: "t".to_string() });
        assert_eq!(log.drain().len(), 1);
        assert!(log.drain().is_empty());
    }
}
