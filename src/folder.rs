//! Folders group notes. A folder may sit under a parent folder.
use serde::{Deserialize, Serialize};

/// A named container for notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// Parent folder, `None` for top-level folders
    pub parent_id: Option<String>,
}

/// The folder set used on first run or when stored folders cannot be read.
pub fn seed_folders() -> Vec<Folder> {
    vec![Folder {
        id: "default".to_string(),
        name: "Main".to_string(),
        parent_id: None,
    }]
}

/// Returns true if placing `folder_id` under `new_parent` would make the
/// folder its own ancestor.
pub(crate) fn creates_cycle(folders: &[Folder], folder_id: &str, new_parent: &str) -> bool {
    let mut cursor = Some(new_parent);
    // Bounded walk so a cycle already present in loaded data cannot spin forever.
    let mut steps = 0;
    while let Some(id) = cursor {
        if id == folder_id {
            return true;
        }
        steps += 1;
        if steps > folders.len() {
            return true;
        }
        cursor = folders
            .iter()
            .find(|f| f.id == id)
            .and_then(|f| f.parent_id.as_deref());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parent: Option<&str>) -> Folder {
        Folder {
            id: id.to_string(),
            name: id.to_uppercase(),
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_seed_has_main_folder() {
        let seed = seed_folders();
        assert_eq!(seed.len(), 1);
        assert_eq!(seed[0].name, "Main");
        assert!(seed[0].parent_id.is_none());
    }

    #[test]
    fn test_cycle_detection() {
        let folders = vec![folder("a", None), folder("b", Some("a")), folder("c", Some("b"))];

        assert!(creates_cycle(&folders, "a", "c"));
        assert!(creates_cycle(&folders, "a", "a"));
        assert!(!creates_cycle(&folders, "c", "a"));
        assert!(!creates_cycle(&folders, "b", "missing"));
    }
}
