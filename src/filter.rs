//! Read-side filtering of notes by search text, folder and tag.
use crate::Note;

/// The active view filters. Each unset filter matches every note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub search_query: String,
    pub folder_id: Option<String>,
    pub tag_id: Option<String>,
}

impl NoteFilter {
    /// True when the note passes the search, folder and tag tests together.
    pub fn matches(&self, note: &Note) -> bool {
        self.matches_search(note) && self.matches_folder(note) && self.matches_tag(note)
    }

    pub fn is_empty(&self) -> bool {
        self.search_query.is_empty() && self.folder_id.is_none() && self.tag_id.is_none()
    }

    fn matches_search(&self, note: &Note) -> bool {
        if self.search_query.is_empty() {
            return true;
        }
        let query = self.search_query.to_lowercase();
        note.title.to_lowercase().contains(&query) || note.content.to_lowercase().contains(&query)
    }

    fn matches_folder(&self, note: &Note) -> bool {
        match &self.folder_id {
            Some(folder_id) => note.folder_id.as_deref() == Some(folder_id.as_str()),
            None => true,
        }
    }

    fn matches_tag(&self, note: &Note) -> bool {
        match &self.tag_id {
            Some(tag_id) => note.has_tag(tag_id),
            None => true,
        }
    }
}

/// Applies the filter, keeping the collection's order.
pub fn filter_notes<'a>(notes: &'a [Note], filter: &NoteFilter) -> Vec<&'a Note> {
    notes.iter().filter(|note| filter.matches(note)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn note(id: &str, title: &str, content: &str, folder: Option<&str>, tags: &[&str]) -> Note {
        let now = Utc::now();
        Note {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            folder_id: folder.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn corpus() -> Vec<Note> {
        vec![
            note("1", "Groceries", "milk and eggs", Some("home"), &["tag3"]),
            note("2", "Sprint plan", "Ship the MILK feature", Some("work"), &["tag2"]),
            note("3", "Ideas", "nothing here", None, &["tag2", "tag3"]),
            note("4", "milk tasting", "", Some("home"), &[]),
        ]
    }

    fn ids(notes: Vec<&Note>) -> Vec<&str> {
        notes.into_iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let notes = corpus();
        let filter = NoteFilter::default();
        assert!(filter.is_empty());
        assert_eq!(filter_notes(&notes, &filter).len(), notes.len());
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let notes = corpus();
        let filter = NoteFilter {
            search_query: "Milk".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(filter_notes(&notes, &filter)), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let notes = corpus();
        let filter = NoteFilter {
            search_query: "milk".to_string(),
            folder_id: Some("home".to_string()),
            tag_id: Some("tag3".to_string()),
        };
        assert_eq!(ids(filter_notes(&notes, &filter)), vec!["1"]);

        // Each note passes iff every individual test passes.
        for n in &notes {
            let search = NoteFilter {
                search_query: filter.search_query.clone(),
                ..Default::default()
            };
            let folder = NoteFilter {
                folder_id: filter.folder_id.clone(),
                ..Default::default()
            };
            let tag = NoteFilter {
                tag_id: filter.tag_id.clone(),
                ..Default::default()
            };
            assert_eq!(
                filter.matches(n),
                search.matches(n) && folder.matches(n) && tag.matches(n)
            );
        }
    }

    #[test]
    fn test_tag_filter() {
        let notes = corpus();
        let filter = NoteFilter {
            tag_id: Some("tag2".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(filter_notes(&notes, &filter)), vec!["2", "3"]);
    }
}
