//! Word and character counts shown alongside the editor.
use serde::Serialize;

/// Average silent reading speed used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub word_count: usize,
    pub char_count: usize,
    /// Whole minutes, rounded up; zero for an empty document
    pub reading_time: usize,
}

impl DocumentStats {
    pub fn for_text(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            word_count,
            char_count: text.chars().count(),
            reading_time: word_count.div_ceil(WORDS_PER_MINUTE),
        }
    }
}
