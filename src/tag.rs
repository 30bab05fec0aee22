//! Tags label notes across folders.
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Colors a new tag picks from when none is given.
pub const TAG_PALETTE: [&str; 6] = [
    "#F2FCE2", // soft green
    "#FEF7CD", // soft yellow
    "#FEC6A1", // soft orange
    "#E5DEFF", // soft purple
    "#FFDEE2", // soft pink
    "#D3E4FD", // soft blue
];

/// Name given to tags created without one.
pub const DEFAULT_TAG_NAME: &str = "New Tag";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Display color, opaque to the store
    pub color: String,
}

/// Input for creating a tag.
#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl NewTag {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            color: None,
        }
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A partial update for a tag.
#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl Tag {
    pub(crate) fn apply(&mut self, patch: TagPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
    }
}

/// The tag set used on first run or when stored tags cannot be read.
pub fn seed_tags() -> Vec<Tag> {
    [
        ("tag1", "Important", "#FEC6A1"),
        ("tag2", "Work", "#E5DEFF"),
        ("tag3", "Personal", "#D3E4FD"),
    ]
    .into_iter()
    .map(|(id, name, color)| Tag {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

/// Picks a palette color at random.
pub(crate) fn random_color<R: Rng + ?Sized>(rng: &mut R) -> String {
    TAG_PALETTE[rng.gen_range(0..TAG_PALETTE.len())].to_string()
}
