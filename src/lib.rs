//! Markdown note-taking library
//!
//! This library provides the note store (notes, nested folders and tags with
//! referential integrity), its persistence adapters, the markdown, zip and
//! backup codecs, and the command-line front end built on top of them.

pub mod codec;

mod cli;
mod config;
mod errors;
mod events;
mod filter;
mod folder;
mod helper;
mod import;
mod note;
mod stats;
mod storage;
mod store;
mod tag;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use events::*;
pub use filter::*;
pub use folder::*;
pub use helper::*;
pub use import::*;
pub use note::*;
pub use stats::*;
pub use storage::*;
pub use store::*;
pub use tag::*;
pub use types::*;
