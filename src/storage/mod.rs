// Local persistence and the document shape shared with export and sync.

pub mod document;
pub mod sqlite;

pub use document::{demo_document, export_file_name, Document, Meta};
pub use sqlite::{LocalCache, SqliteStorage, STORAGE_KEY};
