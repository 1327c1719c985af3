//! The normalized document store.
//!
//! A parsed document decomposes into a root row plus seven child tables
//! (pages, references, images, tables, footnotes, endnotes, quotations),
//! all written in one transaction. Re-storing a document replaces its
//! children wholesale, which is what makes the augmenting operations
//! idempotent.

mod resources;
mod sqlite;

pub use resources::resource_paths;
pub use sqlite::SqliteStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("encoding error: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
