//! Zotero Web API client.
//!
//! Thin typed wrapper over the v3 REST API plus the two library-level
//! operations the server exposes: item search (with attachment resolution)
//! and collection listing.

mod client;
mod models;
mod ops;

pub use client::{QueryParams, ZoteroClient};
pub use models::{Collection, Creator, Item, ItemData};
pub use ops::{
    AttachmentInfo, CollectionSummary, ItemSummary, ListCollectionsParams, SearchParams,
    list_collections, search_items,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZoteroError {
    #[error("Zotero API key and library ID are required")]
    MissingCredentials,
    #[error("Zotero HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Zotero API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Zotero response decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ZoteroError>;
