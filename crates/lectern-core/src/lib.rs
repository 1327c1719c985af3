//! Document pipeline core.
//!
//! Everything between the tool surface and the external services lives
//! here: fetching bytes, detecting their format, splitting and parsing
//! them through the language model under a shared rate governor,
//! validating page numbering, merging metadata, and persisting the result
//! into the SQLite store. The [`Pipeline`] ties it together with the
//! get-or-parse-or-augment flow every operation goes through.

use thiserror::Error;

pub mod batch;
pub mod config;
pub mod detect;
pub mod fetch;
pub mod html;
pub mod identity;
pub mod llm;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod pool;
pub mod rate_limit;
pub mod snapshot;
pub mod store;

pub use config::Config;
pub use models::{
    DocumentData, DocumentInfo, DocumentType, Endnote, Footnote, Image, Metadata, MetadataSource,
    ParsedDocument, ParsedPage, Quotation, Reference, SourceInfo, Table,
};
pub use orchestrator::{AugmentOutcome, DocumentRequest, Pipeline};
pub use rate_limit::RateGovernor;

/// Error kinds for every pipeline operation. Batch layers capture these
/// per element; nothing unwinds across the component boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("cancelled")]
    Cancelled,
    #[error("malformed document: {0}")]
    Malformed(String),
    #[error("store error: {0}")]
    Store(#[from] store::StoreError),
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<lectern_pdf::PdfError> for Error {
    fn from(err: lectern_pdf::PdfError) -> Self {
        Error::Malformed(err.to_string())
    }
}

impl From<lectern_zotero::ZoteroError> for Error {
    fn from(err: lectern_zotero::ZoteroError) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}
