//! Citekey generation and BibTeX formatting.
//!
//! Both halves are pure: callers supply metadata and (for citekeys) the set
//! of keys already in use, and get strings back. Nothing here touches the
//! store or the network.

mod bibtex;
mod citekey;

pub use bibtex::{generate_bibtex_entry, generate_bibtex_file};
pub use citekey::{extract_year, generate_citekey};

/// The metadata fields the formatters consume. Mirrors the document
/// metadata model without depending on it, so this crate stays leaf-level.
#[derive(Debug, Clone, Default)]
pub struct CitationMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    pub publication: String,
    pub doi: String,
    pub abstract_text: String,
    pub item_type: String,
    pub publisher: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub issn: String,
    pub isbn: String,
    pub url: String,
}
