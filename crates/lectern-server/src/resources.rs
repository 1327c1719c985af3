//! The resource resolver: hierarchical `pdf://` URIs over the store.
//!
//! Grammar:
//!
//! ```text
//! pdf://<id>                      document summary (metadata + counts + catalog)
//! pdf://<id>/metadata             full metadata record
//! pdf://<id>/pages                all pages with (seq, label, content)
//! pdf://<id>/pages/<label>        one page by display label
//! pdf://<id>/<kind>               full sequence + count
//! pdf://<id>/<kind>/<index>       one item, 0-indexed
//! ```
//!
//! where `<kind>` is one of references, images, tables, footnotes,
//! endnotes, quotations. All payloads are JSON.

use lectern_core::store::{SqliteStore, StoreError, resource_paths};
use serde_json::json;

const SCHEME: &str = "pdf://";

#[derive(Debug)]
pub enum ResourceError {
    /// Malformed URI or unknown resource type.
    BadRequest(String),
    /// Unknown document, label, or index.
    NotFound(String),
    /// Store failure.
    Internal(String),
}

impl std::fmt::Display for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceError::BadRequest(msg) => write!(f, "bad request: {msg}"),
            ResourceError::NotFound(msg) => write!(f, "not found: {msg}"),
            ResourceError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

fn store_err(err: StoreError) -> ResourceError {
    match err {
        StoreError::NotFound(what) => ResourceError::NotFound(what),
        other => ResourceError::Internal(other.to_string()),
    }
}

/// Resolve a resource URI to its JSON payload.
pub fn read_resource(store: &SqliteStore, uri: &str) -> Result<String, ResourceError> {
    let Some(path) = uri.strip_prefix(SCHEME) else {
        return Err(ResourceError::BadRequest(format!(
            "invalid URI scheme, expected {SCHEME}: {uri}"
        )));
    };

    let mut parts = path.splitn(3, '/');
    let doc_id = parts.next().unwrap_or_default();
    if doc_id.is_empty() {
        return Err(ResourceError::BadRequest("missing document id".into()));
    }
    let resource_type = parts.next();
    let selector = parts.next();

    match (resource_type, selector) {
        (None, _) | (Some(""), None) => document_summary(store, doc_id),
        (Some("metadata"), None) => {
            let metadata = store.metadata(doc_id).map_err(store_err)?;
            to_json(&metadata)
        }
        (Some("pages"), None) => all_pages(store, doc_id),
        (Some("pages"), Some(label)) => page_by_label(store, doc_id, label),
        (Some("references"), None) => {
            let items = store.references(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"reference_count": items.len(), "references": items}))
        }
        (Some("references"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.reference(doc_id, index).map_err(store_err)?)
        }
        (Some("images"), None) => {
            let items = store.images(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"image_count": items.len(), "images": items}))
        }
        (Some("images"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.image(doc_id, index).map_err(store_err)?)
        }
        (Some("tables"), None) => {
            let items = store.tables(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"table_count": items.len(), "tables": items}))
        }
        (Some("tables"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.table(doc_id, index).map_err(store_err)?)
        }
        (Some("footnotes"), None) => {
            let items = store.footnotes(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"footnote_count": items.len(), "footnotes": items}))
        }
        (Some("footnotes"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.footnote(doc_id, index).map_err(store_err)?)
        }
        (Some("endnotes"), None) => {
            let items = store.endnotes(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"endnote_count": items.len(), "endnotes": items}))
        }
        (Some("endnotes"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.endnote(doc_id, index).map_err(store_err)?)
        }
        (Some("quotations"), None) => {
            let items = store.quotations(doc_id).map_err(store_err)?;
            ensure_known(store, doc_id)?;
            to_json(&json!({"quotation_count": items.len(), "quotations": items}))
        }
        (Some("quotations"), Some(index)) => {
            let index = parse_index(index)?;
            to_json(&store.quotation(doc_id, index).map_err(store_err)?)
        }
        (Some(other), _) => Err(ResourceError::BadRequest(format!(
            "unknown resource type: {other}"
        ))),
    }
}

/// Child listings come back empty for unknown ids; distinguish that from
/// a stored document with no children.
fn ensure_known(store: &SqliteStore, doc_id: &str) -> Result<(), ResourceError> {
    match store.exists(doc_id) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ResourceError::NotFound(format!("document {doc_id}"))),
        Err(err) => Err(store_err(err)),
    }
}

fn parse_index(raw: &str) -> Result<usize, ResourceError> {
    raw.parse::<usize>()
        .map_err(|_| ResourceError::BadRequest(format!("invalid index: {raw}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ResourceError> {
    serde_json::to_string_pretty(value).map_err(|e| ResourceError::Internal(e.to_string()))
}

fn document_summary(store: &SqliteStore, doc_id: &str) -> Result<String, ResourceError> {
    let document = store.document(doc_id).map_err(store_err)?;
    let summary = json!({
        "document_id": doc_id,
        "metadata": document.metadata,
        "page_count": document.pages.len(),
        "reference_count": document.references.len(),
        "image_count": document.images.len(),
        "table_count": document.tables.len(),
        "footnote_count": document.footnotes.len(),
        "endnote_count": document.endnotes.len(),
        "quotation_count": document.quotations.len(),
        "available_resources": resource_paths(doc_id, &document),
    });
    to_json(&summary)
}

fn all_pages(store: &SqliteStore, doc_id: &str) -> Result<String, ResourceError> {
    ensure_known(store, doc_id)?;
    let contents = store.pages(doc_id).map_err(store_err)?;
    let mapping = store.page_mapping(doc_id).map_err(store_err)?;
    let pages: Vec<_> = mapping
        .iter()
        .zip(contents.iter())
        .map(|((label, seq), content)| {
            json!({
                "page_number": seq,
                "source_page_number": label,
                "content": content,
            })
        })
        .collect();
    to_json(&json!({"page_count": pages.len(), "pages": pages}))
}

fn page_by_label(store: &SqliteStore, doc_id: &str, label: &str) -> Result<String, ResourceError> {
    let content = store.page_by_label(doc_id, label).map_err(store_err)?;
    let mapping = store.page_mapping(doc_id).map_err(store_err)?;
    let seq = mapping
        .iter()
        .find(|(l, _)| l == label)
        .map(|(_, seq)| *seq)
        .unwrap_or_default();
    to_json(&json!({
        "page_number": seq,
        "source_page_number": label,
        "content": content,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::models::{
        Endnote, Footnote, Image, Metadata, ParsedDocument, Quotation, Reference, SourceInfo, Table,
    };

    fn store_with_document() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let doc = ParsedDocument {
            metadata: Metadata {
                title: "Resource Test".into(),
                authors: vec!["Doe, Jane".into()],
                doi: "10.1/rt".into(),
                citekey: "doe2020".into(),
                ..Default::default()
            },
            pages: vec!["first page".into(), "second page".into()],
            page_numbers: vec!["iv".into(), "v".into()],
            references: vec![Reference {
                reference_text: "Ref 0".into(),
                doi: "".into(),
            }],
            images: vec![Image {
                caption: "Fig 1".into(),
                ..Default::default()
            }],
            tables: vec![Table {
                table_id: "t1".into(),
                ..Default::default()
            }],
            footnotes: vec![Footnote {
                marker: "1".into(),
                ..Default::default()
            }],
            endnotes: vec![Endnote {
                marker: "i".into(),
                ..Default::default()
            }],
            quotations: vec![Quotation {
                quotation_text: "a quote".into(),
                page_number: "v".into(),
                ..Default::default()
            }],
            summary: "s".into(),
        };
        store.store_document("data_test", &doc, &SourceInfo::default()).unwrap();
        store
    }

    fn read(store: &SqliteStore, uri: &str) -> serde_json::Value {
        serde_json::from_str(&read_resource(store, uri).unwrap()).unwrap()
    }

    #[test]
    fn root_summary_has_counts_and_catalog() {
        let store = store_with_document();
        let value = read(&store, "pdf://data_test");
        assert_eq!(value["document_id"], "data_test");
        assert_eq!(value["metadata"]["title"], "Resource Test");
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["reference_count"], 1);
        assert_eq!(value["quotation_count"], 1);
        let catalog = value["available_resources"].as_array().unwrap();
        assert!(catalog.iter().any(|v| v == "pdf://data_test/metadata"));
        assert!(catalog.iter().any(|v| v == "pdf://data_test/quotations"));
    }

    #[test]
    fn metadata_resource() {
        let store = store_with_document();
        let value = read(&store, "pdf://data_test/metadata");
        assert_eq!(value["title"], "Resource Test");
        assert_eq!(value["citekey"], "doe2020");
    }

    #[test]
    fn all_pages_carry_labels_and_sequence() {
        let store = store_with_document();
        let value = read(&store, "pdf://data_test/pages");
        assert_eq!(value["page_count"], 2);
        assert_eq!(value["pages"][0]["page_number"], 1);
        assert_eq!(value["pages"][0]["source_page_number"], "iv");
        assert_eq!(value["pages"][1]["content"], "second page");
    }

    #[test]
    fn page_by_display_label() {
        let store = store_with_document();
        let value = read(&store, "pdf://data_test/pages/v");
        assert_eq!(value["content"], "second page");
        assert_eq!(value["page_number"], 2);
    }

    #[test]
    fn missing_page_label_is_not_found() {
        let store = store_with_document();
        let result = read_resource(&store, "pdf://data_test/pages/99");
        assert!(matches!(result, Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn sequences_and_items_for_every_kind() {
        let store = store_with_document();
        for (kind, count_key) in [
            ("references", "reference_count"),
            ("images", "image_count"),
            ("tables", "table_count"),
            ("footnotes", "footnote_count"),
            ("endnotes", "endnote_count"),
            ("quotations", "quotation_count"),
        ] {
            let value = read(&store, &format!("pdf://data_test/{kind}"));
            assert_eq!(value[count_key], 1, "{kind}");

            let item = read(&store, &format!("pdf://data_test/{kind}/0"));
            assert!(item.is_object(), "{kind}/0");

            let missing = read_resource(&store, &format!("pdf://data_test/{kind}/7"));
            assert!(matches!(missing, Err(ResourceError::NotFound(_))), "{kind}/7");
        }
    }

    #[test]
    fn unknown_document_is_not_found() {
        let store = store_with_document();
        for uri in [
            "pdf://ghost",
            "pdf://ghost/metadata",
            "pdf://ghost/pages",
            "pdf://ghost/references",
        ] {
            let result = read_resource(&store, uri);
            assert!(matches!(result, Err(ResourceError::NotFound(_))), "{uri}");
        }
    }

    #[test]
    fn unknown_resource_type_is_bad_request() {
        let store = store_with_document();
        let result = read_resource(&store, "pdf://data_test/chapters");
        assert!(matches!(result, Err(ResourceError::BadRequest(_))));
    }

    #[test]
    fn wrong_scheme_is_bad_request() {
        let store = store_with_document();
        let result = read_resource(&store, "doc://data_test");
        assert!(matches!(result, Err(ResourceError::BadRequest(_))));
    }

    #[test]
    fn non_numeric_index_is_bad_request() {
        let store = store_with_document();
        let result = read_resource(&store, "pdf://data_test/references/first");
        assert!(matches!(result, Err(ResourceError::BadRequest(_))));
    }
}
