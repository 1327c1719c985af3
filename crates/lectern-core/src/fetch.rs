//! Byte acquisition.
//!
//! Preference order: inline bytes, then the reference manager, then a
//! URL. Zotero sources also yield external bibliographic metadata from
//! the attachment's parent item; a metadata failure degrades to none
//! rather than failing the fetch. Snapshot archives are unwrapped to
//! their inner HTML here so the parser only ever sees concrete formats.

use std::future::Future;

use lectern_zotero::{Item, ZoteroClient};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::detect::detect_document_type;
use crate::models::{DocumentData, DocumentType, Metadata, MetadataSource, SourceInfo};
use crate::snapshot;
use crate::{Error, Result};

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// Resolve a document request to typed bytes plus any external metadata.
pub async fn resolve(
    http: &reqwest::Client,
    config: &Config,
    source: &SourceInfo,
    raw_data: Option<&[u8]>,
    type_override: Option<DocumentType>,
    cancel: &CancellationToken,
) -> Result<(DocumentData, Option<Metadata>)> {
    let (bytes, external) = if let Some(raw) = raw_data {
        if raw.is_empty() {
            return Err(Error::BadInput("raw document data is empty".into()));
        }
        (raw.to_vec(), None)
    } else if !source.zotero_id.is_empty() {
        fetch_from_zotero(http, config, &source.zotero_id, cancel).await?
    } else if !source.url.is_empty() {
        (fetch_from_url(http, &source.url, cancel).await?, None)
    } else {
        return Err(Error::BadInput("no document source provided".into()));
    };

    let doc_type = type_override.unwrap_or_else(|| detect_document_type(&bytes));

    // Snapshot archives carry their payload one level down.
    if doc_type == DocumentType::ZoteroSnapshot {
        let html = snapshot::extract_html(&bytes)?;
        return Ok((
            DocumentData {
                data: html,
                doc_type: DocumentType::Html,
            },
            external,
        ));
    }

    Ok((
        DocumentData {
            data: bytes,
            doc_type,
        },
        external,
    ))
}

async fn fetch_from_url(
    http: &reqwest::Client,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let bytes = cancellable(cancel, async {
        let resp = http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("GET {url} returned HTTP {status}")));
        }
        Ok(resp.bytes().await?.to_vec())
    })
    .await?;

    if bytes.is_empty() {
        return Err(Error::Upstream(format!("GET {url} returned an empty payload")));
    }
    Ok(bytes)
}

async fn fetch_from_zotero(
    http: &reqwest::Client,
    config: &Config,
    zotero_id: &str,
    cancel: &CancellationToken,
) -> Result<(Vec<u8>, Option<Metadata>)> {
    let (api_key, library_id) = config.zotero_credentials()?;
    let client = ZoteroClient::new(http.clone(), library_id, api_key)?;

    let bytes = cancellable(cancel, async { Ok(client.file(zotero_id).await?) }).await?;
    if bytes.is_empty() {
        return Err(Error::Upstream(format!(
            "Zotero attachment {zotero_id} is empty"
        )));
    }

    // Metadata failure is non-fatal; the document still parses.
    let external = cancellable(cancel, external_metadata(&client, zotero_id)).await;
    let external = match external {
        Ok(metadata) => metadata,
        Err(Error::Cancelled) => return Err(Error::Cancelled),
        Err(_) => None,
    };

    Ok((bytes, external))
}

/// Fetch bibliographic metadata for a Zotero item. Attachments resolve
/// through their parent item; an orphaned attachment yields none.
async fn external_metadata(client: &ZoteroClient, zotero_id: &str) -> Result<Option<Metadata>> {
    let mut item = client.item(zotero_id).await?;
    if item.data.item_type == "attachment" && !item.data.parent_item.is_empty() {
        let parent_key = item.data.parent_item.clone();
        item = client.item(&parent_key).await?;
    }
    if item.data.item_type == "attachment" {
        return Ok(None);
    }
    Ok(Some(item_to_metadata(&item)))
}

fn item_to_metadata(item: &Item) -> Metadata {
    Metadata {
        title: item.data.title.clone(),
        authors: item
            .data
            .creators
            .iter()
            .map(|c| c.display_name())
            .filter(|name| !name.is_empty())
            .collect(),
        publication_date: item.data.date.clone(),
        publication: item.data.publication_title.clone(),
        doi: item.data.doi.clone(),
        abstract_text: item.data.abstract_note.clone(),
        item_type: item.data.item_type.clone(),
        publisher: item.data.publisher.clone(),
        volume: item.data.volume.clone(),
        issue: item.data.issue.clone(),
        pages: item.data.pages.clone(),
        issn: item.data.issn.clone(),
        isbn: item.data.isbn.clone(),
        url: item.data.url.clone(),
        citekey: String::new(),
        metadata_source: MetadataSource::External,
    }
}
