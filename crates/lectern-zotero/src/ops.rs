//! Library-level operations: item search with attachment resolution, and
//! collection listing. These wrap the raw client with the defaults and
//! shaping the tool surface expects.

use crate::client::{QueryParams, ZoteroClient};
use crate::models::Item;
use crate::Result;

/// Parameters for searching a Zotero library.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    /// Quick search text (matches title, creator, year).
    pub query: String,
    /// Filter by tags (all must match).
    pub tags: Vec<String>,
    /// Filter by item type, e.g. "book", "journalArticle", "-attachment".
    pub item_types: Vec<String>,
    /// Restrict to a collection key.
    pub collection: String,
    /// Max results; 0 means the default of 25.
    pub limit: usize,
    /// Sort field; empty means "dateModified".
    pub sort: String,
}

/// A search hit: the bibliographic item plus its file attachments.
#[derive(Debug, Clone, Default)]
pub struct ItemSummary {
    pub key: String,
    pub title: String,
    pub creators: Vec<String>,
    pub item_type: String,
    pub date: String,
    pub attachments: Vec<AttachmentInfo>,
}

/// A file attached to an item. The key is what document parsing takes as
/// its reference-manager id.
#[derive(Debug, Clone, Default)]
pub struct AttachmentInfo {
    pub key: String,
    pub filename: String,
    pub content_type: String,
    pub link_mode: String,
}

/// Search the library (or one collection) and resolve each hit's
/// attachments. A failure fetching one item's children skips that item
/// rather than failing the search.
pub async fn search_items(client: &ZoteroClient, params: &SearchParams) -> Result<Vec<ItemSummary>> {
    let mut query = QueryParams {
        q: params.query.clone(),
        qmode: "titleCreatorYear".to_string(),
        tags: params.tags.clone(),
        item_types: params.item_types.clone(),
        limit: params.limit,
        sort: params.sort.clone(),
    };
    if query.limit == 0 {
        query.limit = 25;
    }
    if query.sort.is_empty() {
        query.sort = "dateModified".to_string();
    }
    if query.item_types.is_empty() {
        query.item_types = vec!["-attachment".to_string()];
    }

    let items = if params.collection.is_empty() {
        client.items(&query).await?
    } else {
        client.collection_items(&params.collection, &query).await?
    };

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        if item.data.item_type == "attachment" {
            continue;
        }
        let mut summary = summarize(&item);

        let children = match client.children(&item.key).await {
            Ok(children) => children,
            Err(_) => continue,
        };
        for child in children {
            if child.data.item_type == "attachment" {
                summary.attachments.push(AttachmentInfo {
                    key: child.key,
                    filename: child.data.filename,
                    content_type: child.data.content_type,
                    link_mode: child.data.link_mode,
                });
            }
        }
        results.push(summary);
    }
    Ok(results)
}

fn summarize(item: &Item) -> ItemSummary {
    ItemSummary {
        key: item.key.clone(),
        title: item.data.title.clone(),
        creators: item
            .data
            .creators
            .iter()
            .map(|c| c.display_name())
            .filter(|name| !name.is_empty())
            .collect(),
        item_type: item.data.item_type.clone(),
        date: item.data.date_added.clone(),
        attachments: Vec::new(),
    }
}

/// Parameters for listing collections.
#[derive(Debug, Clone, Default)]
pub struct ListCollectionsParams {
    /// Only collections without a parent.
    pub top_level_only: bool,
    /// Subcollections of this collection key.
    pub parent_collection: String,
    /// Max results; 0 means the default of 100.
    pub limit: usize,
    /// Sort field; empty means "title".
    pub sort: String,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionSummary {
    pub key: String,
    pub name: String,
    pub parent_collection: String,
}

/// List collections: all of them, top-level only, or the children of one
/// parent.
pub async fn list_collections(
    client: &ZoteroClient,
    params: &ListCollectionsParams,
) -> Result<Vec<CollectionSummary>> {
    let mut query = QueryParams {
        limit: params.limit,
        sort: params.sort.clone(),
        ..Default::default()
    };
    if query.limit == 0 {
        query.limit = 100;
    }
    if query.sort.is_empty() {
        query.sort = "title".to_string();
    }

    let collections = if !params.parent_collection.is_empty() {
        client.collections_sub(&params.parent_collection, &query).await?
    } else if params.top_level_only {
        client.collections_top(&query).await?
    } else {
        client.collections(&query).await?
    };

    Ok(collections
        .into_iter()
        .map(|c| CollectionSummary {
            key: c.key,
            name: c.data.name.clone(),
            parent_collection: c
                .data
                .parent_collection
                .key()
                .unwrap_or_default()
                .to_string(),
        })
        .collect())
}
