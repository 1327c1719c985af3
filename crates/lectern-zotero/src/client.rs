//! HTTP client for the Zotero v3 API.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::models::{Collection, Item};
use crate::{Result, ZoteroError};

const API_BASE: &str = "https://api.zotero.org";

/// Query parameters for item and collection listings. Zero/empty fields
/// are omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub q: String,
    pub qmode: String,
    pub tags: Vec<String>,
    pub item_types: Vec<String>,
    pub limit: usize,
    pub sort: String,
}

pub struct ZoteroClient {
    http: reqwest::Client,
    library_id: String,
    api_key: String,
}

impl ZoteroClient {
    pub fn new(http: reqwest::Client, library_id: &str, api_key: &str) -> Result<Self> {
        if library_id.is_empty() || api_key.is_empty() {
            return Err(ZoteroError::MissingCredentials);
        }
        Ok(Self {
            http,
            library_id: library_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{API_BASE}/users/{}{path}", self.library_id)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Result<T> {
        let mut req = self
            .http
            .get(self.url(path))
            .header("Zotero-API-Key", &self.api_key)
            .header("Zotero-API-Version", "3");

        let mut query: Vec<(&str, String)> = Vec::new();
        if !params.q.is_empty() {
            query.push(("q", params.q.clone()));
        }
        if !params.qmode.is_empty() {
            query.push(("qmode", params.qmode.clone()));
        }
        for tag in &params.tags {
            query.push(("tag", tag.clone()));
        }
        if !params.item_types.is_empty() {
            query.push(("itemType", params.item_types.join(" || ")));
        }
        if params.limit > 0 {
            query.push(("limit", params.limit.to_string()));
        }
        if !params.sort.is_empty() {
            query.push(("sort", params.sort.clone()));
        }
        if !query.is_empty() {
            req = req.query(&query);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp.text().await.unwrap_or_default()));
        }
        resp.json::<T>()
            .await
            .map_err(|e| ZoteroError::Decode(e.to_string()))
    }

    /// Fetch a single item by key.
    pub async fn item(&self, key: &str) -> Result<Item> {
        self.get_json(&format!("/items/{key}"), &QueryParams::default())
            .await
    }

    /// Fetch an item's child items (attachments, notes).
    pub async fn children(&self, key: &str) -> Result<Vec<Item>> {
        self.get_json(&format!("/items/{key}/children"), &QueryParams::default())
            .await
    }

    /// Search items across the whole library.
    pub async fn items(&self, params: &QueryParams) -> Result<Vec<Item>> {
        self.get_json("/items", params).await
    }

    /// Search items within a collection.
    pub async fn collection_items(&self, collection: &str, params: &QueryParams) -> Result<Vec<Item>> {
        self.get_json(&format!("/collections/{collection}/items"), params)
            .await
    }

    /// All collections in the library.
    pub async fn collections(&self, params: &QueryParams) -> Result<Vec<Collection>> {
        self.get_json("/collections", params).await
    }

    /// Top-level collections only.
    pub async fn collections_top(&self, params: &QueryParams) -> Result<Vec<Collection>> {
        self.get_json("/collections/top", params).await
    }

    /// Direct subcollections of a collection.
    pub async fn collections_sub(&self, parent: &str, params: &QueryParams) -> Result<Vec<Collection>> {
        self.get_json(&format!("/collections/{parent}/collections"), params)
            .await
    }

    /// Download an attachment's file content.
    pub async fn file(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(self.url(&format!("/items/{key}/file")))
            .header("Zotero-API-Key", &self.api_key)
            .header("Zotero-API-Version", "3")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(api_error(status, resp.text().await.unwrap_or_default()));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

fn api_error(status: StatusCode, body: String) -> ZoteroError {
    let message = if body.len() > 200 {
        format!("{}...", &body[..200])
    } else {
        body
    };
    ZoteroError::Api {
        status: status.as_u16(),
        message,
    }
}
