//! The MCP tool and resource surface.
//!
//! Six tools over the pipeline (parse, summarize, quotations, reference
//! search, collection listing, bibliography export) plus the `pdf://`
//! resource space. Document tools accept one document inline or a batch
//! via `documents`; batch elements fail individually, never wholesale.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use lectern_citations::{generate_bibtex_entry, generate_bibtex_file};
use lectern_core::batch::run_batch;
use lectern_core::store::resource_paths;
use lectern_core::{DocumentRequest, DocumentType, Error, ParsedDocument, Pipeline, Quotation};
use lectern_zotero::{ListCollectionsParams, SearchParams, ZoteroClient, list_collections, search_items};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::schemars;
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::resources::{ResourceError, read_resource};

// ── Tool inputs ─────────────────────────────────────────────────────────

/// One document source. Exactly one of `zotero_id`, `url`, `raw_data`
/// should be set.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct DocumentInput {
    /// Zotero attachment key to fetch from the configured library.
    #[serde(default)]
    pub zotero_id: String,
    /// URL to fetch the document from.
    #[serde(default)]
    pub url: String,
    /// Base64-encoded raw document bytes.
    #[serde(default)]
    pub raw_data: Option<String>,
    /// Type override: pdf, html, md, txt, docx. Auto-detected when empty.
    #[serde(default)]
    pub doc_type: Option<String>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct DocumentToolParams {
    #[serde(default)]
    pub zotero_id: String,
    #[serde(default)]
    pub url: String,
    /// Base64-encoded raw document bytes.
    #[serde(default)]
    pub raw_data: Option<String>,
    /// Type override: pdf, html, md, txt, docx. Auto-detected when empty.
    #[serde(default)]
    pub doc_type: Option<String>,
    /// Batch mode: process these documents instead of the inline fields.
    #[serde(default)]
    pub documents: Option<Vec<DocumentInput>>,
}

impl DocumentToolParams {
    fn into_inputs(self) -> Vec<DocumentInput> {
        match self.documents {
            Some(documents) if !documents.is_empty() => documents,
            _ => vec![DocumentInput {
                zotero_id: self.zotero_id,
                url: self.url,
                raw_data: self.raw_data,
                doc_type: self.doc_type,
            }],
        }
    }
}

/// A quotations request for one document: a source plus its quota.
#[derive(Debug, Clone, Default, Deserialize, schemars::JsonSchema)]
pub struct QuotationsInput {
    #[serde(flatten)]
    pub document: DocumentInput,
    /// Max quotations to return. Default 10, 0 = unlimited.
    #[serde(default)]
    pub max_quotations: Option<i64>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct QuotationsToolParams {
    #[serde(default)]
    pub zotero_id: String,
    #[serde(default)]
    pub url: String,
    /// Base64-encoded raw document bytes.
    #[serde(default)]
    pub raw_data: Option<String>,
    /// Type override: pdf, html, md, txt, docx. Auto-detected when empty.
    #[serde(default)]
    pub doc_type: Option<String>,
    /// Max quotations to return. Default 10, 0 = unlimited.
    #[serde(default)]
    pub max_quotations: Option<i64>,
    /// Batch mode: process these documents instead of the inline fields.
    #[serde(default)]
    pub documents: Option<Vec<QuotationsInput>>,
}

impl QuotationsToolParams {
    fn into_inputs(self) -> Vec<QuotationsInput> {
        match self.documents {
            Some(documents) if !documents.is_empty() => documents,
            _ => vec![QuotationsInput {
                document: DocumentInput {
                    zotero_id: self.zotero_id,
                    url: self.url,
                    raw_data: self.raw_data,
                    doc_type: self.doc_type,
                },
                max_quotations: self.max_quotations,
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ReferenceSearchParams {
    /// Quick search text (matches title, creator, year).
    #[serde(default)]
    pub query: String,
    /// Filter by tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Filter by item type, e.g. "book", "journalArticle", "-attachment".
    #[serde(default)]
    pub item_types: Vec<String>,
    /// Restrict the search to a collection key.
    #[serde(default)]
    pub collection: String,
    /// Max results (default 25).
    #[serde(default)]
    pub limit: usize,
    /// Sort field (default "dateModified").
    #[serde(default)]
    pub sort: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct CollectionListParams {
    /// Only top-level collections.
    #[serde(default)]
    pub top_level_only: bool,
    /// List subcollections of this collection key.
    #[serde(default)]
    pub parent_collection: String,
    /// Max results (default 100).
    #[serde(default)]
    pub limit: usize,
    /// Sort field (default "title").
    #[serde(default)]
    pub sort: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct BibliographyExportParams {
    /// Export only these document ids; empty exports the whole library.
    #[serde(default)]
    pub document_ids: Vec<String>,
    /// Output format; only "bibtex" is supported.
    #[serde(default)]
    pub format: String,
}

// ── Tool outputs ────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct ParseResultRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    document_id: String,
    resource_paths: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    citekey: String,
    page_count: usize,
    reference_count: usize,
    image_count: usize,
    table_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct SummarizeResultRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    document_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resource_paths: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    citekey: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct QuotationsResultRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    document_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resource_paths: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    citekey: String,
    quotations: Vec<Quotation>,
    quotation_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ── Server ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct LecternServer {
    pipeline: Arc<Pipeline>,
    http: reqwest::Client,
    /// Root token; cancelled only on shutdown. Tool calls derive child
    /// tokens from it so in-flight work dies with the server.
    shutdown: CancellationToken,
    tool_router: ToolRouter<Self>,
}

impl LecternServer {
    pub fn new(pipeline: Arc<Pipeline>, http: reqwest::Client) -> Self {
        LecternServer {
            pipeline,
            http,
            shutdown: CancellationToken::new(),
            tool_router: Self::tool_router(),
        }
    }

    fn zotero_client(&self) -> Result<ZoteroClient, Error> {
        let (api_key, library_id) = self.pipeline.config.zotero_credentials()?;
        Ok(ZoteroClient::new(self.http.clone(), library_id, api_key)?)
    }

    fn render<T: Serialize>(results: &[T]) -> String {
        let response = json!({"results": results, "count": results.len()});
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    fn render_error(err: impl std::fmt::Display) -> String {
        serde_json::to_string_pretty(&json!({"error": err.to_string()})).unwrap_or_default()
    }
}

fn build_request(input: &DocumentInput) -> Result<DocumentRequest, Error> {
    let raw_data = match input.raw_data.as_deref() {
        Some(encoded) if !encoded.is_empty() => Some(
            BASE64
                .decode(encoded)
                .map_err(|e| Error::BadInput(format!("raw_data is not valid base64: {e}")))?,
        ),
        _ => None,
    };
    let doc_type = match input.doc_type.as_deref() {
        Some(name) if !name.is_empty() => Some(
            DocumentType::parse(name)
                .ok_or_else(|| Error::BadInput(format!("unknown doc_type: {name}")))?,
        ),
        _ => None,
    };
    Ok(DocumentRequest {
        zotero_id: input.zotero_id.clone(),
        url: input.url.clone(),
        raw_data,
        doc_type,
    })
}

fn parse_row(doc_id: String, document: &ParsedDocument) -> ParseResultRow {
    ParseResultRow {
        resource_paths: resource_paths(&doc_id, document),
        title: document.metadata.title.clone(),
        citekey: document.metadata.citekey.clone(),
        page_count: document.pages.len(),
        reference_count: document.references.len(),
        image_count: document.images.len(),
        table_count: document.tables.len(),
        error: None,
        document_id: doc_id,
    }
}

#[tool_router]
impl LecternServer {
    /// Parse one or more documents into structured records.
    #[tool(
        name = "document-parse",
        description = "Parse one or more documents (PDF, HTML, Markdown, or plain text) into structured data: metadata, per-page content, references, images, tables, footnotes and endnotes. The document type is auto-detected and can be overridden with doc_type. Results are cached by document identity; re-parsing a known document is free. Use the documents field for a batch; elements are processed concurrently."
    )]
    async fn document_parse(&self, Parameters(params): Parameters<DocumentToolParams>) -> String {
        info!("document-parse tool called");
        if let Err(err) = self.pipeline.config.openai_key() {
            return Self::render_error(err);
        }

        let inputs = params.into_inputs();
        let pipeline = self.pipeline.clone();
        let cancel = self.shutdown.child_token();
        let worker_cancel = cancel.clone();
        let outcomes = run_batch(inputs, &cancel, move |input| {
            let pipeline = pipeline.clone();
            let cancel = worker_cancel.clone();
            async move {
                let request = build_request(&input)?;
                let (doc_id, document) = pipeline.get_or_parse(&request, &cancel).await?;
                Ok(parse_row(doc_id, &document))
            }
        })
        .await;

        let results: Vec<ParseResultRow> = outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|err| ParseResultRow {
                    error: Some(format!("failed to parse: {err}")),
                    ..Default::default()
                })
            })
            .collect();

        info!(count = results.len(), "document-parse complete");
        Self::render(&results)
    }

    /// Summarize one or more documents, parsing them first if needed.
    #[tool(
        name = "document-summarize",
        description = "Summarize one or more documents (PDF, HTML, Markdown, or plain text) into 1-3 paragraphs of academic prose. Documents are parsed first if they haven't been; an existing summary is returned without re-generating it. Use the documents field for a batch; elements are processed concurrently."
    )]
    async fn document_summarize(
        &self,
        Parameters(params): Parameters<DocumentToolParams>,
    ) -> String {
        info!("document-summarize tool called");
        if let Err(err) = self.pipeline.config.openai_key() {
            return Self::render_error(err);
        }

        let inputs = params.into_inputs();
        let pipeline = self.pipeline.clone();
        let cancel = self.shutdown.child_token();
        let worker_cancel = cancel.clone();
        let outcomes = run_batch(inputs, &cancel, move |input| {
            let pipeline = pipeline.clone();
            let cancel = worker_cancel.clone();
            async move {
                let request = build_request(&input)?;
                let outcome = pipeline.summarize(&request, &cancel).await?;
                Ok(SummarizeResultRow {
                    resource_paths: resource_paths(&outcome.document_id, &outcome.document),
                    title: outcome.document.metadata.title.clone(),
                    citekey: outcome.document.metadata.citekey.clone(),
                    summary: outcome.document.summary.clone(),
                    error: outcome.warning.map(|w| format!("warning: {w}")),
                    document_id: outcome.document_id,
                })
            }
        })
        .await;

        let results: Vec<SummarizeResultRow> = outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|err| SummarizeResultRow {
                    error: Some(format!("failed to summarize: {err}")),
                    ..Default::default()
                })
            })
            .collect();

        info!(count = results.len(), "document-summarize complete");
        Self::render(&results)
    }

    /// Extract representative quotations from one or more documents.
    #[tool(
        name = "document-quotations",
        description = "Extract representative quotations from one or more documents. The document is parsed and summarized first (both cached), then quotations are extracted with page labels for paginated documents. max_quotations limits the result (default 10, 0 = unlimited); when more are found, a second pass selects the most significant ones verbatim. Use the documents field for a batch."
    )]
    async fn document_quotations(
        &self,
        Parameters(params): Parameters<QuotationsToolParams>,
    ) -> String {
        info!("document-quotations tool called");
        if let Err(err) = self.pipeline.config.openai_key() {
            return Self::render_error(err);
        }

        let inputs = params.into_inputs();
        let pipeline = self.pipeline.clone();
        let cancel = self.shutdown.child_token();
        let worker_cancel = cancel.clone();
        let outcomes = run_batch(inputs, &cancel, move |input| {
            let pipeline = pipeline.clone();
            let cancel = worker_cancel.clone();
            async move {
                let request = build_request(&input.document)?;
                let outcome = pipeline
                    .quotations(&request, input.max_quotations, &cancel)
                    .await?;
                Ok(QuotationsResultRow {
                    resource_paths: resource_paths(&outcome.document_id, &outcome.document),
                    title: outcome.document.metadata.title.clone(),
                    citekey: outcome.document.metadata.citekey.clone(),
                    quotation_count: outcome.document.quotations.len(),
                    quotations: outcome.document.quotations,
                    error: outcome.warning.map(|w| format!("warning: {w}")),
                    document_id: outcome.document_id,
                })
            }
        })
        .await;

        let results: Vec<QuotationsResultRow> = outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|err| QuotationsResultRow {
                    error: Some(format!("failed to extract quotations: {err}")),
                    ..Default::default()
                })
            })
            .collect();

        info!(count = results.len(), "document-quotations complete");
        Self::render(&results)
    }

    /// Search the reference library.
    #[tool(
        name = "reference-search",
        description = "Search the configured Zotero library for bibliographic items. Returns items with their file attachments; use an attachment key as zotero_id in document-parse to analyze that file. Items that have already been parsed include their citekey."
    )]
    async fn reference_search(
        &self,
        Parameters(params): Parameters<ReferenceSearchParams>,
    ) -> String {
        info!("reference-search tool called");
        let client = match self.zotero_client() {
            Ok(client) => client,
            Err(err) => return Self::render_error(err),
        };

        let search = SearchParams {
            query: params.query,
            tags: params.tags,
            item_types: params.item_types,
            collection: params.collection,
            limit: params.limit,
            sort: params.sort,
        };
        let items = match search_items(&client, &search).await {
            Ok(items) => items,
            Err(err) => return Self::render_error(err),
        };

        // Known citekeys by attachment key. A failure here degrades to no
        // enrichment rather than failing the search.
        let citekeys = match self.pipeline.store.citekey_map() {
            Ok(map) => map,
            Err(err) => {
                warn!(error = %err, "failed to load citekey map");
                Default::default()
            }
        };
        let by_attachment: std::collections::HashMap<&str, &str> = citekeys
            .iter()
            .filter_map(|(doc_id, citekey)| {
                doc_id
                    .strip_prefix("ref_")
                    .map(|key| (key, citekey.as_str()))
            })
            .collect();

        let results: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                let citekey = item
                    .attachments
                    .iter()
                    .find_map(|a| by_attachment.get(a.key.as_str()))
                    .copied()
                    .unwrap_or_default();
                json!({
                    "key": item.key,
                    "title": item.title,
                    "creators": item.creators,
                    "item_type": item.item_type,
                    "date": item.date,
                    "attachments": item.attachments.iter().map(|a| json!({
                        "key": a.key,
                        "filename": a.filename,
                        "content_type": a.content_type,
                        "link_mode": a.link_mode,
                    })).collect::<Vec<_>>(),
                    "citekey": citekey,
                })
            })
            .collect();

        info!(count = results.len(), "reference-search complete");
        serde_json::to_string_pretty(&json!({"items": results, "count": results.len()}))
            .unwrap_or_default()
    }

    /// Browse the reference library's collections.
    #[tool(
        name = "collection-list",
        description = "List collections in the configured Zotero library: all of them, only top-level ones, or the subcollections of a given parent. Collection keys can be passed to reference-search to scope a search."
    )]
    async fn collection_list(&self, Parameters(params): Parameters<CollectionListParams>) -> String {
        info!("collection-list tool called");
        let client = match self.zotero_client() {
            Ok(client) => client,
            Err(err) => return Self::render_error(err),
        };

        let list = ListCollectionsParams {
            top_level_only: params.top_level_only,
            parent_collection: params.parent_collection,
            limit: params.limit,
            sort: params.sort,
        };
        let collections = match list_collections(&client, &list).await {
            Ok(collections) => collections,
            Err(err) => return Self::render_error(err),
        };

        let results: Vec<serde_json::Value> = collections
            .iter()
            .map(|c| {
                json!({
                    "key": c.key,
                    "name": c.name,
                    "parent_collection": c.parent_collection,
                })
            })
            .collect();

        info!(count = results.len(), "collection-list complete");
        serde_json::to_string_pretty(&json!({"collections": results, "count": results.len()}))
            .unwrap_or_default()
    }

    /// Export stored documents as a bibliography.
    #[tool(
        name = "bibliography-export",
        description = "Export a BibTeX bibliography for previously parsed documents. With document_ids, exports only those; otherwise the whole library. Documents without a citekey are reported in missing_citekey rather than exported."
    )]
    async fn bibliography_export(
        &self,
        Parameters(params): Parameters<BibliographyExportParams>,
    ) -> String {
        info!("bibliography-export tool called");

        let format = if params.format.is_empty() {
            "bibtex".to_string()
        } else {
            params.format
        };
        if format.to_lowercase() != "bibtex" {
            return Self::render_error(format!(
                "unsupported format: {format} (only 'bibtex' is supported)"
            ));
        }

        let document_ids = if params.document_ids.is_empty() {
            match self.pipeline.store.list() {
                Ok(docs) => docs.into_iter().map(|d| d.document_id).collect(),
                Err(err) => return Self::render_error(err),
            }
        } else {
            params.document_ids
        };

        let mut entries = Vec::new();
        let mut missing_citekey = Vec::new();
        for doc_id in &document_ids {
            let metadata = match self.pipeline.store.metadata(doc_id) {
                Ok(metadata) => metadata,
                Err(err) => {
                    return Self::render_error(format!("failed to get metadata for {doc_id}: {err}"));
                }
            };
            if metadata.citekey.is_empty() {
                missing_citekey.push(doc_id.clone());
                continue;
            }
            entries.push(generate_bibtex_entry(&(&metadata).into(), &metadata.citekey));
        }

        let content = generate_bibtex_file(&entries);
        info!(
            entries = entries.len(),
            missing = missing_citekey.len(),
            "bibliography-export complete"
        );
        serde_json::to_string_pretty(&json!({
            "format": format,
            "content": content,
            "document_count": entries.len(),
            "missing_citekey": missing_citekey,
        }))
        .unwrap_or_default()
    }
}

// ── Resource surface ────────────────────────────────────────────────────

fn resource_error(err: ResourceError) -> McpError {
    match err {
        ResourceError::BadRequest(msg) => McpError::invalid_params(msg, None),
        ResourceError::NotFound(msg) => McpError::resource_not_found(msg, None),
        ResourceError::Internal(msg) => McpError::internal_error(msg, None),
    }
}

#[tool_handler]
impl ServerHandler for LecternServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "lectern turns academic documents (PDF, HTML, Markdown, text) into a \
                 queryable knowledge base. Parse documents with document-parse, enrich \
                 them with document-summarize and document-quotations, and read stored \
                 fragments through pdf:// resources."
                    .into(),
            ),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let documents = self
            .pipeline
            .store
            .list()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let mut resources = Vec::new();
        for doc in documents {
            let title = if doc.title.is_empty() {
                doc.document_id.clone()
            } else {
                doc.title.clone()
            };
            for (suffix, label, description) in [
                ("", "Document", "Parsed document: metadata, counts, and sub-resources"),
                ("/metadata", "Metadata", "Title, authors, DOI, abstract and bibliographic fields"),
                ("/pages", "All Pages", "Every page with its display label and content"),
            ] {
                let mut raw = RawResource::new(
                    format!("pdf://{}{suffix}", doc.document_id),
                    format!("{title} ({label})"),
                );
                raw.description = Some(description.to_string());
                raw.mime_type = Some("application/json".to_string());
                resources.push(raw.no_annotation());
            }
        }
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
        })
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = [
            ("pdf://{documentId}", "document", "Document summary with metadata, counts, and available sub-resources"),
            ("pdf://{documentId}/metadata", "document-metadata", "Document metadata"),
            ("pdf://{documentId}/pages", "document-pages", "All pages of the document"),
            ("pdf://{documentId}/pages/{pageLabel}", "document-page", "A page by its display label (e.g. 125 or iv)"),
            ("pdf://{documentId}/references", "document-references", "All bibliographic references"),
            ("pdf://{documentId}/references/{index}", "document-reference", "A reference by 0-based index"),
            ("pdf://{documentId}/images", "document-images", "All image captions and descriptions"),
            ("pdf://{documentId}/images/{index}", "document-image", "An image by 0-based index"),
            ("pdf://{documentId}/tables", "document-tables", "All tables"),
            ("pdf://{documentId}/tables/{index}", "document-table", "A table by 0-based index"),
            ("pdf://{documentId}/footnotes", "document-footnotes", "All footnotes"),
            ("pdf://{documentId}/footnotes/{index}", "document-footnote", "A footnote by 0-based index"),
            ("pdf://{documentId}/endnotes", "document-endnotes", "All endnotes"),
            ("pdf://{documentId}/endnotes/{index}", "document-endnote", "An endnote by 0-based index"),
            ("pdf://{documentId}/quotations", "document-quotations", "All extracted quotations"),
            ("pdf://{documentId}/quotations/{index}", "document-quotation", "A quotation by 0-based index"),
        ];
        Ok(ListResourceTemplatesResult {
            resource_templates: templates
                .into_iter()
                .map(|(uri_template, name, description)| {
                    RawResourceTemplate {
                        uri_template: uri_template.to_string(),
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        mime_type: Some("application/json".to_string()),
                    }
                    .no_annotation()
                })
                .collect(),
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let content =
            read_resource(&self.pipeline.store, &uri).map_err(resource_error)?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri,
                mime_type: Some("application/json".to_string()),
                text: content,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_document_params_become_one_input() {
        let params = DocumentToolParams {
            url: "https://example.org/a.pdf".into(),
            ..Default::default()
        };
        let inputs = params.into_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].url, "https://example.org/a.pdf");
    }

    #[test]
    fn batch_field_overrides_inline_fields() {
        let params = DocumentToolParams {
            url: "ignored".into(),
            documents: Some(vec![
                DocumentInput {
                    zotero_id: "A".into(),
                    ..Default::default()
                },
                DocumentInput {
                    zotero_id: "B".into(),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        let inputs = params.into_inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].zotero_id, "A");
    }

    #[test]
    fn build_request_decodes_base64() {
        let input = DocumentInput {
            raw_data: Some(BASE64.encode(b"%PDF-1.4")),
            ..Default::default()
        };
        let request = build_request(&input).unwrap();
        assert_eq!(request.raw_data.unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn build_request_rejects_bad_base64() {
        let input = DocumentInput {
            raw_data: Some("not base64!!!".into()),
            ..Default::default()
        };
        assert!(matches!(build_request(&input), Err(Error::BadInput(_))));
    }

    #[test]
    fn build_request_parses_doc_type() {
        let input = DocumentInput {
            url: "https://example.org/x".into(),
            doc_type: Some("html".into()),
            ..Default::default()
        };
        let request = build_request(&input).unwrap();
        assert_eq!(request.doc_type, Some(DocumentType::Html));
    }

    #[test]
    fn build_request_rejects_unknown_doc_type() {
        let input = DocumentInput {
            doc_type: Some("epub".into()),
            ..Default::default()
        };
        assert!(matches!(build_request(&input), Err(Error::BadInput(_))));
    }

    #[test]
    fn parse_row_counts_children() {
        let mut document = ParsedDocument::default();
        document.metadata.title = "T".into();
        document.pages = vec!["a".into(), "b".into()];
        document.page_numbers = vec!["1".into(), "2".into()];
        let row = parse_row("data_x".into(), &document);
        assert_eq!(row.document_id, "data_x");
        assert_eq!(row.page_count, 2);
        assert!(row.resource_paths.contains(&"pdf://data_x/pages".to_string()));
    }
}
