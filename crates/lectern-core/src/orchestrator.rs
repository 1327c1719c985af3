//! The pipeline orchestrator: get-or-parse-or-augment.
//!
//! Every user-facing operation funnels through [`Pipeline::get_or_parse`]:
//! resolve bytes, compute the identity, and either load the stored
//! document or run the full parse once and persist it. The augmenting
//! operations wrap that with their own caching rule (an existing summary
//! or quotation set short-circuits) and re-store the whole document,
//! which the store's replace-upsert makes idempotent.
//!
//! Calls for distinct identities proceed in parallel; calls for the same
//! identity are not coordinated here. A duplicate parse wastes model
//! work but cannot corrupt state: the last writer wins over identical
//! content.

use std::collections::HashSet;
use std::sync::Arc;

use lectern_citations::generate_citekey;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm::{self, LanguageModel, enrich};
use crate::models::{DocumentType, ParsedDocument, SourceInfo};
use crate::rate_limit::RateGovernor;
use crate::store::SqliteStore;
use crate::{Error, Result, fetch, identity, merge};

/// Default cap on extracted quotations.
pub const DEFAULT_MAX_QUOTATIONS: usize = 10;

/// One document to process: at most one source plus an optional type
/// override.
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    pub zotero_id: String,
    pub url: String,
    pub raw_data: Option<Vec<u8>>,
    pub doc_type: Option<DocumentType>,
}

impl DocumentRequest {
    pub fn source_info(&self) -> SourceInfo {
        SourceInfo {
            zotero_id: self.zotero_id.clone(),
            url: self.url.clone(),
        }
    }
}

/// Result of an augmenting operation. `warning` is set when the
/// augmented document could not be re-stored; the in-memory result is
/// still valid.
#[derive(Debug)]
pub struct AugmentOutcome {
    pub document_id: String,
    pub document: ParsedDocument,
    pub warning: Option<String>,
}

/// Shared state for the whole document pipeline. Constructed once at
/// startup; everything inside is safe to use from concurrent operations.
pub struct Pipeline {
    pub config: Config,
    http: reqwest::Client,
    pub store: Arc<SqliteStore>,
    model: Arc<dyn LanguageModel>,
    governor: Arc<RateGovernor>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        store: Arc<SqliteStore>,
        model: Arc<dyn LanguageModel>,
        governor: Arc<RateGovernor>,
    ) -> Self {
        Pipeline {
            config,
            http: reqwest::Client::new(),
            store,
            model,
            governor,
        }
    }

    /// Return the stored document for this request's identity, parsing
    /// and persisting it first if this is the first time the identity is
    /// seen.
    pub async fn get_or_parse(
        &self,
        request: &DocumentRequest,
        cancel: &CancellationToken,
    ) -> Result<(String, ParsedDocument)> {
        let source = request.source_info();
        let (data, external) = fetch::resolve(
            &self.http,
            &self.config,
            &source,
            request.raw_data.as_deref(),
            request.doc_type,
            cancel,
        )
        .await?;

        let doc_id = identity::document_id(&source, &data.data);

        if self.store.exists(&doc_id)? {
            info!(doc_id, "document already parsed, loading from store");
            return Ok((doc_id.clone(), self.store.document(&doc_id)?));
        }

        info!(doc_id, doc_type = %data.doc_type, "parsing new document");
        let mut document = llm::parse_document(&self.model, &self.governor, data, cancel).await?;
        document.metadata = merge::merge_metadata(external.as_ref(), Some(&document.metadata));

        if document.metadata.citekey.is_empty() {
            let existing: HashSet<String> = self.store.citekey_map()?.into_values().collect();
            document.metadata.citekey =
                generate_citekey(&(&document.metadata).into(), &existing);
        }

        self.store.store_document(&doc_id, &document, &source)?;
        info!(
            doc_id,
            pages = document.pages.len(),
            citekey = %document.metadata.citekey,
            "parsed and stored document"
        );
        Ok((doc_id, document))
    }

    /// Summarize a document, parsing it first if needed. An existing
    /// summary is returned unchanged without touching the model.
    pub async fn summarize(
        &self,
        request: &DocumentRequest,
        cancel: &CancellationToken,
    ) -> Result<AugmentOutcome> {
        let (document_id, mut document) = self.get_or_parse(request, cancel).await?;

        if !document.summary.is_empty() {
            info!(doc_id = %document_id, "returning cached summary");
            return Ok(AugmentOutcome {
                document_id,
                document,
                warning: None,
            });
        }

        document.summary =
            enrich::summarize_document(&self.model, &self.governor, &document, cancel).await?;
        let warning = self.persist_augmented(&document_id, &document, &request.source_info());
        Ok(AugmentOutcome {
            document_id,
            document,
            warning,
        })
    }

    /// Extract quotations, parsing and summarizing first as needed. An
    /// existing quotation set is returned unchanged. `max_quotations` of
    /// `None` or a negative value means the default; 0 means unlimited.
    pub async fn quotations(
        &self,
        request: &DocumentRequest,
        max_quotations: Option<i64>,
        cancel: &CancellationToken,
    ) -> Result<AugmentOutcome> {
        let max = normalize_max_quotations(max_quotations);
        let (document_id, mut document) = self.get_or_parse(request, cancel).await?;

        if !document.quotations.is_empty() {
            info!(
                doc_id = %document_id,
                count = document.quotations.len(),
                "returning cached quotations"
            );
            return Ok(AugmentOutcome {
                document_id,
                document,
                warning: None,
            });
        }

        // The summary feeds the quotation prompts; same caching rule.
        if document.summary.is_empty() {
            document.summary =
                enrich::summarize_document(&self.model, &self.governor, &document, cancel).await?;
        }

        let summary = document.summary.clone();
        document.quotations = enrich::extract_quotations(
            &self.model,
            &self.governor,
            &document,
            &summary,
            max,
            cancel,
        )
        .await?;

        let warning = self.persist_augmented(&document_id, &document, &request.source_info());
        Ok(AugmentOutcome {
            document_id,
            document,
            warning,
        })
    }

    /// Re-store an augmented document. Failure degrades to a warning;
    /// the caller still gets the in-memory result.
    fn persist_augmented(
        &self,
        doc_id: &str,
        document: &ParsedDocument,
        source: &SourceInfo,
    ) -> Option<String> {
        match self.store.store_document(doc_id, document, source) {
            Ok(()) => None,
            Err(err) => {
                warn!(doc_id, error = %err, "failed to persist augmented document");
                Some(format!("result generated but not stored: {err}"))
            }
        }
    }

    /// Delete a stored document.
    pub fn delete(&self, doc_id: &str) -> Result<()> {
        self.store.delete(doc_id).map_err(Error::from)
    }
}

fn normalize_max_quotations(max: Option<i64>) -> usize {
    match max {
        None => DEFAULT_MAX_QUOTATIONS,
        Some(n) if n < 0 => DEFAULT_MAX_QUOTATIONS,
        Some(n) => n as usize,
    }
}
