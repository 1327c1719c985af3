//! Summary and quotation enrichment.
//!
//! Both operate on an already-parsed document. Quotation extraction runs
//! per page for paginated documents so every quotation carries a real
//! display label, and over the whole text otherwise. When more
//! quotations come back than asked for, a second model pass picks the
//! most significant ones without rewriting them.

use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::llm::openai::{LanguageModel, LlmRequest};
use crate::llm::{prompts, schema};
use crate::models::{ParsedDocument, Quotation};
use crate::pool::parallel_process;
use crate::rate_limit::{RateGovernor, estimate_tokens, rate_limited_call};
use crate::{Error, Result};

#[derive(Deserialize)]
struct QuotationsPayload {
    #[serde(default)]
    quotations: Vec<Quotation>,
}

/// Generate a 1-3 paragraph summary over the document's full text.
pub async fn summarize_document(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    document: &ParsedDocument,
    cancel: &CancellationToken,
) -> Result<String> {
    info!(title = %document.metadata.title, "generating summary");
    let full_text = document.pages.join("\n");
    let prompt = format!("{}{}", prompts::SUMMARY_PROMPT, full_text);
    let tokens = estimate_tokens(&prompt);
    let request = LlmRequest::text(prompt);
    rate_limited_call(&governor.bucket, tokens, cancel, || model.generate(&request)).await
}

/// Extract representative quotations, using `summary` as context.
///
/// `max_quotations` of 0 means unlimited. When the extracted set exceeds
/// the limit, the prioritization pass trims it; if that pass fails, the
/// full set is returned rather than failing the operation.
pub async fn extract_quotations(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    document: &ParsedDocument,
    summary: &str,
    max_quotations: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Quotation>> {
    let paginated = document
        .page_numbers
        .first()
        .is_some_and(|label| !label.is_empty());

    let quotations = if paginated {
        info!(pages = document.pages.len(), "extracting quotations per page");
        extract_from_pages(model, governor, document, summary, cancel).await?
    } else {
        info!("extracting quotations from full text");
        extract_from_full_text(model, governor, document, summary, cancel).await?
    };

    if max_quotations > 0 && quotations.len() > max_quotations {
        info!(
            found = quotations.len(),
            keeping = max_quotations,
            "prioritizing quotations"
        );
        match prioritize(model, governor, document, summary, &quotations, max_quotations, cancel)
            .await
        {
            Ok(selected) => return Ok(selected),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                warn!(error = %err, "prioritization failed, returning all quotations");
                return Ok(quotations);
            }
        }
    }
    Ok(quotations)
}

async fn extract_from_pages(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    document: &ParsedDocument,
    summary: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Quotation>> {
    let title = document.metadata.title.clone();
    let summary = summary.to_string();
    let items: Vec<(String, String)> = document
        .pages
        .iter()
        .cloned()
        .zip(document.page_numbers.iter().cloned())
        .collect();

    let shared_model = model.clone();
    let shared_governor = governor.clone();
    let shared_cancel = cancel.clone();
    let per_page = parallel_process(
        &governor.pool,
        items,
        cancel,
        move |_, (content, label)| {
            let model = shared_model.clone();
            let governor = shared_governor.clone();
            let cancel = shared_cancel.clone();
            let title = title.clone();
            let summary = summary.clone();
            async move {
                let prompt = prompts::page_quotations_prompt(&label, &summary, &title, &content);
                let tokens = estimate_tokens(&prompt);
                let request = LlmRequest::text(prompt)
                    .with_schema("quotations", schema::quotations_schema());
                let output = rate_limited_call(&governor.bucket, tokens, &cancel, || {
                    model.generate(&request)
                })
                .await?;
                let payload: QuotationsPayload = serde_json::from_str(&output).map_err(|e| {
                    Error::Malformed(format!("quotations response violates the schema: {e}"))
                })?;
                Ok(payload.quotations)
            }
        },
    )
    .await?;

    Ok(per_page.into_iter().flatten().collect())
}

async fn extract_from_full_text(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    document: &ParsedDocument,
    summary: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Quotation>> {
    let full_text = document.pages.join("\n");
    let prompt =
        prompts::full_text_quotations_prompt(summary, &document.metadata.title, &full_text);
    let tokens = estimate_tokens(&prompt);
    let request = LlmRequest::text(prompt).with_schema("quotations", schema::quotations_schema());
    let output =
        rate_limited_call(&governor.bucket, tokens, cancel, || model.generate(&request)).await?;
    let payload: QuotationsPayload = serde_json::from_str(&output)
        .map_err(|e| Error::Malformed(format!("quotations response violates the schema: {e}")))?;
    Ok(payload.quotations)
}

async fn prioritize(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    document: &ParsedDocument,
    summary: &str,
    quotations: &[Quotation],
    max_quotations: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Quotation>> {
    let quotations_json = serde_json::to_string_pretty(quotations)
        .map_err(|e| Error::Malformed(format!("failed to encode quotations: {e}")))?;
    let prompt = prompts::prioritize_quotations_prompt(
        max_quotations,
        &document.metadata.title,
        summary,
        &quotations_json,
    );
    let tokens = estimate_tokens(&prompt);
    let request =
        LlmRequest::text(prompt).with_schema("prioritized_quotations", schema::quotations_schema());
    let output =
        rate_limited_call(&governor.bucket, tokens, cancel, || model.generate(&request)).await?;
    let payload: QuotationsPayload = serde_json::from_str(&output)
        .map_err(|e| Error::Malformed(format!("prioritization response violates the schema: {e}")))?;
    Ok(payload.quotations)
}
