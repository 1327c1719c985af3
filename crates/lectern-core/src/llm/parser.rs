//! Type-dispatched document parsing.
//!
//! PDFs split into pages and fan out through the rate governor; HTML is
//! preprocessed to Markdown and handed to the text path; Markdown and
//! plain text go to the model in a single call. Every path produces the
//! same `ParsedDocument` shape so the callers never branch on format.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::llm::numbering::validate_page_numbers;
use crate::llm::openai::{LanguageModel, LlmRequest};
use crate::llm::{prompts, schema};
use crate::models::{DocumentData, DocumentType, ParsedDocument, ParsedPage};
use crate::pool::parallel_process;
use crate::rate_limit::{
    ESTIMATED_TOKENS_PER_PAGE, RateGovernor, estimate_tokens, rate_limited_call,
};
use crate::{Error, Result};

/// Rough context-window ceiling for single-call text parsing.
const TEXT_TOKEN_LIMIT: u32 = 400_000;
/// Approximate size of the instruction prefix.
const PROMPT_TOKEN_ESTIMATE: u32 = 500;

/// Parse a document of any supported type into a [`ParsedDocument`].
pub async fn parse_document(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    data: DocumentData,
    cancel: &CancellationToken,
) -> Result<ParsedDocument> {
    info!(doc_type = %data.doc_type, bytes = data.data.len(), "parsing document");
    match data.doc_type {
        DocumentType::Pdf => parse_pdf(model, governor, data.data, cancel).await,
        DocumentType::Html => {
            let original_len = data.data.len();
            let markdown = crate::html::preprocess_html(&data.data)?;
            info!(
                html_bytes = original_len,
                markdown_bytes = markdown.len(),
                "converted HTML to markdown"
            );
            parse_text(model, governor, markdown, cancel).await
        }
        DocumentType::Md | DocumentType::Txt => {
            let content = String::from_utf8_lossy(&data.data).into_owned();
            parse_text(model, governor, content, cancel).await
        }
        other => Err(Error::Unsupported(other.to_string())),
    }
}

async fn parse_pdf(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    data: Vec<u8>,
    cancel: &CancellationToken,
) -> Result<ParsedDocument> {
    let pages = tokio::task::spawn_blocking(move || lectern_pdf::split_pages(&data))
        .await
        .map_err(|e| Error::Malformed(format!("page split task failed: {e}")))??;

    info!(pages = pages.len(), "processing PDF pages in parallel");
    if pages.is_empty() {
        return Ok(ParsedDocument::default());
    }

    let shared_model = model.clone();
    let shared_governor = governor.clone();
    let shared_cancel = cancel.clone();
    let parsed: Vec<ParsedPage> = parallel_process(
        &governor.pool,
        pages,
        cancel,
        move |index, page_bytes| {
            let model = shared_model.clone();
            let governor = shared_governor.clone();
            let cancel = shared_cancel.clone();
            async move {
                debug!(page = index + 1, "requesting structured parse");
                let request = LlmRequest::text(prompts::PDF_PAGE_PROMPT)
                    .with_pdf("page.pdf", page_bytes)
                    .with_schema("parsed_page", schema::parsed_page_schema());
                let output = rate_limited_call(
                    &governor.bucket,
                    ESTIMATED_TOKENS_PER_PAGE,
                    &cancel,
                    || model.generate(&request),
                )
                .await?;
                serde_json::from_str::<ParsedPage>(&output).map_err(|e| {
                    Error::Malformed(format!("page {} violates the output schema: {e}", index + 1))
                })
            }
        },
    )
    .await?;

    let page_numbers = validate_page_numbers(&parsed);
    Ok(stitch(parsed, page_numbers))
}

/// Combine per-page results into one document: first non-empty value per
/// metadata field, pages and child sequences concatenated in order.
fn stitch(pages: Vec<ParsedPage>, page_numbers: Vec<String>) -> ParsedDocument {
    let mut doc = ParsedDocument {
        page_numbers,
        ..Default::default()
    };

    for page in pages {
        let meta = &mut doc.metadata;
        let page_meta = page.metadata;
        if meta.title.is_empty() && !page_meta.title.is_empty() {
            meta.title = page_meta.title;
        }
        if meta.authors.is_empty() && !page_meta.authors.is_empty() {
            meta.authors = page_meta.authors;
        }
        if meta.publication_date.is_empty() && !page_meta.publication_date.is_empty() {
            meta.publication_date = page_meta.publication_date;
        }
        if meta.publication.is_empty() && !page_meta.publication.is_empty() {
            meta.publication = page_meta.publication;
        }
        if meta.doi.is_empty() && !page_meta.doi.is_empty() {
            meta.doi = page_meta.doi;
        }
        if meta.abstract_text.is_empty() && !page_meta.abstract_text.is_empty() {
            meta.abstract_text = page_meta.abstract_text;
        }

        doc.pages.push(page.content);
        doc.references.extend(page.references);
        doc.images.extend(page.images);
        doc.tables.extend(page.tables);
        doc.footnotes.extend(page.footnotes);
        doc.endnotes.extend(page.endnotes);
    }
    doc
}

async fn parse_text(
    model: &Arc<dyn LanguageModel>,
    governor: &Arc<RateGovernor>,
    content: String,
    cancel: &CancellationToken,
) -> Result<ParsedDocument> {
    let content_tokens = estimate_tokens(&content);
    let total_tokens = content_tokens + PROMPT_TOKEN_ESTIMATE;
    if total_tokens > TEXT_TOKEN_LIMIT {
        warn!(
            estimated = total_tokens,
            limit = TEXT_TOKEN_LIMIT,
            "document may exceed the model context window"
        );
    }

    let prompt = format!("{}{}", prompts::TEXT_DOCUMENT_PROMPT, content);
    let request = LlmRequest::text(prompt)
        .with_schema("parsed_text_document", schema::parsed_page_schema());
    let output = rate_limited_call(&governor.bucket, total_tokens, cancel, || {
        model.generate(&request)
    })
    .await?;

    let page: ParsedPage = serde_json::from_str(&output)
        .map_err(|e| Error::Malformed(format!("text document violates the output schema: {e}")))?;

    Ok(ParsedDocument {
        metadata: page.metadata,
        pages: vec![page.content],
        page_numbers: vec!["1".to_string()],
        references: page.references,
        images: page.images,
        tables: page.tables,
        footnotes: page.footnotes,
        endnotes: page.endnotes,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::{MockModel, MockResponse};
    use serde_json::json;

    fn governor() -> Arc<RateGovernor> {
        Arc::new(RateGovernor::new())
    }

    fn page_json(content: &str, title: &str, label: &str, confidence: f64) -> String {
        json!({
            "metadata": {"title": title, "authors": [], "publication_date": "",
                          "publication": "", "doi": "", "abstract": ""},
            "content": content,
            "references": [{"reference_text": format!("ref from {content}"), "doi": ""}],
            "images": [], "tables": [], "footnotes": [], "endnotes": [],
            "page_number_info": {"page_number": label, "confidence": confidence,
                                  "location": "footer", "page_range_info": ""}
        })
        .to_string()
    }

    /// Minimal n-page PDF; each page's content stream names its position.
    fn make_pdf(n: usize) -> Vec<u8> {
        use lopdf::{Document, Object, Stream, dictionary};
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for i in 0..n {
            let content = Stream::new(
                dictionary! {},
                format!("BT (marker-{}) Tj ET", i + 1).into_bytes(),
            );
            let content_id = doc.add_object(content);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => n as i64,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Which page is this request for? The marker travels in the page's
    /// content stream, so it survives the split.
    fn page_index_of(request: &LlmRequest) -> usize {
        let data = &request.file.as_ref().expect("page file attached").data;
        let text = String::from_utf8_lossy(data);
        for i in 1..=64 {
            if text.contains(&format!("marker-{i}")) {
                return i;
            }
        }
        panic!("no page marker found");
    }

    #[tokio::test]
    async fn pdf_pages_stitch_in_document_order() {
        let mock = MockModel::new().with_responder(|request| {
            let i = page_index_of(request);
            // First page carries the title; labels 11, 12, 13.
            let title = if i == 1 { "The Title" } else { "" };
            Ok(page_json(
                &format!("content {i}"),
                title,
                &(i + 10).to_string(),
                0.9,
            ))
        });
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: make_pdf(3),
            doc_type: DocumentType::Pdf,
        };
        let doc = parse_document(&model, &governor(), data, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(doc.pages, vec!["content 1", "content 2", "content 3"]);
        assert_eq!(doc.page_numbers, vec!["11", "12", "13"]);
        assert_eq!(doc.metadata.title, "The Title");
        assert_eq!(doc.references.len(), 3);
        assert_eq!(doc.references[0].reference_text, "ref from content 1");
    }

    #[tokio::test]
    async fn pdf_metadata_takes_first_non_empty_value() {
        let mock = MockModel::new().with_responder(|request| {
            let i = page_index_of(request);
            let title = match i {
                2 => "From Page Two",
                3 => "From Page Three",
                _ => "",
            };
            Ok(page_json("x", title, "", 0.0))
        });
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: make_pdf(3),
            doc_type: DocumentType::Pdf,
        };
        let doc = parse_document(&model, &governor(), data, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(doc.metadata.title, "From Page Two");
        // No confident labels anywhere: sequential fallback.
        assert_eq!(doc.page_numbers, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn pdf_page_error_fails_whole_parse() {
        let mock = MockModel::new().with_responder(|request| {
            if page_index_of(request) == 2 {
                Err(Error::Upstream("midway failure".into()))
            } else {
                Ok(page_json("x", "", "", 0.0))
            }
        });
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: make_pdf(3),
            doc_type: DocumentType::Pdf,
        };
        let result = parse_document(&model, &governor(), data, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn malformed_page_json_is_schema_violation() {
        let mock = MockModel::new();
        mock.set_fallback(MockResponse::Text("not json at all".into()));
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: make_pdf(1),
            doc_type: DocumentType::Pdf,
        };
        let result = parse_document(&model, &governor(), data, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::Malformed(_))));
    }

    #[tokio::test]
    async fn text_document_is_single_call_single_page() {
        let mock = MockModel::new();
        mock.push_text(page_json("# Parsed body", "Text Title", "", 0.0));
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: b"# Title\n\nSome markdown".to_vec(),
            doc_type: DocumentType::Md,
        };
        let doc = parse_document(&model, &governor(), data, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.page_numbers, vec!["1"]);
        assert_eq!(doc.metadata.title, "Text Title");
    }

    #[tokio::test]
    async fn text_prompt_embeds_the_content() {
        let mock = MockModel::new();
        mock.push_text(page_json("body", "", "", 0.0));
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: b"unique-sentinel-content".to_vec(),
            doc_type: DocumentType::Txt,
        };
        // Keep a handle on the mock through the trait object.
        let doc = parse_document(&model, &governor(), data, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(doc.pages, vec!["body"]);
    }

    #[tokio::test]
    async fn html_is_preprocessed_then_parsed_as_text() {
        let mock = MockModel::new().with_responder(|request| {
            assert!(
                !request.prompt.contains("<script>"),
                "script content leaked into the prompt"
            );
            assert!(request.prompt.contains("Visible text"));
            Ok(page_json("converted", "", "", 0.0))
        });
        let model: Arc<dyn LanguageModel> = Arc::new(mock);

        let data = DocumentData {
            data: b"<html><body><script>bad()</script><p>Visible text</p></body></html>".to_vec(),
            doc_type: DocumentType::Html,
        };
        let doc = parse_document(&model, &governor(), data, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(doc.pages, vec!["converted"]);
    }

    #[tokio::test]
    async fn docx_and_unknown_are_unsupported() {
        let model: Arc<dyn LanguageModel> = Arc::new(MockModel::new());
        for doc_type in [DocumentType::Docx, DocumentType::Unknown, DocumentType::Zip] {
            let data = DocumentData {
                data: vec![1, 2, 3],
                doc_type,
            };
            let result =
                parse_document(&model, &governor(), data, &CancellationToken::new()).await;
            assert!(matches!(result, Err(Error::Unsupported(_))), "{doc_type}");
        }
    }

    #[tokio::test]
    async fn malformed_pdf_bytes_rejected() {
        let model: Arc<dyn LanguageModel> = Arc::new(MockModel::new());
        let data = DocumentData {
            data: b"%PDF-but-not-really".to_vec(),
            doc_type: DocumentType::Pdf,
        };
        let result = parse_document(&model, &governor(), data, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::Malformed(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_page_calls_stay_within_pool_bound() {
        let mock = MockModel::new().with_delay(std::time::Duration::from_millis(20));
        mock.set_fallback(MockResponse::Text(page_json("x", "", "", 0.0)));
        // Peek at the high-water mark through a second Arc.
        let mock = Arc::new(mock);
        let model: Arc<dyn LanguageModel> = mock.clone();

        let governor = Arc::new(RateGovernor {
            bucket: crate::rate_limit::TokenBucket::new(1_000_000, 2_000_000),
            pool: crate::pool::WorkerPool::new(4),
        });

        let data = DocumentData {
            data: make_pdf(12),
            doc_type: DocumentType::Pdf,
        };
        parse_document(&model, &governor, data, &CancellationToken::new())
            .await
            .unwrap();

        assert!(mock.high_water_mark() <= 4);
        assert_eq!(mock.call_count(), 12);
    }
}
