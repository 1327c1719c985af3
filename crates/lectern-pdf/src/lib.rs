//! PDF splitting.
//!
//! The rest of the pipeline never touches PDF internals: this crate takes
//! a document's bytes and hands back one standalone single-page PDF per
//! page, in order. Downstream components only ever see byte buffers.

use lopdf::Document;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    /// The input failed to load or validate as a PDF.
    #[error("malformed PDF: {0}")]
    Malformed(String),
    /// A page could not be rewritten into a standalone document.
    #[error("failed to extract page {page}: {reason}")]
    PageExtraction { page: u32, reason: String },
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Number of pages in the document, validating it along the way.
pub fn page_count(data: &[u8]) -> Result<usize> {
    let doc = load(data)?;
    Ok(doc.get_pages().len())
}

/// Split a PDF into standalone single-page documents, in page order.
///
/// A zero-page document yields an empty vector. Each returned buffer is a
/// complete PDF containing exactly one page of the original.
pub fn split_pages(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let doc = load(data)?;
    let total = doc.get_pages().len() as u32;
    if total == 0 {
        return Ok(Vec::new());
    }

    let mut pages = Vec::with_capacity(total as usize);
    for page_num in 1..=total {
        pages.push(extract_single_page(&doc, page_num, total)?);
    }
    Ok(pages)
}

fn load(data: &[u8]) -> Result<Document> {
    Document::load_mem(data).map_err(|e| PdfError::Malformed(e.to_string()))
}

/// Rewrite the document with every page except `page_num` deleted, then
/// prune unreferenced objects so page buffers stay small.
fn extract_single_page(doc: &Document, page_num: u32, total: u32) -> Result<Vec<u8>> {
    let mut single = doc.clone();

    let delete: Vec<u32> = (1..=total).filter(|&n| n != page_num).collect();
    single.delete_pages(&delete);
    single.prune_objects();
    single.renumber_objects();

    let mut buf = Vec::new();
    single
        .save_to(&mut buf)
        .map_err(|e| PdfError::PageExtraction {
            page: page_num,
            reason: e.to_string(),
        })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use lopdf::{Object, Stream};

    /// Build a minimal n-page PDF in memory.
    fn make_pdf(n: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(n);
        for i in 0..n {
            let content = Stream::new(
                dictionary! {},
                format!("BT /F1 12 Tf 72 720 Td (page {}) Tj ET", i + 1).into_bytes(),
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

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(&make_pdf(3)).unwrap(), 3);
        assert_eq!(page_count(&make_pdf(1)).unwrap(), 1);
    }

    #[test]
    fn split_produces_one_buffer_per_page() {
        let pdf = make_pdf(4);
        let pages = split_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 4);
        for page in &pages {
            assert!(page.starts_with(b"%PDF"));
            assert_eq!(page_count(page).unwrap(), 1);
        }
    }

    #[test]
    fn split_preserves_page_order() {
        let pdf = make_pdf(3);
        let pages = split_pages(&pdf).unwrap();
        for (i, page) in pages.iter().enumerate() {
            let needle = format!("page {}", i + 1);
            let text = String::from_utf8_lossy(page);
            assert!(text.contains(&needle), "buffer {i} missing '{needle}'");
        }
    }

    #[test]
    fn malformed_input_rejected() {
        let err = split_pages(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Malformed(_)));
    }

    #[test]
    fn empty_input_rejected() {
        assert!(matches!(split_pages(b""), Err(PdfError::Malformed(_))));
    }
}
