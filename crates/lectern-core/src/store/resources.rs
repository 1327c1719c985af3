//! Resource-path catalog for a stored document.

use crate::models::ParsedDocument;

/// All resource URIs a document answers to, based on which children it
/// actually has. Placeholders in braces mark the templated forms.
pub fn resource_paths(doc_id: &str, document: &ParsedDocument) -> Vec<String> {
    let mut paths = vec![
        format!("pdf://{doc_id}"),
        format!("pdf://{doc_id}/metadata"),
        format!("pdf://{doc_id}/pages"),
    ];

    if let (Some(first), Some(last)) =
        (document.page_numbers.first(), document.page_numbers.last())
    {
        paths.push(format!("pdf://{doc_id}/pages/{first}"));
        paths.push(format!("pdf://{doc_id}/pages/{last}"));
    }
    paths.push(format!("pdf://{doc_id}/pages/{{sourcePageNumber}}"));

    if !document.references.is_empty() {
        paths.push(format!("pdf://{doc_id}/references"));
        paths.push(format!("pdf://{doc_id}/references/{{refIndex}}"));
    }
    if !document.images.is_empty() {
        paths.push(format!("pdf://{doc_id}/images"));
        paths.push(format!("pdf://{doc_id}/images/{{imageIndex}}"));
    }
    if !document.tables.is_empty() {
        paths.push(format!("pdf://{doc_id}/tables"));
        paths.push(format!("pdf://{doc_id}/tables/{{tableIndex}}"));
    }
    if !document.footnotes.is_empty() {
        paths.push(format!("pdf://{doc_id}/footnotes"));
        paths.push(format!("pdf://{doc_id}/footnotes/{{footnoteIndex}}"));
    }
    if !document.endnotes.is_empty() {
        paths.push(format!("pdf://{doc_id}/endnotes"));
        paths.push(format!("pdf://{doc_id}/endnotes/{{endnoteIndex}}"));
    }
    if !document.quotations.is_empty() {
        paths.push(format!("pdf://{doc_id}/quotations"));
        paths.push(format!("pdf://{doc_id}/quotations/{{quotationIndex}}"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quotation, Reference};

    #[test]
    fn minimal_document_gets_core_paths() {
        let doc = ParsedDocument::default();
        let paths = resource_paths("data_abc", &doc);
        assert!(paths.contains(&"pdf://data_abc".to_string()));
        assert!(paths.contains(&"pdf://data_abc/metadata".to_string()));
        assert!(paths.contains(&"pdf://data_abc/pages".to_string()));
        assert!(!paths.iter().any(|p| p.contains("/references")));
    }

    #[test]
    fn page_samples_use_first_and_last_labels() {
        let doc = ParsedDocument {
            pages: vec!["a".into(), "b".into(), "c".into()],
            page_numbers: vec!["125".into(), "126".into(), "127".into()],
            ..Default::default()
        };
        let paths = resource_paths("d", &doc);
        assert!(paths.contains(&"pdf://d/pages/125".to_string()));
        assert!(paths.contains(&"pdf://d/pages/127".to_string()));
    }

    #[test]
    fn child_paths_only_when_present() {
        let doc = ParsedDocument {
            references: vec![Reference::default()],
            quotations: vec![Quotation::default()],
            ..Default::default()
        };
        let paths = resource_paths("d", &doc);
        assert!(paths.contains(&"pdf://d/references".to_string()));
        assert!(paths.contains(&"pdf://d/quotations".to_string()));
        assert!(!paths.iter().any(|p| p.contains("/images")));
        assert!(!paths.iter().any(|p| p.contains("/tables")));
    }
}
