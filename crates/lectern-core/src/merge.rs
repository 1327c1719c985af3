//! Metadata merging.
//!
//! External (reference-manager) metadata wins over model-extracted
//! metadata wherever both exist. The long tail of bibliographic fields
//! (publisher, volume, ISSN, ...) is taken from the external record only;
//! model extraction of those is too unreliable to ever prefer.

use crate::models::{Metadata, MetadataSource};

/// Merge external and extracted metadata under the fixed precedence.
pub fn merge_metadata(external: Option<&Metadata>, extracted: Option<&Metadata>) -> Metadata {
    match (external, extracted) {
        (None, None) => Metadata {
            metadata_source: MetadataSource::None,
            ..Default::default()
        },
        (None, Some(extracted)) => Metadata {
            metadata_source: MetadataSource::Extracted,
            ..extracted.clone()
        },
        (Some(external), None) => Metadata {
            metadata_source: MetadataSource::External,
            ..external.clone()
        },
        (Some(external), Some(extracted)) => {
            let pick = |ext: &str, fallback: &str| {
                if ext.is_empty() { fallback } else { ext }.to_string()
            };
            Metadata {
                title: pick(&external.title, &extracted.title),
                authors: if external.authors.is_empty() {
                    extracted.authors.clone()
                } else {
                    external.authors.clone()
                },
                publication_date: pick(&external.publication_date, &extracted.publication_date),
                publication: pick(&external.publication, &extracted.publication),
                doi: pick(&external.doi, &extracted.doi),
                abstract_text: pick(&external.abstract_text, &extracted.abstract_text),
                // External only from here down.
                item_type: external.item_type.clone(),
                publisher: external.publisher.clone(),
                volume: external.volume.clone(),
                issue: external.issue.clone(),
                pages: external.pages.clone(),
                issn: external.issn.clone(),
                isbn: external.isbn.clone(),
                url: external.url.clone(),
                citekey: String::new(),
                metadata_source: MetadataSource::Merged,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external() -> Metadata {
        Metadata {
            title: "External Title".into(),
            authors: vec!["Smith, John".into()],
            publication_date: "2020".into(),
            publication: "Journal".into(),
            doi: "10.1/ext".into(),
            abstract_text: "external abstract".into(),
            item_type: "journalArticle".into(),
            publisher: "Pub".into(),
            volume: "12".into(),
            issue: "3".into(),
            pages: "1-10".into(),
            issn: "1234-5678".into(),
            isbn: "".into(),
            url: "https://example.org".into(),
            metadata_source: MetadataSource::External,
            ..Default::default()
        }
    }

    fn extracted() -> Metadata {
        Metadata {
            title: "Extracted Title".into(),
            authors: vec!["Doe, Jane".into()],
            publication_date: "2019".into(),
            publication: "Other Journal".into(),
            doi: "10.1/llm".into(),
            abstract_text: "extracted abstract".into(),
            // An extracted record never carries these, but make sure the
            // merge ignores them even if it did.
            publisher: "WrongPub".into(),
            volume: "99".into(),
            metadata_source: MetadataSource::Extracted,
            ..Default::default()
        }
    }

    #[test]
    fn external_wins_when_both_present() {
        let merged = merge_metadata(Some(&external()), Some(&extracted()));
        assert_eq!(merged.title, "External Title");
        assert_eq!(merged.authors, vec!["Smith, John"]);
        assert_eq!(merged.doi, "10.1/ext");
        assert_eq!(merged.metadata_source, MetadataSource::Merged);
    }

    #[test]
    fn extracted_fills_empty_external_fields() {
        let mut ext = external();
        ext.title = String::new();
        ext.abstract_text = String::new();
        let merged = merge_metadata(Some(&ext), Some(&extracted()));
        assert_eq!(merged.title, "Extracted Title");
        assert_eq!(merged.abstract_text, "extracted abstract");
        // Non-empty external fields still win.
        assert_eq!(merged.publication, "Journal");
    }

    #[test]
    fn tail_fields_come_from_external_only() {
        let merged = merge_metadata(Some(&external()), Some(&extracted()));
        assert_eq!(merged.publisher, "Pub");
        assert_eq!(merged.volume, "12");
        assert_eq!(merged.pages, "1-10");

        let mut ext = external();
        ext.publisher = String::new();
        ext.volume = String::new();
        let merged = merge_metadata(Some(&ext), Some(&extracted()));
        // Even empty, the extracted side never supplies these.
        assert_eq!(merged.publisher, "");
        assert_eq!(merged.volume, "");
    }

    #[test]
    fn only_external() {
        let merged = merge_metadata(Some(&external()), None);
        assert_eq!(merged.title, "External Title");
        assert_eq!(merged.metadata_source, MetadataSource::External);
    }

    #[test]
    fn only_extracted() {
        let merged = merge_metadata(None, Some(&extracted()));
        assert_eq!(merged.title, "Extracted Title");
        assert_eq!(merged.metadata_source, MetadataSource::Extracted);
    }

    #[test]
    fn neither() {
        let merged = merge_metadata(None, None);
        assert_eq!(merged.metadata_source, MetadataSource::None);
        assert!(merged.title.is_empty());
    }
}
