//! The document data model.
//!
//! A tree rooted at [`ParsedDocument`]: one metadata record plus ordered
//! sequences of pages, references, images, tables, footnotes, endnotes and
//! quotations. Child rows refer to the root by document id only; there are
//! no back-pointers. Serde field names double as the wire contract with
//! the language model's unified schema.

use serde::{Deserialize, Serialize};

/// Aggregate root for a parsed document. Core fields are immutable once
/// stored; `summary` and `quotations` are added later by the augmenting
/// operations through an idempotent re-store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedDocument {
    pub metadata: Metadata,
    /// Page contents, Markdown, in document order.
    pub pages: Vec<String>,
    /// Display label per page ("125", "iv"); parallel to `pages`.
    pub page_numbers: Vec<String>,
    pub references: Vec<Reference>,
    pub images: Vec<Image>,
    pub tables: Vec<Table>,
    pub footnotes: Vec<Footnote>,
    pub endnotes: Vec<Endnote>,
    pub quotations: Vec<Quotation>,
    pub summary: String,
}

/// Where a metadata record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    #[default]
    None,
    External,
    Extracted,
    Merged,
}

impl MetadataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataSource::None => "none",
            MetadataSource::External => "external",
            MetadataSource::Extracted => "extracted",
            MetadataSource::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "external" => MetadataSource::External,
            "extracted" => MetadataSource::Extracted,
            "merged" => MetadataSource::Merged,
            _ => MetadataSource::None,
        }
    }
}

/// Bibliographic metadata. The first six fields can come from the language
/// model; the rest only ever come from the reference manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub publication_date: String,
    pub publication: String,
    pub doi: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub item_type: String,
    pub publisher: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub issn: String,
    pub isbn: String,
    pub url: String,
    pub citekey: String,
    pub metadata_source: MetadataSource,
}

impl From<&Metadata> for lectern_citations::CitationMetadata {
    fn from(metadata: &Metadata) -> Self {
        lectern_citations::CitationMetadata {
            title: metadata.title.clone(),
            authors: metadata.authors.clone(),
            publication_date: metadata.publication_date.clone(),
            publication: metadata.publication.clone(),
            doi: metadata.doi.clone(),
            abstract_text: metadata.abstract_text.clone(),
            item_type: metadata.item_type.clone(),
            publisher: metadata.publisher.clone(),
            volume: metadata.volume.clone(),
            issue: metadata.issue.clone(),
            pages: metadata.pages.clone(),
            issn: metadata.issn.clone(),
            isbn: metadata.isbn.clone(),
            url: metadata.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    pub reference_text: String,
    pub doi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub image_url: String,
    pub image_description: String,
    pub caption: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Table {
    pub table_id: String,
    pub table_title: String,
    pub table_data: String,
}

/// A note at the bottom of the page carrying its marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footnote {
    pub marker: String,
    pub text: String,
    /// Display label of the page where the note is defined.
    pub page_number: String,
    /// Display label of the page where the marker appears in text.
    pub in_text_page: String,
}

/// A note collected at the end of a chapter or the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endnote {
    pub marker: String,
    pub text: String,
    pub page_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quotation {
    pub quotation_text: String,
    /// Display label; empty for non-paginated formats.
    pub page_number: String,
    pub context: String,
    pub relevance: String,
}

/// One page's worth of structured output from the language model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedPage {
    pub metadata: Metadata,
    pub content: String,
    pub references: Vec<Reference>,
    pub images: Vec<Image>,
    pub tables: Vec<Table>,
    pub footnotes: Vec<Footnote>,
    pub endnotes: Vec<Endnote>,
    pub page_number_info: PageNumberInfo,
}

/// What the model saw of a printed page number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageNumberInfo {
    /// The printed number as seen on the page ("125", "iv", "A-3").
    pub page_number: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Where it was found ("bottom center", "none", ...).
    pub location: String,
    /// Any page-range hint from headers ("Pages 125-150").
    pub page_range_info: String,
}

/// Where a document's bytes came from. At most one field is non-empty;
/// both empty means the caller supplied raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceInfo {
    pub zotero_id: String,
    pub url: String,
}

/// Listing row for a stored document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    pub document_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub doi: String,
    pub citekey: String,
    pub source_info: SourceInfo,
}

/// The closed set of formats the detector can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Pdf,
    Html,
    Md,
    Txt,
    Docx,
    Zip,
    ZoteroSnapshot,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pdf => "pdf",
            DocumentType::Html => "html",
            DocumentType::Md => "md",
            DocumentType::Txt => "txt",
            DocumentType::Docx => "docx",
            DocumentType::Zip => "zip",
            DocumentType::ZoteroSnapshot => "zotero-snapshot",
            DocumentType::Unknown => "unknown",
        }
    }

    /// Parse a caller-supplied type override. Unknown strings are
    /// rejected rather than mapped to `Unknown` so a typo'd override
    /// fails loudly.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(DocumentType::Pdf),
            "html" => Some(DocumentType::Html),
            "md" => Some(DocumentType::Md),
            "txt" => Some(DocumentType::Txt),
            "docx" => Some(DocumentType::Docx),
            "zip" => Some(DocumentType::Zip),
            "zotero-snapshot" => Some(DocumentType::ZoteroSnapshot),
            "unknown" => Some(DocumentType::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bytes plus their detected (or overridden) format.
#[derive(Debug, Clone)]
pub struct DocumentData {
    pub data: Vec<u8>,
    pub doc_type: DocumentType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_page_decodes_from_unified_schema_shape() {
        let json = r##"{
            "metadata": {"title":"T","authors":["A B"],"publication_date":"2020","publication":"J","doi":"10.1/x","abstract":"Abs"},
            "content": "# Heading\nBody",
            "references": [{"reference_text":"Ref 1","doi":""}],
            "images": [{"image_url":"","image_description":"d","caption":"c"}],
            "tables": [{"table_id":"1","table_title":"t","table_data":"d"}],
            "footnotes": [{"marker":"1","text":"f","page_number":"3","in_text_page":"3"}],
            "endnotes": [{"marker":"i","text":"e","page_number":"9"}],
            "page_number_info": {"page_number":"125","confidence":0.95,"location":"bottom center","page_range_info":""}
        }"##;
        let page: ParsedPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.metadata.title, "T");
        assert_eq!(page.metadata.abstract_text, "Abs");
        assert_eq!(page.page_number_info.page_number, "125");
        assert_eq!(page.footnotes[0].in_text_page, "3");
    }

    #[test]
    fn metadata_source_round_trips() {
        for source in [
            MetadataSource::None,
            MetadataSource::External,
            MetadataSource::Extracted,
            MetadataSource::Merged,
        ] {
            assert_eq!(MetadataSource::parse(source.as_str()), source);
        }
        assert_eq!(MetadataSource::parse("zotero"), MetadataSource::None);
    }

    #[test]
    fn document_type_strings() {
        assert_eq!(DocumentType::ZoteroSnapshot.as_str(), "zotero-snapshot");
        assert_eq!(DocumentType::parse("pdf"), Some(DocumentType::Pdf));
        assert_eq!(DocumentType::parse("PDF"), None);
        assert_eq!(DocumentType::parse(""), None);
    }

    #[test]
    fn missing_fields_default() {
        let page: ParsedPage = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(page.content, "x");
        assert!(page.references.is_empty());
        assert_eq!(page.page_number_info.confidence, 0.0);
    }
}
