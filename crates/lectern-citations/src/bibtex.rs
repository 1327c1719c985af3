//! BibTeX entry and file generation.

use crate::CitationMetadata;
use crate::citekey::extract_year;

/// Generate a single BibTeX entry for a document.
///
/// Fields are emitted in conventional order; empty metadata fields are
/// omitted. The caller supplies the citekey (usually the stored one).
pub fn generate_bibtex_entry(metadata: &CitationMetadata, citekey: &str) -> String {
    let citekey = if citekey.is_empty() { "unknown" } else { citekey };
    let entry_type = entry_type_for(&metadata.item_type);

    let mut out = format!("@{entry_type}{{{citekey},\n");

    let mut field = |name: &str, value: String| {
        if !value.is_empty() {
            out.push_str(&format!("  {name} = {{{value}}},\n"));
        }
    };

    field("title", escape(&metadata.title));
    if !metadata.authors.is_empty() {
        field("author", format_authors(&metadata.authors));
    }
    if !metadata.publication.is_empty() {
        field(
            publication_field_for(entry_type),
            escape(&metadata.publication),
        );
    }
    field("year", extract_year(&metadata.publication_date));
    field("volume", metadata.volume.clone());
    field("number", metadata.issue.clone());
    if !metadata.pages.is_empty() {
        field("pages", format_pages(&metadata.pages));
    }
    field("publisher", escape(&metadata.publisher));
    field("doi", metadata.doi.clone());
    field("issn", metadata.issn.clone());
    field("isbn", metadata.isbn.clone());
    field("url", metadata.url.clone());
    field("abstract", escape(&metadata.abstract_text));

    // Drop the trailing comma before closing the entry.
    let mut result = out
        .strip_suffix(",\n")
        .map(str::to_string)
        .unwrap_or(out);
    result.push_str("\n}\n");
    result
}

/// Assemble a complete .bib file from individual entries.
pub fn generate_bibtex_file(entries: &[String]) -> String {
    let mut out = String::from("% BibTeX bibliography file\n% Generated by lectern\n\n");
    for (i, entry) in entries.iter().enumerate() {
        out.push_str(entry);
        if i + 1 < entries.len() {
            out.push('\n');
        }
    }
    out
}

/// Map an item type (Zotero vocabulary and common aliases) to a BibTeX
/// entry type. Unknown types become `misc`.
fn entry_type_for(item_type: &str) -> &'static str {
    match item_type.to_lowercase().as_str() {
        "article" | "journalarticle" => "article",
        "book" => "book",
        "inbook" | "bookchapter" | "booksection" => "inbook",
        "incollection" => "incollection",
        "inproceedings" | "conferencepaper" => "inproceedings",
        "mastersthesis" | "thesis" => "mastersthesis",
        "phdthesis" | "dissertation" => "phdthesis",
        "techreport" | "report" => "techreport",
        "unpublished" => "unpublished",
        "proceedings" => "proceedings",
        "manual" => "manual",
        "misc" => "misc",
        _ => "misc",
    }
}

/// Field name that carries the venue for the given entry type.
fn publication_field_for(entry_type: &str) -> &'static str {
    match entry_type {
        "inproceedings" | "inbook" | "incollection" => "booktitle",
        _ => "journal",
    }
}

/// Normalize an author list to BibTeX's "Last, First and Last, First".
/// Names already in "Last, First" form pass through untouched.
fn format_authors(authors: &[String]) -> String {
    let formatted: Vec<String> = authors
        .iter()
        .filter_map(|author| {
            if author.contains(',') {
                return Some(author.trim().to_string());
            }
            let parts: Vec<&str> = author.split_whitespace().collect();
            match parts.as_slice() {
                [] => None,
                [single] => Some(single.to_string()),
                [given @ .., last] => Some(format!("{}, {}", last, given.join(" "))),
            }
        })
        .collect();
    formatted.join(" and ")
}

/// Page ranges use a double dash; existing double dashes are preserved.
fn format_pages(pages: &str) -> String {
    const PLACEHOLDER: &str = "\u{0}";
    pages
        .replace("--", PLACEHOLDER)
        .replace('-', "--")
        .replace(PLACEHOLDER, "--")
}

/// Escape LaTeX-special characters. Backslash is expanded first so the
/// escapes added afterwards survive.
fn escape(text: &str) -> String {
    text.replace('\\', "\\textbackslash{}")
        .replace('%', "\\%")
        .replace('&', "\\&")
        .replace('_', "\\_")
        .replace('$', "\\$")
        .replace('#', "\\#")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_metadata() -> CitationMetadata {
        CitationMetadata {
            title: "Machine Learning in Climate Science".into(),
            authors: vec!["Smith, John".into(), "Doe, Jane".into()],
            publication_date: "2020-05-15".into(),
            publication: "Nature Climate Change".into(),
            item_type: "article".into(),
            pages: "123-130".into(),
            ..Default::default()
        }
    }

    #[test]
    fn article_entry_contents() {
        let entry = generate_bibtex_entry(&article_metadata(), "smithDoe2020");
        assert!(entry.starts_with("@article{smithDoe2020,\n"));
        assert!(entry.contains("title = {Machine Learning in Climate Science}"));
        assert!(entry.contains("author = {Smith, John and Doe, Jane}"));
        assert!(entry.contains("journal = {Nature Climate Change}"));
        assert!(entry.contains("year = {2020}"));
        assert!(entry.contains("pages = {123--130}"));
        assert!(entry.ends_with("\n}\n"));
    }

    #[test]
    fn citekey_appears_exactly_once_in_header() {
        let entry = generate_bibtex_entry(&article_metadata(), "smithDoe2020");
        assert_eq!(entry.matches("@article{smithDoe2020,").count(), 1);
    }

    #[test]
    fn empty_citekey_becomes_unknown() {
        let entry = generate_bibtex_entry(&article_metadata(), "");
        assert!(entry.starts_with("@article{unknown,"));
    }

    #[test]
    fn book_uses_book_entry_type() {
        let meta = CitationMetadata {
            title: "Introduction to Algorithms".into(),
            item_type: "book".into(),
            publisher: "MIT Press".into(),
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "cormenEtAl2009");
        assert!(entry.starts_with("@book{cormenEtAl2009,"));
        assert!(entry.contains("publisher = {MIT Press}"));
    }

    #[test]
    fn inproceedings_uses_booktitle() {
        let meta = CitationMetadata {
            title: "A Paper".into(),
            publication: "Proc. of Things".into(),
            item_type: "conferencePaper".into(),
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "key");
        assert!(entry.starts_with("@inproceedings{key,"));
        assert!(entry.contains("booktitle = {Proc. of Things}"));
        assert!(!entry.contains("journal ="));
    }

    #[test]
    fn unknown_item_type_is_misc() {
        let meta = CitationMetadata {
            title: "Something".into(),
            item_type: "webpage".into(),
            ..Default::default()
        };
        assert!(generate_bibtex_entry(&meta, "k").starts_with("@misc{k,"));
    }

    #[test]
    fn first_last_authors_are_reordered() {
        let meta = CitationMetadata {
            authors: vec!["John Smith".into(), "Mary Jane Watson".into()],
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "k");
        assert!(entry.contains("author = {Smith, John and Watson, Mary Jane}"));
    }

    #[test]
    fn escaping_special_characters() {
        let meta = CitationMetadata {
            title: "Salt & Light: 100% _real_ #1 for $5".into(),
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "k");
        assert!(entry.contains(r"Salt \& Light: 100\% \_real\_ \#1 for \$5"));
    }

    #[test]
    fn backslash_expanded_before_other_escapes() {
        let meta = CitationMetadata {
            title: r"a\b".into(),
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "k");
        assert!(entry.contains(r"a\textbackslash{}b"));
    }

    #[test]
    fn existing_double_dash_preserved() {
        assert_eq!(format_pages("123--130"), "123--130");
        assert_eq!(format_pages("123-130"), "123--130");
        assert_eq!(format_pages("iv"), "iv");
    }

    #[test]
    fn empty_fields_omitted() {
        let meta = CitationMetadata {
            title: "Only a Title".into(),
            ..Default::default()
        };
        let entry = generate_bibtex_entry(&meta, "k");
        assert!(!entry.contains("author ="));
        assert!(!entry.contains("year ="));
        assert!(!entry.contains("doi ="));
    }

    #[test]
    fn file_concatenates_entries_with_header() {
        let e1 = generate_bibtex_entry(&article_metadata(), "a1");
        let e2 = generate_bibtex_entry(&article_metadata(), "a2");
        let file = generate_bibtex_file(&[e1.clone(), e2.clone()]);
        assert!(file.starts_with("% BibTeX bibliography file"));
        assert!(file.contains(&e1));
        assert!(file.contains(&e2));
    }
}
