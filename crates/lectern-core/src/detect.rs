//! Byte-level document format detection.
//!
//! A pure classifier: magic bytes first, then structural checks for
//! ZIP-based formats, then a printable-character heuristic for text.
//! A caller-supplied type override always wins over detection; that
//! decision is made upstream, not here.

use std::io::Cursor;

use crate::models::DocumentType;

/// Classify raw bytes into a [`DocumentType`].
pub fn detect_document_type(data: &[u8]) -> DocumentType {
    if data.is_empty() {
        return DocumentType::Unknown;
    }

    if data.len() < 4 {
        return if is_likely_text(data) {
            DocumentType::Txt
        } else {
            DocumentType::Unknown
        };
    }

    if data.starts_with(b"%PDF") {
        return DocumentType::Pdf;
    }

    let trimmed = data.trim_ascii_start();
    if starts_with_ignore_case(trimmed, b"<!doctype html") || starts_with_ignore_case(trimmed, b"<html") {
        return DocumentType::Html;
    }

    // ZIP local-file signature: PK followed by 0x03/0x05/0x07.
    if data[0] == 0x50 && data[1] == 0x4B && matches!(data[2], 0x03 | 0x05 | 0x07) {
        return classify_zip(data);
    }

    if is_likely_text(data) {
        let head = &data[..data.len().min(1024)];
        if contains(head, b"# ") || contains(head, b"## ") || contains(head, b"```") {
            return DocumentType::Md;
        }
        return DocumentType::Txt;
    }

    DocumentType::Unknown
}

/// Distinguish docx, web-snapshot archives, and plain ZIPs.
fn classify_zip(data: &[u8]) -> DocumentType {
    let head = &data[..data.len().min(1024)];
    if contains(head, b"word/") {
        return DocumentType::Docx;
    }
    if zip_contains_html(data) {
        return DocumentType::ZoteroSnapshot;
    }
    DocumentType::Zip
}

/// Does the archive contain any `.html` / `.htm` entry?
fn zip_contains_html(data: &[u8]) -> bool {
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(data)) else {
        return false;
    };
    for i in 0..archive.len() {
        let Ok(file) = archive.by_index(i) else {
            continue;
        };
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_lowercase();
        if name.ends_with(".html") || name.ends_with(".htm") {
            return true;
        }
    }
    false
}

/// No NULs, and at least 90% of the first 512 bytes printable or
/// whitespace.
fn is_likely_text(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let sample = &data[..data.len().min(512)];
    if sample.contains(&0) {
        return false;
    }
    let printable = sample
        .iter()
        .filter(|&&b| (32..=126).contains(&b) || b == b'\n' || b == b'\r' || b == b'\t')
        .count();
    printable as f64 / sample.len() as f64 > 0.9
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len()
        && data[..prefix.len()]
            .iter()
            .zip(prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(content).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn pdf_magic() {
        assert_eq!(detect_document_type(b"%PDF-1.4\nrest"), DocumentType::Pdf);
    }

    #[test]
    fn html_variants() {
        assert_eq!(
            detect_document_type(b"  \n  <!DOCTYPE html><html></html>"),
            DocumentType::Html
        );
        assert_eq!(detect_document_type(b"<!doctype html>"), DocumentType::Html);
        assert_eq!(detect_document_type(b"<html lang=\"en\">"), DocumentType::Html);
        assert_eq!(detect_document_type(b"<HTML>"), DocumentType::Html);
    }

    #[test]
    fn markdown_markers() {
        assert_eq!(detect_document_type(b"# Title\n\nHi"), DocumentType::Md);
        assert_eq!(detect_document_type(b"intro\n## Section\n"), DocumentType::Md);
        assert_eq!(detect_document_type(b"text\n```rust\ncode\n```"), DocumentType::Md);
    }

    #[test]
    fn plain_text() {
        assert_eq!(detect_document_type(b"Hello world!"), DocumentType::Txt);
    }

    #[test]
    fn short_text() {
        assert_eq!(detect_document_type(b"hi"), DocumentType::Txt);
    }

    #[test]
    fn binary_is_unknown() {
        assert_eq!(detect_document_type(&[0x00, 0x01, 0xFF]), DocumentType::Unknown);
        assert_eq!(
            detect_document_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
            DocumentType::Unknown
        );
    }

    #[test]
    fn empty_is_unknown() {
        assert_eq!(detect_document_type(b""), DocumentType::Unknown);
    }

    #[test]
    fn docx_by_word_directory() {
        // A real docx has word/document.xml near the front of the archive.
        let zip = make_zip(&[("word/document.xml", b"<w:document/>")]);
        assert_eq!(detect_document_type(&zip), DocumentType::Docx);
    }

    #[test]
    fn snapshot_by_html_entry() {
        let zip = make_zip(&[
            ("style.css", b"body{}"),
            ("index.html", b"<html><body>snap</body></html>"),
        ]);
        assert_eq!(detect_document_type(&zip), DocumentType::ZoteroSnapshot);
    }

    #[test]
    fn plain_zip_without_html() {
        let zip = make_zip(&[("data.bin", &[0u8, 1, 2, 3])]);
        assert_eq!(detect_document_type(&zip), DocumentType::Zip);
    }

    #[test]
    fn mostly_binary_text_ratio_fails() {
        let mut data = vec![b'a'; 100];
        data.extend(std::iter::repeat_n(0x01u8, 100));
        assert_eq!(detect_document_type(&data), DocumentType::Unknown);
    }

    #[test]
    fn nul_byte_forces_unknown() {
        let mut data = b"looks like text".to_vec();
        data.push(0);
        assert_eq!(detect_document_type(&data), DocumentType::Unknown);
    }
}
