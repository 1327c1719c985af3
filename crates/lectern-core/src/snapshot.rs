//! Web-snapshot extraction.
//!
//! A snapshot is a ZIP capture of a web page with its assets. Only the
//! principal HTML file matters downstream; the assets are dropped.

use std::io::{Cursor, Read};

use crate::{Error, Result};

/// Extract the main HTML file from a snapshot archive.
///
/// Preference: an entry whose basename is exactly `index.html` /
/// `index.htm` (case-insensitive), else the first `.html` / `.htm` entry
/// in iteration order. Fails `NotFound` when the archive holds no HTML.
pub fn extract_html(data: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::Malformed(format!("failed to open snapshot archive: {e}")))?;

    let mut index_entry: Option<usize> = None;
    let mut first_html: Option<usize> = None;

    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| Error::Malformed(format!("failed to read archive entry: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let basename = file
            .name()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_lowercase();

        if basename == "index.html" || basename == "index.htm" {
            index_entry = Some(i);
            break;
        }
        if (basename.ends_with(".html") || basename.ends_with(".htm")) && first_html.is_none() {
            first_html = Some(i);
        }
    }

    let Some(target) = index_entry.or(first_html) else {
        return Err(Error::NotFound("no HTML file found in snapshot archive".into()));
    };

    let mut file = archive
        .by_index(target)
        .map_err(|e| Error::Malformed(format!("failed to open HTML entry: {e}")))?;
    let mut html = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut html)
        .map_err(|e| Error::Malformed(format!("failed to read HTML entry: {e}")))?;
    Ok(html)
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
    fn prefers_index_html() {
        let zip = make_zip(&[
            ("other.html", b"<html>other</html>"),
            ("assets/Index.HTML", b"<html>main</html>"),
        ]);
        let html = extract_html(&zip).unwrap();
        assert_eq!(html, b"<html>main</html>");
    }

    #[test]
    fn falls_back_to_first_html_entry() {
        let zip = make_zip(&[
            ("style.css", b"body{}"),
            ("page.htm", b"<html>page</html>"),
            ("later.html", b"<html>later</html>"),
        ]);
        let html = extract_html(&zip).unwrap();
        assert_eq!(html, b"<html>page</html>");
    }

    #[test]
    fn basename_matching_only() {
        // "myindex.html" must not be mistaken for index.html.
        let zip = make_zip(&[
            ("myindex.html", b"<html>not main</html>"),
            ("sub/index.html", b"<html>main</html>"),
        ]);
        let html = extract_html(&zip).unwrap();
        assert_eq!(html, b"<html>main</html>");
    }

    #[test]
    fn no_html_is_not_found() {
        let zip = make_zip(&[("readme.txt", b"no html here")]);
        assert!(matches!(extract_html(&zip), Err(Error::NotFound(_))));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(extract_html(b"not a zip"), Err(Error::Malformed(_))));
    }
}
