//! HTML preprocessing.
//!
//! Converts fetched HTML to compact Markdown before it goes anywhere near
//! the language model. Scripts, styles and images are dropped up front;
//! heading structure, lists, tables and links survive the conversion.
//! The point is context-window economy, not perfect fidelity.

use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("static regex"))
}

fn style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("static regex"))
}

fn img_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<img\b[^>]*>").expect("static regex"))
}

fn md_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("static regex"))
}

/// Convert HTML bytes to Markdown.
pub fn preprocess_html(data: &[u8]) -> Result<String> {
    let html = String::from_utf8_lossy(data);

    // Drop elements whose content must not reach the model. Images go
    // first so inline base64 payloads never hit the converter.
    let cleaned = script_re().replace_all(&html, "");
    let cleaned = style_re().replace_all(&cleaned, "");
    let cleaned = img_re().replace_all(&cleaned, "");

    let markdown = html2md::rewrite_html(&cleaned, false);
    if markdown.trim().is_empty() && !html.trim().is_empty() {
        return Err(Error::Malformed("HTML conversion produced no content".into()));
    }

    // Any image syntax the converter still emitted gets stripped too.
    let markdown = md_image_re().replace_all(&markdown, "");
    Ok(markdown.trim().to_string())
}
