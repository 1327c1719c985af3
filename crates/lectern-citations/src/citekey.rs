//! Pandoc-style citekey generation.
//!
//! Format: `author[Second|EtAl]year`, e.g. `smith2020`, `smithJones2021`,
//! `cormenEtAl2009`. Collisions against the existing set append `a`..`z`,
//! then `z0`, `z1`, ...

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::CitationMetadata;

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("static regex"))
}

/// Extract a 4-digit year from a free-form publication date.
///
/// Handles "2020", "2020-01-15", "January 2020" and similar; returns an
/// empty string when no plausible year is present.
pub fn extract_year(publication_date: &str) -> String {
    if publication_date.is_empty() {
        return String::new();
    }
    year_re()
        .find(publication_date)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Generate a citekey for `metadata` that does not collide with
/// `existing`.
pub fn generate_citekey(metadata: &CitationMetadata, existing: &HashSet<String>) -> String {
    let year = extract_year(&metadata.publication_date);
    let author_part = author_part(&metadata.authors);

    let mut base = format!("{author_part}{year}");
    if base.is_empty() {
        base = "unknown".to_string();
    }
    let base = sanitize(&base);

    if !existing.contains(&base) {
        return base;
    }

    // Letter suffixes first.
    for suffix in 'a'..='z' {
        let candidate = format!("{base}{suffix}");
        if !existing.contains(&candidate) {
            return candidate;
        }
    }

    // Letter alphabet exhausted: z0, z1, ... until a free slot turns up.
    let mut n = 0u64;
    loop {
        let candidate = format!("{base}z{n}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Author portion of the citekey:
/// one author -> last name; two -> both last names with the second
/// capitalized; three or more -> first last name + "EtAl".
fn author_part(authors: &[String]) -> String {
    match authors {
        [] => String::new(),
        [only] => format_author(only),
        [first, second] => {
            let first = format_author(first);
            let second = capitalize(&format_author(second));
            format!("{first}{second}")
        }
        [first, ..] => format!("{}EtAl", format_author(first)),
    }
}

/// Extract the last name from "Last, First", "First Last", or a bare name,
/// lowercased. Multi-part last names collapse to camel case
/// ("von Neumann" -> "vonNeumann").
fn format_author(author: &str) -> String {
    let last_name = if let Some((last, _)) = author.split_once(',') {
        last.trim().to_string()
    } else {
        author
            .split_whitespace()
            .next_back()
            .unwrap_or_default()
            .to_string()
    };

    let mut parts = last_name.split_whitespace();
    let Some(head) = parts.next() else {
        return String::new();
    };
    let mut out = head.to_lowercase();
    for part in parts {
        out.push_str(&capitalize(&part.to_lowercase()));
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Keep only letters, digits and underscores; prefix leading digits with
/// "ref"; never return an empty key.
fn sanitize(citekey: &str) -> String {
    let sanitized: String = citekey
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if sanitized.is_empty() {
        return "unknown".to_string();
    }
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("ref{sanitized}");
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(authors: &[&str], date: &str) -> CitationMetadata {
        CitationMetadata {
            authors: authors.iter().map(|s| s.to_string()).collect(),
            publication_date: date.to_string(),
            ..Default::default()
        }
    }

    fn existing(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_author() {
        let key = generate_citekey(&meta(&["Smith, John"], "2020-05-15"), &HashSet::new());
        assert_eq!(key, "smith2020");
    }

    #[test]
    fn two_authors_full_metadata() {
        let key = generate_citekey(
            &meta(&["Smith, John", "Doe, Jane"], "2020-05-15"),
            &HashSet::new(),
        );
        assert_eq!(key, "smithDoe2020");
    }

    #[test]
    fn three_authors_et_al() {
        let key = generate_citekey(
            &meta(
                &["Cormen, Thomas", "Leiserson, Charles", "Rivest, Ronald"],
                "2009",
            ),
            &HashSet::new(),
        );
        assert_eq!(key, "cormenEtAl2009");
    }

    #[test]
    fn three_authors_with_collision() {
        let key = generate_citekey(
            &meta(
                &["Cormen, Thomas", "Leiserson, Charles", "Rivest, Ronald"],
                "2009",
            ),
            &existing(&["cormenEtAl2009"]),
        );
        assert_eq!(key, "cormenEtAl2009a");
    }

    #[test]
    fn collision_walks_letter_suffixes() {
        let key = generate_citekey(
            &meta(&["Smith, John"], "2020"),
            &existing(&["smith2020", "smith2020a", "smith2020b"]),
        );
        assert_eq!(key, "smith2020c");
    }

    #[test]
    fn collision_exhausts_letters_then_numbers() {
        let mut set = existing(&["smith2020"]);
        for c in 'a'..='z' {
            set.insert(format!("smith2020{c}"));
        }
        assert_eq!(generate_citekey(&meta(&["Smith, John"], "2020"), &set), "smith2020z0");
        set.insert("smith2020z0".to_string());
        assert_eq!(generate_citekey(&meta(&["Smith, John"], "2020"), &set), "smith2020z1");
    }

    #[test]
    fn first_last_order() {
        let key = generate_citekey(&meta(&["John Smith"], "1999"), &HashSet::new());
        assert_eq!(key, "smith1999");
    }

    #[test]
    fn multi_part_last_name() {
        let key = generate_citekey(&meta(&["von Neumann, John"], "1945"), &HashSet::new());
        assert_eq!(key, "vonNeumann1945");
    }

    #[test]
    fn no_authors_no_year() {
        let key = generate_citekey(&meta(&[], ""), &HashSet::new());
        assert_eq!(key, "unknown");
    }

    #[test]
    fn year_only() {
        let key = generate_citekey(&meta(&[], "2021"), &HashSet::new());
        // Leading digit gets a "ref" prefix.
        assert_eq!(key, "ref2021");
    }

    #[test]
    fn non_alphanumerics_stripped() {
        let key = generate_citekey(&meta(&["O'Brien, Patrick"], "2015"), &HashSet::new());
        assert_eq!(key, "obrien2015");
    }

    #[test]
    fn returned_key_never_in_existing_set() {
        let mut set = HashSet::new();
        for _ in 0..40 {
            let key = generate_citekey(&meta(&["Smith, John"], "2020"), &set);
            assert!(!set.contains(&key));
            set.insert(key);
        }
    }

    #[test]
    fn extract_year_variants() {
        assert_eq!(extract_year("2020"), "2020");
        assert_eq!(extract_year("2020-01-15"), "2020");
        assert_eq!(extract_year("January 2020"), "2020");
        assert_eq!(extract_year("1987/03"), "1987");
        assert_eq!(extract_year("n.d."), "");
        assert_eq!(extract_year(""), "");
        // 3- or 5-digit runs are not years.
        assert_eq!(extract_year("vol. 123"), "");
        assert_eq!(extract_year("id 20205"), "");
    }
}
