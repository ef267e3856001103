//! Metadata extraction from arbitrary (foreign) TEI documents.
//!
//! Each field is looked up through a list of locations, most specific first,
//! and falls back to a fixed default when none matches.

use serde::{Deserialize, Serialize};

use crate::dom::Element;
use crate::tei::TEI_NS;

pub const UNTITLED: &str = "Untitled Document";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Metadata found in a TEI document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeiMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

const TITLE_PATHS: &[&[&str]] = &[
    &["teiHeader", "fileDesc", "titleStmt", "title"],
    &["teiHeader", "titleStmt", "title"],
    &["teiHeader", "title"],
];

const AUTHOR_PATHS: &[&[&str]] = &[
    &["teiHeader", "fileDesc", "titleStmt"],
    &["teiHeader", "titleStmt"],
    &["teiHeader"],
];

const DATE_PATHS: &[&[&str]] = &[
    &["teiHeader", "fileDesc", "publicationStmt", "date"],
    &["teiHeader", "publicationStmt", "date"],
    &["teiHeader", "date"],
];

/// Extract `{title, author, language, date}` from a parsed TEI root.
pub fn extract_metadata(root: &Element) -> TeiMetadata {
    TeiMetadata {
        title: extract_title(root),
        author: extract_author(root),
        language: extract_language(root),
        date: extract_date(root),
    }
}

pub fn extract_title(root: &Element) -> String {
    first_text(root, TITLE_PATHS)
        .or_else(|| any_text(root, "title"))
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// All authors of the first location that has any, joined with `"; "`.
pub fn extract_author(root: &Element) -> String {
    for path in AUTHOR_PATHS {
        if let Some(parent) = root.path(TEI_NS, path) {
            let authors = non_empty_texts(parent.children_named(TEI_NS, "author"));
            if !authors.is_empty() {
                return authors.join("; ");
            }
        }
    }
    let authors = non_empty_texts(root.descendants().filter(|e| e.is(TEI_NS, "author")));
    if authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        authors.join("; ")
    }
}

/// Two-letter lowercase language code.
pub fn extract_language(root: &Element) -> String {
    let declared = root
        .attr("xml:lang")
        .map(str::to_string)
        .or_else(|| {
            root.descendants()
                .find(|e| e.is(TEI_NS, "language") && e.attr("ident").is_some())
                .and_then(|e| e.attr("ident"))
                .map(str::to_string)
        })
        .or_else(|| {
            root.descendants()
                .find(|e| e.is(TEI_NS, "text"))
                .and_then(|e| e.attr("xml:lang"))
                .map(str::to_string)
        });

    declared
        .map(|lang| lang.trim().chars().take(2).collect::<String>().to_lowercase())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

pub fn extract_date(root: &Element) -> Option<String> {
    first_text(root, DATE_PATHS)
}

fn first_text(root: &Element, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| {
        root.path(TEI_NS, path)
            .map(|e| e.text().trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

fn any_text(root: &Element, local: &str) -> Option<String> {
    root.descendants()
        .filter(|e| e.is(TEI_NS, local))
        .map(|e| e.text().trim().to_string())
        .find(|t| !t.is_empty())
}

fn non_empty_texts<'a>(elements: impl Iterator<Item = &'a Element>) -> Vec<String> {
    elements
        .map(|e| e.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
