//! DiScEPT TEI: XML element tree, TEI vocabulary helpers, metadata extraction, tokenization.

pub mod dom;
pub mod metadata;
pub mod tei;
pub mod tokenize;

pub use dom::{Attribute, Element, Node};
pub use metadata::{extract_metadata, TeiMetadata};
pub use tei::{
    collect_ids, declared_language, ensure_language_declaration, language_template, parse_tei,
    tei, TeiKind, DEMO_DOCUMENT, TEI_NS, TEI_VERSION,
};
