//! TEI vocabulary: namespace, root validation, header helpers and templates.

use discept_core::{Error, Result};

use crate::dom::{Element, Node};

pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";
pub const TEI_VERSION: &str = "3.3.0";

/// Create an element in the TEI namespace.
pub fn tei(local: &str) -> Element {
    Element::new(Some(TEI_NS), local)
}

/// Shape of a parsed TEI root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeiKind {
    /// Plain TEI document: the root carries a `text` child, in any namespace.
    Plain,
    /// Container of nested `TEI` documents (the merged multilingual model).
    Nested,
}

/// Parse `xml` and require a `{TEI_NS}TEI` root.
pub fn parse_tei(xml: &str) -> Result<(Element, TeiKind)> {
    let root = Element::parse(xml)?;
    if !root.is(TEI_NS, "TEI") {
        return Err(Error::InvalidFormat(format!(
            "root element is <{}> in namespace {:?}, expected TEI in {}",
            root.qualified_name(),
            root.namespace.as_deref().unwrap_or(""),
            TEI_NS
        )));
    }
    // Matched by local name: a `text` child in any namespace marks plain TEI.
    let kind = if root.elements().any(|e| e.local == "text") {
        TeiKind::Plain
    } else {
        TeiKind::Nested
    };
    Ok((root, kind))
}

/// Text of the first element reached by following `steps` from `root`.
pub fn path_text(root: &Element, steps: &[&str]) -> Option<String> {
    root.path(TEI_NS, steps).map(|e| e.text())
}

/// Language declared in `teiHeader/profileDesc/langUsage/language/@ident`.
pub fn declared_language(doc: &Element) -> Option<String> {
    doc.path(TEI_NS, &["teiHeader", "profileDesc", "langUsage"])?
        .children_named(TEI_NS, "language")
        .find_map(|l| l.attr("ident"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Make sure `doc` declares `language`, building whatever part of
/// `teiHeader/profileDesc/langUsage/language[@ident]` is missing.
///
/// An existing declaration naming another language is rewritten. Returns
/// true if the tree was modified.
pub fn ensure_language_declaration(doc: &mut Element, language: &str) -> bool {
    if doc.child(TEI_NS, "teiHeader").is_none() {
        doc.children.insert(0, Node::Element(tei("teiHeader")));
    }
    let header = doc.ensure_path(TEI_NS, &["teiHeader"]);

    if header.child(TEI_NS, "profileDesc").is_none() {
        // profileDesc precedes revisionDesc in the header content model.
        let profile = tei("profileDesc");
        let position = header
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.is(TEI_NS, "revisionDesc")));
        match position {
            Some(i) => header.children.insert(i, Node::Element(profile)),
            None => header.push(profile),
        }
    }

    let usage = header.ensure_path(TEI_NS, &["profileDesc", "langUsage"]);
    let declared = usage.elements_mut().find(|e| e.is(TEI_NS, "language"));
    match declared {
        Some(existing) if existing.attr("ident") == Some(language) => false,
        Some(existing) => {
            tracing::warn!(
                "Rewriting declared language {:?} to '{}'",
                existing.attr("ident"),
                language
            );
            existing.set_attr("ident", language);
            true
        }
        None => {
            usage.push(
                tei("language")
                    .with_attr("ident", language)
                    .with_text(language),
            );
            true
        }
    }
}

/// Every `xml:id` in the subtree, document order.
pub fn collect_ids(root: &Element) -> Vec<String> {
    root.descendants()
        .filter_map(|e| e.id())
        .map(str::to_string)
        .collect()
}

/// Default body for a newly added language.
pub fn language_template(language: &str, title: &str) -> Result<String> {
    let header = tei("teiHeader")
        .with_child(
            tei("fileDesc")
                .with_child(tei("titleStmt").with_child(tei("title").with_text(title)))
                .with_child(tei("publicationStmt").with_child(tei("p").with_text(language))),
        )
        .with_child(
            tei("profileDesc").with_child(
                tei("langUsage").with_child(
                    tei("language")
                        .with_attr("ident", language)
                        .with_text(language),
                ),
            ),
        );
    let text = tei("text").with_child(
        tei("body").with_child(tei("div").with_child(tei("p").with_text(" "))),
    );
    let mut doc = tei("TEI")
        .with_attr("version", TEI_VERSION)
        .with_child(header)
        .with_child(text);
    doc.indent(0, &|e| e.is(TEI_NS, "p") || e.is(TEI_NS, "title"));
    doc.to_xml()
}

/// Seed document shown before anything is loaded.
pub const DEMO_DOCUMENT: &str = r#"<TEI version="3.3.0" xmlns="http://www.tei-c.org/ns/1.0">
 <teiHeader>
  <fileDesc>
   <titleStmt>
    <title>TEST</title>
   </titleStmt>
   <publicationStmt>
    <p>A</p>
   </publicationStmt>
  </fileDesc>
 </teiHeader>
 <text>
  <body><p>Something</p>
  </body>
 </text>
</TEI>"#;
