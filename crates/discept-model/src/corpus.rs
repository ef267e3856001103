//! Reading the aligned corpus produced by the automatic aligner.
//!
//! The aligner answers with a `teiCorpus` (or a `TEI` container) holding the
//! two input documents, re-tokenized with fresh element ids, and a `standOff`
//! that links them with the same join/link vocabulary as the merged model.

use tracing::{debug, warn};

use discept_core::{Error, Result};
use discept_tei::{ensure_language_declaration, Element, TEI_NS};

use crate::joins::{resolve_links, JoinIndex};
use crate::reader::id_languages;
use crate::types::AlignmentLink;

/// Bodies and links extracted from an aligner result.
#[derive(Debug, Clone)]
pub struct AlignedCorpus {
    pub body_a: String,
    pub body_b: String,
    /// Oriented as `(lang_a, lang_b)`.
    pub links: Vec<AlignmentLink>,
}

pub fn read_aligned_corpus(lang_a: &str, lang_b: &str, xml: &str) -> Result<AlignedCorpus> {
    let root = Element::parse(xml)?;
    if !(root.is(TEI_NS, "teiCorpus") || root.is(TEI_NS, "TEI")) {
        return Err(Error::InvalidFormat(format!(
            "aligned corpus root is <{}>, expected teiCorpus or TEI",
            root.qualified_name()
        )));
    }

    let mut nested = root.children_named(TEI_NS, "TEI");
    let (Some(doc_a), Some(doc_b)) = (nested.next(), nested.next()) else {
        return Err(Error::InvalidFormat(
            "aligned corpus must contain two TEI documents".to_string(),
        ));
    };
    if nested.next().is_some() {
        warn!("Aligned corpus has more than two documents; using the first two");
    }

    let stand_offs = || {
        root.children_named(TEI_NS, "standOff")
            .chain(doc_a.children_named(TEI_NS, "standOff"))
            .chain(doc_b.children_named(TEI_NS, "standOff"))
    };
    let joins = JoinIndex::from_stand_offs(stand_offs());
    let languages = id_languages([(lang_a, doc_a), (lang_b, doc_b)].into_iter());

    let links: Vec<AlignmentLink> = resolve_links(stand_offs(), &joins, &languages)
        .into_iter()
        .filter_map(|link| {
            if link.lang_a == lang_a && link.lang_b == lang_b {
                Some(AlignmentLink::new(link.ids_a, link.ids_b, link.category))
            } else if link.lang_a == lang_b && link.lang_b == lang_a {
                Some(AlignmentLink::new(link.ids_b, link.ids_a, link.category))
            } else {
                None
            }
        })
        .collect();
    debug!("Aligned corpus: {} joins, {} links", joins.len(), links.len());

    Ok(AlignedCorpus {
        body_a: language_body(doc_a, lang_a)?,
        body_b: language_body(doc_b, lang_b)?,
        links,
    })
}

fn language_body(doc: &Element, language: &str) -> Result<String> {
    let mut doc = doc.clone();
    doc.remove_children(TEI_NS, "standOff");
    ensure_language_declaration(&mut doc, language);
    doc.to_xml()
}
