//! TEI text → model.
//!
//! Each aspect of the merged document is pulled out by its own extractor, in a
//! fixed order, over a shared [`ReadContext`]. An extractor that fails is
//! logged and skipped so that a document missing one aspect still yields the
//! others. Only the root checks are fatal.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use discept_core::{Error, Result};
use discept_tei::{declared_language, parse_tei, tei::path_text, Element, TeiKind, TEI_NS};

use crate::document::AlignmentDocument;
use crate::joins::{facs_joins, resolve_links, stand_offs, JoinIndex};
use crate::types::{Image, ImageType, LanguageDocument};

/// Shared state for the extractors: the parsed root, the nested language
/// documents, and the model being filled.
pub struct ReadContext<'a> {
    pub root: &'a Element,
    /// Nested `TEI` documents that declare a language, document order.
    pub languages: Vec<(String, &'a Element)>,
    pub model: AlignmentDocument,
}

type Extractor = fn(&mut ReadContext<'_>) -> Result<()>;

const EXTRACTORS: &[(&str, Extractor)] = &[
    ("title", extract_title),
    ("authors", extract_authors),
    ("publication", extract_publication),
    ("documents", extract_documents),
    ("images", extract_images),
    ("alignments", extract_alignments),
];

/// Parse a merged TEI document into a fresh model.
///
/// Fails with [`Error::InvalidFormat`] for malformed XML or a wrong root, and
/// with [`Error::NotAlignmentModel`] for a plain single-document TEI file.
pub fn parse_tei_string(text: &str) -> Result<AlignmentDocument> {
    let (root, kind) = parse_tei(text)?;
    if kind == TeiKind::Plain {
        return Err(Error::NotAlignmentModel);
    }

    let mut ctx = ReadContext::new(&root);
    for (name, extract) in EXTRACTORS {
        if let Err(e) = extract(&mut ctx) {
            warn!("Skipping {} while reading TEI: {}", name, e);
        }
    }

    let mut model = ctx.model;
    model.mark_saved();
    info!(
        "Read TEI model: {} languages, {} alignment groups",
        model.get_document_languages().len(),
        model.alignment_groups().len()
    );
    Ok(model)
}

impl<'a> ReadContext<'a> {
    pub fn new(root: &'a Element) -> Self {
        let mut languages = Vec::new();
        for doc in root.children_named(TEI_NS, "TEI") {
            match declared_language(doc) {
                Some(lang) if languages.iter().any(|(l, _)| *l == lang) => {
                    warn!("Skipping second document declaring language '{}'", lang);
                }
                Some(lang) => languages.push((lang, doc)),
                None => warn!("Skipping nested TEI without a language declaration"),
            }
        }
        Self {
            root,
            languages,
            model: AlignmentDocument::new(),
        }
    }

    /// Element id → language of the nested document containing it.
    pub fn id_languages(&self) -> HashMap<String, String> {
        id_languages(self.languages.iter().map(|(l, d)| (l.as_str(), *d)))
    }
}

/// Map each `xml:id` to the language of the document it sits in. The first
/// document to use an id wins.
pub fn id_languages<'a>(
    docs: impl Iterator<Item = (&'a str, &'a Element)>,
) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (language, doc) in docs {
        for id in doc.descendants().filter_map(|e| e.id()) {
            map.entry(id.to_string())
                .or_insert_with(|| language.to_string());
        }
    }
    map
}

fn extract_title(ctx: &mut ReadContext<'_>) -> Result<()> {
    ctx.model.project_mut().title =
        non_empty(path_text(ctx.root, &["teiHeader", "fileDesc", "titleStmt", "title"]));
    Ok(())
}

fn extract_authors(ctx: &mut ReadContext<'_>) -> Result<()> {
    let Some(stmt) = ctx.root.path(TEI_NS, &["teiHeader", "fileDesc", "titleStmt"]) else {
        return Ok(());
    };
    let authors: Vec<String> = stmt
        .children_named(TEI_NS, "author")
        .map(|a| a.text().trim().to_string())
        .collect();
    let resps: Vec<String> = stmt
        .children_named(TEI_NS, "respStmt")
        .filter_map(|r| r.child(TEI_NS, "resp"))
        .map(|r| r.text().trim().to_string())
        .collect();

    let project = ctx.model.project_mut();
    if !authors.is_empty() {
        project.authors = Some(authors.join("\n"));
    }
    if !resps.is_empty() {
        project.resps = Some(resps.join("\n"));
    }
    Ok(())
}

fn extract_publication(ctx: &mut ReadContext<'_>) -> Result<()> {
    ctx.model.project_mut().pub_statement =
        non_empty(path_text(ctx.root, &["teiHeader", "fileDesc", "publicationStmt", "p"]));
    Ok(())
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

fn extract_documents(ctx: &mut ReadContext<'_>) -> Result<()> {
    for (language, doc) in &ctx.languages {
        // Images are modeled separately and regenerated on export.
        let mut body = (*doc).clone();
        body.remove_children(TEI_NS, "facsimile");
        ctx.model.insert_document(LanguageDocument {
            language: language.clone(),
            body: body.to_xml()?,
            images: Vec::new(),
        });
    }
    Ok(())
}

fn extract_images(ctx: &mut ReadContext<'_>) -> Result<()> {
    let facs = facs_joins(stand_offs(ctx.root));
    let owners = ctx.id_languages();
    for (language, doc) in &ctx.languages {
        let mut images = Vec::new();
        for facsimile in doc.children_named(TEI_NS, "facsimile") {
            for graphic in facsimile.children_named(TEI_NS, "graphic") {
                let Some(id) = graphic.id() else {
                    debug!("Skipping graphic without xml:id in '{}'", language);
                    continue;
                };
                let image_type = graphic
                    .attr("type")
                    .map(|t| {
                        t.parse().unwrap_or_else(|e| {
                            warn!("{}; treating image '{}' as URL", e, id);
                            ImageType::Url
                        })
                    })
                    .unwrap_or_default();
                images.push(Image {
                    id: id.to_string(),
                    // Graphic ids may repeat across languages; drop targets owned by another.
                    ids: facs
                        .get(id)
                        .into_iter()
                        .flatten()
                        .filter(|t| owners.get(*t).map_or(true, |owner| owner == language))
                        .cloned()
                        .collect(),
                    url: graphic.attr("url").unwrap_or("").to_string(),
                    image_type,
                });
            }
        }
        if !images.is_empty() {
            ctx.model.replace_images(language, images);
        }
    }
    Ok(())
}

fn extract_alignments(ctx: &mut ReadContext<'_>) -> Result<()> {
    let joins = JoinIndex::from_stand_offs(stand_offs(ctx.root));
    let languages = ctx.id_languages();
    for link in resolve_links(stand_offs(ctx.root), &joins, &languages) {
        ctx.model.add_alignment(
            &link.lang_a,
            &link.lang_b,
            link.ids_a,
            link.ids_b,
            link.category,
        );
    }
    Ok(())
}
