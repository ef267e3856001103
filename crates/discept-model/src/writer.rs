//! Model → TEI text.
//!
//! The output tree is assembled from a header skeleton by a fixed sequence of
//! injectors, then serialized once. Language bodies are embedded as parsed
//! subtrees, never spliced in as text.

use tracing::{debug, info};

use discept_core::{Error, Result};
use discept_tei::{collect_ids, ensure_language_declaration, tei, Element, TEI_NS, TEI_VERSION};

use crate::document::AlignmentDocument;
use crate::joins::{format_targets, JoinAllocator, TRANSLATION};

pub struct WriteContext<'a> {
    pub model: &'a AlignmentDocument,
    pub header: Element,
    /// Nested language documents, in model order.
    pub documents: Vec<(String, Element)>,
    pub stand_off: Vec<Element>,
    pub joins: JoinAllocator,
}

type Injector = fn(&mut WriteContext<'_>) -> Result<()>;

const INJECTORS: &[(&str, Injector)] = &[
    ("header", inject_header),
    ("documents", inject_documents),
    ("images", inject_images),
    ("alignments", inject_alignments),
];

/// Serialize the whole model as a merged TEI document.
pub fn generate_tei(model: &AlignmentDocument) -> Result<String> {
    let mut ctx = WriteContext {
        model,
        header: tei("teiHeader"),
        documents: Vec::new(),
        stand_off: Vec::new(),
        joins: JoinAllocator::default(),
    };
    for (name, inject) in INJECTORS {
        debug!("Injecting {}", name);
        inject(&mut ctx)?;
    }

    let mut root = tei("TEI").with_attr("version", TEI_VERSION);
    root.push(ctx.header);
    let mut stand_off = tei("standOff");
    for element in ctx.stand_off {
        stand_off.push(element);
    }
    root.push(stand_off);
    let languages = ctx.documents.len();
    for (_, doc) in ctx.documents {
        root.push(doc);
    }

    // Indent the skeleton only: the nested bodies keep their own whitespace.
    root.indent(0, &|e: &Element| {
        e.is(TEI_NS, "TEI") || e.is(TEI_NS, "title") || e.is(TEI_NS, "p")
    });

    let xml = root.to_document()?;
    info!("Generated TEI: {} languages, {} bytes", languages, xml.len());
    Ok(xml)
}

fn inject_header(ctx: &mut WriteContext<'_>) -> Result<()> {
    let project = ctx.model.project();

    let mut title_stmt =
        tei("titleStmt").with_child(tei("title").with_text(project.title.as_deref().unwrap_or("")));
    for author in project.author_lines() {
        title_stmt.push(tei("author").with_text(author));
    }
    for resp in project.resp_lines() {
        title_stmt.push(tei("respStmt").with_child(tei("resp").with_text(resp)));
    }

    let publication = tei("publicationStmt")
        .with_child(tei("p").with_text(project.pub_statement.as_deref().unwrap_or("")));

    ctx.header.push(
        tei("fileDesc")
            .with_child(title_stmt)
            .with_child(publication),
    );
    Ok(())
}

fn inject_documents(ctx: &mut WriteContext<'_>) -> Result<()> {
    let model = ctx.model;
    let mut taken = Vec::new();
    for document in model.documents() {
        if document.body.trim().is_empty() {
            debug!("Language '{}' has an empty body, not exported", document.language);
            continue;
        }
        let mut doc = embeddable(&document.language, &document.body)?;
        ensure_language_declaration(&mut doc, &document.language);
        // Stale facsimiles are replaced by the image injector.
        doc.remove_children(TEI_NS, "facsimile");
        taken.extend(collect_ids(&doc));
        taken.extend(model.get_images(&document.language).iter().map(|i| i.id.clone()));
        ctx.documents.push((document.language.clone(), doc));
    }
    ctx.joins = JoinAllocator::new(taken);
    Ok(())
}

/// Parse a stored body into a `TEI` element in the TEI namespace.
fn embeddable(language: &str, body: &str) -> Result<Element> {
    let invalid = |reason: String| Error::InvalidDocument {
        language: language.to_string(),
        reason,
    };
    let mut doc = Element::parse(body).map_err(|e| invalid(e.to_string()))?;
    if doc.namespace.is_none() {
        doc.adopt_namespace(TEI_NS);
    }
    if !doc.is(TEI_NS, "TEI") {
        return Err(invalid(format!(
            "root element is <{}>, expected TEI",
            doc.qualified_name()
        )));
    }
    Ok(doc)
}

fn inject_images(ctx: &mut WriteContext<'_>) -> Result<()> {
    let model = ctx.model;
    for (language, doc) in ctx.documents.iter_mut() {
        let images = model.get_images(language);
        if images.is_empty() {
            continue;
        }
        let mut facsimile = tei("facsimile");
        for image in images {
            facsimile.push(
                tei("graphic")
                    .with_attr("xml:id", image.id.clone())
                    .with_attr("url", image.url.clone())
                    .with_attr("type", image.image_type.as_str()),
            );
            if !image.ids.is_empty() {
                ctx.stand_off.push(
                    tei("join")
                        .with_attr("facs", format!("#{}", image.id))
                        .with_attr("target", format_targets(&image.ids)),
                );
            }
        }
        doc.insert_after(TEI_NS, "teiHeader", facsimile);
    }
    Ok(())
}

fn inject_alignments(ctx: &mut WriteContext<'_>) -> Result<()> {
    let model = ctx.model;
    let mut groups = Vec::new();
    for group in model.alignment_groups() {
        if group.alignments.is_empty() {
            continue;
        }
        let mut link_grp = tei("linkGrp").with_attr("type", TRANSLATION);
        for link in &group.alignments {
            let a = ctx.joins.side_reference(&link.a, link.category, &mut ctx.stand_off);
            let b = ctx.joins.side_reference(&link.b, link.category, &mut ctx.stand_off);
            link_grp.push(
                tei("link")
                    .with_attr("type", link.category.as_str())
                    .with_attr("target", format_targets(&[a, b])),
            );
        }
        groups.push(link_grp);
    }
    ctx.stand_off.extend(groups);
    Ok(())
}
