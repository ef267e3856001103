//! The in-memory multilingual alignment model.

use tracing::{debug, info, warn};
use uuid::Uuid;

use discept_core::{Error, Result};
use discept_tei::tokenize::{ensure_ids, tokenize};
use discept_tei::{
    ensure_language_declaration, extract_metadata, language_template, parse_tei, Element,
    TeiKind, DEMO_DOCUMENT, TEI_NS,
};

use crate::source::TextResource;
use crate::types::{
    AlignmentGroup, AlignmentLink, Category, DocumentSummary, Image, ImageType,
    LanguageDocument, LanguageSummary, PairSummary, ProjectMetadata,
};
use crate::{corpus, reader, writer};

const DEMO_LANGUAGE: &str = "it";

/// One editable multilingual project: language bodies, their images, the
/// alignments between language pairs, and the project record.
///
/// Every mutator sets the changed flag. A successful parse clears it.
#[derive(Debug, Clone, Default)]
pub struct AlignmentDocument {
    project: ProjectMetadata,
    documents: Vec<LanguageDocument>,
    alignments: Vec<AlignmentGroup>,
    changed: bool,
}

impl AlignmentDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model seeded with the Italian demo document.
    pub fn demo() -> Self {
        let mut doc = Self::new();
        doc.insert_document(LanguageDocument {
            language: DEMO_LANGUAGE.to_string(),
            body: DEMO_DOCUMENT.to_string(),
            images: Vec::new(),
        });
        doc
    }

    // ---- project ----

    pub fn project(&self) -> &ProjectMetadata {
        &self.project
    }

    /// Reader access; does not touch the changed flag.
    pub(crate) fn project_mut(&mut self) -> &mut ProjectMetadata {
        &mut self.project
    }

    pub fn set_project(&mut self, project: ProjectMetadata) {
        self.project = project;
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub(crate) fn mark_saved(&mut self) {
        self.changed = false;
    }

    // ---- language documents ----

    /// Languages in insertion order.
    pub fn get_document_languages(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.language.clone()).collect()
    }

    /// Stored body, or `""` for an unknown language.
    pub fn get_document_per_language(&self, language: &str) -> &str {
        self.document(language).map(|d| d.body.as_str()).unwrap_or("")
    }

    pub fn documents(&self) -> &[LanguageDocument] {
        &self.documents
    }

    pub fn add_document_per_language(&mut self, language: &str, body: impl Into<String>) {
        let body = body.into();
        match self.document_mut(language) {
            Some(doc) => doc.body = body,
            None => self.documents.push(LanguageDocument {
                language: language.to_string(),
                body,
                images: Vec::new(),
            }),
        }
        self.changed = true;
    }

    pub fn update_document_per_language(&mut self, language: &str, body: impl Into<String>) {
        self.add_document_per_language(language, body);
    }

    /// Read the body from `resource` and store it for `language`.
    pub async fn add_file_document_per_language<R>(
        &mut self,
        language: &str,
        resource: &R,
    ) -> Result<()>
    where
        R: TextResource + ?Sized,
    {
        let body = resource.read_text().await?;
        self.add_document_per_language(language, body);
        Ok(())
    }

    /// Add `language` with a template body titled after the project.
    /// Nothing happens if the language already has a body.
    pub fn add_language(&mut self, language: &str) -> Result<()> {
        if !self.get_document_per_language(language).is_empty() {
            debug!("Language '{}' already present", language);
            return Ok(());
        }
        let title = self.project.title.clone().unwrap_or_default();
        let body = language_template(language, &title)?;
        self.add_document_per_language(language, body);
        Ok(())
    }

    /// Remove `language` with its images and every alignment group naming it.
    pub fn delete_document_per_language(&mut self, language: &str) {
        let before = self.documents.len();
        self.documents.retain(|d| d.language != language);
        let groups = self.alignments.len();
        self.alignments.retain(|g| !g.involves(language));
        if before != self.documents.len() || groups != self.alignments.len() {
            debug!(
                "Deleted language '{}' and {} alignment groups",
                language,
                groups - self.alignments.len()
            );
            self.changed = true;
        }
    }

    /// Insert or replace a whole language document without marking changes.
    pub(crate) fn insert_document(&mut self, document: LanguageDocument) {
        match self.document_mut(&document.language) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    fn document(&self, language: &str) -> Option<&LanguageDocument> {
        self.documents.iter().find(|d| d.language == language)
    }

    fn document_mut(&mut self, language: &str) -> Option<&mut LanguageDocument> {
        self.documents.iter_mut().find(|d| d.language == language)
    }

    fn require_document(&mut self, language: &str) -> Result<&mut LanguageDocument> {
        self.document_mut(language)
            .ok_or_else(|| Error::NotFound(format!("language '{}'", language)))
    }

    // ---- images ----

    pub fn get_images(&self, language: &str) -> &[Image] {
        self.document(language)
            .map(|d| d.images.as_slice())
            .unwrap_or(&[])
    }

    /// Append an image. Fails with [`Error::NotFound`] for an unknown language.
    pub fn add_image(
        &mut self,
        language: &str,
        id: impl Into<String>,
        ids: Vec<String>,
        url: impl Into<String>,
        image_type: ImageType,
    ) -> Result<()> {
        let image = Image {
            id: id.into(),
            ids,
            url: url.into(),
            image_type,
        };
        self.require_document(language)?.images.push(image);
        self.changed = true;
        Ok(())
    }

    pub fn set_images(&mut self, language: &str, images: Vec<Image>) -> Result<()> {
        self.require_document(language)?.images = images;
        self.changed = true;
        Ok(())
    }

    pub fn delete_image(&mut self, language: &str, index: usize) {
        let Some(doc) = self.document_mut(language) else {
            return;
        };
        if index < doc.images.len() {
            doc.images.remove(index);
            self.changed = true;
        }
    }

    pub(crate) fn replace_images(&mut self, language: &str, images: Vec<Image>) {
        if let Some(doc) = self.document_mut(language) {
            doc.images = images;
        }
    }

    // ---- alignments ----

    pub fn alignment_groups(&self) -> &[AlignmentGroup] {
        &self.alignments
    }

    /// Links of the pair, oriented as `(lang_a, lang_b)` whatever the storage order.
    pub fn get_alignments(&self, lang_a: &str, lang_b: &str) -> Vec<AlignmentLink> {
        for group in &self.alignments {
            match group.orientation(lang_a, lang_b) {
                Some(false) => return group.alignments.clone(),
                Some(true) => return group.alignments.iter().map(|l| l.swapped()).collect(),
                None => {}
            }
        }
        Vec::new()
    }

    pub fn add_alignment(
        &mut self,
        lang_a: &str,
        lang_b: &str,
        ids_a: Vec<String>,
        ids_b: Vec<String>,
        category: Category,
    ) {
        if ids_a.is_empty() || ids_b.is_empty() {
            warn!(
                "Ignoring {}/{} alignment with an empty side",
                lang_a, lang_b
            );
            return;
        }
        let link = AlignmentLink::new(ids_a, ids_b, category);
        self.changed = true;
        for group in &mut self.alignments {
            match group.orientation(lang_a, lang_b) {
                Some(false) => return group.alignments.push(link),
                Some(true) => return group.alignments.push(link.swapped()),
                None => {}
            }
        }
        self.alignments.push(AlignmentGroup {
            lang_a: lang_a.to_string(),
            lang_b: lang_b.to_string(),
            alignments: vec![link],
        });
    }

    /// Remove the `index`-th link as returned by `get_alignments(lang_a, lang_b)`.
    pub fn delete_alignment(&mut self, lang_a: &str, lang_b: &str, index: usize) {
        let Some(group) = self
            .alignments
            .iter_mut()
            .find(|g| g.orientation(lang_a, lang_b).is_some())
        else {
            return;
        };
        if index < group.alignments.len() {
            group.alignments.remove(index);
            self.changed = true;
        }
    }

    // ---- derived operations ----

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            languages: self
                .documents
                .iter()
                .map(|d| LanguageSummary {
                    language: d.language.clone(),
                    images: d.images.len(),
                    body_bytes: d.body.len(),
                })
                .collect(),
            alignments: self
                .alignments
                .iter()
                .map(|g| PairSummary {
                    lang_a: g.lang_a.clone(),
                    lang_b: g.lang_b.clone(),
                    links: g.alignments.len(),
                })
                .collect(),
            changed: self.changed,
        }
    }

    /// Wrap the words of `language` in `<w>` elements. Returns whether the
    /// body changed.
    pub fn tokenize_language(&mut self, language: &str) -> Result<bool> {
        self.edit_body(language, |doc| Ok(tokenize(doc)))
    }

    /// Give every addressable element of `language` an `xml:id`. Returns the
    /// ids that were assigned.
    pub fn ensure_ids(&mut self, language: &str) -> Result<Vec<String>> {
        let assigned = self.edit_body(language, |doc| {
            let ids = ensure_ids(doc, &mut || format!("id-{}", Uuid::new_v4()));
            Ok(ids)
        })?;
        debug!("Assigned {} ids in '{}'", assigned.len(), language);
        Ok(assigned)
    }

    /// Parse the body of `language`, apply `edit`, and store the result if
    /// the tree was modified. The edit reports modification through its
    /// return value: `true` or a non-empty list.
    fn edit_body<T, F>(&mut self, language: &str, edit: F) -> Result<T>
    where
        T: Modified,
        F: FnOnce(&mut Element) -> Result<T>,
    {
        let body = self.get_document_per_language(language);
        if body.is_empty() {
            return Err(Error::NotFound(format!("language '{}'", language)));
        }
        let mut root = Element::parse(body)?;
        let outcome = edit(&mut root)?;
        if outcome.modified() {
            let body = root.to_xml()?;
            self.add_document_per_language(language, body);
        }
        Ok(outcome)
    }

    /// Add a plain (non-merged) TEI document as a new language. The language
    /// is detected from the document when not given. Returns the language.
    pub fn import_foreign(&mut self, body: &str, language: Option<&str>) -> Result<String> {
        let (mut root, kind) = parse_tei(body)?;
        if kind != TeiKind::Plain {
            return Err(Error::InvalidFormat(
                "expected a single TEI document with a text element".to_string(),
            ));
        }
        let language = match language {
            Some(l) => l.to_string(),
            None => extract_metadata(&root).language,
        };
        ensure_language_declaration(&mut root, &language);
        root.remove_children(TEI_NS, "facsimile");
        self.add_document_per_language(&language, root.to_xml()?);
        info!("Imported TEI document as language '{}'", language);
        Ok(language)
    }

    /// Merge an aligner result for `(lang_a, lang_b)`. Returns the number of
    /// alignment links added.
    pub fn apply_aligned_corpus(&mut self, lang_a: &str, lang_b: &str, xml: &str) -> Result<usize> {
        let merge = corpus::read_aligned_corpus(lang_a, lang_b, xml)?;
        self.add_document_per_language(lang_a, merge.body_a);
        self.add_document_per_language(lang_b, merge.body_b);
        let added = merge.links.len();
        for link in merge.links {
            self.add_alignment(lang_a, lang_b, link.a, link.b, link.category);
        }
        info!("Merged {} aligned links for {}/{}", added, lang_a, lang_b);
        Ok(added)
    }

    // ---- TEI text ----

    /// Replace the whole model with the parsed document. On error the model
    /// is left untouched.
    pub fn parse_tei_string(&mut self, text: &str) -> Result<()> {
        *self = reader::parse_tei_string(text)?;
        Ok(())
    }

    pub async fn read_from_file<R>(&mut self, resource: &R) -> Result<()>
    where
        R: TextResource + ?Sized,
    {
        let text = resource.read_text().await?;
        self.parse_tei_string(&text)
    }

    pub fn generate_tei(&self) -> Result<String> {
        writer::generate_tei(self)
    }
}

trait Modified {
    fn modified(&self) -> bool;
}

impl Modified for bool {
    fn modified(&self) -> bool {
        *self
    }
}

impl Modified for Vec<String> {
    fn modified(&self) -> bool {
        !self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unknown_language_reads_empty() {
        let doc = AlignmentDocument::new();
        assert_eq!(doc.get_document_per_language("fr"), "");
        assert!(doc.get_images("fr").is_empty());
        assert!(doc.get_alignments("fr", "en").is_empty());
        assert!(!doc.is_changed());
    }

    #[test]
    fn test_languages_keep_insertion_order() {
        let mut doc = AlignmentDocument::new();
        doc.add_document_per_language("en", "<TEI/>");
        doc.add_document_per_language("de", "<TEI/>");
        doc.update_document_per_language("en", "<TEI><text/></TEI>");
        assert_eq!(doc.get_document_languages(), vec!["en", "de"]);
        assert_eq!(doc.get_document_per_language("en"), "<TEI><text/></TEI>");
        assert!(doc.is_changed());
    }

    #[test]
    fn test_add_image_unknown_language_fails() {
        let mut doc = AlignmentDocument::new();
        let err = doc
            .add_image("en", "img1", ids(&["a1"]), "http://x", ImageType::Url)
            .unwrap_err();
        assert_eq!(err.kind(), "not-found");
        // Silent no-op for deletion.
        doc.delete_image("en", 0);
        assert!(!doc.is_changed());
    }

    #[test]
    fn test_set_and_delete_images() {
        let mut doc = AlignmentDocument::new();
        doc.add_language("en").unwrap();
        let image = |id: &str| Image {
            id: id.into(),
            ids: vec![],
            url: format!("http://x/{}.jpg", id),
            image_type: ImageType::Iiif,
        };
        doc.set_images("en", vec![image("a"), image("b")]).unwrap();
        doc.delete_image("en", 0);
        doc.delete_image("en", 7);
        assert_eq!(doc.get_images("en"), &[image("b")]);
    }

    #[test]
    fn test_alignment_storage_order() {
        let mut doc = AlignmentDocument::new();
        doc.add_alignment("en", "de", ids(&["e1"]), ids(&["d1"]), Category::Literal);
        doc.add_alignment("de", "en", ids(&["d2"]), ids(&["e2"]), Category::Other);

        let groups = doc.alignment_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lang_a, "en");
        assert_eq!(groups[0].alignments[1].a, vec!["e2"]);

        let from_de = doc.get_alignments("de", "en");
        assert_eq!(from_de[0].a, vec!["d1"]);
        assert_eq!(from_de[1].b, vec!["e2"]);
    }

    #[test]
    fn test_empty_side_is_ignored() {
        let mut doc = AlignmentDocument::new();
        doc.add_alignment("en", "de", vec![], ids(&["d1"]), Category::Literal);
        assert!(doc.alignment_groups().is_empty());
        assert!(!doc.is_changed());
    }

    #[test]
    fn test_delete_alignment_out_of_range_is_noop() {
        let mut doc = AlignmentDocument::new();
        doc.delete_alignment("en", "de", 0);
        doc.add_alignment("en", "de", ids(&["e1"]), ids(&["d1"]), Category::Literal);
        doc.delete_alignment("de", "en", 3);
        assert_eq!(doc.get_alignments("en", "de").len(), 1);
    }

    #[test]
    fn test_delete_language_cascades() {
        let mut doc = AlignmentDocument::new();
        doc.add_language("en").unwrap();
        doc.add_language("de").unwrap();
        doc.add_language("it").unwrap();
        doc.add_image("en", "img", ids(&["e1"]), "http://x", ImageType::Url)
            .unwrap();
        doc.add_alignment("en", "de", ids(&["e1"]), ids(&["d1"]), Category::Literal);
        doc.add_alignment("de", "it", ids(&["d1"]), ids(&["i1"]), Category::Literal);

        doc.delete_document_per_language("en");
        assert_eq!(doc.get_document_languages(), vec!["de", "it"]);
        assert!(doc.get_images("en").is_empty());
        assert!(doc.get_alignments("en", "de").is_empty());
        assert_eq!(doc.get_alignments("it", "de").len(), 1);
    }

    #[test]
    fn test_add_language_uses_template_once() {
        let mut doc = AlignmentDocument::new();
        doc.set_project(ProjectMetadata {
            title: Some("Aeneid".into()),
            ..Default::default()
        });
        doc.add_language("la").unwrap();
        let body = doc.get_document_per_language("la").to_string();
        assert!(body.contains("Aeneid"));
        assert!(body.contains(r#"ident="la""#));

        doc.add_document_per_language("la", "<TEI/>");
        doc.add_language("la").unwrap();
        assert_eq!(doc.get_document_per_language("la"), "<TEI/>");
    }

    #[test]
    fn test_demo_is_italian() {
        let doc = AlignmentDocument::demo();
        assert_eq!(doc.get_document_languages(), vec!["it"]);
        assert!(!doc.is_changed());
        assert!(doc.generate_tei().is_ok());
    }

    #[test]
    fn test_failed_parse_keeps_model() {
        let mut doc = AlignmentDocument::demo();
        assert!(doc.parse_tei_string("not xml").is_err());
        assert_eq!(doc.get_document_languages(), vec!["it"]);
    }

    #[test]
    fn test_tokenize_and_ids() {
        let mut doc = AlignmentDocument::new();
        doc.add_document_per_language(
            "en",
            format!(
                r#"<TEI xmlns="{}"><text><body><p>Hello brave world</p></body></text></TEI>"#,
                TEI_NS
            ),
        );
        assert!(doc.tokenize_language("en").unwrap());
        assert!(!doc.tokenize_language("en").unwrap());
        assert_eq!(doc.get_document_per_language("en").matches("<w>").count(), 3);

        let assigned = doc.ensure_ids("en").unwrap();
        assert_eq!(assigned.len(), 4);
        assert!(assigned.iter().all(|id| id.starts_with("id-")));
        assert!(doc.ensure_ids("en").unwrap().is_empty());

        assert_eq!(doc.tokenize_language("fr").unwrap_err().kind(), "not-found");
    }

    #[test]
    fn test_import_foreign_detects_language() {
        let mut doc = AlignmentDocument::new();
        let language = doc
            .import_foreign(
                &format!(
                    r#"<TEI xmlns="{}" xml:lang="fr-FR"><teiHeader/><text><body><p>Bonjour</p></body></text></TEI>"#,
                    TEI_NS
                ),
                None,
            )
            .unwrap();
        assert_eq!(language, "fr");
        assert!(doc
            .get_document_per_language("fr")
            .contains(r#"<language ident="fr">"#));

        let merged = format!(r#"<TEI xmlns="{}"><teiHeader/></TEI>"#, TEI_NS);
        assert_eq!(
            doc.import_foreign(&merged, Some("de")).unwrap_err().kind(),
            "invalid"
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut doc = AlignmentDocument::new();
        doc.add_language("en").unwrap();
        doc.add_image("en", "img", vec![], "http://x", ImageType::Url)
            .unwrap();
        doc.add_alignment("en", "de", ids(&["e1"]), ids(&["d1"]), Category::Literal);
        let summary = doc.summary();
        assert_eq!(summary.languages[0].images, 1);
        assert_eq!(summary.alignments[0].links, 1);
        assert!(summary.changed);
    }
}
