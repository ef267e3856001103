//! Behaviour of the alignment model through its public API, including the
//! merged TEI round trip.

use discept_model::{AlignmentDocument, Category, Image, ImageType, ProjectMetadata};

const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn body(language: &str, paragraphs: &[&str]) -> String {
    let ps: String = paragraphs
        .iter()
        .map(|id| format!(r#"<p xml:id="{}">text {}</p>"#, id, id))
        .collect();
    format!(
        r#"<TEI xmlns="{}"><teiHeader><fileDesc><titleStmt><title>{}</title></titleStmt></fileDesc><profileDesc><langUsage><language ident="{}"/></langUsage></profileDesc></teiHeader><text><body>{}</body></text></TEI>"#,
        TEI_NS, language, language, ps
    )
}

fn sample() -> AlignmentDocument {
    let mut doc = AlignmentDocument::new();
    doc.set_project(ProjectMetadata {
        title: Some("Parallel edition".into()),
        authors: Some("Ada\nGrace".into()),
        resps: Some("encoding".into()),
        pub_statement: Some("CC-BY".into()),
        ..Default::default()
    });
    doc.add_document_per_language("en", body("en", &["e1", "e2", "e3"]));
    doc.add_document_per_language("de", body("de", &["d1", "d2"]));
    doc.add_image("en", "img1", ids(&["e1", "e2"]), "http://example.com/1.jpg", ImageType::Url)
        .unwrap();
    doc.add_image("de", "img2", vec![], "http://iiif.example.com/2", ImageType::Iiif)
        .unwrap();
    doc.add_alignment("en", "de", ids(&["e1", "e2"]), ids(&["d1"]), Category::Semantic);
    doc.add_alignment("en", "de", ids(&["e3"]), ids(&["d2"]), Category::Literal);
    doc
}

fn reparse(doc: &AlignmentDocument) -> AlignmentDocument {
    let xml = doc.generate_tei().unwrap();
    let mut back = AlignmentDocument::new();
    back.parse_tei_string(&xml).unwrap();
    back
}

#[test]
fn test_round_trip_preserves_model() {
    let doc = sample();
    let back = reparse(&doc);

    assert_eq!(back.get_document_languages(), vec!["en", "de"]);
    assert_eq!(back.get_alignments("en", "de"), doc.get_alignments("en", "de"));
    assert_eq!(back.get_images("en"), doc.get_images("en"));
    assert_eq!(back.get_images("de"), doc.get_images("de"));
    assert_eq!(back.project(), doc.project());
    for language in ["en", "de"] {
        assert_eq!(
            back.get_document_per_language(language),
            doc.get_document_per_language(language)
        );
    }
    assert!(!back.is_changed());
}

#[test]
fn test_repeated_image_id_keeps_each_language_targets() {
    let mut doc = AlignmentDocument::new();
    doc.add_document_per_language("en", body("en", &["e1"]));
    doc.add_document_per_language("de", body("de", &["d1"]));
    doc.add_image("en", "img1", ids(&["e1"]), "http://example.com/en.jpg", ImageType::Url)
        .unwrap();
    doc.add_image("de", "img1", ids(&["d1"]), "http://example.com/de.jpg", ImageType::Url)
        .unwrap();

    let back = reparse(&doc);
    assert_eq!(back.get_images("en")[0].ids, vec!["e1"]);
    assert_eq!(back.get_images("de")[0].ids, vec!["d1"]);
}

#[test]
fn test_regeneration_is_idempotent() {
    let doc = sample();
    let first = doc.generate_tei().unwrap();
    let second = reparse(&doc).generate_tei().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_symmetric_alignment_storage() {
    let mut doc = AlignmentDocument::new();
    doc.add_alignment("en", "de", ids(&["x"]), ids(&["y"]), Category::Other);

    let forward = doc.get_alignments("en", "de");
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].a, vec!["x"]);
    assert_eq!(forward[0].b, vec!["y"]);
    assert_eq!(forward[0].category, Category::Other);

    let backward = doc.get_alignments("de", "en");
    assert_eq!(backward[0].a, vec!["y"]);
    assert_eq!(backward[0].b, vec!["x"]);
    assert_eq!(backward[0].category, Category::Other);
}

#[test]
fn test_category_is_written() {
    let mut doc = AlignmentDocument::new();
    doc.add_alignment(
        "en",
        "de",
        ids(&["a1", "a2"]),
        ids(&["b1", "b2"]),
        Category::Semantic,
    );
    let xml = doc.generate_tei().unwrap();
    assert!(xml.contains(r#"type="Semantic""#));
}

#[test]
fn test_empty_model_structure() {
    let xml = AlignmentDocument::new().generate_tei().unwrap();
    assert!(xml.contains("<TEI"));
    assert!(xml.contains("<teiHeader>"));
}

#[test]
fn test_image_storage() {
    let mut doc = AlignmentDocument::new();
    doc.add_document_per_language("en", body("en", &["a1"]));
    doc.add_image("en", "img1", ids(&["a1"]), "http://example.com/img.jpg", ImageType::Url)
        .unwrap();
    assert_eq!(
        doc.get_images("en"),
        &[Image {
            id: "img1".into(),
            ids: ids(&["a1"]),
            url: "http://example.com/img.jpg".into(),
            image_type: ImageType::Url,
        }]
    );
}

#[test]
fn test_plain_tei_is_not_alignment_model() {
    let plain = format!(
        r#"<TEI xmlns="{}"><teiHeader/><text><body><p>Hello</p></body></text></TEI>"#,
        TEI_NS
    );
    let mut doc = AlignmentDocument::new();
    let err = doc.parse_tei_string(&plain).unwrap_err();
    assert_eq!(err.kind(), "no-discept");
}

#[test]
fn test_non_tei_input_is_invalid() {
    let inputs = [
        "this is not xml".to_string(),
        "<html><body/></html>".to_string(),
        "<TEI><teiHeader/></TEI>".to_string(),
        format!(r#"<TEI xmlns="{}"><teiHeader>"#, TEI_NS),
    ];
    for input in &inputs {
        let mut doc = AlignmentDocument::new();
        let err = doc.parse_tei_string(input).unwrap_err();
        assert_eq!(err.kind(), "invalid", "input: {}", input);
    }
}

#[test]
fn test_delete_alignment_by_index() {
    let mut doc = AlignmentDocument::new();
    doc.add_alignment("en", "de", ids(&["e1"]), ids(&["d1"]), Category::Literal);
    doc.add_alignment("en", "de", ids(&["e2"]), ids(&["d2"]), Category::Semantic);

    doc.delete_alignment("en", "de", 0);
    let forward = doc.get_alignments("en", "de");
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].a, vec!["e2"]);

    let backward = doc.get_alignments("de", "en");
    assert_eq!(backward.len(), 1);
    assert_eq!(backward[0].a, vec!["d2"]);

    doc.delete_alignment("de", "en", 0);
    assert!(doc.get_alignments("en", "de").is_empty());
}

#[test]
fn test_multi_id_side_uses_join() {
    let mut doc = AlignmentDocument::new();
    doc.add_document_per_language("en", body("en", &["a3", "a1", "a2"]));
    doc.add_document_per_language("de", body("de", &["b1"]));
    doc.add_alignment(
        "en",
        "de",
        ids(&["a3", "a1", "a2"]),
        ids(&["b1"]),
        Category::Linguistic,
    );

    let xml = doc.generate_tei().unwrap();
    assert!(xml.contains(r##"<join xml:id="join-1" type="Linguistic" target="#a3 #a1 #a2"/>"##));
    assert!(xml.contains(r##"target="#join-1 #b1""##));

    let back = reparse(&doc);
    assert_eq!(back.get_alignments("en", "de")[0].a, vec!["a3", "a1", "a2"]);
}

#[test]
fn test_parse_replaces_previous_state() {
    let mut doc = sample();
    doc.add_alignment("it", "fr", ids(&["i1"]), ids(&["f1"]), Category::Other);

    let mut fresh = AlignmentDocument::new();
    fresh.add_document_per_language("en", body("en", &["e1"]));
    let xml = fresh.generate_tei().unwrap();

    doc.parse_tei_string(&xml).unwrap();
    assert_eq!(doc.get_document_languages(), vec!["en"]);
    assert!(doc.get_alignments("it", "fr").is_empty());
    assert!(doc.get_images("de").is_empty());
    assert_eq!(doc.project(), &ProjectMetadata::default());
}

#[test]
fn test_aligned_corpus_merge() {
    let mut doc = AlignmentDocument::new();
    let corpus = format!(
        r##"<teiCorpus xmlns="{}">
  <TEI><text><body><s xml:id="s1">One.</s><s xml:id="s2">Two.</s></body></text></TEI>
  <TEI><text><body><s xml:id="t1">Uno. Due.</s></body></text></TEI>
  <standOff>
    <join xml:id="j1" target="#s1 #s2"/>
    <linkGrp type="translation"><link type="Literal" target="#j1 #t1"/></linkGrp>
  </standOff>
</teiCorpus>"##,
        TEI_NS
    );

    assert_eq!(doc.apply_aligned_corpus("en", "it", &corpus).unwrap(), 1);
    assert_eq!(doc.get_document_languages(), vec!["en", "it"]);
    let links = doc.get_alignments("it", "en");
    assert_eq!(links[0].a, vec!["t1"]);
    assert_eq!(links[0].b, vec!["s1", "s2"]);
    assert_eq!(links[0].category, Category::Literal);

    let back = reparse(&doc);
    assert_eq!(back.get_alignments("en", "it"), doc.get_alignments("en", "it"));
}

#[tokio::test]
async fn test_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.xml");
    std::fs::write(&path, sample().generate_tei().unwrap()).unwrap();

    let mut doc = AlignmentDocument::new();
    doc.read_from_file(path.as_path()).await.unwrap();
    assert_eq!(doc.get_document_languages(), vec!["en", "de"]);

    let extra = dir.path().join("it.xml");
    std::fs::write(&extra, body("it", &["i1"])).unwrap();
    doc.add_file_document_per_language("it", &extra).await.unwrap();
    assert!(doc.get_document_per_language("it").contains(r#"xml:id="i1""#));
    assert!(doc.is_changed());
}
