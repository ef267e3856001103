//! Response shapes the editor front end relies on.
//!
//! The handlers serialize the model types directly, so these tests pin the
//! JSON field names of those types.

use discept_model::{
    AlignmentDocument, AlignmentLink, Category, Image, ImageType, ProjectMetadata,
};

/// Alignment link: `{ a: string[], b: string[], category: string }`
#[test]
fn test_alignment_link_shape() {
    let link = AlignmentLink::new(vec!["e1".into(), "e2".into()], vec!["d1".into()], Category::Semantic);
    let json = serde_json::to_value(&link).unwrap();

    assert!(json["a"].is_array());
    assert!(json["b"].is_array());
    assert_eq!(json["category"], "Semantic");
    assert_eq!(json.as_object().unwrap().len(), 3);
}

/// Image: `{ id, ids, url, type }` with `type` one of `"URL"` / `"IIIF"`.
#[test]
fn test_image_shape() {
    let image = Image {
        id: "img1".into(),
        ids: vec!["a1".into()],
        url: "http://example.com/img.jpg".into(),
        image_type: ImageType::Iiif,
    };
    let json = serde_json::to_value(&image).unwrap();

    assert!(json["id"].is_string());
    assert!(json["ids"].is_array());
    assert!(json["url"].is_string());
    assert_eq!(json["type"], "IIIF");

    let parsed: Image = serde_json::from_value(serde_json::json!({
        "id": "img2",
        "ids": [],
        "url": "http://example.com/2.jpg",
    }))
    .unwrap();
    assert_eq!(parsed.image_type, ImageType::Url);
}

/// Project: camelCase keys, absent fields omitted, unknown keys kept.
#[test]
fn test_project_shape() {
    let project: ProjectMetadata = serde_json::from_value(serde_json::json!({
        "title": "Edition",
        "pubStatement": "CC-BY",
        "notes": ["kept"],
    }))
    .unwrap();
    let json = serde_json::to_value(&project).unwrap();

    assert_eq!(json["title"], "Edition");
    assert_eq!(json["pubStatement"], "CC-BY");
    assert_eq!(json["notes"][0], "kept");
    assert!(json.get("authors").is_none());
}

/// Summary: `{ languages: [{language, images, body_bytes}], alignments: [{langA, langB, links}], changed }`
#[test]
fn test_summary_shape() {
    let mut doc = AlignmentDocument::demo();
    doc.add_alignment("it", "en", vec!["i1".into()], vec!["e1".into()], Category::Other);
    let json = serde_json::to_value(doc.summary()).unwrap();

    assert_eq!(json["languages"][0]["language"], "it");
    assert!(json["languages"][0]["images"].is_number());
    assert!(json["languages"][0]["body_bytes"].is_number());
    assert_eq!(json["alignments"][0]["langA"], "it");
    assert_eq!(json["alignments"][0]["langB"], "en");
    assert_eq!(json["alignments"][0]["links"], 1);
    assert_eq!(json["changed"], true);
}
