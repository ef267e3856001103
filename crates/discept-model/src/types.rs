//! Data types for language documents, images and alignments.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification label attached to an alignment link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Linguistic,
    Semantic,
    Literal,
    Other,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Self::Linguistic, Self::Semantic, Self::Literal, Self::Other]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linguistic => "Linguistic",
            Self::Semantic => "Semantic",
            Self::Literal => "Literal",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown alignment category '{}'", s))
    }
}

/// How an image URL is to be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageType {
    #[default]
    #[serde(rename = "URL")]
    Url,
    /// IIIF image service. Stored and exported, not resolved.
    #[serde(rename = "IIIF")]
    Iiif,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "URL",
            Self::Iiif => "IIIF",
        }
    }
}

impl FromStr for ImageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "URL" | "" => Ok(Self::Url),
            "IIIF" => Ok(Self::Iiif),
            other => Err(format!("unknown image type '{}'", other)),
        }
    }
}

/// An image illustrating one or more text elements of a language document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub ids: Vec<String>,
    pub url: String,
    #[serde(rename = "type", default)]
    pub image_type: ImageType,
}

/// A correspondence between elements of language A and language B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentLink {
    pub a: Vec<String>,
    pub b: Vec<String>,
    #[serde(default)]
    pub category: Category,
}

impl AlignmentLink {
    pub fn new(a: Vec<String>, b: Vec<String>, category: Category) -> Self {
        Self { a, b, category }
    }

    /// The same link seen from the other language.
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
            category: self.category,
        }
    }
}

/// All links of one unordered language pair, stored in the order of its first writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentGroup {
    pub lang_a: String,
    pub lang_b: String,
    pub alignments: Vec<AlignmentLink>,
}

impl AlignmentGroup {
    /// `Some(false)` if stored as `(a, b)`, `Some(true)` if stored as `(b, a)`.
    pub fn orientation(&self, lang_a: &str, lang_b: &str) -> Option<bool> {
        if self.lang_a == lang_a && self.lang_b == lang_b {
            Some(false)
        } else if self.lang_a == lang_b && self.lang_b == lang_a {
            Some(true)
        } else {
            None
        }
    }

    pub fn involves(&self, language: &str) -> bool {
        self.lang_a == language || self.lang_b == language
    }
}

/// One language's TEI body and its images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDocument {
    pub language: String,
    pub body: String,
    pub images: Vec<Image>,
}

/// Free-form project record. The well-known keys are typed; anything else
/// round-trips through `extra` for API clients but is not exported to TEI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// One author per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    /// One responsibility statement per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_statement: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectMetadata {
    pub fn author_lines(&self) -> Vec<&str> {
        lines(self.authors.as_deref())
    }

    pub fn resp_lines(&self) -> Vec<&str> {
        lines(self.resps.as_deref())
    }
}

fn lines(value: Option<&str>) -> Vec<&str> {
    value
        .unwrap_or("")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Counts per language and per aligned pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub languages: Vec<LanguageSummary>,
    pub alignments: Vec<PairSummary>,
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageSummary {
    pub language: String,
    pub images: usize,
    pub body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairSummary {
    pub lang_a: String,
    pub lang_b: String,
    pub links: usize,
}
