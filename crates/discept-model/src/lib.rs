//! DiScEPT alignment model: language documents, images and alignments, and
//! their merged TEI representation.

pub mod corpus;
pub mod document;
pub mod joins;
pub mod reader;
pub mod source;
pub mod types;
pub mod writer;

pub use document::AlignmentDocument;
pub use source::TextResource;
pub use types::{
    AlignmentGroup, AlignmentLink, Category, DocumentSummary, Image, ImageType,
    LanguageDocument, LanguageSummary, PairSummary, ProjectMetadata,
};
