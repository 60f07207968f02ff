//! Core domain types, paragraph splitting, and the lyrics-to-slides
//! transformer.

pub mod document;
pub mod error;
pub mod paragraphs;
pub mod search;
pub mod transform;
pub mod types;

pub use document::SlideDocument;
pub use error::{Error, Result};
pub use paragraphs::split_paragraphs;
pub use search::SearchQueryBuilder;
pub use transform::{slide_title, LyricsToSlidesTransformer, SlideStyle};
pub use types::{
    output_file_name, Alignment, ExtractedSlide, FontSize, Language, Page, PlaceholderId,
    PlaceholderKind, PresentationFormat, SlideId, PPTX_MIME_TYPE,
};
