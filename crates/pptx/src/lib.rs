//! PPTX (Office Open XML) document backend for lyrics slides.
//!
//! Opens .pptx packages (ZIP archives of XML parts), appends slides through
//! the [`lyrics_core::SlideDocument`] trait and writes the package back out.

pub mod document;
pub mod reader;
mod slide;
pub mod template;
mod xml;

pub use document::PptxDocument;
pub use reader::extract_slide;
pub use template::sample_template;
