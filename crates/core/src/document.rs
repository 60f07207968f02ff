//! The document capability the transformer writes through.
//!
//! Keeping this a trait means the transformer never touches a file format
//! directly; `lyrics-pptx` provides the Office Open XML implementation.

use crate::error::Result;
use crate::types::{Alignment, FontSize, PlaceholderId, PlaceholderKind, SlideId};

/// A mutable presentation that slides can be appended to.
///
/// Implementations are not expected to be thread-safe; callers hold a
/// `&mut` for the whole transformation.
pub trait SlideDocument {
    /// Number of slide layouts the document offers.
    fn layout_count(&self) -> usize;

    /// Number of slides currently in the document.
    fn slide_count(&self) -> usize;

    /// Whether the layout at `layout_index` has a placeholder of `kind`.
    fn layout_has_placeholder(&self, layout_index: usize, kind: PlaceholderKind) -> bool;

    /// Append a new slide based on the layout at `layout_index`.
    fn add_slide(&mut self, layout_index: usize) -> Result<SlideId>;

    /// Look up a placeholder on a slide.
    fn placeholder(&self, slide: SlideId, kind: PlaceholderKind) -> Result<PlaceholderId>;

    /// Remove all text from a placeholder, leaving one empty paragraph.
    fn clear_text(&mut self, placeholder: PlaceholderId) -> Result<()>;

    /// Replace the placeholder's content with a single paragraph.
    fn set_text(&mut self, placeholder: PlaceholderId, text: &str) -> Result<()>;

    /// Set the font size of every paragraph in the placeholder.
    fn set_font_size(&mut self, placeholder: PlaceholderId, size: FontSize) -> Result<()>;

    /// Set horizontal alignment of every paragraph in the placeholder.
    fn set_alignment(&mut self, placeholder: PlaceholderId, alignment: Alignment) -> Result<()>;

    /// Set line spacing, as a multiple of single spacing.
    fn set_line_spacing(&mut self, placeholder: PlaceholderId, spacing: f64) -> Result<()>;

    /// Show or hide the bullet marker on every paragraph in the placeholder.
    fn set_bullet(&mut self, placeholder: PlaceholderId, visible: bool) -> Result<()>;
}
