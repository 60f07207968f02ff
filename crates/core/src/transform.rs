//! Lyrics to slides transformation.
//!
//! Appends one slide per lyrics paragraph to an existing document, using
//! the document's second layout (title and content).

use crate::document::SlideDocument;
use crate::error::{Error, Result};
use crate::paragraphs::split_paragraphs;
use crate::types::{Alignment, FontSize, PlaceholderKind};

/// Fixed formatting applied to every generated slide.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideStyle {
    /// Index of the layout used for new slides.
    pub layout_index: usize,
    /// Font size of the "Song Lyrics N" title.
    pub title_size: FontSize,
    /// Font size of the lyrics paragraph.
    pub body_size: FontSize,
    /// Horizontal alignment of the lyrics paragraph.
    pub body_alignment: Alignment,
    /// Line spacing of the lyrics paragraph, as a multiple of single spacing.
    pub line_spacing: f64,
}

impl Default for SlideStyle {
    fn default() -> Self {
        Self {
            layout_index: 1,
            title_size: FontSize::from_points(18),
            body_size: FontSize::from_points(24),
            body_alignment: Alignment::Center,
            line_spacing: 1.5,
        }
    }
}

/// Title given to the `index`-th generated slide (1-based).
pub fn slide_title(index: usize) -> String {
    format!("Song Lyrics {}", index)
}

/// Turns lyrics text into appended slides.
#[derive(Debug, Clone, Default)]
pub struct LyricsToSlidesTransformer {
    style: SlideStyle,
}

impl LyricsToSlidesTransformer {
    /// Create a transformer with the standard slide style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one slide per paragraph of `lyrics` to `document`.
    ///
    /// Returns the same document handle. Existing slides are never touched,
    /// and calling this twice on one document appends the slides twice.
    pub fn transform<'d, D: SlideDocument>(
        &self,
        document: &'d mut D,
        lyrics: &str,
    ) -> Result<&'d mut D> {
        let paragraphs = split_paragraphs(lyrics);
        if paragraphs.is_empty() {
            log::debug!("No lyrics paragraphs found, document left unchanged");
            return Ok(document);
        }

        self.check_layout(document)?;

        for (idx, paragraph) in paragraphs.iter().enumerate() {
            let number = idx + 1;
            let slide = document.add_slide(self.style.layout_index)?;

            let title = document.placeholder(slide, PlaceholderKind::Title)?;
            document.set_text(title, &slide_title(number))?;
            document.set_font_size(title, self.style.title_size)?;

            let body = document.placeholder(slide, PlaceholderKind::Body)?;
            document.clear_text(body)?;
            document.set_text(body, paragraph)?;
            document.set_bullet(body, false)?;
            document.set_alignment(body, self.style.body_alignment)?;
            document.set_font_size(body, self.style.body_size)?;
            document.set_line_spacing(body, self.style.line_spacing)?;

            log::debug!("Added slide {} ({} chars)", number, paragraph.len());
        }

        log::info!(
            "Appended {} lyrics slides; document now has {} slides",
            paragraphs.len(),
            document.slide_count()
        );

        Ok(document)
    }

    /// Fail before adding anything if the layout can't hold our slides.
    fn check_layout<D: SlideDocument>(&self, document: &D) -> Result<()> {
        let layout = self.style.layout_index;
        if layout >= document.layout_count() {
            return Err(Error::InvalidDocument(format!(
                "document has {} layouts, need layout index {}",
                document.layout_count(),
                layout
            )));
        }

        for kind in [PlaceholderKind::Title, PlaceholderKind::Body] {
            if !document.layout_has_placeholder(layout, kind) {
                return Err(Error::InvalidDocument(format!(
                    "layout {} has no {:?} placeholder",
                    layout, kind
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlaceholderId, SlideId};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct MemoryParagraph {
        text: String,
        size: Option<FontSize>,
        alignment: Option<Alignment>,
        spacing: Option<f64>,
        bullet: bool,
    }

    #[derive(Debug, Default)]
    struct MemorySlide {
        layout: usize,
        title: Vec<MemoryParagraph>,
        body: Vec<MemoryParagraph>,
    }

    /// Minimal document: every layout has both placeholders unless listed
    /// in `layouts_without_body`.
    #[derive(Debug, Default)]
    struct MemoryDocument {
        layouts: usize,
        layouts_without_body: Vec<usize>,
        slides: Vec<MemorySlide>,
    }

    impl MemoryDocument {
        fn with_layouts(layouts: usize) -> Self {
            Self {
                layouts,
                ..Default::default()
            }
        }

        fn paragraphs(&mut self, ph: PlaceholderId) -> Result<&mut Vec<MemoryParagraph>> {
            let slide = self
                .slides
                .get_mut(ph.slide.0)
                .ok_or_else(|| Error::InvalidDocument("no such slide".into()))?;
            Ok(match ph.kind {
                PlaceholderKind::Title => &mut slide.title,
                PlaceholderKind::Body => &mut slide.body,
            })
        }
    }

    impl SlideDocument for MemoryDocument {
        fn layout_count(&self) -> usize {
            self.layouts
        }

        fn slide_count(&self) -> usize {
            self.slides.len()
        }

        fn layout_has_placeholder(&self, layout_index: usize, kind: PlaceholderKind) -> bool {
            kind == PlaceholderKind::Title || !self.layouts_without_body.contains(&layout_index)
        }

        fn add_slide(&mut self, layout_index: usize) -> Result<SlideId> {
            self.slides.push(MemorySlide {
                layout: layout_index,
                title: vec![MemoryParagraph::default()],
                body: vec![MemoryParagraph {
                    text: "Click to add text".into(),
                    bullet: true,
                    ..Default::default()
                }],
            });
            Ok(SlideId(self.slides.len() - 1))
        }

        fn placeholder(&self, slide: SlideId, kind: PlaceholderKind) -> Result<PlaceholderId> {
            Ok(PlaceholderId { slide, kind })
        }

        fn clear_text(&mut self, ph: PlaceholderId) -> Result<()> {
            *self.paragraphs(ph)? = vec![MemoryParagraph::default()];
            Ok(())
        }

        fn set_text(&mut self, ph: PlaceholderId, text: &str) -> Result<()> {
            *self.paragraphs(ph)? = vec![MemoryParagraph {
                text: text.to_string(),
                bullet: ph.kind == PlaceholderKind::Body,
                ..Default::default()
            }];
            Ok(())
        }

        fn set_font_size(&mut self, ph: PlaceholderId, size: FontSize) -> Result<()> {
            self.paragraphs(ph)?.iter_mut().for_each(|p| p.size = Some(size));
            Ok(())
        }

        fn set_alignment(&mut self, ph: PlaceholderId, alignment: Alignment) -> Result<()> {
            self.paragraphs(ph)?
                .iter_mut()
                .for_each(|p| p.alignment = Some(alignment));
            Ok(())
        }

        fn set_line_spacing(&mut self, ph: PlaceholderId, spacing: f64) -> Result<()> {
            self.paragraphs(ph)?
                .iter_mut()
                .for_each(|p| p.spacing = Some(spacing));
            Ok(())
        }

        fn set_bullet(&mut self, ph: PlaceholderId, visible: bool) -> Result<()> {
            self.paragraphs(ph)?.iter_mut().for_each(|p| p.bullet = visible);
            Ok(())
        }
    }

    const LYRICS: &str = "Amazing grace how sweet the sound\nThat saved a wretch like me\n\n\
                          I once was lost but now am found\nWas blind but now I see\n\n\
                          'Twas grace that taught my heart to fear";

    #[test]
    fn test_one_slide_per_paragraph() {
        let mut doc = MemoryDocument::with_layouts(2);
        LyricsToSlidesTransformer::new().transform(&mut doc, LYRICS).unwrap();

        assert_eq!(doc.slides.len(), 3);
        for (idx, slide) in doc.slides.iter().enumerate() {
            assert_eq!(slide.layout, 1);
            assert_eq!(slide.title.len(), 1);
            assert_eq!(slide.title[0].text, format!("Song Lyrics {}", idx + 1));
            assert_eq!(slide.title[0].size, Some(FontSize::from_points(18)));
        }
    }

    #[test]
    fn test_body_formatting() {
        let mut doc = MemoryDocument::with_layouts(2);
        LyricsToSlidesTransformer::new().transform(&mut doc, LYRICS).unwrap();

        let body = &doc.slides[1].body;
        assert_eq!(body.len(), 1);
        assert_eq!(
            body[0],
            MemoryParagraph {
                text: "I once was lost but now am found\nWas blind but now I see".into(),
                size: Some(FontSize::from_points(24)),
                alignment: Some(Alignment::Center),
                spacing: Some(1.5),
                bullet: false,
            }
        );
    }

    #[test]
    fn test_appends_after_existing_slides() {
        let mut doc = MemoryDocument::with_layouts(2);
        doc.add_slide(0).unwrap();

        LyricsToSlidesTransformer::new().transform(&mut doc, "one\n\ntwo").unwrap();

        assert_eq!(doc.slides.len(), 3);
        assert_eq!(doc.slides[0].layout, 0);
        assert_eq!(doc.slides[0].body[0].text, "Click to add text");
        assert_eq!(doc.slides[1].title[0].text, "Song Lyrics 1");
        assert_eq!(doc.slides[2].title[0].text, "Song Lyrics 2");
    }

    #[test]
    fn test_empty_lyrics_add_nothing() {
        let mut doc = MemoryDocument::with_layouts(2);
        let transformer = LyricsToSlidesTransformer::new();
        transformer.transform(&mut doc, "").unwrap();
        transformer.transform(&mut doc, " \n\n\t\n").unwrap();
        assert_eq!(doc.slide_count(), 0);
    }

    #[test]
    fn test_repeated_transform_appends_again() {
        let mut doc = MemoryDocument::with_layouts(2);
        let transformer = LyricsToSlidesTransformer::new();
        transformer.transform(&mut doc, LYRICS).unwrap();
        transformer.transform(&mut doc, LYRICS).unwrap();

        assert_eq!(doc.slide_count(), 6);
        // Numbering restarts for each call.
        assert_eq!(doc.slides[3].title[0].text, "Song Lyrics 1");
    }

    #[test]
    fn test_missing_layout_is_an_error() {
        let mut doc = MemoryDocument::with_layouts(1);
        let err = LyricsToSlidesTransformer::new()
            .transform(&mut doc, LYRICS)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
        assert_eq!(doc.slide_count(), 0);
    }

    #[test]
    fn test_missing_body_placeholder_is_an_error() {
        let mut doc = MemoryDocument::with_layouts(2);
        doc.layouts_without_body.push(1);
        let err = LyricsToSlidesTransformer::new()
            .transform(&mut doc, LYRICS)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
        assert_eq!(doc.slide_count(), 0);
    }

    #[test]
    fn test_empty_lyrics_skip_layout_check() {
        let mut doc = MemoryDocument::with_layouts(0);
        assert!(LyricsToSlidesTransformer::new().transform(&mut doc, "").is_ok());
    }
}
