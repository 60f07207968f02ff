//! WASM-compatible wrapper for lyrics slide generation.
//!
//! This crate exposes search URL building, deck generation and slide
//! inspection to JavaScript, plus the page state of the two-page web UI.

use lyrics_core::{
    output_file_name, ExtractedSlide, Language, LyricsToSlidesTransformer, Page,
    SearchQueryBuilder, SlideDocument, PPTX_MIME_TYPE,
};
use lyrics_pptx::PptxDocument;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// A generated deck ready to offer as a download.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct GeneratedDeck {
    file_name: String,
    slide_count: usize,
    added_slides: usize,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl GeneratedDeck {
    /// Download file name, `"<song name>.pptx"`.
    #[wasm_bindgen(getter, js_name = fileName)]
    pub fn file_name(&self) -> String {
        self.file_name.clone()
    }

    /// MIME type for the download.
    #[wasm_bindgen(getter, js_name = mimeType)]
    pub fn mime_type(&self) -> String {
        PPTX_MIME_TYPE.to_string()
    }

    /// Total slides in the deck.
    #[wasm_bindgen(getter, js_name = slideCount)]
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Slides added from the lyrics.
    #[wasm_bindgen(getter, js_name = addedSlides)]
    pub fn added_slides(&self) -> usize {
        self.added_slides
    }

    /// The `.pptx` file contents.
    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Summary of an inspected presentation.
#[derive(Debug, Serialize)]
pub struct InspectionResult {
    /// Number of slides found.
    pub slide_count: usize,
    /// Text of each slide.
    pub slides: Vec<ExtractedSlide>,
}

/// Page state of one browser session.
///
/// Starts on the lyrics searcher; the host swaps pages through this value
/// instead of any global state.
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct Session {
    page: Page,
}

#[wasm_bindgen]
impl Session {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Heading of the current page.
    #[wasm_bindgen(getter, js_name = pageTitle)]
    pub fn page_title(&self) -> String {
        self.page.title().to_string()
    }

    /// Whether the slide generator page is showing.
    #[wasm_bindgen(getter, js_name = onGenerator)]
    pub fn on_generator(&self) -> bool {
        self.page == Page::PptGenerator
    }

    /// Switch to the slide generator page.
    #[wasm_bindgen(js_name = goToGenerator)]
    pub fn go_to_generator(&mut self) {
        self.page = Page::PptGenerator;
    }

    /// Switch back to the lyrics searcher page.
    #[wasm_bindgen(js_name = goToSearcher)]
    pub fn go_to_searcher(&mut self) {
        self.page = Page::LyricsSearcher;
    }
}

/// Build a lyrics search URL.
///
/// # Arguments
/// * `first_line` - The first line of the lyrics
/// * `language` - One of English, Malayalam, Tamil, Hindi
///
/// # Returns
/// The URL, or throws "Please enter the first line of lyrics." when empty.
#[wasm_bindgen(js_name = buildSearchUrl)]
pub fn build_search_url(first_line: &str, language: &str) -> Result<String, JsValue> {
    build_search_url_impl(first_line, language).map_err(|e| JsValue::from_str(&e))
}

fn build_search_url_impl(first_line: &str, language: &str) -> Result<String, String> {
    let language: Language = language.parse().map_err(|e| format!("{}", e))?;
    SearchQueryBuilder::new()
        .try_build_url(first_line, language)
        .map_err(|e| e.to_string())
}

/// Add one slide per lyrics paragraph to a template.
///
/// # Arguments
/// * `template` - Bytes of an uploaded .pptx, or nothing to use the sample template
/// * `song_name` - Used for the download file name
/// * `lyrics` - Lyrics, paragraphs separated by blank lines
///
/// # Returns
/// The generated deck, `undefined` when the song name or lyrics are blank,
/// or throws on an invalid template.
#[wasm_bindgen(js_name = generatePresentation)]
pub fn generate_presentation(
    template: Option<Vec<u8>>,
    song_name: &str,
    lyrics: &str,
) -> Result<Option<GeneratedDeck>, JsValue> {
    generate_presentation_impl(template.as_deref(), song_name, lyrics)
        .map_err(|e| JsValue::from_str(&e))
}

fn generate_presentation_impl(
    template: Option<&[u8]>,
    song_name: &str,
    lyrics: &str,
) -> Result<Option<GeneratedDeck>, String> {
    let song_name = song_name.trim();
    if song_name.is_empty() || lyrics.trim().is_empty() {
        return Ok(None);
    }

    // Reopen the template every time so repeated clicks don't pile up slides.
    let mut document = match template {
        Some(bytes) => PptxDocument::from_bytes(bytes),
        None => PptxDocument::sample(),
    }
    .map_err(|e| format!("Invalid PowerPoint template: {}", e))?;

    LyricsToSlidesTransformer::new()
        .transform(&mut document, lyrics)
        .map_err(|e| e.to_string())?;

    let bytes = document
        .to_bytes()
        .map_err(|e| format!("Failed to write presentation: {}", e))?;

    Ok(Some(GeneratedDeck {
        file_name: output_file_name(song_name),
        slide_count: document.slide_count(),
        added_slides: document.added_slide_count(),
        bytes,
    }))
}

/// Read the text of every slide in a .pptx file.
#[wasm_bindgen(js_name = inspectPresentation)]
pub fn inspect_presentation(data: &[u8]) -> Result<JsValue, JsValue> {
    let result = inspect_presentation_impl(data).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn inspect_presentation_impl(data: &[u8]) -> Result<InspectionResult, String> {
    let document =
        PptxDocument::from_bytes(data).map_err(|e| format!("PPTX parsing error: {}", e))?;
    let slides = document.slides().map_err(|e| e.to_string())?;

    Ok(InspectionResult {
        slide_count: slides.len(),
        slides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_pages() {
        let mut session = Session::new();
        assert!(!session.on_generator());
        assert_eq!(session.page_title(), "Lyrics Searcher");

        session.go_to_generator();
        assert!(session.on_generator());
        assert_eq!(session.page_title(), "Lyrics to PPT Converter");

        session.go_to_searcher();
        assert!(!session.on_generator());
    }

    #[test]
    fn test_build_search_url() {
        let url = build_search_url_impl("Amazing Grace", "english").unwrap();
        assert_eq!(
            url,
            "https://www.google.com/search?q=lyrics+Amazing+Grace+English+christian+devotional"
        );
        assert_eq!(
            build_search_url_impl("", "English").unwrap_err(),
            "Please enter the first line of lyrics."
        );
        assert!(build_search_url_impl("Amazing Grace", "Latin").is_err());
    }

    #[test]
    fn test_generate_from_sample() {
        let deck = generate_presentation_impl(None, "Amazing Grace", "one\n\ntwo\n\nthree")
            .unwrap()
            .unwrap();

        assert_eq!(deck.file_name(), "Amazing Grace.pptx");
        assert_eq!(
            deck.mime_type(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        );
        assert_eq!(deck.slide_count(), 3);
        assert_eq!(deck.added_slides(), 3);

        let inspected = inspect_presentation_impl(&deck.bytes()).unwrap();
        assert_eq!(inspected.slide_count, 3);
        assert_eq!(inspected.slides[2].body, vec!["three"]);
    }

    #[test]
    fn test_generate_on_uploaded_template() {
        let first = generate_presentation_impl(None, "First", "intro")
            .unwrap()
            .unwrap();
        let second = generate_presentation_impl(Some(&first.bytes()), "Second", "a\n\nb")
            .unwrap()
            .unwrap();

        assert_eq!(second.slide_count(), 3);
        assert_eq!(second.added_slides(), 2);
    }

    #[test]
    fn test_generate_needs_name_and_lyrics() {
        assert!(generate_presentation_impl(None, "", "lyrics").unwrap().is_none());
        assert!(generate_presentation_impl(None, "Song", "  ").unwrap().is_none());
    }

    #[test]
    fn test_invalid_template() {
        let err = generate_presentation_impl(Some(b"nope"), "Song", "lyrics").unwrap_err();
        assert!(err.starts_with("Invalid PowerPoint template"));
    }
}
