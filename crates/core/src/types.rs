//! Domain types shared by the transformer, the document backends and the hosts.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MIME type of a generated `.pptx` download.
pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// File name offered for a generated deck.
pub fn output_file_name(song_name: &str) -> String {
    format!("{}.pptx", song_name)
}

/// Language offered by the lyrics search helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Malayalam,
    Tamil,
    Hindi,
}

impl Language {
    /// All selectable languages, in display order.
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Malayalam,
        Language::Tamil,
        Language::Hindi,
    ];

    /// Display label, as inserted into the search phrase.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Malayalam => "Malayalam",
            Language::Tamil => "Tamil",
            Language::Hindi => "Hindi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownLanguage(s.to_string()))
    }
}

/// Which page a host shell is currently showing.
///
/// Hosts own this value; nothing in the core keeps it globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Page {
    #[default]
    LyricsSearcher,
    PptGenerator,
}

impl Page {
    /// Heading shown for the page.
    pub fn title(self) -> &'static str {
        match self {
            Page::LyricsSearcher => "Lyrics Searcher",
            Page::PptGenerator => "Lyrics to PPT Converter",
        }
    }
}

/// Font size in hundredths of a point (the OOXML `sz` unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontSize(u32);

impl FontSize {
    /// Font size from whole points.
    pub const fn from_points(points: u32) -> Self {
        Self(points * 100)
    }

    /// Size in hundredths of a point.
    pub fn centipoints(self) -> u32 {
        self.0
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Value of the DrawingML `algn` attribute.
    pub fn ooxml_value(self) -> &'static str {
        match self {
            Alignment::Left => "l",
            Alignment::Center => "ctr",
            Alignment::Right => "r",
            Alignment::Justify => "just",
        }
    }
}

/// Handle to a slide inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlideId(pub usize);

/// The placeholder regions the transformer writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    /// The slide title.
    Title,
    /// The main content region.
    Body,
}

/// Handle to a placeholder on a specific slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId {
    pub slide: SlideId,
    pub kind: PlaceholderKind,
}

/// The format of a presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Recognized so it can be rejected clearly.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// Text read back from a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number in presentation order.
    pub number: usize,

    /// Text of the title placeholder, if the slide has one.
    pub title: Option<String>,

    /// Every other text block on the slide, one entry per paragraph.
    pub body: Vec<String>,
}

impl ExtractedSlide {
    /// Create an empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            title: None,
            body: Vec::new(),
        }
    }
}
