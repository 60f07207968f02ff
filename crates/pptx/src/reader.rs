//! Slide text extraction.
//!
//! Reads the visible text of a slide part back into an [`ExtractedSlide`],
//! separating the title placeholder from the remaining text blocks.

use crate::xml::{attr, local_name, xml_err};
use lyrics_core::{ExtractedSlide, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Text collected from one shape.
#[derive(Debug, Default)]
struct ShapeText {
    is_title: bool,
    paragraphs: Vec<String>,
}

/// Extract the title and text blocks from slide XML.
///
/// Each `<a:p>` becomes one block; `<a:br/>` becomes a newline inside it.
/// Empty paragraphs are dropped.
pub fn extract_slide(xml: &str, number: usize) -> Result<ExtractedSlide> {
    let mut slide = ExtractedSlide::new(number);
    let mut reader = Reader::from_str(xml);

    let mut current_shape: Option<ShapeText> = None;
    let mut current_paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current_shape = Some(ShapeText::default()),
                b"p" if current_shape.is_some() => current_paragraph = Some(String::new()),
                b"t" => in_text = current_paragraph.is_some(),
                b"br" => {
                    if let Some(ref mut para) = current_paragraph {
                        para.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => {
                    if let Some(ref mut shape) = current_shape {
                        shape.is_title = matches!(
                            attr(e, "type").as_deref(),
                            Some("title") | Some("ctrTitle")
                        );
                    }
                }
                b"br" => {
                    if let Some(ref mut para) = current_paragraph {
                        para.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| xml_err("Invalid text in slide", e))?;
                if let Some(ref mut para) = current_paragraph {
                    para.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"p" => {
                    if let (Some(para), Some(shape)) =
                        (current_paragraph.take(), current_shape.as_mut())
                    {
                        if !para.trim().is_empty() {
                            shape.paragraphs.push(para);
                        }
                    }
                }
                b"sp" => {
                    if let Some(shape) = current_shape.take() {
                        if shape.is_title {
                            if !shape.paragraphs.is_empty() {
                                slide.title = Some(shape.paragraphs.join("\n"));
                            }
                        } else {
                            slide.body.extend(shape.paragraphs);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(xml_err(&format!("Error parsing slide {}", number), e));
            }
            _ => {}
        }
    }

    Ok(slide)
}
