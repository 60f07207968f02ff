//! Slides added in memory, and their serialization to PresentationML.

use crate::xml::{
    into_string, write, write_decl, write_empty, write_end, write_start, NS_MAIN,
    NS_PACKAGE_REL, NS_PML, NS_REL, REL_TYPE_SLIDE_LAYOUT,
};
use lyrics_core::{Alignment, FontSize, PlaceholderKind, Result};
use quick_xml::events::{BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;

/// Vertical tab, pasted from Office as a soft line break.
const SOFT_BREAK: char = '\u{0B}';

/// Escape C0 control characters XML 1.0 cannot carry as `_xHHHH_`.
///
/// Tab, line feed and carriage return are legal and kept as is.
fn escape_control_chars(text: &str) -> Cow<'_, str> {
    let is_illegal =
        |c: char| c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r' | '\u{7F}');
    if !text.contains(is_illegal) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_illegal(c) {
            escaped.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// A placeholder defined on a slide layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LayoutPlaceholder {
    pub name: String,
    pub ph_type: Option<String>,
    pub idx: Option<u32>,
}

impl LayoutPlaceholder {
    fn is_title(&self) -> bool {
        matches!(self.ph_type.as_deref(), Some("title") | Some("ctrTitle"))
    }

    /// Date, footer and slide number placeholders are not copied to new slides.
    pub fn is_cloneable(&self) -> bool {
        !matches!(
            self.ph_type.as_deref(),
            Some("dt") | Some("ftr") | Some("sldNum")
        )
    }

    fn is_content(&self) -> bool {
        matches!(self.ph_type.as_deref(), None | Some("body") | Some("obj"))
    }
}

/// Pick the placeholder of `kind` from a list of layout placeholders.
///
/// The body is the placeholder with index 1 when there is one, otherwise
/// the first generic content placeholder.
pub(crate) fn find_placeholder<'a, I>(placeholders: I, kind: PlaceholderKind) -> Option<usize>
where
    I: Iterator<Item = &'a LayoutPlaceholder> + Clone,
{
    match kind {
        PlaceholderKind::Title => placeholders.clone().position(|p| p.is_title()),
        PlaceholderKind::Body => placeholders
            .clone()
            .position(|p| p.idx == Some(1) && !p.is_title())
            .or_else(|| placeholders.clone().position(|p| p.is_content())),
    }
}

/// One paragraph of placeholder text with its formatting overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Paragraph {
    pub text: String,
    pub alignment: Option<Alignment>,
    pub font_size: Option<FontSize>,
    pub line_spacing: Option<f64>,
    /// `None` inherits the layout's bullet; `Some(false)` writes `buNone`.
    pub bullet: Option<bool>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// A placeholder shape on a new slide.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaceholderShape {
    pub source: LayoutPlaceholder,
    pub paragraphs: Vec<Paragraph>,
}

/// A slide added since the document was opened.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSlide {
    pub part_name: String,
    pub layout_part: String,
    pub slide_id: u32,
    pub rel_id: String,
    pub shapes: Vec<PlaceholderShape>,
}

impl PendingSlide {
    /// Build a slide from a layout's cloneable placeholders, each holding
    /// one empty paragraph.
    pub fn from_layout(
        part_name: String,
        layout_part: String,
        slide_id: u32,
        rel_id: String,
        placeholders: &[LayoutPlaceholder],
    ) -> Self {
        let shapes = placeholders
            .iter()
            .filter(|p| p.is_cloneable())
            .map(|p| PlaceholderShape {
                source: p.clone(),
                paragraphs: vec![Paragraph::default()],
            })
            .collect();

        Self {
            part_name,
            layout_part,
            slide_id,
            rel_id,
            shapes,
        }
    }

    /// Index of the shape playing `kind`, if any.
    pub fn shape_index(&self, kind: PlaceholderKind) -> Option<usize> {
        find_placeholder(self.shapes.iter().map(|s| &s.source), kind)
    }

    /// Serialize the slide part.
    pub fn to_xml(&self) -> Result<String> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        write_start(
            &mut w,
            "p:sld",
            &[("xmlns:a", NS_MAIN), ("xmlns:r", NS_REL), ("xmlns:p", NS_PML)],
        )?;
        write_start(&mut w, "p:cSld", &[])?;
        write_start(&mut w, "p:spTree", &[])?;

        write_start(&mut w, "p:nvGrpSpPr", &[])?;
        write_empty(&mut w, "p:cNvPr", &[("id", "1"), ("name", "")])?;
        write_empty(&mut w, "p:cNvGrpSpPr", &[])?;
        write_empty(&mut w, "p:nvPr", &[])?;
        write_end(&mut w, "p:nvGrpSpPr")?;
        write_empty(&mut w, "p:grpSpPr", &[])?;

        for (i, shape) in self.shapes.iter().enumerate() {
            write_shape(&mut w, shape, i as u32 + 2)?;
        }

        write_end(&mut w, "p:spTree")?;
        write_end(&mut w, "p:cSld")?;
        write_start(&mut w, "p:clrMapOvr", &[])?;
        write_empty(&mut w, "a:masterClrMapping", &[])?;
        write_end(&mut w, "p:clrMapOvr")?;
        write_end(&mut w, "p:sld")?;

        into_string(w)
    }

    /// Serialize the slide's relationship part (just its layout).
    pub fn rels_xml(&self) -> Result<String> {
        let target = crate::xml::relative_target(&self.part_name, &self.layout_part);

        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        write_start(&mut w, "Relationships", &[("xmlns", NS_PACKAGE_REL)])?;
        write_empty(
            &mut w,
            "Relationship",
            &[
                ("Id", "rId1"),
                ("Type", REL_TYPE_SLIDE_LAYOUT),
                ("Target", target.as_str()),
            ],
        )?;
        write_end(&mut w, "Relationships")?;

        into_string(w)
    }
}

fn write_shape(w: &mut Writer<Vec<u8>>, shape: &PlaceholderShape, shape_id: u32) -> Result<()> {
    let id = shape_id.to_string();
    let idx = shape.source.idx.map(|i| i.to_string());

    let mut ph_attrs: Vec<(&str, &str)> = Vec::new();
    if let Some(ph_type) = shape.source.ph_type.as_deref() {
        ph_attrs.push(("type", ph_type));
    }
    if let Some(idx) = idx.as_deref() {
        ph_attrs.push(("idx", idx));
    }

    write_start(w, "p:sp", &[])?;
    write_start(w, "p:nvSpPr", &[])?;
    write_empty(w, "p:cNvPr", &[("id", id.as_str()), ("name", shape.source.name.as_str())])?;
    write_start(w, "p:cNvSpPr", &[])?;
    write_empty(w, "a:spLocks", &[("noGrp", "1")])?;
    write_end(w, "p:cNvSpPr")?;
    write_start(w, "p:nvPr", &[])?;
    write_empty(w, "p:ph", &ph_attrs)?;
    write_end(w, "p:nvPr")?;
    write_end(w, "p:nvSpPr")?;
    write_empty(w, "p:spPr", &[])?;

    write_start(w, "p:txBody", &[])?;
    write_empty(w, "a:bodyPr", &[])?;
    write_empty(w, "a:lstStyle", &[])?;
    for paragraph in &shape.paragraphs {
        write_paragraph(w, paragraph)?;
    }
    write_end(w, "p:txBody")?;
    write_end(w, "p:sp")
}

fn write_paragraph(w: &mut Writer<Vec<u8>>, paragraph: &Paragraph) -> Result<()> {
    write_start(w, "a:p", &[])?;

    let has_children = paragraph.line_spacing.is_some() || paragraph.bullet == Some(false);
    let algn: Vec<(&str, &str)> = paragraph
        .alignment
        .map(|a| vec![("algn", a.ooxml_value())])
        .unwrap_or_default();

    if has_children {
        write_start(w, "a:pPr", &algn)?;
        if let Some(spacing) = paragraph.line_spacing {
            let val = ((spacing * 100_000.0).round() as i64).to_string();
            write_start(w, "a:lnSpc", &[])?;
            write_empty(w, "a:spcPct", &[("val", val.as_str())])?;
            write_end(w, "a:lnSpc")?;
        }
        if paragraph.bullet == Some(false) {
            write_empty(w, "a:buNone", &[])?;
        }
        write_end(w, "a:pPr")?;
    } else if !algn.is_empty() {
        write_empty(w, "a:pPr", &algn)?;
    }

    let size = paragraph.font_size.map(|s| s.centipoints().to_string());
    let mut run_attrs: Vec<(&str, &str)> = vec![("lang", "en-US")];
    if let Some(size) = size.as_deref() {
        run_attrs.push(("sz", size));
    }
    run_attrs.push(("dirty", "0"));

    for (i, line) in paragraph.text.split(['\n', SOFT_BREAK]).enumerate() {
        if i > 0 {
            write_start(w, "a:br", &[])?;
            write_empty(w, "a:rPr", &run_attrs)?;
            write_end(w, "a:br")?;
        }
        if line.is_empty() {
            continue;
        }
        write_start(w, "a:r", &[])?;
        write_empty(w, "a:rPr", &run_attrs)?;
        write_start(w, "a:t", &[])?;
        write(w, Event::Text(BytesText::new(&escape_control_chars(line))))?;
        write_end(w, "a:t")?;
        write_end(w, "a:r")?;
    }

    write_empty(w, "a:endParaRPr", &run_attrs)?;
    write_end(w, "a:p")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_ph() -> LayoutPlaceholder {
        LayoutPlaceholder {
            name: "Title 1".into(),
            ph_type: Some("title".into()),
            idx: None,
        }
    }

    fn body_ph() -> LayoutPlaceholder {
        LayoutPlaceholder {
            name: "Content Placeholder 2".into(),
            ph_type: None,
            idx: Some(1),
        }
    }

    fn date_ph() -> LayoutPlaceholder {
        LayoutPlaceholder {
            name: "Date Placeholder 3".into(),
            ph_type: Some("dt".into()),
            idx: Some(10),
        }
    }

    #[test]
    fn test_find_placeholder() {
        let phs = vec![title_ph(), body_ph(), date_ph()];
        assert_eq!(find_placeholder(phs.iter(), PlaceholderKind::Title), Some(0));
        assert_eq!(find_placeholder(phs.iter(), PlaceholderKind::Body), Some(1));
        assert_eq!(find_placeholder([date_ph()].iter(), PlaceholderKind::Body), None);
    }

    #[test]
    fn test_from_layout_skips_footer_placeholders() {
        let slide = PendingSlide::from_layout(
            "ppt/slides/slide1.xml".into(),
            "ppt/slideLayouts/slideLayout2.xml".into(),
            256,
            "rId5".into(),
            &[title_ph(), body_ph(), date_ph()],
        );
        assert_eq!(slide.shapes.len(), 2);
        assert_eq!(slide.shape_index(PlaceholderKind::Body), Some(1));
    }

    #[test]
    fn test_paragraph_xml() {
        let mut slide = PendingSlide::from_layout(
            "ppt/slides/slide1.xml".into(),
            "ppt/slideLayouts/slideLayout2.xml".into(),
            256,
            "rId5".into(),
            &[body_ph()],
        );
        slide.shapes[0].paragraphs = vec![Paragraph {
            text: "Grace & peace\nto you".into(),
            alignment: Some(Alignment::Center),
            font_size: Some(FontSize::from_points(24)),
            line_spacing: Some(1.5),
            bullet: Some(false),
        }];

        let xml = slide.to_xml().unwrap();
        assert!(xml.contains(r#"<a:pPr algn="ctr"><a:lnSpc><a:spcPct val="150000"/></a:lnSpc><a:buNone/></a:pPr>"#));
        assert!(xml.contains(r#"<a:t>Grace &amp; peace</a:t>"#));
        assert!(xml.contains(r#"<a:br><a:rPr lang="en-US" sz="2400" dirty="0"/></a:br>"#));
        assert!(xml.contains(r#"<p:ph idx="1"/>"#));
        assert_eq!(xml.matches("<a:p>").count(), 1);
    }

    #[test]
    fn test_control_characters_in_text() {
        let mut slide = PendingSlide::from_layout(
            "ppt/slides/slide1.xml".into(),
            "ppt/slideLayouts/slideLayout2.xml".into(),
            256,
            "rId5".into(),
            &[body_ph()],
        );
        slide.shapes[0].paragraphs =
            vec![Paragraph::new("Amazing grace\u{0B}how sweet\u{0C}\tthe sound")];

        let xml = slide.to_xml().unwrap();
        let illegal: Vec<char> = xml
            .chars()
            .filter(|c| c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
            .collect();
        assert!(illegal.is_empty(), "illegal characters: {:?}", illegal);

        // vertical tab is a soft line break, form feed is escaped
        assert!(xml.contains("<a:t>Amazing grace</a:t>"));
        assert_eq!(xml.matches("<a:br>").count(), 1);
        assert!(xml.contains("<a:t>how sweet_x000C_\tthe sound</a:t>"));
    }

    #[test]
    fn test_escape_control_chars() {
        assert!(matches!(escape_control_chars("plain\ttext"), Cow::Borrowed(_)));
        assert_eq!(escape_control_chars("a\u{1}b\u{1F}"), "a_x0001_b_x001F_");
    }

    #[test]
    fn test_rels_xml_points_at_layout() {
        let slide = PendingSlide::from_layout(
            "ppt/slides/slide7.xml".into(),
            "ppt/slideLayouts/slideLayout2.xml".into(),
            256,
            "rId5".into(),
            &[],
        );
        let rels = slide.rels_xml().unwrap();
        assert!(rels.contains(r#"Target="../slideLayouts/slideLayout2.xml""#));
    }
}
