//! PPTX document implementation of [`SlideDocument`].
//!
//! The package is held in memory part by part. Slides that were already in
//! the file are never rewritten; new slides live in memory until
//! [`PptxDocument::save`] writes them, along with the updated presentation,
//! relationship and content type parts.

use crate::reader::extract_slide;
use crate::slide::{find_placeholder, LayoutPlaceholder, PendingSlide, Paragraph};
use crate::template::sample_template;
use crate::xml::{
    attr, into_string, local_name, parse_relationships, prefixed_attr, rel_id_number,
    rels_path_for, resolve_target, write, write_empty, write_end, write_start, xml_err,
    Relationship, CT_SLIDE, NS_REL, REL_TYPE_SLIDE,
};
use lyrics_core::{
    Alignment, Error, ExtractedSlide, FontSize, PlaceholderId, PlaceholderKind,
    PresentationFormat, Result, SlideDocument, SlideId,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// First slide id PowerPoint hands out.
const MIN_SLIDE_ID: u32 = 256;

/// Presentation children that come after `sldIdLst`, in schema order.
const AFTER_SLIDE_ID_LIST: &[&[u8]] = &[
    b"sldSz",
    b"notesSz",
    b"smartTags",
    b"embeddedFontLst",
    b"custShowLst",
    b"photoAlbum",
    b"custDataLst",
    b"kinsoku",
    b"defaultTextStyle",
    b"modifyVerifier",
    b"extLst",
];

/// A slide layout from the first slide master.
#[derive(Debug, Clone)]
struct Layout {
    part_name: String,
    name: Option<String>,
    placeholders: Vec<LayoutPlaceholder>,
}

/// An Office Open XML presentation opened for appending slides.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    /// Every package part in archive order.
    parts: Vec<(String, Vec<u8>)>,
    presentation_part: String,
    /// Slide parts present when the document was opened, in slide order.
    slide_parts: Vec<String>,
    layouts: Vec<Layout>,
    pending: Vec<PendingSlide>,
    next_slide_id: u32,
    next_rel_id: u32,
}

impl PptxDocument {
    /// Open a PPTX package from a reader.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push((name, data));
        }

        Self::from_parts(parts)
    }

    /// Open a PPTX package from uploaded bytes, rejecting other formats.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match PresentationFormat::from_magic(bytes) {
            Some(PresentationFormat::Pptx) => Self::open(Cursor::new(bytes)),
            Some(PresentationFormat::Ppt) => Err(Error::UnsupportedFormat(
                "legacy .ppt files are not supported, save the file as .pptx".to_string(),
            )),
            None => Err(Error::UnsupportedFormat(
                "file is not a PowerPoint .pptx package".to_string(),
            )),
        }
    }

    /// Open the built-in sample template.
    pub fn sample() -> Result<Self> {
        Self::open(Cursor::new(sample_template()?))
    }

    fn from_parts(parts: Vec<(String, Vec<u8>)>) -> Result<Self> {
        let mut doc = Self {
            parts,
            presentation_part: DEFAULT_PRESENTATION_PART.to_string(),
            slide_parts: Vec::new(),
            layouts: Vec::new(),
            pending: Vec::new(),
            next_slide_id: MIN_SLIDE_ID,
            next_rel_id: 1,
        };

        doc.part_str(CONTENT_TYPES_PART)?;
        doc.presentation_part = doc.find_presentation_part()?;

        let presentation_rels = doc.relationships_of(&doc.presentation_part)?;
        let presentation = parse_presentation(doc.part_str(&doc.presentation_part)?)?;

        // External relationships take ids too.
        doc.next_rel_id = presentation_rels
            .iter()
            .filter_map(|r| rel_id_number(&r.id))
            .max()
            .map_or(1, |n| n + 1);
        doc.next_slide_id = presentation
            .slide_ids
            .iter()
            .map(|(id, _)| id + 1)
            .max()
            .map_or(MIN_SLIDE_ID, |id| id.max(MIN_SLIDE_ID));

        for (_, rel_id) in &presentation.slide_ids {
            let target = find_target(&presentation_rels, rel_id, &doc.presentation_part)?;
            doc.slide_parts.push(target);
        }

        let master_rel = presentation.master_rel_ids.first().ok_or_else(|| {
            Error::InvalidDocument("presentation has no slide master".to_string())
        })?;
        let master_part = find_target(&presentation_rels, master_rel, &doc.presentation_part)?;
        doc.layouts = doc.load_layouts(&master_part)?;

        log::debug!(
            "Opened presentation with {} slides and {} layouts",
            doc.slide_parts.len(),
            doc.layouts.len()
        );

        Ok(doc)
    }

    /// Locate the main presentation part through the package relationships.
    fn find_presentation_part(&self) -> Result<String> {
        if self.part(PACKAGE_RELS_PART).is_some() {
            let rels = parse_relationships(self.part_str(PACKAGE_RELS_PART)?)?;
            if let Some(rel) = rels
                .iter()
                .find(|r| !r.external && r.rel_type.ends_with("/officeDocument"))
            {
                return Ok(resolve_target("", &rel.target));
            }
        }
        Ok(DEFAULT_PRESENTATION_PART.to_string())
    }

    /// Read the master's layouts in `sldLayoutIdLst` order.
    fn load_layouts(&self, master_part: &str) -> Result<Vec<Layout>> {
        let master_rels = self.relationships_of(master_part)?;
        let layout_rel_ids = parse_layout_ids(self.part_str(master_part)?)?;

        layout_rel_ids
            .iter()
            .map(|rel_id| {
                let part_name = find_target(&master_rels, rel_id, master_part)?;
                let (name, placeholders) = parse_layout(self.part_str(&part_name)?)?;
                Ok(Layout {
                    part_name,
                    name,
                    placeholders,
                })
            })
            .collect()
    }

    fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::InvalidDocument(format!("missing part '{}'", name)))?;
        std::str::from_utf8(data).map_err(|e| xml_err(&format!("Part '{}' is not UTF-8", name), e))
    }

    fn relationships_of(&self, part: &str) -> Result<Vec<Relationship>> {
        let rels_path = rels_path_for(part);
        match self.part(&rels_path) {
            Some(_) => parse_relationships(self.part_str(&rels_path)?),
            None => Ok(Vec::new()),
        }
    }

    /// Number of slides added since the document was opened.
    pub fn added_slide_count(&self) -> usize {
        self.pending.len()
    }

    /// Text of every slide, in presentation order.
    pub fn slides(&self) -> Result<Vec<ExtractedSlide>> {
        let mut slides = Vec::with_capacity(self.slide_count());

        for (idx, part) in self.slide_parts.iter().enumerate() {
            slides.push(extract_slide(self.part_str(part)?, idx + 1)?);
        }
        for (idx, slide) in self.pending.iter().enumerate() {
            let number = self.slide_parts.len() + idx + 1;
            slides.push(extract_slide(&slide.to_xml()?, number)?);
        }

        Ok(slides)
    }

    /// Write the package, including any added slides.
    pub fn save<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            let data = self.updated_part(name, data)?;
            add_zip_entry(&mut zip, name, &data, options)?;
        }

        for slide in &self.pending {
            add_zip_entry(&mut zip, &slide.part_name, slide.to_xml()?.as_bytes(), options)?;
            add_zip_entry(
                &mut zip,
                &rels_path_for(&slide.part_name),
                slide.rels_xml()?.as_bytes(),
                options,
            )?;
        }

        let writer = zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;

        log::debug!(
            "Saved presentation with {} slides ({} added)",
            self.slide_count(),
            self.pending.len()
        );

        Ok(writer)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.save(Cursor::new(Vec::new()))?.into_inner())
    }

    /// The bytes to write for an existing part, updated for added slides.
    fn updated_part<'a>(&self, name: &str, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        if self.pending.is_empty() {
            return Ok(Cow::Borrowed(data));
        }

        let xml = || {
            std::str::from_utf8(data)
                .map_err(|e| xml_err(&format!("Part '{}' is not UTF-8", name), e))
        };

        let updated = if name == CONTENT_TYPES_PART {
            insert_before_end(xml()?, b"Types", |w| {
                for slide in &self.pending {
                    let part_name = format!("/{}", slide.part_name);
                    write_empty(
                        w,
                        "Override",
                        &[("PartName", part_name.as_str()), ("ContentType", CT_SLIDE)],
                    )?;
                }
                Ok(())
            })?
        } else if name == rels_path_for(&self.presentation_part) {
            insert_before_end(xml()?, b"Relationships", |w| {
                for slide in &self.pending {
                    let target =
                        crate::xml::relative_target(&self.presentation_part, &slide.part_name);
                    write_empty(
                        w,
                        "Relationship",
                        &[
                            ("Id", slide.rel_id.as_str()),
                            ("Type", REL_TYPE_SLIDE),
                            ("Target", target.as_str()),
                        ],
                    )?;
                }
                Ok(())
            })?
        } else if name == self.presentation_part {
            let ids: Vec<(u32, &str)> = self
                .pending
                .iter()
                .map(|s| (s.slide_id, s.rel_id.as_str()))
                .collect();
            add_slide_ids(xml()?, &ids)?
        } else {
            return Ok(Cow::Borrowed(data));
        };

        Ok(Cow::Owned(updated.into_bytes()))
    }

    fn next_slide_part_name(&self) -> String {
        (1..)
            .map(|n| format!("ppt/slides/slide{}.xml", n))
            .find(|name| {
                self.part(name).is_none() && !self.pending.iter().any(|s| &s.part_name == name)
            })
            .unwrap_or_default()
    }

    /// Position in `pending` of a slide handle.
    fn pending_index(&self, slide: SlideId) -> Result<usize> {
        if slide.0 < self.slide_parts.len() {
            return Err(Error::InvalidDocument(format!(
                "slide {} was in the original file and is not modified",
                slide.0 + 1
            )));
        }
        let idx = slide.0 - self.slide_parts.len();
        if idx >= self.pending.len() {
            return Err(Error::InvalidDocument(format!("no slide {}", slide.0 + 1)));
        }
        Ok(idx)
    }

    fn paragraphs_mut(&mut self, placeholder: PlaceholderId) -> Result<&mut Vec<Paragraph>> {
        let idx = self.pending_index(placeholder.slide)?;
        let slide = &mut self.pending[idx];
        let shape = slide.shape_index(placeholder.kind).ok_or_else(|| {
            Error::InvalidDocument(format!(
                "slide {} has no {:?} placeholder",
                placeholder.slide.0 + 1,
                placeholder.kind
            ))
        })?;
        Ok(&mut slide.shapes[shape].paragraphs)
    }
}

impl SlideDocument for PptxDocument {
    fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    fn slide_count(&self) -> usize {
        self.slide_parts.len() + self.pending.len()
    }

    fn layout_has_placeholder(&self, layout_index: usize, kind: PlaceholderKind) -> bool {
        self.layouts
            .get(layout_index)
            .map_or(false, |l| find_placeholder(l.placeholders.iter(), kind).is_some())
    }

    fn add_slide(&mut self, layout_index: usize) -> Result<SlideId> {
        let layout = self.layouts.get(layout_index).ok_or_else(|| {
            Error::InvalidDocument(format!(
                "no layout at index {} ({} layouts)",
                layout_index,
                self.layouts.len()
            ))
        })?;
        let layout_part = layout.part_name.clone();
        let placeholders = layout.placeholders.clone();
        log::debug!(
            "Using layout {} '{}'",
            layout_index,
            layout.name.as_deref().unwrap_or_default()
        );

        let part_name = self.next_slide_part_name();
        let rel_id = format!("rId{}", self.next_rel_id);
        let slide_id = self.next_slide_id;
        self.next_rel_id += 1;
        self.next_slide_id += 1;

        log::debug!("Adding {} from layout {}", part_name, layout_part);
        self.pending.push(PendingSlide::from_layout(
            part_name,
            layout_part,
            slide_id,
            rel_id,
            &placeholders,
        ));

        Ok(SlideId(self.slide_count() - 1))
    }

    fn placeholder(&self, slide: SlideId, kind: PlaceholderKind) -> Result<PlaceholderId> {
        let idx = self.pending_index(slide)?;
        self.pending[idx]
            .shape_index(kind)
            .map(|_| PlaceholderId { slide, kind })
            .ok_or_else(|| {
                Error::InvalidDocument(format!("slide {} has no {:?} placeholder", slide.0 + 1, kind))
            })
    }

    fn clear_text(&mut self, placeholder: PlaceholderId) -> Result<()> {
        *self.paragraphs_mut(placeholder)? = vec![Paragraph::default()];
        Ok(())
    }

    fn set_text(&mut self, placeholder: PlaceholderId, text: &str) -> Result<()> {
        *self.paragraphs_mut(placeholder)? = vec![Paragraph::new(text)];
        Ok(())
    }

    fn set_font_size(&mut self, placeholder: PlaceholderId, size: FontSize) -> Result<()> {
        for p in self.paragraphs_mut(placeholder)? {
            p.font_size = Some(size);
        }
        Ok(())
    }

    fn set_alignment(&mut self, placeholder: PlaceholderId, alignment: Alignment) -> Result<()> {
        for p in self.paragraphs_mut(placeholder)? {
            p.alignment = Some(alignment);
        }
        Ok(())
    }

    fn set_line_spacing(&mut self, placeholder: PlaceholderId, spacing: f64) -> Result<()> {
        for p in self.paragraphs_mut(placeholder)? {
            p.line_spacing = Some(spacing);
        }
        Ok(())
    }

    fn set_bullet(&mut self, placeholder: PlaceholderId, visible: bool) -> Result<()> {
        for p in self.paragraphs_mut(placeholder)? {
            p.bullet = Some(visible);
        }
        Ok(())
    }
}

fn add_zip_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: FileOptions,
) -> Result<()> {
    zip.start_file(name, options)
        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
    zip.write_all(data)?;
    Ok(())
}

fn find_target(rels: &[Relationship], rel_id: &str, source_part: &str) -> Result<String> {
    rels.iter()
        .find(|r| !r.external && r.id == rel_id)
        .map(|r| resolve_target(source_part, &r.target))
        .ok_or_else(|| {
            Error::InvalidDocument(format!(
                "relationship '{}' of '{}' not found",
                rel_id, source_part
            ))
        })
}

/// Slide and master references from `presentation.xml`.
#[derive(Debug, Default)]
struct PresentationRefs {
    /// `(slide id, relationship id)` in slide order.
    slide_ids: Vec<(u32, String)>,
    master_rel_ids: Vec<String>,
}

fn parse_presentation(xml: &str) -> Result<PresentationRefs> {
    let mut refs = PresentationRefs::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"sldId" => {
                        let id = attr(e, "id").and_then(|v| v.parse().ok()).unwrap_or(0);
                        if let Some(rel_id) = prefixed_attr(e, "id") {
                            refs.slide_ids.push((id, rel_id));
                        }
                    }
                    b"sldMasterId" => {
                        if let Some(rel_id) = prefixed_attr(e, "id") {
                            refs.master_rel_ids.push(rel_id);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err("Error parsing presentation", e)),
            _ => {}
        }
    }

    Ok(refs)
}

fn parse_layout_ids(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldLayoutId" =>
            {
                if let Some(rel_id) = prefixed_attr(e, "id") {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err("Error parsing slide master", e)),
            _ => {}
        }
    }

    Ok(ids)
}

/// Layout name and the placeholders it defines.
fn parse_layout(xml: &str) -> Result<(Option<String>, Vec<LayoutPlaceholder>)> {
    let mut name = None;
    let mut placeholders = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    // (shape name, placeholder) for the shape being read
    let mut current: Option<(String, Option<LayoutPlaceholder>)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match local_name(e.name().as_ref()) {
                    b"cSld" => name = attr(e, "name"),
                    b"sp" => current = Some((String::new(), None)),
                    b"cNvPr" => {
                        if let Some((ref mut shape_name, _)) = current {
                            *shape_name = attr(e, "name").unwrap_or_default();
                        }
                    }
                    b"ph" => {
                        if let Some((_, ref mut ph)) = current {
                            *ph = Some(LayoutPlaceholder {
                                name: String::new(),
                                ph_type: attr(e, "type"),
                                idx: attr(e, "idx").and_then(|v| v.parse().ok()),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sp" => {
                if let Some((shape_name, Some(mut ph))) = current.take() {
                    ph.name = shape_name;
                    placeholders.push(ph);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err("Error parsing slide layout", e)),
            _ => {}
        }
    }

    Ok((name, placeholders))
}

/// Copy `xml`, calling `insert` just before the closing tag of `parent`.
fn insert_before_end<F>(xml: &str, parent: &[u8], mut insert: F) -> Result<String>
where
    F: FnMut(&mut Writer<Vec<u8>>) -> Result<()>,
{
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut inserted = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_err("Error rewriting package part", e))?;
        match &event {
            Event::Eof => break,
            Event::End(e) if !inserted && local_name(e.name().as_ref()) == parent => {
                insert(&mut writer)?;
                inserted = true;
            }
            Event::Empty(e) if !inserted && local_name(e.name().as_ref()) == parent => {
                write(&mut writer, Event::Start(e.clone()))?;
                insert(&mut writer)?;
                write(&mut writer, Event::End(e.to_end()))?;
                inserted = true;
                continue;
            }
            _ => {}
        }
        write(&mut writer, event)?;
    }

    if !inserted {
        return Err(Error::InvalidDocument(format!(
            "missing <{}> element",
            String::from_utf8_lossy(parent)
        )));
    }

    into_string(writer)
}

/// Prefix of a qualified element name (`p` for `p:presentation`).
fn prefix_of(e: &BytesStart<'_>) -> Option<String> {
    let name = e.name();
    let name = std::str::from_utf8(name.as_ref()).ok()?;
    name.split_once(':').map(|(prefix, _)| prefix.to_string())
}

/// `prefix:local`, or just `local` for an unprefixed element.
fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

/// The prefix the root element binds to the relationships namespace.
fn rel_prefix_of(e: &BytesStart<'_>) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        let key = std::str::from_utf8(a.key.as_ref()).ok()?;
        let prefix = key.strip_prefix("xmlns:")?;
        (a.value.as_ref() == NS_REL.as_bytes()).then(|| prefix.to_string())
    })
}

/// Append `<p:sldId>` entries to the presentation's slide list, creating
/// the list if the presentation has no slides yet.
fn add_slide_ids(xml: &str, ids: &[(u32, &str)]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut p = String::from("p");
    let mut r = String::from("r");
    let mut root_seen = false;
    let mut done = false;

    let write_ids = |w: &mut Writer<Vec<u8>>, p: &str, r: &str| -> Result<()> {
        let elem = qualified(p, "sldId");
        let rel_attr = format!("{}:id", r);
        for (id, rel_id) in ids {
            let id = id.to_string();
            write_empty(
                w,
                &elem,
                &[("id", id.as_str()), (rel_attr.as_str(), *rel_id)],
            )?;
        }
        Ok(())
    };

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_err("Error rewriting presentation", e))?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if !root_seen => {
                root_seen = true;
                p = prefix_of(e).unwrap_or_default();
                r = rel_prefix_of(e).unwrap_or_else(|| "r".to_string());
            }
            Event::End(e) if !done && local_name(e.name().as_ref()) == b"sldIdLst" => {
                write_ids(&mut writer, &p, &r)?;
                done = true;
            }
            Event::Empty(e) if !done && local_name(e.name().as_ref()) == b"sldIdLst" => {
                write(&mut writer, Event::Start(e.clone()))?;
                write_ids(&mut writer, &p, &r)?;
                write(&mut writer, Event::End(e.to_end()))?;
                done = true;
                continue;
            }
            Event::Start(e) | Event::Empty(e)
                if !done
                    && AFTER_SLIDE_ID_LIST
                        .iter()
                        .any(|n| *n == local_name(e.name().as_ref())) =>
            {
                let list = qualified(&p, "sldIdLst");
                write_start(&mut writer, &list, &[])?;
                write_ids(&mut writer, &p, &r)?;
                write_end(&mut writer, &list)?;
                done = true;
            }
            _ => {}
        }
        write(&mut writer, event)?;
    }

    if !done {
        return Err(Error::InvalidDocument(
            "presentation has no place for a slide list".to_string(),
        ));
    }

    into_string(writer)
}
