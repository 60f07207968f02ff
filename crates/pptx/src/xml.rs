//! Small helpers shared by the PPTX reader and writer: namespaced names,
//! attribute lookup, relationship parts and package paths.

use lyrics_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::fmt::Display;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PML: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(crate) const NS_PACKAGE_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const REL_TYPE_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub(crate) const REL_TYPE_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub(crate) const CT_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

/// Map any quick-xml failure into our error type.
pub(crate) fn xml_err(context: &str, e: impl Display) -> Error {
    Error::XmlError(format!("{}: {}", context, e))
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Value of an unprefixed attribute.
pub(crate) fn attr(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of a prefixed attribute such as `r:id`, whatever the prefix.
pub(crate) fn prefixed_attr(e: &BytesStart<'_>, local: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key.contains(&b':') && local_name(key) == local.as_bytes()
        })
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// A relationship entry from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`: the target is a URL, not a package part.
    pub external: bool,
}

/// Parse every `Relationship` in a `.rels` part.
pub(crate) fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                rels.push(Relationship {
                    id: attr(e, "Id").unwrap_or_default(),
                    rel_type: attr(e, "Type").unwrap_or_default(),
                    target: attr(e, "Target").unwrap_or_default(),
                    external: attr(e, "TargetMode").as_deref() == Some("External"),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err("Error parsing relationships", e)),
            _ => {}
        }
    }

    Ok(rels)
}

/// The `.rels` part holding relationships of `part`.
///
/// `ppt/presentation.xml` -> `ppt/_rels/presentation.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

fn part_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the part that owns it.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = part_dir(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Relative target from `source_part` to `target_part`, as written in a `.rels`.
pub(crate) fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = part_dir(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = std::iter::repeat("..").take(from.len() - common).collect();
    parts.extend(&to[common..]);
    parts.join("/")
}

/// Numeric suffix of an id like `rId12`.
pub(crate) fn rel_id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId").and_then(|n| n.parse().ok())
}

/// Write an event, mapping the error.
pub(crate) fn write<'a>(writer: &mut Writer<Vec<u8>>, event: Event<'a>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| xml_err("Error writing XML", e))
}

/// Write `<name attrs.../>`.
pub(crate) fn write_empty(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    write(writer, Event::Empty(elem))
}

/// Write `<name attrs...>`.
pub(crate) fn write_start(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    attrs: &[(&str, &str)],
) -> Result<()> {
    let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
    write(writer, Event::Start(elem))
}

/// Write `</name>`.
pub(crate) fn write_end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::End(quick_xml::events::BytesEnd::new(name)))
}

/// Write the standard `<?xml ...?>` declaration.
pub(crate) fn write_decl(writer: &mut Writer<Vec<u8>>) -> Result<()> {
    write(
        writer,
        Event::Decl(quick_xml::events::BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )
}

/// Finish a writer into a UTF-8 string.
pub(crate) fn into_string(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| xml_err("Generated XML is not UTF-8", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("ppt/presentation.xml"),
            "ppt/_rels/presentation.xml.rels"
        );
        assert_eq!(
            rels_path_for("ppt/slides/slide3.xml"),
            "ppt/slides/_rels/slide3.xml.rels"
        );
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/presentation.xml", "slides/slide1.xml"),
            "ppt/slides/slide1.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "/ppt/media/image1.png"),
            "ppt/media/image1.png"
        );
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide4.xml", "ppt/slideLayouts/slideLayout2.xml"),
            "../slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slides/slide4.xml"),
            "slides/slide4.xml"
        );
    }

    #[test]
    fn test_rel_id_number() {
        assert_eq!(rel_id_number("rId1"), Some(1));
        assert_eq!(rel_id_number("rId12"), Some(12));
        assert_eq!(rel_id_number("custom"), None);
    }

    #[test]
    fn test_parse_relationships_marks_external() {
        let xml = format!(
            r#"<Relationships xmlns="{}">
                <Relationship Id="rId1" Type="{}" Target="slides/slide1.xml"/>
                <Relationship Id="rId2" Type="hyperlink" Target="https://example.com" TargetMode="External"/>
            </Relationships>"#,
            NS_PACKAGE_REL, REL_TYPE_SLIDE
        );
        let rels = parse_relationships(&xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(
            rels[0],
            Relationship {
                id: "rId1".into(),
                rel_type: REL_TYPE_SLIDE.into(),
                target: "slides/slide1.xml".into(),
                external: false,
            }
        );
        assert_eq!(rels[1].id, "rId2");
        assert!(rels[1].external);
    }
}
