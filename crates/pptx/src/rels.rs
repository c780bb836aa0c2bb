//! OPC relationship parts (`*.rels`).

use notes_core::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Relationship type URI of a slide.
pub const RT_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
/// Relationship type URI of a notes slide.
pub const RT_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
/// Relationship type URI of the notes master.
pub const RT_NOTES_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
/// Relationship type URI of a theme.
pub const RT_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
/// Relationship type URI of the main document part.
pub const RT_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `TargetMode="External"`: the target is a URL, not a part.
    pub external: bool,
}

impl Relationship {
    /// Whether this relationship has the given type.
    ///
    /// Compares the last path segment so that both transitional and strict
    /// OOXML namespaces match.
    pub fn is_type(&self, rel_type: &str) -> bool {
        last_segment(&self.rel_type) == last_segment(rel_type)
    }
}

fn last_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// The relationships of one source part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut rels = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };

                    for attr in e.attributes().flatten() {
                        let value = attr
                            .unescape_value()
                            .map(|v| v.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value == "External",
                            _ => {}
                        }
                    }

                    rels.push(rel);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(Self { rels })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    pub fn by_id(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.id == id)
    }

    /// First internal relationship of the given type.
    pub fn find_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.rels
            .iter()
            .find(|rel| !rel.external && rel.is_type(rel_type))
    }

    /// Add a relationship and return its new id.
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.next_id();
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    /// The lowest `rIdN` above every numbered id in use.
    fn next_id(&self) -> String {
        let max = self
            .rels
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", max + 1)
    }

    /// Serialize as a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.rels {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(rel.id.as_str()),
                escape(rel.rel_type.as_str()),
                escape(rel.target.as_str())
            ));
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/>
</Relationships>"#;

    #[test]
    fn test_parse() {
        let rels = Relationships::parse(SLIDE_RELS).unwrap();
        assert_eq!(rels.iter().count(), 3);

        let notes = rels.find_by_type(RT_NOTES_SLIDE).unwrap();
        assert_eq!(notes.id, "rId2");
        assert_eq!(notes.target, "../notesSlides/notesSlide1.xml");

        let link = rels.by_id("rId3").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_strict_namespace_matches() {
        let rel = Relationship {
            id: "rId1".into(),
            rel_type: "http://purl.oclc.org/ooxml/officeDocument/relationships/notesSlide".into(),
            target: "../notesSlides/notesSlide1.xml".into(),
            external: false,
        };
        assert!(rel.is_type(RT_NOTES_SLIDE));
        assert!(!rel.is_type(RT_SLIDE));
    }

    #[test]
    fn test_add_uses_next_free_id() {
        let mut rels = Relationships::parse(SLIDE_RELS).unwrap();
        let id = rels.add(RT_THEME, "../theme/theme2.xml");
        assert_eq!(id, "rId4");

        let mut empty = Relationships::new();
        assert_eq!(empty.add(RT_SLIDE, "slides/slide1.xml"), "rId1");
    }

    #[test]
    fn test_to_xml_parses_back() {
        let rels = Relationships::parse(SLIDE_RELS).unwrap();
        let reparsed = Relationships::parse(&rels.to_xml()).unwrap();
        assert_eq!(rels, reparsed);
        assert!(rels.to_xml().contains("a=1&amp;b=2"));
    }
}
