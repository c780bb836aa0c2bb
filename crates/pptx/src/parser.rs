//! Slide text extraction.

use crate::package::Package;
use notes_core::{Error, ExtractedSlide, Presentation, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Read, Seek};
use std::path::Path;

/// Extracts the visible text of every slide in a deck.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse the deck at `path`.
    ///
    /// Any failure to read or interpret the file is reported as a
    /// `DocumentOpenError` naming the path.
    pub fn parse_path(&self, path: &Path) -> Result<Presentation> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        Package::open(path)
            .and_then(|package| self.parse_package(&package, filename))
            .map_err(|e| Error::document_open(path, e))
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let package = Package::from_reader(reader)?;
        self.parse_package(&package, filename)
    }

    /// Parse an already loaded package.
    pub fn parse_package(&self, package: &Package, filename: &str) -> Result<Presentation> {
        let mut presentation = Presentation::new(filename);

        for (idx, slide_path) in package.slide_paths()?.iter().enumerate() {
            let slide = self.parse_slide(package, slide_path, idx + 1)?;
            presentation.add_slide(slide);
        }

        log::debug!(
            "Extracted {} slides from {}",
            presentation.slide_count(),
            filename
        );
        Ok(presentation)
    }

    /// Parse a single slide from the package.
    fn parse_slide(
        &self,
        package: &Package,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<ExtractedSlide> {
        let content = package.part_str(slide_path)?;
        let mut slide = ExtractedSlide::new(slide_number);

        for shape in extract_shapes_from_xml(content)? {
            if let Some(text) = shape.text {
                slide.add_shape_text(text);
            }
        }

        Ok(slide)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Character standing for a line break (`a:br`) within a paragraph.
pub(crate) const LINE_BREAK: char = '\u{0B}';

/// A `p:sp` shape as seen by the extractor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ShapeInfo {
    /// Placeholder type (`title`, `body`, ...); `Some("")` for an untyped placeholder.
    pub placeholder: Option<String>,
    /// Paragraphs joined with `\n`; `None` when the shape has no text frame.
    pub text: Option<String>,
}

impl ShapeInfo {
    pub fn is_placeholder(&self, kind: &str) -> bool {
        self.placeholder.as_deref() == Some(kind)
    }
}

/// Collect the top-level `p:sp` shapes of a slide-like part, in document
/// order.
///
/// Shapes inside group shapes are skipped. Whitespace inside runs is kept as
/// written and a line break (`a:br`) becomes a vertical tab.
pub(crate) fn extract_shapes_from_xml(xml_content: &str) -> Result<Vec<ShapeInfo>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);

    let mut group_depth = 0usize;
    let mut current_shape: Option<ShapeInfo> = None;
    let mut paragraphs: Option<Vec<String>> = None;
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"grpSp" => group_depth += 1,
                b"sp" if group_depth == 0 => current_shape = Some(ShapeInfo::default()),
                b"ph" => mark_placeholder(current_shape.as_mut(), e),
                b"txBody" if current_shape.is_some() => paragraphs = Some(Vec::new()),
                b"p" => {
                    if let Some(paragraphs) = paragraphs.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(last) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                        last.push(LINE_BREAK);
                    }
                }
                b"t" if paragraphs.is_some() => in_text_run = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" => mark_placeholder(current_shape.as_mut(), e),
                b"txBody" => {
                    if let Some(shape) = current_shape.as_mut() {
                        shape.text = Some(String::new());
                    }
                }
                b"p" => {
                    if let Some(paragraphs) = paragraphs.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(last) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                        last.push(LINE_BREAK);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text_run => {
                let text = e
                    .unescape()
                    .map_err(|err| Error::XmlError(format!("Bad text in run: {}", err)))?;
                if let Some(last) = paragraphs.as_mut().and_then(|p| p.last_mut()) {
                    last.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"grpSp" => group_depth = group_depth.saturating_sub(1),
                b"sp" => {
                    if let Some(shape) = current_shape.take() {
                        shapes.push(shape);
                    }
                    paragraphs = None;
                    in_text_run = false;
                }
                b"txBody" => {
                    if let (Some(shape), Some(done)) = (current_shape.as_mut(), paragraphs.take())
                    {
                        shape.text = Some(done.join("\n"));
                    }
                }
                b"t" => in_text_run = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

fn mark_placeholder(shape: Option<&mut ShapeInfo>, e: &BytesStart<'_>) {
    let Some(shape) = shape else {
        return;
    };
    let kind = e
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"type")
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
        .unwrap_or_default();
    shape.placeholder = Some(kind);
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DeckBuilder;
    use std::io::Cursor;

    const SLIDE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr>
      <p:txBody><a:bodyPr/><a:p><a:r><a:t>Fish &amp; Chips</a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture"/></p:nvPicPr></p:pic>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="4" name="Box"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
      <p:txBody><a:bodyPr/><a:p><a:r><a:t>Line one</a:t></a:r><a:br/><a:r><a:t>Line two</a:t></a:r></a:p><a:p><a:r><a:t>  spaced </a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:grpSp>
      <p:nvGrpSpPr><p:cNvPr id="8" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
      <p:sp>
        <p:nvSpPr><p:cNvPr id="9" name="Grouped Box"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
        <p:txBody><a:bodyPr/><a:p><a:r><a:t>Grouped</a:t></a:r></a:p></p:txBody>
      </p:sp>
    </p:grpSp>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="5" name="Shape"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
      <p:spPr/>
    </p:sp>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="6" name="Body"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
      <p:txBody><a:bodyPr/><a:p/></p:txBody>
    </p:sp>
  </p:spTree></p:cSld>
</p:sld>"#;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_extract_shapes() {
        let shapes = extract_shapes_from_xml(SLIDE_XML).unwrap();
        assert_eq!(shapes.len(), 4);

        assert!(shapes[0].is_placeholder("title"));
        assert_eq!(shapes[0].text.as_deref(), Some("Fish & Chips"));

        assert_eq!(shapes[1].placeholder, None);
        assert_eq!(
            shapes[1].text.as_deref(),
            Some("Line one\u{0B}Line two\n  spaced ")
        );

        assert_eq!(shapes[2].text, None);

        assert!(shapes[3].is_placeholder(""));
        assert_eq!(shapes[3].text.as_deref(), Some(""));

        assert!(shapes
            .iter()
            .all(|shape| shape.text.as_deref() != Some("Grouped")));
    }

    #[test]
    fn test_group_shapes_are_skipped() {
        let xml = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Top"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>Top</a:t></a:r></a:p></p:txBody></p:sp>
<p:grpSp><p:nvGrpSpPr><p:cNvPr id="3" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="4" name="Inner"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>Grouped</a:t></a:r></a:p></p:txBody></p:sp>
<p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Nested"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="6" name="Deep"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>Deeper</a:t></a:r></a:p></p:txBody></p:sp>
</p:grpSp></p:grpSp>
<p:sp><p:nvSpPr><p:cNvPr id="7" name="After"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:bodyPr/><a:p><a:r><a:t>After</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#;

        let texts: Vec<_> = extract_shapes_from_xml(xml)
            .unwrap()
            .into_iter()
            .map(|shape| shape.text)
            .collect();
        assert_eq!(
            texts,
            vec![Some("Top".to_string()), Some("After".to_string())]
        );
    }

    #[test]
    fn test_extract_slide_texts() {
        let bytes = DeckBuilder::new()
            .slide(&["Welcome", "Agenda\nGoals"])
            .slide(&[])
            .slide(&["Summary"])
            .build();
        let presentation = PptxParser::new()
            .parse(Cursor::new(bytes), "deck.pptx")
            .unwrap();

        assert_eq!(presentation.filename, "deck.pptx");
        assert_eq!(
            presentation.slide_texts(),
            vec!["Welcome\nAgenda\nGoals", "", "Summary"]
        );
        assert_eq!(presentation.slides[2].number, 3);
    }

    #[test]
    fn test_slide_order_follows_slide_list() {
        let bytes = DeckBuilder::new()
            .slide(&["first part"])
            .slide(&["second part"])
            .reversed_slide_list()
            .build();
        let presentation = PptxParser::new().parse(Cursor::new(bytes), "x.pptx").unwrap();

        assert_eq!(
            presentation.slide_texts(),
            vec!["second part", "first part"]
        );
    }

    #[test]
    fn test_parse_path_reports_document_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pptx");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        let err = PptxParser::new().parse_path(&path).unwrap_err();
        assert!(matches!(err, Error::DocumentOpenError { .. }));
        assert!(err.to_string().contains("broken.pptx"));
    }

    #[test]
    fn test_parse_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.pptx");
        DeckBuilder::new()
            .slide(&["A"])
            .slide(&["B"])
            .write_to(&path)
            .unwrap();

        let presentation = PptxParser::new().parse_path(&path).unwrap();
        assert_eq!(presentation.filename, "talk.pptx");
        assert_eq!(presentation.slide_count(), 2);
    }
}
