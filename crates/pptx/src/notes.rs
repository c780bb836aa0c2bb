//! Notes slide XML: reading and replacing the notes text, and templates for
//! newly created notes slides and notes masters.
//!
//! The notes region of a notes slide is its body placeholder
//! (`<p:ph type="body"/>`).

use crate::parser::{extract_shapes_from_xml, local_name, LINE_BREAK};
use notes_core::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Content type of a notes slide part.
pub const CT_NOTES_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
/// Content type of a notes master part.
pub const CT_NOTES_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";
/// Content type of a theme part.
pub const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);

/// Text of the notes region, paragraphs joined with `\n`.
///
/// Returns `None` when the notes slide has no body placeholder.
pub fn read_notes_text(xml: &str) -> Result<Option<String>> {
    Ok(extract_shapes_from_xml(xml)?
        .into_iter()
        .find(|shape| shape.is_placeholder("body"))
        .map(|shape| shape.text.unwrap_or_default()))
}

/// Replace the text of the notes region, keeping everything else.
///
/// The existing `a:bodyPr` and `a:lstStyle` of the placeholder are kept and
/// its paragraphs replaced. A notes slide without a body placeholder gets
/// one appended to its shape tree.
pub fn replace_notes_text(xml: &str, text: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + text.len()));

    let mut in_sp = false;
    let mut sp_is_body = false;
    let mut sp_has_text_body = false;
    let mut in_body_text = false;
    let mut skip_depth = 0usize;
    let mut replaced = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("Error reading notes slide: {}", e)))?;

        if in_body_text {
            if skip_depth > 0 {
                match event {
                    Event::Start(_) => skip_depth += 1,
                    Event::End(_) => skip_depth -= 1,
                    Event::Eof => {
                        return Err(Error::XmlError("Notes slide ends inside a paragraph".into()))
                    }
                    _ => {}
                }
                continue;
            }
            match &event {
                Event::Start(e) if local_name(e.name().as_ref()) == b"p" => {
                    skip_depth = 1;
                    continue;
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"p" => continue,
                Event::End(e) if local_name(e.name().as_ref()) == b"txBody" => {
                    write_paragraphs(&mut writer, text)?;
                    in_body_text = false;
                    replaced = true;
                }
                Event::Eof => {
                    return Err(Error::XmlError("Notes slide ends inside a text body".into()))
                }
                _ => {}
            }
            write(&mut writer, event)?;
            continue;
        }

        match &event {
            Event::Start(e) if local_name(e.name().as_ref()) == b"sp" => {
                in_sp = true;
                sp_is_body = false;
                sp_has_text_body = false;
            }
            Event::Start(e) | Event::Empty(e)
                if in_sp && local_name(e.name().as_ref()) == b"ph" =>
            {
                sp_is_body = is_body_placeholder(e);
            }
            Event::Start(e)
                if in_sp
                    && sp_is_body
                    && !replaced
                    && local_name(e.name().as_ref()) == b"txBody" =>
            {
                sp_has_text_body = true;
                in_body_text = true;
            }
            Event::Empty(e)
                if in_sp
                    && sp_is_body
                    && !replaced
                    && local_name(e.name().as_ref()) == b"txBody" =>
            {
                sp_has_text_body = true;
                write_text_body(&mut writer, text)?;
                replaced = true;
                continue;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"sp" => {
                if sp_is_body && !sp_has_text_body && !replaced {
                    write_text_body(&mut writer, text)?;
                    replaced = true;
                }
                in_sp = false;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"spTree" && !replaced => {
                write_body_placeholder(&mut writer, text)?;
                replaced = true;
            }
            Event::Eof => break,
            _ => {}
        }
        write(&mut writer, event)?;
    }

    if !replaced {
        return Err(Error::XmlError(
            "Notes slide has no shape tree to hold the notes".to_string(),
        ));
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::XmlError(format!("Notes slide is not valid UTF-8: {}", e)))
}

fn is_body_placeholder(e: &BytesStart<'_>) -> bool {
    e.attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"type" && attr.value.as_ref() == b"body")
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("Error writing notes slide: {}", e)))
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::End(BytesEnd::new(name)))
}

fn empty(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    write(writer, Event::Empty(BytesStart::new(name)))
}

/// One `a:p` per line of `text`; a vertical tab within a line becomes an
/// `a:br`.
fn write_paragraphs(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    for line in text.split('\n') {
        start(writer, "a:p")?;
        if line.is_empty() {
            write(writer, Event::Empty(run_properties("a:endParaRPr")))?;
        } else {
            for (i, segment) in line.split(LINE_BREAK).enumerate() {
                if i > 0 {
                    start(writer, "a:br")?;
                    write(writer, Event::Empty(run_properties("a:rPr")))?;
                    end(writer, "a:br")?;
                }
                if segment.is_empty() {
                    continue;
                }
                start(writer, "a:r")?;
                write(writer, Event::Empty(run_properties("a:rPr")))?;
                start(writer, "a:t")?;
                write(writer, Event::Text(BytesText::new(&escape_control_chars(segment))))?;
                end(writer, "a:t")?;
                end(writer, "a:r")?;
            }
        }
        end(writer, "a:p")?;
    }
    Ok(())
}

fn run_properties(name: &str) -> BytesStart<'_> {
    BytesStart::new(name).with_attributes([("lang", "en-US"), ("dirty", "0")])
}

/// Replace control characters XML 1.0 cannot carry with `_xHHHH_`.
fn escape_control_chars(text: &str) -> Cow<'_, str> {
    let illegal = |c: char| c < ' ' && !matches!(c, '\t' | '\n' | '\r');
    if !text.contains(illegal) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if illegal(c) {
            escaped.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

fn write_text_body(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    start(writer, "p:txBody")?;
    empty(writer, "a:bodyPr")?;
    empty(writer, "a:lstStyle")?;
    write_paragraphs(writer, text)?;
    end(writer, "p:txBody")
}

fn write_body_placeholder(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<()> {
    start(writer, "p:sp")?;
    start(writer, "p:nvSpPr")?;
    write(
        writer,
        Event::Empty(
            BytesStart::new("p:cNvPr").with_attributes([("id", "1000"), ("name", "Notes Placeholder")]),
        ),
    )?;
    start(writer, "p:cNvSpPr")?;
    write(
        writer,
        Event::Empty(BytesStart::new("a:spLocks").with_attributes([("noGrp", "1")])),
    )?;
    end(writer, "p:cNvSpPr")?;
    start(writer, "p:nvPr")?;
    write(
        writer,
        Event::Empty(BytesStart::new("p:ph").with_attributes([("type", "body"), ("idx", "1")])),
    )?;
    end(writer, "p:nvPr")?;
    end(writer, "p:nvSpPr")?;
    empty(writer, "p:spPr")?;
    write_text_body(writer, text)?;
    end(writer, "p:sp")
}

/// A new notes slide whose notes region holds `text`.
pub fn new_notes_slide_xml(text: &str) -> Result<String> {
    let mut xml = String::with_capacity(1536);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!("<p:notes {}>", NAMESPACES));
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(GROUP_SHAPE_PROPERTIES);
    xml.push_str(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/>"#,
        r#"<p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr>"#,
        r#"<p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
    ));
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:notes>");

    replace_notes_text(&xml, text)
}

/// A minimal notes master with slide image and body placeholders.
pub fn new_notes_master_xml() -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push('\n');
    xml.push_str(&format!("<p:notesMaster {}>", NAMESPACES));
    xml.push_str("<p:cSld><p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>");
    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_SHAPE_PROPERTIES);
    xml.push_str(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/>"#,
        r#"<p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr>"#,
        r#"<p:nvPr><p:ph type="sldImg" idx="2"/></p:nvPr></p:nvSpPr>"#,
        r#"<p:spPr><a:xfrm><a:off x="1143000" y="685800"/><a:ext cx="4572000" cy="3429000"/></a:xfrm>"#,
        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:sp>"#,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/>"#,
        r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#,
        r#"<p:nvPr><p:ph type="body" sz="quarter" idx="3"/></p:nvPr></p:nvSpPr>"#,
        r#"<p:spPr><a:xfrm><a:off x="685800" y="4343400"/><a:ext cx="5486400" cy="4114800"/></a:xfrm>"#,
        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
        r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp>"#,
    ));
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(concat!(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
        r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
        r#"hlink="hlink" folHlink="folHlink"/>"#,
    ));
    xml.push_str("</p:notesMaster>");
    xml
}

const GROUP_SHAPE_PROPERTIES: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

#[cfg(test)]
mod tests {
    use super::*;

    const NOTES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="2" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr>
      <p:spPr/>
    </p:sp>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="3" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>
      <p:spPr/>
      <p:txBody><a:bodyPr anchor="t"/><a:lstStyle/><a:p><a:r><a:t>Old note</a:t></a:r></a:p><a:p><a:r><a:rPr b="1"/><a:t>second</a:t></a:r></a:p></p:txBody>
    </p:sp>
    <p:sp>
      <p:nvSpPr><p:cNvPr id="4" name="Slide Number"/><p:cNvSpPr/><p:nvPr><p:ph type="sldNum" idx="5"/></p:nvPr></p:nvSpPr>
      <p:txBody><a:bodyPr/><a:p><a:r><a:t>7</a:t></a:r></a:p></p:txBody>
    </p:sp>
  </p:spTree></p:cSld>
</p:notes>"#;

    #[test]
    fn test_read_notes_text() {
        assert_eq!(
            read_notes_text(NOTES_XML).unwrap().as_deref(),
            Some("Old note\nsecond")
        );
    }

    #[test]
    fn test_replace_keeps_other_shapes() {
        let updated = replace_notes_text(NOTES_XML, "New <note> & more\n\nLast line").unwrap();

        assert_eq!(
            read_notes_text(&updated).unwrap().as_deref(),
            Some("New <note> & more\n\nLast line")
        );
        assert!(updated.contains(r#"<a:bodyPr anchor="t"/>"#));
        assert!(updated.contains("<a:t>7</a:t>"));
        assert!(!updated.contains("Old note"));
        assert!(updated.contains("New &lt;note&gt; &amp; more"));
    }

    #[test]
    fn test_control_characters_are_not_written_raw() {
        let updated = replace_notes_text(NOTES_XML, "line\u{0B}tab\u{1}end\u{C}").unwrap();

        assert!(!updated
            .chars()
            .any(|c| c < ' ' && !matches!(c, '\t' | '\n' | '\r')));
        assert!(updated.contains("<a:t>line</a:t></a:r><a:br>"));
        assert!(updated.contains("<a:t>tab_x0001_end_x000C_</a:t>"));
        assert_eq!(
            read_notes_text(&updated).unwrap().as_deref(),
            Some("line\u{0B}tab_x0001_end_x000C_")
        );
    }

    #[test]
    fn test_placeholder_space_survives() {
        let updated = replace_notes_text(NOTES_XML, " ").unwrap();
        assert_eq!(read_notes_text(&updated).unwrap().as_deref(), Some(" "));
    }

    #[test]
    fn test_body_placeholder_without_text_body() {
        let xml = NOTES_XML.replace(
            r#"<p:txBody><a:bodyPr anchor="t"/><a:lstStyle/><a:p><a:r><a:t>Old note</a:t></a:r></a:p><a:p><a:r><a:rPr b="1"/><a:t>second</a:t></a:r></a:p></p:txBody>"#,
            "",
        );
        assert_eq!(read_notes_text(&xml).unwrap().as_deref(), Some(""));

        let updated = replace_notes_text(&xml, "Added").unwrap();
        assert_eq!(read_notes_text(&updated).unwrap().as_deref(), Some("Added"));
    }

    #[test]
    fn test_missing_body_placeholder_is_appended() {
        let xml = NOTES_XML.replace(r#"type="body" idx="1""#, r#"type="hdr" idx="1""#);
        assert_eq!(read_notes_text(&xml).unwrap(), None);

        let updated = replace_notes_text(&xml, "Appended").unwrap();
        assert_eq!(
            read_notes_text(&updated).unwrap().as_deref(),
            Some("Appended")
        );
        assert!(updated.contains("Old note"));
    }

    #[test]
    fn test_new_notes_slide() {
        let xml = new_notes_slide_xml("Fresh").unwrap();
        assert_eq!(read_notes_text(&xml).unwrap().as_deref(), Some("Fresh"));
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"type="sldImg""#));
    }

    #[test]
    fn test_new_notes_master_has_body_placeholder() {
        let xml = new_notes_master_xml();
        assert_eq!(read_notes_text(&xml).unwrap().as_deref(), Some(""));
        assert!(xml.contains("<p:clrMap "));
    }
}
