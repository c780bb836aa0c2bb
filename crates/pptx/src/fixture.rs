//! Minimal in-memory `.pptx` decks for tests.

use notes_core::{Error, Result};
use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

const NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PML_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml";
const DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

#[derive(Debug, Clone)]
struct FixtureSlide {
    texts: Vec<String>,
    notes: Option<String>,
}

/// Builds a deck with one text box per given string.
///
/// Every slide also carries a picture, which has no text frame.
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    slides: Vec<FixtureSlide>,
    reversed: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide with one text shape per entry (`\n` splits paragraphs).
    pub fn slide(mut self, texts: &[&str]) -> Self {
        self.slides.push(FixtureSlide {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            notes: None,
        });
        self
    }

    /// Add a slide that already has a notes slide holding `notes`.
    pub fn slide_with_notes(mut self, texts: &[&str], notes: &str) -> Self {
        self.slides.push(FixtureSlide {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            notes: Some(notes.to_string()),
        });
        self
    }

    /// Add `count` slides whose text is "Slide text N".
    pub fn numbered_slides(mut self, count: usize) -> Self {
        for _ in 0..count {
            let n = self.slides.len() + 1;
            self.slides.push(FixtureSlide {
                texts: vec![format!("Slide text {}", n)],
                notes: None,
            });
        }
        self
    }

    /// List the slides in reverse of their part numbering.
    pub fn reversed_slide_list(mut self) -> Self {
        self.reversed = true;
        self
    }

    /// The deck as `.pptx` bytes.
    pub fn build(&self) -> Vec<u8> {
        self.try_build().expect("in-memory deck fixture")
    }

    /// Write the deck to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.try_build()?)?;
        Ok(())
    }

    fn try_build(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in self.parts() {
            zip.start_file(name, FileOptions::default())
                .map_err(|e| Error::ZipError(e.to_string()))?;
            zip.write_all(content.as_bytes())?;
        }
        let cursor = zip.finish().map_err(|e| Error::ZipError(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn has_notes(&self) -> bool {
        self.slides.iter().any(|s| s.notes.is_some())
    }

    fn parts(&self) -> Vec<(String, String)> {
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), self.content_types()),
            (
                "_rels/.rels".to_string(),
                rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
            ),
            ("ppt/presentation.xml".to_string(), self.presentation()),
            (
                "ppt/_rels/presentation.xml.rels".to_string(),
                self.presentation_rels(),
            ),
            (
                "ppt/slideMasters/slideMaster1.xml".to_string(),
                format!(
                    r#"{}<p:sldMaster {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sldMaster>"#,
                    DECL, NS, GROUP
                ),
            ),
            (
                "ppt/theme/theme1.xml".to_string(),
                format!(
                    r#"{}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Fixture"><a:themeElements/></a:theme>"#,
                    DECL
                ),
            ),
        ];

        if self.has_notes() {
            parts.push((
                "ppt/notesMasters/notesMaster1.xml".to_string(),
                format!(
                    r#"{}<p:notesMaster {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:notesMaster>"#,
                    DECL, NS, GROUP
                ),
            ));
        }

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slides/slide{}.xml", n), slide_xml(slide)));

            if let Some(notes) = &slide.notes {
                parts.push((
                    format!("ppt/slides/_rels/slide{}.xml.rels", n),
                    rels(&[(
                        "rId1",
                        "notesSlide",
                        &format!("../notesSlides/notesSlide{}.xml", n),
                    )]),
                ));
                parts.push((format!("ppt/notesSlides/notesSlide{}.xml", n), notes_xml(notes)));
                parts.push((
                    format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                    rels(&[
                        ("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
                        ("rId2", "slide", &format!("../slides/slide{}.xml", n)),
                    ]),
                ));
            }
        }

        parts
    }

    fn content_types(&self) -> String {
        let mut xml = format!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#,
            DECL
        );
        let mut overrides = vec![
            ("/ppt/presentation.xml".to_string(), "presentation.main+xml"),
            (
                "/ppt/slideMasters/slideMaster1.xml".to_string(),
                "slideMaster+xml",
            ),
        ];
        if self.has_notes() {
            overrides.push((
                "/ppt/notesMasters/notesMaster1.xml".to_string(),
                "notesMaster+xml",
            ));
        }
        for (i, slide) in self.slides.iter().enumerate() {
            overrides.push((format!("/ppt/slides/slide{}.xml", i + 1), "slide+xml"));
            if slide.notes.is_some() {
                overrides.push((
                    format!("/ppt/notesSlides/notesSlide{}.xml", i + 1),
                    "notesSlide+xml",
                ));
            }
        }
        for (part, kind) in overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}.{}"/>"#,
                part, PML_CT, kind
            ));
        }
        xml.push_str(r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#);
        xml.push_str("</Types>");
        xml
    }

    fn presentation(&self) -> String {
        let mut ids: Vec<usize> = (1..=self.slides.len()).collect();
        if self.reversed {
            ids.reverse();
        }

        let mut xml = format!(
            r#"{}<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            DECL, NS
        );
        if self.has_notes() {
            xml.push_str(r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId2"/></p:notesMasterIdLst>"#);
        }
        xml.push_str("<p:sldIdLst>");
        for n in ids {
            xml.push_str(&format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                255 + n,
                10 + n
            ));
        }
        xml.push_str("</p:sldIdLst>");
        xml.push_str(r#"<p:sldSz cx="9144000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/>"#);
        xml.push_str("</p:presentation>");
        xml
    }

    fn presentation_rels(&self) -> String {
        let slide_targets: Vec<(String, String)> = (1..=self.slides.len())
            .map(|n| (format!("rId{}", 10 + n), format!("slides/slide{}.xml", n)))
            .collect();

        let mut entries = vec![
            ("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
            ("rId3", "theme", "theme/theme1.xml"),
        ];
        if self.has_notes() {
            entries.push(("rId2", "notesMaster", "notesMasters/notesMaster1.xml"));
        }
        for (id, target) in &slide_targets {
            entries.push((id.as_str(), "slide", target.as_str()));
        }
        rels(&entries)
    }
}

fn rels(entries: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        r#"{}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        DECL
    );
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, REL_NS, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn paragraphs(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(line)))
        .collect()
}

fn slide_xml(slide: &FixtureSlide) -> String {
    let mut xml = format!(r#"{}<p:sld {}><p:cSld><p:spTree>{}"#, DECL, NS, GROUP);
    for (i, text) in slide.texts.iter().enumerate() {
        xml.push_str(&format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="TextBox {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            i + 2,
            i + 1,
            paragraphs(text)
        ));
    }
    xml.push_str(&format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="Picture"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill/><p:spPr/></p:pic>"#,
        slide.texts.len() + 2
    ));
    xml.push_str("</p:spTree></p:cSld></p:sld>");
    xml
}

fn notes_xml(notes: &str) -> String {
    format!(
        concat!(
            r#"{}<p:notes {}><p:cSld><p:spTree>{}"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#,
            r#"<p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/>"#,
            r#"<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            r#"</p:spTree></p:cSld></p:notes>"#
        ),
        DECL,
        NS,
        GROUP,
        paragraphs(notes)
    )
}
