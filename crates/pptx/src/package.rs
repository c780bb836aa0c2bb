//! In-memory OPC package (the ZIP container of a `.pptx`).
//!
//! Every part is loaded up front and kept in archive order so the package
//! can be written back out with only the touched parts changed.

use crate::rels::{Relationships, RT_OFFICE_DOCUMENT, RT_SLIDE};
use notes_core::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Upper bound on the preallocation taken from an entry's declared size.
const SIZE_HINT_LIMIT: u64 = 64 << 20;

/// Presentation part used when the package relationships do not name one.
const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// A named part and its bytes.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// A loaded package.
#[derive(Debug, Clone)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Load every part of the archive in `reader`.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
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
            let mut data = Vec::with_capacity(file.size().min(SIZE_HINT_LIMIT) as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push(Part { name, data });
        }

        let package = Self { parts };
        if !package.contains(CONTENT_TYPES_PART) {
            return Err(Error::PptxParseError(format!(
                "'{}' is missing; not an OOXML package",
                CONTENT_TYPES_PART
            )));
        }
        Ok(package)
    }

    /// Load a package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.name == name)
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// A part decoded as UTF-8 XML.
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        std::str::from_utf8(data)
            .map_err(|e| Error::XmlError(format!("'{}' is not valid UTF-8: {}", name, e)))
    }

    /// Replace a part, or append it when new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// First unused part name of the form `{prefix}{n}{suffix}`.
    pub fn next_part_name(&self, prefix: &str, suffix: &str) -> String {
        let max = self
            .part_names()
            .filter_map(|name| name.strip_prefix(prefix))
            .filter_map(|rest| rest.strip_suffix(suffix))
            .filter_map(|n| n.parse::<usize>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{}{}", prefix, max + 1, suffix)
    }

    /// Relationships of `source`; empty when it has no `.rels` part.
    pub fn relationships(&self, source: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(source);
        if !self.contains(&rels_path) {
            return Ok(Relationships::new());
        }
        Relationships::parse(self.part_str(&rels_path)?)
    }

    pub fn set_relationships(&mut self, source: &str, rels: &Relationships) {
        self.set_part(&rels_path_for(source), rels.to_xml().into_bytes());
    }

    /// Name of the presentation part.
    pub fn presentation_part(&self) -> Result<String> {
        let root = self.relationships("")?;
        Ok(root
            .find_by_type(RT_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string()))
    }

    /// Slide part names in presentation order.
    ///
    /// The order is that of `p:sldIdLst`, resolved through the presentation
    /// part's relationships.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let presentation = self.presentation_part()?;
        let rels = self.relationships(&presentation)?;
        let xml = self.part_str(&presentation)?;

        let mut slides = Vec::new();
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"sldId" =>
                {
                    let rel_id = e
                        .attributes()
                        .flatten()
                        .find(|attr| attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some())
                        .map(|attr| String::from_utf8_lossy(&attr.value).to_string());

                    let Some(rel_id) = rel_id else {
                        log::warn!("Slide entry without relationship id in {}", presentation);
                        continue;
                    };
                    match rels.by_id(&rel_id) {
                        Some(rel) if rel.is_type(RT_SLIDE) => {
                            slides.push(resolve_target(&presentation, &rel.target));
                        }
                        _ => {
                            return Err(Error::PptxParseError(format!(
                                "Slide relationship '{}' not found in {}",
                                rel_id, presentation
                            )));
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing {}: {}",
                        presentation, e
                    )));
                }
                _ => {}
            }
        }

        Ok(slides)
    }

    /// Register a content type override for a part, unless one exists.
    pub fn add_content_type_override(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let xml = self.part_str(CONTENT_TYPES_PART)?;
        let part_attr = format!("PartName=\"/{}\"", part_name);
        if xml.contains(&part_attr) {
            return Ok(());
        }

        let close = xml.rfind("</Types>").ok_or_else(|| {
            Error::PptxParseError(format!("{} has no closing Types element", CONTENT_TYPES_PART))
        })?;
        let mut updated = String::with_capacity(xml.len() + 160);
        updated.push_str(&xml[..close]);
        updated.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            escape(part_name),
            escape(content_type)
        ));
        updated.push_str(&xml[close..]);

        self.set_part(CONTENT_TYPES_PART, updated.into_bytes());
        Ok(())
    }

    /// Write the package as a ZIP archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Write the package to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = self.write_to(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }
}

/// The `.rels` part holding the relationships of `part`.
///
/// `ppt/slides/slide1.xml` maps to `ppt/slides/_rels/slide1.xml.rels`; the
/// empty source (the package itself) maps to `_rels/.rels`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part it belongs to.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/'));
    }
    let base = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(base.split('/').chain(target.split('/')))
}

/// Target of a relationship from `source` to `part`, relative to `source`.
pub fn relative_target(source: &str, part: &str) -> String {
    let base: Vec<&str> = source
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    let target: Vec<&str> = part.split('/').collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<&str> = vec![".."; base.len() - common];
    segments.extend(&target[common..]);
    segments.join("/")
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}
