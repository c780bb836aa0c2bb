//! A deck opened for editing its notes regions.

use crate::notes::{
    new_notes_master_xml, new_notes_slide_xml, read_notes_text, replace_notes_text,
    CT_NOTES_MASTER, CT_NOTES_SLIDE, CT_THEME,
};
use crate::package::{relative_target, resolve_target, Package};
use crate::rels::{Relationships, RT_NOTES_MASTER, RT_NOTES_SLIDE, RT_SLIDE, RT_THEME};
use notes_core::{Error, Result};
use std::io::{Read, Seek, Write};
use std::path::Path;

/// A `.pptx` deck held in memory.
///
/// Changes only touch the notes slides (and, when the deck has none yet, the
/// notes master) and are written out by [`Deck::save`].
#[derive(Debug, Clone)]
pub struct Deck {
    package: Package,
    slides: Vec<String>,
}

impl Deck {
    /// Open the deck at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Package::open(path)
            .and_then(Self::from_package)
            .map_err(|e| Error::document_open(path, e))
    }

    /// Open a deck from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(Package::from_reader(reader)?)
    }

    pub fn from_package(package: Package) -> Result<Self> {
        let slides = package.slide_paths()?;
        Ok(Self { package, slides })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Text of a slide's notes region.
    ///
    /// `None` when the slide has no notes slide or the notes slide has no
    /// body placeholder.
    pub fn notes_text(&self, index: usize) -> Result<Option<String>> {
        match self.notes_part(index)? {
            Some(part) if self.package.contains(&part) => {
                read_notes_text(self.package.part_str(&part)?)
            }
            _ => Ok(None),
        }
    }

    /// Whether the slide already has a notes slide.
    pub fn has_notes_slide(&self, index: usize) -> Result<bool> {
        Ok(self
            .notes_part(index)?
            .is_some_and(|part| self.package.contains(&part)))
    }

    /// Make sure the slide has a notes slide and return its part name.
    pub fn ensure_notes_slide(&mut self, index: usize) -> Result<String> {
        let slide = self.slide_path(index)?.to_string();
        match self.notes_part(index)? {
            Some(part) if self.package.contains(&part) => Ok(part),
            Some(dangling) => {
                log::warn!(
                    "Notes slide {} of {} is missing; recreating it",
                    dangling,
                    slide
                );
                self.create_notes_slide(&slide, Some(dangling))
            }
            None => self.create_notes_slide(&slide, None),
        }
    }

    /// Replace the text of a slide's notes region, creating it if needed.
    pub fn set_notes_text(&mut self, index: usize, text: &str) -> Result<()> {
        let part = self.ensure_notes_slide(index)?;
        let updated = replace_notes_text(self.package.part_str(&part)?, text)?;
        self.package.set_part(&part, updated.into_bytes());
        Ok(())
    }

    /// Write the deck to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.package.save(path)
    }

    /// Write the deck as a ZIP archive to `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        self.package.write_to(writer)
    }

    fn slide_path(&self, index: usize) -> Result<&str> {
        self.slides
            .get(index)
            .map(String::as_str)
            .ok_or(Error::SlideIndexError {
                index,
                count: self.slides.len(),
            })
    }

    /// Part name the slide's notes relationship points to, if any.
    fn notes_part(&self, index: usize) -> Result<Option<String>> {
        let slide = self.slide_path(index)?;
        let rels = self.package.relationships(slide)?;
        Ok(rels
            .find_by_type(RT_NOTES_SLIDE)
            .map(|rel| resolve_target(slide, &rel.target)))
    }

    fn create_notes_slide(&mut self, slide: &str, part: Option<String>) -> Result<String> {
        let master = self.ensure_notes_master()?;
        let linked = part.is_some();
        let notes = part.unwrap_or_else(|| {
            self.package
                .next_part_name("ppt/notesSlides/notesSlide", ".xml")
        });

        self.package
            .set_part(&notes, new_notes_slide_xml("")?.into_bytes());
        self.package
            .add_content_type_override(&notes, CT_NOTES_SLIDE)?;

        let mut notes_rels = Relationships::new();
        notes_rels.add(RT_NOTES_MASTER, &relative_target(&notes, &master));
        notes_rels.add(RT_SLIDE, &relative_target(&notes, slide));
        self.package.set_relationships(&notes, &notes_rels);

        if !linked {
            let mut slide_rels = self.package.relationships(slide)?;
            slide_rels.add(RT_NOTES_SLIDE, &relative_target(slide, &notes));
            self.package.set_relationships(slide, &slide_rels);
        }

        log::debug!("Created {} for {}", notes, slide);
        Ok(notes)
    }

    /// The notes master part, created (with a copy of the deck's theme) when
    /// the deck has none.
    fn ensure_notes_master(&mut self) -> Result<String> {
        let presentation = self.package.presentation_part()?;
        let mut rels = self.package.relationships(&presentation)?;
        if let Some(rel) = rels.find_by_type(RT_NOTES_MASTER) {
            let part = resolve_target(&presentation, &rel.target);
            if self.package.contains(&part) {
                return Ok(part);
            }
        }

        let master = self
            .package
            .next_part_name("ppt/notesMasters/notesMaster", ".xml");
        self.package
            .set_part(&master, new_notes_master_xml().into_bytes());
        self.package
            .add_content_type_override(&master, CT_NOTES_MASTER)?;

        let mut master_rels = Relationships::new();
        if let Some(source) = self.first_theme_part() {
            let theme = self.package.next_part_name("ppt/theme/theme", ".xml");
            let data = self.package.part(&source).map(<[u8]>::to_vec).unwrap_or_default();
            self.package.set_part(&theme, data);
            self.package.add_content_type_override(&theme, CT_THEME)?;
            master_rels.add(RT_THEME, &relative_target(&master, &theme));
        }
        self.package.set_relationships(&master, &master_rels);

        let rel_id = rels.add(RT_NOTES_MASTER, &relative_target(&presentation, &master));
        self.package.set_relationships(&presentation, &rels);
        self.register_notes_master(&presentation, &rel_id)?;

        log::debug!("Created notes master {}", master);
        Ok(master)
    }

    fn first_theme_part(&self) -> Option<String> {
        self.package
            .part_names()
            .filter(|name| name.starts_with("ppt/theme/") && name.ends_with(".xml"))
            .min()
            .map(str::to_string)
    }

    /// Add the `p:notesMasterIdLst` entry to the presentation part.
    ///
    /// The list goes right after `p:sldMasterIdLst`, as the schema orders it.
    fn register_notes_master(&mut self, presentation: &str, rel_id: &str) -> Result<()> {
        let xml = self.package.part_str(presentation)?;
        if xml.contains("notesMasterIdLst") {
            log::warn!("{} already lists a notes master; leaving it as is", presentation);
            return Ok(());
        }

        let entry = format!(
            r#"<p:notesMasterIdLst><p:notesMasterId r:id="{}"/></p:notesMasterIdLst>"#,
            rel_id
        );
        let at = xml
            .find("</p:sldMasterIdLst>")
            .map(|pos| pos + "</p:sldMasterIdLst>".len())
            .or_else(|| xml.find("<p:sldIdLst"))
            .ok_or_else(|| {
                Error::PptxParseError(format!(
                    "{} has no slide master or slide list",
                    presentation
                ))
            })?;

        let mut updated = String::with_capacity(xml.len() + entry.len());
        updated.push_str(&xml[..at]);
        updated.push_str(&entry);
        updated.push_str(&xml[at..]);
        self.package.set_part(presentation, updated.into_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DeckBuilder;
    use crate::package::CONTENT_TYPES_PART;
    use std::io::Cursor;

    fn deck(builder: DeckBuilder) -> Deck {
        Deck::from_reader(Cursor::new(builder.build())).unwrap()
    }

    fn reload(deck: &Deck) -> Deck {
        let bytes = deck.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        Deck::from_reader(Cursor::new(bytes)).unwrap()
    }

    #[test]
    fn test_existing_notes_are_read() {
        let deck = deck(
            DeckBuilder::new()
                .slide_with_notes(&["Intro"], "Say hello")
                .slide(&["Body"]),
        );

        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.notes_text(0).unwrap().as_deref(), Some("Say hello"));
        assert_eq!(deck.notes_text(1).unwrap(), None);
        assert!(deck.has_notes_slide(0).unwrap());
        assert!(!deck.has_notes_slide(1).unwrap());
    }

    #[test]
    fn test_set_notes_creates_notes_slide_and_master() {
        let mut deck = deck(DeckBuilder::new().slide(&["One"]).slide(&["Two"]));
        deck.set_notes_text(1, "Generated").unwrap();

        let deck = reload(&deck);
        assert_eq!(deck.notes_text(1).unwrap().as_deref(), Some("Generated"));
        assert_eq!(deck.notes_text(0).unwrap(), None);

        let package = deck.package();
        assert!(package.contains("ppt/notesSlides/notesSlide1.xml"));
        assert!(package.contains("ppt/notesMasters/notesMaster1.xml"));
        assert!(package.contains("ppt/theme/theme2.xml"));

        let types = package.part_str(CONTENT_TYPES_PART).unwrap();
        assert!(types.contains("/ppt/notesSlides/notesSlide1.xml"));
        assert!(types.contains("/ppt/notesMasters/notesMaster1.xml"));

        let presentation = package.part_str("ppt/presentation.xml").unwrap();
        assert!(presentation.contains("<p:notesMasterIdLst>"));
        let master_list = presentation.find("notesMasterIdLst").unwrap();
        let slide_list = presentation.find("sldIdLst").unwrap();
        assert!(master_list < slide_list);

        let notes_rels = package
            .relationships("ppt/notesSlides/notesSlide1.xml")
            .unwrap();
        assert_eq!(
            notes_rels.find_by_type(RT_SLIDE).unwrap().target,
            "../slides/slide2.xml"
        );
        assert_eq!(
            notes_rels.find_by_type(RT_NOTES_MASTER).unwrap().target,
            "../notesMasters/notesMaster1.xml"
        );
    }

    #[test]
    fn test_notes_master_created_once() {
        let mut deck = deck(DeckBuilder::new().slide(&["One"]).slide(&["Two"]));
        deck.set_notes_text(0, "a").unwrap();
        deck.set_notes_text(1, "b").unwrap();

        let package = deck.package();
        assert!(!package.contains("ppt/notesMasters/notesMaster2.xml"));
        assert!(package.contains("ppt/notesSlides/notesSlide2.xml"));
        let presentation = package.part_str("ppt/presentation.xml").unwrap();
        assert_eq!(presentation.matches("<p:notesMasterId ").count(), 1);
    }

    #[test]
    fn test_existing_notes_master_reused() {
        let mut deck = deck(
            DeckBuilder::new()
                .slide_with_notes(&["One"], "kept")
                .slide(&["Two"]),
        );
        deck.set_notes_text(1, "new").unwrap();

        let package = deck.package();
        assert!(!package.contains("ppt/notesMasters/notesMaster2.xml"));
        assert_eq!(deck.notes_text(0).unwrap().as_deref(), Some("kept"));
        assert_eq!(deck.notes_text(1).unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut deck = deck(DeckBuilder::new().slide(&["One"]));
        let first = deck.ensure_notes_slide(0).unwrap();
        let second = deck.ensure_notes_slide(0).unwrap();
        assert_eq!(first, second);

        let rels = deck.package().relationships("ppt/slides/slide1.xml").unwrap();
        assert_eq!(
            rels.iter().filter(|rel| rel.is_type(RT_NOTES_SLIDE)).count(),
            1
        );
    }

    #[test]
    fn test_overwrite_existing_notes() {
        let mut deck = deck(DeckBuilder::new().slide_with_notes(&["One"], "old text"));
        deck.set_notes_text(0, "replacement").unwrap();

        let deck = reload(&deck);
        assert_eq!(
            deck.notes_text(0).unwrap().as_deref(),
            Some("replacement")
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let mut deck = deck(DeckBuilder::new().slide(&["One"]));
        assert!(matches!(
            deck.set_notes_text(3, "x"),
            Err(Error::SlideIndexError { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let err = Deck::open(Path::new("/nonexistent/deck.pptx")).unwrap_err();
        assert!(matches!(err, Error::DocumentOpenError { .. }));
    }
}
