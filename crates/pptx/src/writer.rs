//! Writing generated notes into a deck.

use crate::deck::Deck;
use notes_core::{NotesMap, Result};
use std::path::Path;

/// Text given to notes regions that would otherwise be empty.
///
/// PowerPoint drops empty notes regions when saving, so every slide keeps at
/// least this single space.
pub const NOTES_PLACEHOLDER: &str = " ";

/// Writes a [`NotesMap`] into the notes regions of a deck.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotesWriter;

impl NotesWriter {
    pub fn new() -> Self {
        Self
    }

    /// Open the deck at `path` fresh from disk and apply `notes` to it.
    ///
    /// The returned deck is only in memory; the caller decides where to
    /// save it.
    pub fn write(&self, path: &Path, notes: &NotesMap) -> Result<Deck> {
        let mut deck = Deck::open(path)?;
        self.apply(&mut deck, notes)?;
        Ok(deck)
    }

    /// Give every slide a notes region, then overwrite the regions of the
    /// slides in `notes`.
    pub fn apply(&self, deck: &mut Deck, notes: &NotesMap) -> Result<()> {
        let count = deck.slide_count();

        for index in 0..count {
            deck.ensure_notes_slide(index)?;
            let current = deck.notes_text(index)?.unwrap_or_default();
            if current.is_empty() {
                deck.set_notes_text(index, NOTES_PLACEHOLDER)?;
            }
        }

        for (index, text) in notes.iter() {
            if index >= count {
                log::warn!(
                    "Ignoring notes for slide {}: the deck has {} slides",
                    index + 1,
                    count
                );
                continue;
            }
            deck.set_notes_text(index, text)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::DeckBuilder;
    use std::io::Cursor;

    #[test]
    fn test_every_slide_gets_notes() {
        let mut deck = Deck::from_reader(Cursor::new(
            DeckBuilder::new()
                .slide(&["One"])
                .slide_with_notes(&["Two"], "Existing")
                .slide(&[])
                .build(),
        ))
        .unwrap();
        let notes: NotesMap = [(0, "First note".to_string())].into_iter().collect();

        NotesWriter::new().apply(&mut deck, &notes).unwrap();

        assert_eq!(deck.notes_text(0).unwrap().as_deref(), Some("First note"));
        assert_eq!(deck.notes_text(1).unwrap().as_deref(), Some("Existing"));
        assert_eq!(
            deck.notes_text(2).unwrap().as_deref(),
            Some(NOTES_PLACEHOLDER)
        );
    }

    #[test]
    fn test_out_of_range_notes_are_ignored() {
        let mut deck =
            Deck::from_reader(Cursor::new(DeckBuilder::new().slide(&["Only"]).build())).unwrap();
        let notes: NotesMap = [(0, "kept".to_string()), (4, "dropped".to_string())]
            .into_iter()
            .collect();

        NotesWriter::new().apply(&mut deck, &notes).unwrap();
        assert_eq!(deck.notes_text(0).unwrap().as_deref(), Some("kept"));
        assert_eq!(deck.slide_count(), 1);
    }

    #[test]
    fn test_write_leaves_input_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.pptx");
        DeckBuilder::new()
            .slide(&["One"])
            .slide(&["Two"])
            .write_to(&input)
            .unwrap();
        let before = std::fs::read(&input).unwrap();

        let notes: NotesMap = [(1, "Second".to_string())].into_iter().collect();
        let deck = NotesWriter::new().write(&input, &notes).unwrap();
        let output = dir.path().join("annotated.pptx");
        deck.save(&output).unwrap();

        assert_eq!(std::fs::read(&input).unwrap(), before);

        let saved = Deck::open(&output).unwrap();
        assert_eq!(
            saved.notes_text(0).unwrap().as_deref(),
            Some(NOTES_PLACEHOLDER)
        );
        assert_eq!(saved.notes_text(1).unwrap().as_deref(), Some("Second"));
    }
}
