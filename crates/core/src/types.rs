//! Domain types for extracted deck text and generated notes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents an entire presentation with its extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<ExtractedSlide>,
}

impl Presentation {
    /// Create a new, empty presentation with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }

    /// Number of slides.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// One string per slide, in slide order.
    ///
    /// Index `i` holds the text of slide `i + 1`.
    pub fn slide_texts(&self) -> Vec<String> {
        self.slides.iter().map(ExtractedSlide::text).collect()
    }
}

/// A single extracted slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// 1-based slide number.
    pub number: usize,

    /// Text of every text-bearing shape, in document order.
    pub shapes: Vec<String>,
}

impl ExtractedSlide {
    /// Create a new slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Add the text of one shape.
    pub fn add_shape_text(&mut self, text: impl Into<String>) {
        self.shapes.push(text.into());
    }

    /// Shape texts joined with newlines; empty when the slide has no text shapes.
    pub fn text(&self) -> String {
        self.shapes.join("\n")
    }
}

/// Generated notes keyed by global 0-based slide index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesMap {
    notes: BTreeMap<usize, String>,
}

impl NotesMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a note unless the slide already has one.
    ///
    /// Returns `false` (and leaves the map untouched) when `index` is taken.
    pub fn insert_new(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.notes.entry(index) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(text.into());
                true
            }
        }
    }

    /// Note for a slide index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.notes.get(&index).map(String::as_str)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.notes.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Entries in ascending slide order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.notes.iter().map(|(idx, text)| (*idx, text.as_str()))
    }

    /// Slide indices below `slide_count` that have no note.
    pub fn missing(&self, slide_count: usize) -> Vec<usize> {
        (0..slide_count).filter(|idx| !self.contains(*idx)).collect()
    }
}

impl FromIterator<(usize, String)> for NotesMap {
    fn from_iter<I: IntoIterator<Item = (usize, String)>>(iter: I) -> Self {
        let mut map = NotesMap::new();
        for (idx, text) in iter {
            map.insert_new(idx, text);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_text_joins_shapes() {
        let mut slide = ExtractedSlide::new(1);
        slide.add_shape_text("Title");
        slide.add_shape_text("First point\nSecond point");
        assert_eq!(slide.text(), "Title\nFirst point\nSecond point");
    }

    #[test]
    fn test_slide_without_shapes_is_empty() {
        assert_eq!(ExtractedSlide::new(3).text(), "");
    }

    #[test]
    fn test_presentation_slide_texts_in_order() {
        let mut presentation = Presentation::new("deck.pptx");
        for number in 1..=3 {
            let mut slide = ExtractedSlide::new(number);
            if number != 2 {
                slide.add_shape_text(format!("Slide body {}", number));
            }
            presentation.add_slide(slide);
        }

        assert_eq!(presentation.slide_count(), 3);
        assert_eq!(
            presentation.slide_texts(),
            vec!["Slide body 1", "", "Slide body 3"]
        );
    }

    #[test]
    fn test_notes_map_never_overwrites() {
        let mut notes = NotesMap::new();
        assert!(notes.insert_new(2, "first"));
        assert!(!notes.insert_new(2, "second"));
        assert_eq!(notes.get(2), Some("first"));
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_notes_map_missing() {
        let notes: NotesMap = vec![(0, "a".to_string()), (2, "c".to_string())]
            .into_iter()
            .collect();
        assert_eq!(notes.missing(4), vec![1, 3]);
        assert_eq!(notes.missing(0), Vec::<usize>::new());
    }
}
