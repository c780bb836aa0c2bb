//! PPTX (Office Open XML) backend: slide text extraction and speaker notes
//! writing.
//!
//! A .pptx file is a ZIP archive of XML parts. Decks are loaded fully into
//! memory, edited there, and written back out as a new archive.

pub mod deck;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;
pub mod notes;
pub mod package;
pub mod parser;
pub mod rels;
pub mod writer;

pub use deck::Deck;
pub use package::Package;
pub use parser::PptxParser;
pub use writer::{NotesWriter, NOTES_PLACEHOLDER};
