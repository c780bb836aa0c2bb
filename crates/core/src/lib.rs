//! Core domain types, chunking, prompt building and reply parsing for
//! speaker notes generation.

pub mod chunk;
pub mod config;
pub mod error;
pub mod labels;
pub mod prompt;
pub mod report;
pub mod types;

pub use chunk::{chunk_slides, Chunk, Chunks};
pub use config::{BatchConfig, DECK_EXTENSION, DEFAULT_CHUNK_SIZE};
pub use error::{Error, Result};
pub use labels::{parse_labeled_notes, LabelIssue, LabeledNotes};
pub use prompt::PromptBuilder;
pub use report::{BatchReport, ChunkOutcome, ChunkReport, FileFailure, FileReport};
pub use types::{ExtractedSlide, NotesMap, Presentation};
