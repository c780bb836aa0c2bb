//! Batch speaker notes generation over a folder of decks.

pub mod batch;

pub use batch::{find_decks, BatchDriver};
