//! Batch run configuration.

use crate::{Error, Result};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Slides per request when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// File extension of the decks the batch picks up.
pub const DECK_EXTENSION: &str = "pptx";

/// Where to read decks from, where to write them, and how to chunk them.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Folder scanned (non-recursively) for decks.
    pub input_dir: PathBuf,

    /// Folder receiving the annotated copies; created when missing.
    pub output_dir: PathBuf,

    /// Slides per request.
    pub chunk_size: NonZeroUsize,

    /// Stop at the first file that cannot be processed.
    pub fail_fast: bool,
}

impl BatchConfig {
    /// Create a configuration with the default chunk size.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            chunk_size: NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN),
            fail_fast: false,
        }
    }

    /// Set the number of slides per request.
    pub fn with_chunk_size(mut self, chunk_size: NonZeroUsize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set whether a file-level failure stops the batch.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Check that the folders make sense together.
    pub fn validate(&self) -> Result<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(Error::ConfigError("input folder is empty".to_string()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::ConfigError("output folder is empty".to_string()));
        }
        if self.input_dir == self.output_dir {
            return Err(Error::ConfigError(format!(
                "output folder must differ from input folder ({})",
                self.input_dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chunk_size() {
        let config = BatchConfig::new("in", "out");
        assert_eq!(config.chunk_size.get(), 5);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_builder() {
        let config = BatchConfig::new("in", "out")
            .with_chunk_size(NonZeroUsize::new(3).unwrap())
            .with_fail_fast(true);
        assert_eq!(config.chunk_size.get(), 3);
        assert!(config.fail_fast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let config = BatchConfig::new("decks", "decks");
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_empty_paths_rejected() {
        assert!(BatchConfig::new("", "out").validate().is_err());
        assert!(BatchConfig::new("in", "").validate().is_err());
    }
}
