//! Error types for slide notes generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating speaker notes.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The input path is not a readable or parsable deck.
    #[error("Cannot open deck '{path}': {reason}")]
    DocumentOpenError { path: String, reason: String },

    /// Failed to interpret the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// A slide index past the end of the deck.
    #[error("Slide index {index} is out of range for a deck of {count} slides")]
    SlideIndexError { index: usize, count: usize },

    /// Transport-level failure talking to the completion endpoint.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The reply body is not valid JSON.
    #[error("Failed to decode JSON from API response ({reason}). Response text: {body}")]
    ResponseFormatError { reason: String, body: String },

    /// The endpoint reported an error in its reply.
    #[error("API returned an error: {error}")]
    ServiceError { error: String },

    /// The reply has no `choices` field.
    #[error("Unexpected API response format, 'choices' key missing. Full response: {body}")]
    SchemaError { body: String },

    /// The first choice carries no message content.
    #[error("Error extracting notes text from response ({reason}). Full response: {body}")]
    ExtractionError { reason: String, body: String },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// Build a [`Error::DocumentOpenError`] for `path`.
    pub fn document_open(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        Error::DocumentOpenError {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error only invalidates a single chunk request.
    ///
    /// Chunk-scoped errors are logged and the batch moves on to the next
    /// chunk; everything else concerns the whole file.
    pub fn is_chunk_scoped(&self) -> bool {
        matches!(
            self,
            Error::NetworkError(_)
                | Error::ResponseFormatError { .. }
                | Error::ServiceError { .. }
                | Error::SchemaError { .. }
                | Error::ExtractionError { .. }
        )
    }
}
