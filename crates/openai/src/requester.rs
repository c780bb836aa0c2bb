//! Requesting notes for one chunk of slides.

use crate::client::{ChatRequest, CompletionTransport, HttpTransport, OpenAiConfig};
use crate::reply::decode_reply;
use notes_core::{parse_labeled_notes, Chunk, ChunkOutcome, LabelIssue, PromptBuilder, Result};
use std::collections::BTreeMap;

/// Notes obtained for one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkNotes {
    /// Global 0-based slide index to note text.
    pub notes: BTreeMap<usize, String>,
    /// Labels that were skipped or overridden.
    pub issues: Vec<LabelIssue>,
    /// The reply text the notes were parsed from.
    pub reply: String,
}

impl ChunkNotes {
    /// `NoLabels` when the reply held nothing label-shaped at all.
    pub fn outcome(&self) -> ChunkOutcome {
        if self.notes.is_empty() && self.issues.is_empty() {
            ChunkOutcome::NoLabels
        } else {
            ChunkOutcome::Notes {
                count: self.notes.len(),
            }
        }
    }
}

/// Turns chunks into prompts, sends them, and maps the labeled reply back
/// to global slide indices.
pub struct NotesRequester<T> {
    transport: T,
    model: String,
    prompt: PromptBuilder,
}

impl NotesRequester<HttpTransport> {
    /// Requester talking HTTP to the configured endpoint.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?, config.model.clone()))
    }
}

impl<T: CompletionTransport> NotesRequester<T> {
    pub fn new(transport: T, model: impl Into<String>) -> Self {
        Self {
            transport,
            model: model.into(),
            prompt: PromptBuilder::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Request notes for `chunk`.
    ///
    /// Transport and reply-decoding failures are returned as errors; label
    /// problems end up in [`ChunkNotes::issues`] for the caller to report.
    pub fn request(&self, chunk: &Chunk<'_>) -> Result<ChunkNotes> {
        let first = chunk.first_slide_number();
        log::debug!(
            "Requesting notes for slides {}-{}",
            first,
            chunk.start + chunk.len()
        );

        let request = ChatRequest::user(&self.model, self.prompt.build(chunk));
        let body = self.transport.send(&request)?;
        let content = decode_reply(&body)?;

        let labeled = parse_labeled_notes(&content);
        let mut result = ChunkNotes::default();
        result
            .issues
            .extend(labeled.malformed.into_iter().map(LabelIssue::MalformedNumber));

        for (number, body) in labeled.entries {
            let Some(index) = chunk.global_index(number) else {
                result.issues.push(LabelIssue::OutOfRange {
                    number,
                    chunk_len: chunk.len(),
                });
                continue;
            };
            if body.is_empty() {
                result.issues.push(LabelIssue::EmptyNote { number });
                continue;
            }
            if result.notes.insert(index, body).is_some() {
                result.issues.push(LabelIssue::Duplicate { number });
            }
        }

        result.reply = content;
        log::debug!(
            "Got notes for {} of {} slides starting at {}",
            result.notes.len(),
            chunk.len(),
            first
        );

        Ok(result)
    }
}
