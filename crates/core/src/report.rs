//! Per-chunk, per-file and per-batch outcome reports.

use crate::labels::LabelIssue;
use crate::types::NotesMap;
use serde::Serialize;
use std::path::PathBuf;

/// What happened to one chunk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkOutcome {
    /// The reply produced notes for `count` slides.
    Notes { count: usize },
    /// The reply was well-formed but had no usable slide labels.
    NoLabels,
    /// The request failed; the chunk's slides keep the placeholder.
    Failed { reason: String },
}

/// Outcome of one chunk within a file.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    /// 1-based number of the chunk's first slide.
    pub first_slide: usize,
    /// Slides in the chunk.
    pub slide_count: usize,
    pub outcome: ChunkOutcome,
    /// Labels that were dropped or rewritten.
    pub issues: Vec<LabelIssue>,
}

impl ChunkReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Failed { .. })
    }
}

/// Outcome of one processed deck.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub output: PathBuf,
    pub slide_count: usize,
    pub chunks: Vec<ChunkReport>,
    /// 1-based numbers of slides with generated notes.
    pub with_notes: Vec<usize>,
    /// 1-based numbers of slides left with the placeholder only.
    pub placeholder_only: Vec<usize>,
}

impl FileReport {
    /// Build a report, deriving notes coverage from `notes`.
    pub fn new(
        filename: impl Into<String>,
        output: impl Into<PathBuf>,
        slide_count: usize,
        chunks: Vec<ChunkReport>,
        notes: &NotesMap,
    ) -> Self {
        let with_notes = notes
            .iter()
            .map(|(idx, _)| idx)
            .filter(|idx| *idx < slide_count)
            .map(|idx| idx + 1)
            .collect();
        let placeholder_only = notes
            .missing(slide_count)
            .into_iter()
            .map(|idx| idx + 1)
            .collect();

        Self {
            filename: filename.into(),
            output: output.into(),
            slide_count,
            chunks,
            with_notes,
            placeholder_only,
        }
    }

    pub fn failed_chunks(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_failed()).count()
    }

    /// Whether every slide received generated notes.
    pub fn is_complete(&self) -> bool {
        self.placeholder_only.is_empty()
    }

    /// One-line coverage summary for logs.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}: {}/{} slides have notes, {}/{} chunks failed",
            self.filename,
            self.with_notes.len(),
            self.slide_count,
            self.failed_chunks(),
            self.chunks.len()
        );
        if !self.placeholder_only.is_empty() {
            let numbers: Vec<String> = self
                .placeholder_only
                .iter()
                .map(|n| n.to_string())
                .collect();
            summary.push_str(&format!("; placeholder only: slides {}", numbers.join(", ")));
        }
        summary
    }
}

/// A file the batch could not process.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a whole batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
