//! Batch driver: runs every deck of the input folder through extraction,
//! chunked note requests and notes writing.

use notes_core::{
    chunk_slides, BatchConfig, BatchReport, ChunkOutcome, ChunkReport, Error, FileFailure,
    FileReport, NotesMap, Result, DECK_EXTENSION,
};
use notes_openai::{CompletionTransport, NotesRequester};
use notes_pptx::{NotesWriter, PptxParser};
use std::fs;
use std::path::{Path, PathBuf};

/// Processes a folder of decks, one file and one chunk at a time.
pub struct BatchDriver<T> {
    config: BatchConfig,
    requester: NotesRequester<T>,
    parser: PptxParser,
    writer: NotesWriter,
}

impl<T: CompletionTransport> BatchDriver<T> {
    pub fn new(config: BatchConfig, requester: NotesRequester<T>) -> Self {
        Self {
            config,
            requester,
            parser: PptxParser::new(),
            writer: NotesWriter::new(),
        }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn requester(&self) -> &NotesRequester<T> {
        &self.requester
    }

    /// Process every deck in the input folder.
    ///
    /// A file that cannot be processed is logged and recorded in the report,
    /// and the batch moves on; with `fail_fast` its error is returned
    /// instead. Failing to create the output folder or to list the input
    /// folder is always an error.
    pub fn run(&self) -> Result<BatchReport> {
        self.config.validate()?;
        fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            Error::ConfigError(format!(
                "Cannot create output folder {}: {}",
                self.config.output_dir.display(),
                e
            ))
        })?;

        let decks = find_decks(&self.config.input_dir)?;
        if decks.is_empty() {
            log::warn!(
                "No .{} files found in {}",
                DECK_EXTENSION,
                self.config.input_dir.display()
            );
        } else {
            log::info!(
                "Found {} decks in {}",
                decks.len(),
                self.config.input_dir.display()
            );
        }

        let mut report = BatchReport::default();
        for path in decks {
            match self.process_file(&path) {
                Ok(file) => report.files.push(file),
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    log::error!("Skipping '{}': {}", path.display(), e);
                    report.failures.push(FileFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Generate notes for one deck and save the annotated copy.
    ///
    /// Request-stage errors only fail their chunk; the file is still saved
    /// with whatever notes the other chunks produced.
    pub fn process_file(&self, path: &Path) -> Result<FileReport> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::document_open(path, "path has no file name"))?;
        log::info!("Processing {}", path.display());

        let presentation = self.parser.parse_path(path)?;
        let texts = presentation.slide_texts();

        let mut notes = NotesMap::new();
        let mut chunks = Vec::new();

        for chunk in chunk_slides(&texts, self.config.chunk_size) {
            let (outcome, issues) = match self.requester.request(&chunk) {
                Ok(chunk_notes) => {
                    let outcome = chunk_notes.outcome();
                    if outcome == ChunkOutcome::NoLabels {
                        log::warn!(
                            "No slide labels in the reply for slides starting at {} in file '{}'. Reply: {}",
                            chunk.first_slide_number(),
                            presentation.filename,
                            chunk_notes.reply
                        );
                    }
                    for issue in &chunk_notes.issues {
                        log::warn!(
                            "Slides starting at {} in file '{}': {}",
                            chunk.first_slide_number(),
                            presentation.filename,
                            issue
                        );
                    }
                    for (index, text) in chunk_notes.notes {
                        if !notes.insert_new(index, text) {
                            log::warn!(
                                "Slide {} of '{}' already has notes; keeping the first",
                                index + 1,
                                presentation.filename
                            );
                        }
                    }
                    (outcome, chunk_notes.issues)
                }
                Err(e) if e.is_chunk_scoped() => {
                    log::error!(
                        "Error processing slides chunk starting at slide {} in file '{}': {}",
                        chunk.first_slide_number(),
                        presentation.filename,
                        e
                    );
                    (
                        ChunkOutcome::Failed {
                            reason: e.to_string(),
                        },
                        Vec::new(),
                    )
                }
                Err(e) => return Err(e),
            };

            chunks.push(ChunkReport {
                first_slide: chunk.first_slide_number(),
                slide_count: chunk.len(),
                outcome,
                issues,
            });
        }

        let deck = self.writer.write(path, &notes)?;
        let output = self.config.output_dir.join(name);
        deck.save(&output)?;
        log::info!("Saved {}", output.display());

        let file = FileReport::new(
            presentation.filename.clone(),
            output,
            presentation.slide_count(),
            chunks,
            &notes,
        );
        log::info!("{}", file.summary());
        Ok(file)
    }
}

/// Regular files directly inside `dir` whose name ends in `.pptx` (any
/// case), sorted by path.
pub fn find_decks(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::ConfigError(format!("Cannot read input folder {}: {}", dir.display(), e))
    })?;

    let mut decks = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_deck = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(has_deck_suffix);
        if is_deck && path.is_file() {
            decks.push(path);
        } else {
            log::debug!("Ignoring {}", path.display());
        }
    }

    decks.sort();
    Ok(decks)
}

/// `name` ends in `.pptx`, compared without regard to ASCII case. A file
/// named just `.pptx` counts.
fn has_deck_suffix(name: &str) -> bool {
    let Some(stem_len) = name.len().checked_sub(DECK_EXTENSION.len() + 1) else {
        return false;
    };
    name.is_char_boundary(stem_len)
        && name[stem_len..]
            .strip_prefix('.')
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DECK_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_decks_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pptx", "a.PPTX", ".pptx", "notes.txt", "old.ppt", "pptx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("folder.pptx")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.pptx"), b"x").unwrap();

        let names: Vec<String> = find_decks(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".pptx", "a.PPTX", "b.pptx"]);
    }

    #[test]
    fn test_has_deck_suffix() {
        assert!(has_deck_suffix("talk.pptx"));
        assert!(has_deck_suffix("TALK.PpTx"));
        assert!(has_deck_suffix(".pptx"));
        assert!(has_deck_suffix("été.pptx"));
        assert!(!has_deck_suffix("pptx"));
        assert!(!has_deck_suffix("talk.ppt"));
        assert!(!has_deck_suffix("talk.pptx.bak"));
        assert!(!has_deck_suffix("talkpptx"));
        assert!(!has_deck_suffix("éépptx"));
    }

    #[test]
    fn test_find_decks_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_decks(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
