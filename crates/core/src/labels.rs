//! Parsing of "Slide N:" labeled notes out of free-text model replies.
//!
//! The reply is prose, so parsing is best-effort: every `Slide <digits>:`
//! label starts a block that runs up to the next label or the end of the
//! text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches a slide label. `\d` is Unicode-aware, so a matched number can
/// still fail to parse as `usize`.
static LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Slide\s*(\d+):").unwrap());

/// A labeled block whose number could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelIssue {
    /// The numeric token is not a valid slide number.
    MalformedNumber(String),
    /// The number does not name a slide of the chunk it came back for.
    OutOfRange { number: usize, chunk_len: usize },
    /// The label has no text after it.
    EmptyNote { number: usize },
    /// The same number appeared more than once; the later block was kept.
    Duplicate { number: usize },
}

impl std::fmt::Display for LabelIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelIssue::MalformedNumber(token) => {
                write!(f, "unparseable slide number '{}'", token)
            }
            LabelIssue::OutOfRange { number, chunk_len } => write!(
                f,
                "slide number {} is outside the chunk's {} slides",
                number, chunk_len
            ),
            LabelIssue::EmptyNote { number } => write!(f, "slide {} has an empty note", number),
            LabelIssue::Duplicate { number } => {
                write!(f, "slide {} was labeled more than once", number)
            }
        }
    }
}

/// Result of parsing one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabeledNotes {
    /// `(slide number, trimmed note)` pairs in reply order.
    pub entries: Vec<(usize, String)>,

    /// Numeric tokens of labels that were skipped.
    pub malformed: Vec<String>,
}

impl LabeledNotes {
    /// True when the reply contained no usable label.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a reply into labeled notes.
///
/// A reply without any label gives an empty result rather than an error.
pub fn parse_labeled_notes(text: &str) -> LabeledNotes {
    let labels: Vec<_> = LABEL_REGEX.captures_iter(text).collect();
    let mut parsed = LabeledNotes::default();

    for (i, caps) in labels.iter().enumerate() {
        let (Some(label), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = labels
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let body = text[label.end()..body_end].trim();

        match number.as_str().parse::<usize>() {
            Ok(n) => parsed.entries.push((n, body.to_string())),
            Err(e) => {
                log::debug!("Skipping slide label '{}': {}", label.as_str(), e);
                parsed.malformed.push(number.as_str().to_string());
            }
        }
    }

    parsed
}
