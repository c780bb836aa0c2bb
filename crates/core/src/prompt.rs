//! Instruction text sent to the completion endpoint.

use crate::chunk::Chunk;

/// Default subject description used in the instruction.
pub const DEFAULT_TOPIC: &str = "an academic topic";

/// Default audience description used in the instruction.
pub const DEFAULT_AUDIENCE: &str = "undergraduate students and/or professionals";

/// Builds the speaker-notes instruction for one chunk of slides.
///
/// Notes come out noticeably better when the topic and audience are named,
/// so both can be set by the operator.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    topic: String,
    audience: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

impl PromptBuilder {
    /// Create a builder with the default topic and audience.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject of the deck, e.g. "cognitive neuroscience".
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set who the notes are written for.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Build the instruction, labeling each slide by its chunk-local number.
    pub fn build(&self, chunk: &Chunk<'_>) -> String {
        let mut prompt = format!(
            "You are an assistant helping a presenter write speaker's notes for a set of slides on {}.\n\
             For each slide, please generate 2-3 paragraphs of clear, engaging, and explanatory speaker's notes. \
             Make sure the complexity of the content is appropriate for {}. \
             If possible, include examples, quotes, and elaborations on the content within each slide. \
             Format using bullet points when appropriate.\n\
             Here are the slides:\n\n",
            self.topic, self.audience
        );

        for (number, text) in chunk.numbered() {
            prompt.push_str(&format!("Slide {}:\n{}\n\n", number, text));
        }

        prompt.push_str(
            "For each slide above, return the speaker's notes labeled by slide number, \
             in the form \"Slide <number>:\". \
             Use 2-3 paragraphs for each, in a conversational style.\n",
        );

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(slides: &[String], start: usize) -> Chunk<'_> {
        Chunk { start, slides }
    }

    #[test]
    fn test_slides_are_labeled_chunk_locally() {
        let slides = vec!["Intro".to_string(), "Results\nTable 1".to_string()];
        let prompt = PromptBuilder::new().build(&chunk_of(&slides, 10));

        assert!(prompt.contains("Slide 1:\nIntro\n\n"));
        assert!(prompt.contains("Slide 2:\nResults\nTable 1\n\n"));
        assert!(!prompt.contains("Slide 11:"));
    }

    #[test]
    fn test_default_topic_and_audience() {
        let slides = vec!["Intro".to_string()];
        let prompt = PromptBuilder::new().build(&chunk_of(&slides, 0));

        assert!(prompt.contains(DEFAULT_TOPIC));
        assert!(prompt.contains(DEFAULT_AUDIENCE));
    }

    #[test]
    fn test_custom_topic_and_audience() {
        let slides = vec!["Neurons".to_string()];
        let prompt = PromptBuilder::new()
            .with_topic("cognitive neuroscience")
            .with_audience("first-year medical students")
            .build(&chunk_of(&slides, 0));

        assert!(prompt.contains("slides on cognitive neuroscience."));
        assert!(prompt.contains("appropriate for first-year medical students."));
        assert!(!prompt.contains(DEFAULT_AUDIENCE));
    }

    #[test]
    fn test_empty_slide_still_listed() {
        let slides = vec![String::new(), "Body".to_string()];
        let prompt = PromptBuilder::new().build(&chunk_of(&slides, 0));

        assert!(prompt.contains("Slide 1:\n\n\nSlide 2:\nBody"));
    }
}
