pub mod chunk;
pub mod format;

pub use chunk::{split_message, ChunkLimits};
pub use format::{format_answer, CitationMode};

/// An answer as returned by a provider, before formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answer {
    pub body: String,
    pub citations: Vec<String>,
}

impl Answer {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            citations: Vec::new(),
        }
    }
}

/// Build the message chunks for one answered question.
///
/// The first chunk opens with a mention of the asker and the question.
pub fn compose(
    mention: &str,
    question: &str,
    answer: &Answer,
    mode: CitationMode,
    limits: ChunkLimits,
) -> Vec<String> {
    let document = format_answer(&answer.body, &answer.citations, mode);
    let full = format!(
        "{} Here's your answer to question: **{}**\n\n{}",
        mention, question, document
    );
    split_message(&full, limits)
}
