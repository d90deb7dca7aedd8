//! Feedback pipeline: transcript, rubric scoring, validation, persistence.

#[cfg(feature = "gemini")]
pub mod gemini;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod rubric;

#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
pub use llm::{LanguageModel, MockLanguageModel, StructuredRequest};
pub use pipeline::{
    FeedbackPipeline, FeedbackRequest, FeedbackResponse, FeedbackService, MockFeedbackService,
};
pub use prompt::{SYSTEM_INSTRUCTION, build_prompt, format_transcript};
pub use report::{FeedbackAssessment, FeedbackReport};
pub use rubric::{CategoryScores, RubricCategory};
