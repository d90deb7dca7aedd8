use crate::feedback::rubric::RubricCategory;
use crate::transcript::TranscriptEntry;

/// System instruction for the scoring model.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional interviewer analyzing a mock interview. Your task is to evaluate the candidate based on structured categories";

/// One `- role: content` line per entry.
pub fn format_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|entry| format!("- {}: {}\n", entry.role, entry.content))
        .collect()
}

/// Scoring prompt for a formatted transcript.
pub fn build_prompt(transcript: &[TranscriptEntry]) -> String {
    let rubric: String = RubricCategory::ALL
        .iter()
        .map(|c| format!("- **{}**: {}\n", c.label(), c.description()))
        .collect();

    format!(
        "You are an AI interviewer analyzing a mock interview. Your task is to evaluate the candidate based on structured categories. \
Be thorough and detailed in your analysis. Don't be lenient with the candidate. \
If there are mistakes or areas for improvement, point them out.\n\
Transcript:\n{}\n\
Please score the candidate from 0 to 100 in the following areas. Do not add categories other than the ones provided:\n{}",
        format_transcript(transcript),
        rubric
    )
}
