//! Terminal rendering for call outcomes, interviews and feedback.
//!
//! Formatting functions return strings so they can be tested; printing is
//! left to the caller.

use crate::call::{CallError, CallOutcome, CallStatus, Navigation, Notifier};
use crate::feedback::FeedbackReport;
use crate::store::{Interview, Record};
use crate::store::timestamp;
use crate::transcript::{Role, TranscriptEntry};
use owo_colors::OwoColorize;

/// Notifier that prints notices to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier {
    pub quiet: bool,
}

impl Notifier for StderrNotifier {
    fn notify(&self, error: &CallError) {
        log::warn!("notice: {}", error);
        if !self.quiet {
            eprintln!("{}", error.to_string().yellow());
        }
    }
}

fn status_label(status: CallStatus) -> String {
    match status {
        CallStatus::Finished => status.as_str().green().to_string(),
        CallStatus::Inactive => status.as_str().red().to_string(),
        CallStatus::Connecting | CallStatus::Active => status.as_str().yellow().to_string(),
    }
}

pub fn format_entry(entry: &TranscriptEntry) -> String {
    let speaker = match entry.role {
        Role::Assistant => "interviewer".cyan().to_string(),
        Role::User => "you".bold().to_string(),
        Role::System => "system".dimmed().to_string(),
    };
    format!("{speaker}: {}", entry.content)
}

/// `user_id` fills in the follow-up command for viewing saved feedback.
pub fn format_outcome(outcome: &CallOutcome, user_id: &str) -> String {
    let mut out = format!("Call {}\n", status_label(outcome.status));
    if outcome.transcript.is_empty() {
        out.push_str(&format!("  {}\n", "(no transcript)".dimmed()));
    }
    for entry in &outcome.transcript {
        out.push_str(&format!("  {}\n", format_entry(entry)));
    }
    match &outcome.navigation {
        Navigation::Feedback {
            interview_id,
            feedback_id,
        } => {
            out.push_str(&format!(
                "Feedback {} saved; view with: prepcall feedback show --interview {} --user {}\n",
                feedback_id.green(),
                interview_id,
                user_id
            ));
        }
        Navigation::Home => out.push_str(&format!("{} /\n", "Next:".dimmed())),
        Navigation::Stay => {}
    }
    out
}

pub fn format_interview_line(record: &Record<Interview>) -> String {
    let interview = &record.data;
    let ready = if interview.finalized {
        "ready".green().to_string()
    } else {
        "draft".dimmed().to_string()
    };
    let stack = if interview.techstack.is_empty() {
        String::new()
    } else {
        format!(" [{}]", interview.techstack.join(", "))
    };
    format!(
        "{}  {} {}{} ({}, {} questions, {})",
        record.id.dimmed(),
        interview.role,
        interview.kind,
        stack,
        ready,
        interview.questions.len(),
        timestamp::format(&interview.created_at)
    )
}

pub fn format_interview(record: &Record<Interview>) -> String {
    let mut out = format_interview_line(record);
    out.push('\n');
    for question in &record.data.questions {
        out.push_str(&format!("  - {question}\n"));
    }
    out
}

pub fn format_feedback(record: &Record<FeedbackReport>) -> String {
    let report = &record.data;
    let assessment = &report.assessment;
    let mut out = format!(
        "Feedback {} for interview {} ({})\n",
        record.id.dimmed(),
        report.interview_id,
        timestamp::format(&report.created_at)
    );
    out.push_str(&format!(
        "Overall: {}/100\n\n",
        assessment.total_score.bold()
    ));
    for (category, score) in assessment.category_scores.iter() {
        out.push_str(&format!("  {:<22} {:>5.1}\n", category.label(), score));
    }
    if !assessment.strengths.is_empty() {
        out.push_str(&format!("\n{}\n", "Strengths".green()));
        for item in &assessment.strengths {
            out.push_str(&format!("  - {item}\n"));
        }
    }
    if !assessment.areas_for_improvement.is_empty() {
        out.push_str(&format!("\n{}\n", "Areas for improvement".yellow()));
        for item in &assessment.areas_for_improvement {
            out.push_str(&format!("  - {item}\n"));
        }
    }
    out.push_str(&format!("\n{}\n", assessment.final_assessment));
    out
}
