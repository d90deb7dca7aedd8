//! Transcript in, persisted feedback id out.

use crate::error::Result;
use crate::feedback::llm::{LanguageModel, StructuredRequest};
use crate::feedback::prompt::{SYSTEM_INSTRUCTION, build_prompt};
use crate::feedback::report::FeedbackAssessment;
use crate::store::{DocumentStore, save_feedback};
use crate::transcript::TranscriptEntry;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<TranscriptEntry>,
    /// Overwrite this record instead of allocating a new one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

/// Coarse outcome reported to callers. Causes are only logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

impl FeedbackResponse {
    pub fn saved(feedback_id: impl Into<String>) -> Self {
        Self {
            success: true,
            feedback_id: Some(feedback_id.into()),
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            feedback_id: None,
        }
    }
}

/// Anything that can turn a finished interview into stored feedback.
#[async_trait::async_trait]
pub trait FeedbackService: Send + Sync {
    async fn create_feedback(&self, request: FeedbackRequest) -> FeedbackResponse;
}

/// Model plus store.
pub struct FeedbackPipeline {
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn DocumentStore>,
}

impl FeedbackPipeline {
    pub fn new(model: Arc<dyn LanguageModel>, store: Arc<dyn DocumentStore>) -> Self {
        Self { model, store }
    }

    /// Score the transcript and persist the report. Returns the id used.
    ///
    /// # Errors
    ///
    /// Model transport failures, unusable model output, rubric violations and
    /// storage failures each surface as their own error variant.
    pub async fn generate_feedback(&self, request: &FeedbackRequest) -> Result<String> {
        let structured = StructuredRequest {
            system: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(&request.transcript),
            schema: FeedbackAssessment::response_schema(),
        };
        log::info!(
            "scoring interview {} ({} entries) with {}",
            request.interview_id,
            request.transcript.len(),
            self.model.model_name()
        );

        let raw = self.model.generate_object(&structured).await?;
        let assessment = FeedbackAssessment::from_value(raw)?;
        let report = assessment.stamp(&request.interview_id, &request.user_id, Utc::now());
        report.assessment.validate()?;

        let id = save_feedback(
            self.store.as_ref(),
            request.feedback_id.as_deref(),
            &report,
        )
        .await?;
        log::info!(
            "saved feedback {} for interview {} (total {})",
            id,
            request.interview_id,
            report.assessment.total_score
        );
        Ok(id)
    }
}

#[async_trait::async_trait]
impl FeedbackService for FeedbackPipeline {
    async fn create_feedback(&self, request: FeedbackRequest) -> FeedbackResponse {
        match self.generate_feedback(&request).await {
            Ok(id) => FeedbackResponse::saved(id),
            Err(e) => {
                log::error!("Error saving feedback: {}", e);
                FeedbackResponse::failed()
            }
        }
    }
}

/// Mock feedback service for testing
#[derive(Debug, Default)]
pub struct MockFeedbackService {
    feedback_id: Option<String>,
    should_fail: bool,
    requests: Mutex<Vec<FeedbackRequest>>,
}

impl MockFeedbackService {
    /// Echo the requested id, or answer `mock-feedback`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with this id
    pub fn with_feedback_id(mut self, id: &str) -> Self {
        self.feedback_id = Some(id.to_string());
        self
    }

    /// Report failure for every request
    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn requests(&self) -> Vec<FeedbackRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl FeedbackService for MockFeedbackService {
    async fn create_feedback(&self, request: FeedbackRequest) -> FeedbackResponse {
        let id = self
            .feedback_id
            .clone()
            .or_else(|| request.feedback_id.clone())
            .unwrap_or_else(|| "mock-feedback".to_string());
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        if self.should_fail {
            FeedbackResponse::failed()
        } else {
            FeedbackResponse::saved(id)
        }
    }
}
