use crate::error::{PrepcallError, Result};
use crate::feedback::rubric::{CategoryScores, RubricCategory, check_score};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The model's evaluation of one interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackAssessment {
    pub total_score: f64,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

impl FeedbackAssessment {
    /// Decode raw model output. Any shape or range problem is a schema
    /// error.
    pub fn from_value(value: Value) -> Result<Self> {
        let assessment: Self =
            serde_json::from_value(value).map_err(|e| PrepcallError::FeedbackSchema {
                message: e.to_string(),
            })?;
        assessment.validate()?;
        Ok(assessment)
    }

    pub fn validate(&self) -> Result<()> {
        check_score("total", self.total_score)?;
        self.category_scores.check()
    }

    pub fn stamp(
        self,
        interview_id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> FeedbackReport {
        FeedbackReport {
            interview_id: interview_id.into(),
            user_id: user_id.into(),
            assessment: self,
            created_at,
        }
    }

    /// Response schema handed to the model, in the OpenAPI subset Gemini
    /// accepts.
    pub fn response_schema() -> Value {
        let labels: Vec<&str> = RubricCategory::ALL.iter().map(|c| c.label()).collect();
        let categories: serde_json::Map<String, Value> = labels
            .iter()
            .map(|label| (label.to_string(), json!({"type": "NUMBER"})))
            .collect();
        let string_list = json!({"type": "ARRAY", "items": {"type": "STRING"}});

        json!({
            "type": "OBJECT",
            "properties": {
                "totalScore": {"type": "NUMBER"},
                "categoryScores": {
                    "type": "OBJECT",
                    "properties": categories,
                    "required": labels,
                },
                "strengths": string_list,
                "areasForImprovement": string_list,
                "finalAssessment": {"type": "STRING"},
            },
            "required": [
                "totalScore",
                "categoryScores",
                "strengths",
                "areasForImprovement",
                "finalAssessment"
            ],
        })
    }
}

/// A persisted assessment, stamped with who and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub interview_id: String,
    pub user_id: String,
    #[serde(flatten)]
    pub assessment: FeedbackAssessment,
    #[serde(with = "crate::store::timestamp")]
    pub created_at: DateTime<Utc>,
}
