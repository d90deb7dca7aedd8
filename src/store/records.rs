//! Typed records on top of [`DocumentStore`]: interviews and feedback.

use crate::defaults::{FEEDBACK_COLLECTION, INTERVIEWS_COLLECTION};
use crate::error::{PrepcallError, Result};
use crate::feedback::FeedbackReport;
use crate::store::{Direction, DocumentStore, Query, StoredDocument};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A decoded document plus its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: DeserializeOwned> Record<T> {
    fn decode(collection: &str, document: StoredDocument) -> Result<Self> {
        let data = serde_json::from_value(document.data).map_err(|e| PrepcallError::Storage {
            message: format!("{}/{} is malformed: {}", collection, document.id, e),
        })?;
        Ok(Self {
            id: document.id,
            data,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub user_id: String,
    /// Interview flavour, e.g. "technical" or "behavioral".
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    #[serde(default)]
    pub techstack: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub status: InterviewStatus,
    /// Ready to be taken (questions prepared).
    #[serde(default)]
    pub finalized: bool,
    #[serde(with = "crate::store::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Input to [`create_interview`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewInterview {
    pub user_id: String,
    pub kind: String,
    pub role: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
}

/// Store a new pending interview and return its id.
///
/// Interviews created with questions are finalized right away.
pub async fn create_interview(store: &dyn DocumentStore, new: NewInterview) -> Result<String> {
    let finalized = !new.questions.is_empty();
    let interview = Interview {
        user_id: new.user_id,
        kind: new.kind,
        role: new.role,
        techstack: new.techstack,
        questions: new.questions,
        status: InterviewStatus::Pending,
        finalized,
        created_at: Utc::now(),
    };
    let id = store
        .add(INTERVIEWS_COLLECTION, serde_json::to_value(&interview)?)
        .await?;
    log::info!("created interview {} for {}", id, interview.user_id);
    Ok(id)
}

/// Attach prepared questions and mark the interview ready.
pub async fn finalize_interview(
    store: &dyn DocumentStore,
    id: &str,
    questions: Vec<String>,
) -> Result<()> {
    let mut record = get_interview_by_id(store, id)
        .await?
        .ok_or_else(|| PrepcallError::DocumentNotFound {
            collection: INTERVIEWS_COLLECTION.to_string(),
            id: id.to_string(),
        })?;
    record.data.questions = questions;
    record.data.finalized = true;
    store
        .set(INTERVIEWS_COLLECTION, id, serde_json::to_value(&record.data)?)
        .await
}

/// Mark an interview as taken.
pub async fn complete_interview(store: &dyn DocumentStore, id: &str) -> Result<()> {
    let Some(mut record) = get_interview_by_id(store, id).await? else {
        return Err(PrepcallError::DocumentNotFound {
            collection: INTERVIEWS_COLLECTION.to_string(),
            id: id.to_string(),
        });
    };
    record.data.status = InterviewStatus::Completed;
    store
        .set(INTERVIEWS_COLLECTION, id, serde_json::to_value(&record.data)?)
        .await
}

pub async fn get_interview_by_id(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<Option<Record<Interview>>> {
    match store.get(INTERVIEWS_COLLECTION, id).await? {
        Some(data) => Ok(Some(Record::decode(
            INTERVIEWS_COLLECTION,
            StoredDocument {
                id: id.to_string(),
                data,
            },
        )?)),
        None => Ok(None),
    }
}

/// A user's own interviews, newest first.
pub async fn get_interviews_by_user_id(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<Record<Interview>>> {
    let query = Query::new()
        .where_eq("userId", user_id)
        .order_by("createdAt", Direction::Desc);
    decode_all(INTERVIEWS_COLLECTION, store.query(INTERVIEWS_COLLECTION, &query).await?)
}

/// Finalized interviews created by other users, newest first.
pub async fn get_latest_interviews(
    store: &dyn DocumentStore,
    user_id: &str,
    limit: usize,
) -> Result<Vec<Record<Interview>>> {
    let query = Query::new()
        .where_eq("finalized", true)
        .where_ne("userId", user_id)
        .order_by("createdAt", Direction::Desc)
        .limit(limit);
    decode_all(INTERVIEWS_COLLECTION, store.query(INTERVIEWS_COLLECTION, &query).await?)
}

/// Persist a report. Overwrites `feedback_id` when given, otherwise a new
/// id is allocated. Returns the id used.
pub async fn save_feedback(
    store: &dyn DocumentStore,
    feedback_id: Option<&str>,
    report: &FeedbackReport,
) -> Result<String> {
    let document = serde_json::to_value(report)?;
    match feedback_id {
        Some(id) => {
            store.set(FEEDBACK_COLLECTION, id, document).await?;
            Ok(id.to_string())
        }
        None => store.add(FEEDBACK_COLLECTION, document).await,
    }
}

pub async fn get_feedback_by_id(
    store: &dyn DocumentStore,
    id: &str,
) -> Result<Option<Record<FeedbackReport>>> {
    match store.get(FEEDBACK_COLLECTION, id).await? {
        Some(data) => Ok(Some(Record::decode(
            FEEDBACK_COLLECTION,
            StoredDocument {
                id: id.to_string(),
                data,
            },
        )?)),
        None => Ok(None),
    }
}

/// First feedback stored for this interview and user.
pub async fn get_feedback_by_interview_id(
    store: &dyn DocumentStore,
    interview_id: &str,
    user_id: &str,
) -> Result<Option<Record<FeedbackReport>>> {
    let query = Query::new()
        .where_eq("interviewId", interview_id)
        .where_eq("userId", user_id)
        .limit(1);
    let mut found = decode_all(FEEDBACK_COLLECTION, store.query(FEEDBACK_COLLECTION, &query).await?)?;
    Ok(found.pop())
}

fn decode_all<T: DeserializeOwned>(
    collection: &str,
    documents: Vec<StoredDocument>,
) -> Result<Vec<Record<T>>> {
    documents
        .into_iter()
        .map(|document| Record::decode(collection, document))
        .collect()
}
