//! Document storage collaborator.
//!
//! Collections of JSON object documents addressed by string ids, with the
//! small query surface the app needs: equality filters, one ordering field
//! and a limit.

pub mod file;
pub mod memory;
pub mod records;
pub mod timestamp;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use records::{
    Interview, InterviewStatus, NewInterview, Record, complete_interview, create_interview,
    finalize_interview, get_feedback_by_id, get_feedback_by_interview_id, get_interview_by_id,
    get_interviews_by_user_id, get_latest_interviews, save_feedback,
};

use crate::error::{PrepcallError, Result};
use serde_json::Value;
use std::cmp::Ordering;

/// A document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

/// Allocate a fresh document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Create or overwrite the document at `id`.
    async fn set(&self, collection: &str, id: &str, document: Value) -> Result<()>;

    /// All documents of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>>;

    /// Store under a newly allocated id and return it.
    async fn add(&self, collection: &str, document: Value) -> Result<String> {
        let id = new_document_id();
        self.set(collection, &id, document).await?;
        Ok(id)
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<StoredDocument>> {
        Ok(query.apply(self.list(collection).await?))
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

/// Reject anything that is not a JSON object.
pub(crate) fn ensure_object(collection: &str, id: &str, document: &Value) -> Result<()> {
    if document.is_object() {
        Ok(())
    } else {
        Err(PrepcallError::Storage {
            message: format!("{}/{} must be a JSON object", collection, id),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    /// Matches documents that have the field with a different value.
    Ne(String, Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn where_ne(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Ne(field.to_string(), value.into()));
        self
    }

    /// Order by one field. Documents without the field are excluded.
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        let filtered = self.filters.iter().all(|filter| match filter {
            Filter::Eq(field, value) => field_value(document, field) == Some(value),
            Filter::Ne(field, value) => {
                field_value(document, field).is_some_and(|found| found != value)
            }
        });
        let ordered = match &self.order {
            Some((field, _)) => field_value(document, field).is_some(),
            None => true,
        };
        filtered && ordered
    }

    /// Filter, sort and truncate. Sorting is stable, so ties keep the
    /// input order.
    pub fn apply(&self, documents: Vec<StoredDocument>) -> Vec<StoredDocument> {
        let mut selected: Vec<StoredDocument> = documents
            .into_iter()
            .filter(|doc| self.matches(&doc.data))
            .collect();

        if let Some((field, direction)) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = match (field_value(&a.data, field), field_value(&b.data, field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Look up a possibly dotted field path (`a.b.c`).
pub fn field_value<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |value, key| value.as_object()?.get(key))
}

/// Total order over JSON values: null < bool < number < string < array <
/// object, then by value within a type.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}
