//! Language model seam for structured generation.

use crate::error::{PrepcallError, Result};
use serde_json::Value;
use std::sync::Mutex;

/// Request for a JSON object matching `schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub system: String,
    pub prompt: String,
    pub schema: Value,
}

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate one JSON object. The result is not validated here.
    async fn generate_object(&self, request: &StructuredRequest) -> Result<Value>;

    fn model_name(&self) -> &str;
}

/// Mock language model for testing
#[derive(Debug)]
pub struct MockLanguageModel {
    model_name: String,
    response: Value,
    should_fail: bool,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl MockLanguageModel {
    /// Create a mock that answers with an empty object
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: Value::Object(serde_json::Map::new()),
            should_fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Configure the mock to return a specific object
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = response;
        self
    }

    /// Configure the mock to fail every request
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate_object(&self, request: &StructuredRequest) -> Result<Value> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if self.should_fail {
            Err(PrepcallError::ModelRequest {
                message: "mock model failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
