//! Error types for prepcall.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepcallError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Transport session errors
    #[error("Transport command '{command}' failed: {message}")]
    TransportCommand { command: String, message: String },

    #[error("Transport event stream error: {message}")]
    TransportEvents { message: String },

    // Language model errors
    #[error("Language model request failed: {message}")]
    ModelRequest { message: String },

    #[error("Language model returned an unusable response: {message}")]
    ModelResponse { message: String },

    #[error("Feedback does not match the rubric: {message}")]
    FeedbackSchema { message: String },

    // Storage errors
    #[error("Document {collection}/{id} not found")]
    DocumentNotFound { collection: String, id: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, PrepcallError>;
