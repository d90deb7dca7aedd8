//! prepcall - Voice mock interviews with scored feedback
//!
//! Drives a voice call through a third-party transport, keeps the
//! transcript, and turns finished interviews into rubric-scored feedback.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod call;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod feedback;
#[cfg(feature = "cli")]
pub mod output;
pub mod store;
pub mod transcript;
pub mod transport;

// Composition root
#[cfg(feature = "cli")]
pub mod app;

// Call lifecycle
pub use call::{CallAgent, CallOutcome, CallPurpose, CallSettings, CallStatus, Navigation};

// Collaborator seams
pub use feedback::{FeedbackService, LanguageModel};
pub use store::DocumentStore;
pub use transport::{Transport, TransportEvent};

// Error handling
pub use error::{PrepcallError, Result};

// Config
pub use config::Config;

pub use transcript::{Role, TranscriptEntry};

/// Crate version, for logs and `--version`.
pub fn version_string() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
