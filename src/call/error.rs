//! Call-level failures and how they reach the user.
//!
//! None of these propagate past the call agent. Each one becomes a notice
//! (via [`Notifier`]) or a fallback navigation.

use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Required start target missing.
    #[error("Call is not configured: {0}")]
    Configuration(String),

    /// Error raised by the transport session or one of its commands.
    #[error("The call encountered an error: {0}")]
    Transport(String),

    /// Network went away while the call was active.
    #[error("Lost connection. Please try starting the interview again.")]
    ConnectivityLoss,

    /// Feedback could not be produced or stored.
    #[error("Feedback could not be generated")]
    FeedbackGeneration,

    /// Camera could not be opened.
    #[error("Could not access camera: {0}")]
    MediaAccess(String),
}

/// Trait for surfacing call errors to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, error: &CallError);
}

/// Notifier that only writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, error: &CallError) {
        log::warn!("{}", error);
    }
}

/// Notifier that keeps every notice, for tests and headless callers.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<CallError>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<CallError> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, error: &CallError) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(error.clone());
    }
}
