//! Voice transport session boundary.
//!
//! The runtime that actually carries audio is an external collaborator. The
//! call agent only sees the [`Transport`] trait: start/stop commands plus a
//! scoped event subscription.

pub mod bus;
pub mod events;
pub mod replay;
pub mod scripted;

pub use bus::{EventBus, Subscription};
pub use events::{Message, TranscriptType, TransportEvent, parse_event_log};
pub use replay::ReplayTransport;
pub use scripted::ScriptedTransport;

use crate::config::InterviewerConfig;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Template variables substituted by the runtime (e.g. `{{questions}}`).
pub type CallVariables = BTreeMap<String, String>;

/// Assistant definition sent inline when starting an interview call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSpec {
    pub name: String,
    pub first_message: String,
    pub system_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl From<&InterviewerConfig> for AssistantSpec {
    fn from(config: &InterviewerConfig) -> Self {
        Self {
            name: config.name.clone(),
            first_message: config.first_message.clone(),
            system_prompt: config.system_prompt.clone(),
            voice: config.voice.clone(),
            model: config.model.clone(),
        }
    }
}

/// What a call is started against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    /// Predefined runtime workflow (generation calls).
    Workflow { id: String },
    /// Inline interviewer persona (interview calls).
    Assistant(AssistantSpec),
}

/// A voice call session provided by a third-party runtime.
///
/// Implementations own their event source; callers hold a [`Subscription`]
/// for exactly as long as they want events.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Register for events. Dropping the subscription unsubscribes.
    fn subscribe(&self) -> Subscription;

    /// Ask the runtime to start a call. Success means the request was
    /// accepted, not that the call is live; `call-start` signals that.
    async fn start(&self, target: &CallTarget, variables: &CallVariables) -> Result<()>;

    /// Ask the runtime to hang up.
    async fn stop(&self) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "transport"
    }
}
