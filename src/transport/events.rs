//! JSON event protocol emitted by the voice transport.
//!
//! One event per JSON object, tagged by `event`. Message events carry the
//! transport's own `type` tag flattened into the same object:
//!
//! ```json
//! {"event":"message","type":"transcript","role":"user","transcriptType":"final","transcript":"hi"}
//! ```

use crate::error::{PrepcallError, Result};
use crate::transcript::{Role, TranscriptEntry};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Whether a transcript fragment is an interim guess or settled text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// Payload of a `message` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Message {
    #[serde(rename_all = "camelCase")]
    Transcript {
        role: Role,
        transcript_type: TranscriptType,
        transcript: String,
    },
    #[serde(rename_all = "camelCase")]
    FunctionCall { function_call: serde_json::Value },
    #[serde(rename_all = "camelCase")]
    FunctionCallResult {
        function_call_result: serde_json::Value,
    },
    /// Any other message type the runtime sends (status updates, etc.)
    #[serde(other)]
    Other,
}

impl Message {
    /// Creates a final transcript message.
    pub fn final_transcript(role: Role, text: impl Into<String>) -> Self {
        Message::Transcript {
            role,
            transcript_type: TranscriptType::Final,
            transcript: text.into(),
        }
    }

    /// Creates a partial (interim) transcript message.
    pub fn partial_transcript(role: Role, text: impl Into<String>) -> Self {
        Message::Transcript {
            role,
            transcript_type: TranscriptType::Partial,
            transcript: text.into(),
        }
    }

    /// The transcript entry this message contributes, if it is a final transcript.
    pub fn final_entry(&self) -> Option<TranscriptEntry> {
        match self {
            Message::Transcript {
                role,
                transcript_type: TranscriptType::Final,
                transcript,
            } => Some(TranscriptEntry::new(*role, transcript.clone())),
            _ => None,
        }
    }
}

/// Events raised by a transport session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum TransportEvent {
    CallStart,
    CallEnd,
    Message(Message),
    SpeechStart,
    SpeechEnd,
    Error { message: String },
}

impl TransportEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportEvent::CallStart => "call-start",
            TransportEvent::CallEnd => "call-end",
            TransportEvent::Message(_) => "message",
            TransportEvent::SpeechStart => "speech-start",
            TransportEvent::SpeechEnd => "speech-end",
            TransportEvent::Error { .. } => "error",
        }
    }

    /// Serialize event to JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Parse a JSON-lines event log. Blank lines and `#` comments are skipped.
pub fn parse_event_log<R: BufRead>(reader: R) -> Result<Vec<TransportEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event =
            TransportEvent::from_json(trimmed).map_err(|e| PrepcallError::TransportEvents {
                message: format!("line {}: {}", index + 1, e),
            })?;
        events.push(event);
    }
    Ok(events)
}
