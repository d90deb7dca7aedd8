use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    #[default]
    Inactive,
    Connecting,
    Active,
    Finished,
}

impl CallStatus {
    pub const ALL: [CallStatus; 4] = [
        CallStatus::Inactive,
        CallStatus::Connecting,
        CallStatus::Active,
        CallStatus::Finished,
    ];

    /// Whether `self -> next` is a legal edge.
    ///
    /// Forward edges advance one step at a time; any state may fall back to
    /// `Inactive`. `Finished` only leads anywhere through a fresh session.
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        use CallStatus::*;
        match (self, next) {
            (Inactive, Connecting) | (Connecting, Active) | (Active, Finished) => true,
            (from, Inactive) => from != Inactive,
            _ => false,
        }
    }

    /// Whether a call is in flight (the transport may still emit events).
    pub fn is_live(self) -> bool {
        matches!(self, CallStatus::Connecting | CallStatus::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Inactive => "INACTIVE",
            CallStatus::Connecting => "CONNECTING",
            CallStatus::Active => "ACTIVE",
            CallStatus::Finished => "FINISHED",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
