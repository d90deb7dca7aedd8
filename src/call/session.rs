//! Pure call state machine.
//!
//! [`CallSession::apply`] consumes one input at a time and returns the side
//! effects the owner must carry out. It never performs I/O, so every
//! sequence of inputs can be checked without a runtime.

use crate::call::error::CallError;
use crate::call::network::EnvSignal;
use crate::call::status::CallStatus;
use crate::transcript::TranscriptEntry;
use crate::transport::events::TransportEvent;

/// Everything that can move a call forward.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    /// User asked to start; the target was already validated.
    Start,
    /// The start command was rejected by the transport.
    StartFailed(String),
    /// `Connecting` outlived its deadline.
    ConnectTimedOut,
    Transport(TransportEvent),
    Environment(EnvSignal),
    /// User pressed "end call".
    EndCall,
    /// The stop command failed after a disconnect.
    StopFailed(String),
    /// Host is going away.
    Teardown,
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StopTransport,
    ReleaseCamera,
    Notify(CallError),
}

#[derive(Debug, Clone, Default)]
pub struct CallSession {
    status: CallStatus,
    transcript: Vec<TranscriptEntry>,
    speaking: bool,
    video_enabled: bool,
    feedback_requested: bool,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Assistant voice activity. Always false outside `Active`.
    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    /// Record the camera state after the owner acquired or released it.
    pub fn set_video(&mut self, enabled: bool) {
        self.video_enabled = enabled;
    }

    /// Latest finalized utterance, for display.
    pub fn last_message(&self) -> Option<&str> {
        self.transcript.last().map(|entry| entry.content.as_str())
    }

    /// Claim the one feedback submission this session allows.
    ///
    /// Returns true exactly once, and only after the call finished.
    pub fn claim_feedback(&mut self) -> bool {
        if self.status != CallStatus::Finished || self.feedback_requested {
            return false;
        }
        self.feedback_requested = true;
        true
    }

    /// Apply one input and return the effects to execute, in order.
    pub fn apply(&mut self, input: SessionInput) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            SessionInput::Start => {
                if self.status == CallStatus::Inactive {
                    self.advance(CallStatus::Connecting);
                } else {
                    log::debug!("start ignored while {}", self.status);
                }
            }
            SessionInput::StartFailed(message) => {
                if self.status == CallStatus::Connecting {
                    self.reset();
                    effects.push(Effect::Notify(CallError::Transport(message)));
                }
            }
            SessionInput::ConnectTimedOut => {
                if self.status == CallStatus::Connecting {
                    self.reset();
                    effects.push(Effect::StopTransport);
                    effects.push(Effect::Notify(CallError::Transport(
                        "timed out waiting for the call to connect".to_string(),
                    )));
                }
            }
            SessionInput::Transport(event) => self.on_transport(event, &mut effects),
            SessionInput::Environment(signal) => match signal {
                EnvSignal::Offline if self.status == CallStatus::Active => {
                    self.finish(&mut effects);
                    effects.push(Effect::StopTransport);
                    effects.push(Effect::Notify(CallError::ConnectivityLoss));
                }
                EnvSignal::Hidden if self.status == CallStatus::Active => {
                    self.finish(&mut effects);
                    effects.push(Effect::StopTransport);
                }
                _ => {}
            },
            SessionInput::EndCall => match self.status {
                CallStatus::Active => {
                    self.finish(&mut effects);
                    effects.push(Effect::StopTransport);
                }
                CallStatus::Connecting => {
                    self.reset();
                    effects.push(Effect::StopTransport);
                }
                _ => log::debug!("end call ignored while {}", self.status),
            },
            SessionInput::StopFailed(message) => {
                log::warn!("stop command failed: {}; forcing reset", message);
                if self.status != CallStatus::Inactive {
                    self.reset();
                }
            }
            SessionInput::Teardown => {
                match self.status {
                    CallStatus::Active => {
                        self.finish(&mut effects);
                        effects.push(Effect::StopTransport);
                    }
                    CallStatus::Connecting => {
                        self.reset();
                        effects.push(Effect::StopTransport);
                    }
                    _ => {}
                }
                if self.video_enabled {
                    self.video_enabled = false;
                    effects.push(Effect::ReleaseCamera);
                }
            }
        }
        effects
    }

    fn on_transport(&mut self, event: TransportEvent, effects: &mut Vec<Effect>) {
        match event {
            TransportEvent::CallStart => {
                if self.status == CallStatus::Connecting {
                    self.advance(CallStatus::Active);
                } else {
                    log::debug!("call-start ignored while {}", self.status);
                }
            }
            TransportEvent::CallEnd => match self.status {
                CallStatus::Active => self.finish(effects),
                CallStatus::Connecting => {
                    self.reset();
                    effects.push(Effect::Notify(CallError::Transport(
                        "call ended before it connected".to_string(),
                    )));
                }
                _ => log::debug!("call-end ignored while {}", self.status),
            },
            TransportEvent::Message(message) => {
                if self.status != CallStatus::Active {
                    return;
                }
                if let Some(entry) = message.final_entry() {
                    log::debug!("{}: {}", entry.role, entry.content);
                    self.transcript.push(entry);
                }
            }
            TransportEvent::SpeechStart => {
                if self.status == CallStatus::Active {
                    self.speaking = true;
                }
            }
            TransportEvent::SpeechEnd => self.speaking = false,
            TransportEvent::Error { message } => {
                if self.status != CallStatus::Inactive {
                    self.reset();
                }
                effects.push(Effect::Notify(CallError::Transport(message)));
            }
        }
    }

    fn finish(&mut self, effects: &mut Vec<Effect>) {
        self.advance(CallStatus::Finished);
        if self.video_enabled {
            self.video_enabled = false;
            effects.push(Effect::ReleaseCamera);
        }
    }

    fn reset(&mut self) {
        self.advance(CallStatus::Inactive);
    }

    fn advance(&mut self, next: CallStatus) -> bool {
        if !self.status.can_transition_to(next) {
            log::error!("illegal call transition {} -> {} ignored", self.status, next);
            return false;
        }
        log::info!("call status {} -> {}", self.status, next);
        self.status = next;
        if next != CallStatus::Active {
            self.speaking = false;
        }
        true
    }
}
