//! In-process transport driven by the caller, for tests and demos.

use crate::error::{PrepcallError, Result};
use crate::transport::bus::{EventBus, Subscription};
use crate::transport::events::TransportEvent;
use crate::transport::{CallTarget, CallVariables, Transport};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct ScriptLog {
    starts: Vec<(CallTarget, CallVariables)>,
    stops: usize,
}

/// Transport whose events are pushed by hand with [`ScriptedTransport::emit`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    bus: EventBus,
    log: Mutex<ScriptLog>,
    start_failure: Option<String>,
    stop_failure: Option<String>,
    acknowledge_start: bool,
    end_on_stop: bool,
}

impl ScriptedTransport {
    /// Create a transport that accepts commands and emits nothing by itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `call-start` as soon as a start command is accepted.
    pub fn acknowledging(mut self) -> Self {
        self.acknowledge_start = true;
        self
    }

    /// Emit `call-end` when a stop command is accepted.
    pub fn ending_on_stop(mut self) -> Self {
        self.end_on_stop = true;
        self
    }

    /// Configure start commands to fail
    pub fn with_start_failure(mut self, message: &str) -> Self {
        self.start_failure = Some(message.to_string());
        self
    }

    /// Configure stop commands to fail
    pub fn with_stop_failure(mut self, message: &str) -> Self {
        self.stop_failure = Some(message.to_string());
        self
    }

    /// Push an event to every subscriber.
    pub fn emit(&self, event: TransportEvent) -> usize {
        self.bus.publish(event)
    }

    /// Start commands received so far.
    pub fn starts(&self) -> Vec<(CallTarget, CallVariables)> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .starts
            .clone()
    }

    /// Number of stop commands received (including failed ones).
    pub fn stop_count(&self) -> usize {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).stops
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    async fn start(&self, target: &CallTarget, variables: &CallVariables) -> Result<()> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .starts
            .push((target.clone(), variables.clone()));

        if let Some(message) = &self.start_failure {
            return Err(PrepcallError::TransportCommand {
                command: "start".to_string(),
                message: message.clone(),
            });
        }
        if self.acknowledge_start {
            self.bus.publish(TransportEvent::CallStart);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).stops += 1;

        if let Some(message) = &self.stop_failure {
            return Err(PrepcallError::TransportCommand {
                command: "stop".to_string(),
                message: message.clone(),
            });
        }
        if self.end_on_stop {
            self.bus.publish(TransportEvent::CallEnd);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
