//! Transport that replays a recorded event log.
//!
//! Each accepted start plays the log from the top, one event per `pace`
//! interval. A stop aborts playback and, if the log had not already ended the
//! call, emits `call-end` the way a live runtime does after hanging up.

use crate::error::{PrepcallError, Result};
use crate::transport::bus::{EventBus, Subscription};
use crate::transport::events::{TransportEvent, parse_event_log};
use crate::transport::{CallTarget, CallVariables, Transport};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct ReplayTransport {
    bus: EventBus,
    events: Arc<Vec<TransportEvent>>,
    pace: Duration,
    player: Mutex<Option<JoinHandle<()>>>,
    ended: Arc<AtomicBool>,
}

impl ReplayTransport {
    pub fn new(events: Vec<TransportEvent>, pace: Duration) -> Self {
        Self {
            bus: EventBus::new(),
            events: Arc::new(events),
            pace,
            player: Mutex::new(None),
            ended: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load a JSON-lines event log from disk.
    pub fn from_path(path: &Path, pace: Duration) -> Result<Self> {
        let file = File::open(path).map_err(|e| PrepcallError::TransportEvents {
            message: format!("cannot open {}: {}", path.display(), e),
        })?;
        let events = parse_event_log(BufReader::new(file))?;
        log::debug!(
            "loaded {} transport events from {}",
            events.len(),
            path.display()
        );
        Ok(Self::new(events, pace))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn take_player(&self) -> Option<JoinHandle<()>> {
        self.player.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

#[async_trait::async_trait]
impl Transport for ReplayTransport {
    fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    async fn start(&self, target: &CallTarget, variables: &CallVariables) -> Result<()> {
        if let Some(previous) = self.take_player() {
            previous.abort();
        }
        log::info!(
            "replaying {} events for {:?} ({} variables)",
            self.events.len(),
            target,
            variables.len()
        );

        self.ended.store(false, Ordering::SeqCst);
        let bus = self.bus.clone();
        let events = Arc::clone(&self.events);
        let ended = Arc::clone(&self.ended);
        let pace = self.pace;

        let handle = tokio::spawn(async move {
            for event in events.iter() {
                if !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
                if matches!(event, TransportEvent::CallEnd) && ended.swap(true, Ordering::SeqCst) {
                    continue;
                }
                bus.publish(event.clone());
            }
            // A log that stops short still hangs up.
            if !ended.swap(true, Ordering::SeqCst) {
                bus.publish(TransportEvent::CallEnd);
            }
        });
        *self.player.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(player) = self.take_player() else {
            return Err(PrepcallError::TransportCommand {
                command: "stop".to_string(),
                message: "no call in progress".to_string(),
            });
        };
        player.abort();
        if !self.ended.swap(true, Ordering::SeqCst) {
            self.bus.publish(TransportEvent::CallEnd);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

impl Drop for ReplayTransport {
    fn drop(&mut self) {
        if let Some(player) = self.take_player() {
            player.abort();
        }
    }
}
