//! Call lifecycle: the pure session state machine and its async driver.

pub mod agent;
pub mod camera;
pub mod error;
pub mod network;
pub mod session;
pub mod status;

pub use agent::{
    CallAgent, CallControl, CallOutcome, CallPurpose, CallSettings, Navigation, UserAction,
    format_questions,
};
pub use camera::{Camera, DeviceCamera, MockCamera, NoCamera};
pub use error::{CallError, CollectingNotifier, LogNotifier, Notifier};
pub use network::{ConnectivityWatcher, EnvSignal, LinkState, WatcherHandle};
pub use session::{CallSession, Effect, SessionInput};
pub use status::CallStatus;
