//! Async driver for a single call.
//!
//! The agent owns the [`CallSession`], the transport subscription, the
//! camera and the notifier. It is the only consumer of transport events,
//! environment signals and user actions, and handles them one at a time.

use crate::call::camera::{Camera, NoCamera};
use crate::call::error::{CallError, LogNotifier, Notifier};
use crate::call::network::EnvSignal;
use crate::call::session::{CallSession, Effect, SessionInput};
use crate::call::status::CallStatus;
use crate::config::Config;
use crate::defaults::CONTROL_CHANNEL_CAPACITY;
use crate::feedback::{FeedbackRequest, FeedbackService};
use crate::transcript::TranscriptEntry;
use crate::transport::{
    AssistantSpec, CallTarget, CallVariables, Subscription, Transport, TransportEvent,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Why the call is being placed.
#[derive(Debug, Clone, PartialEq)]
pub enum CallPurpose {
    /// Open-ended setup call that produces an interview definition.
    Generate { user_name: String, user_id: String },
    /// Structured interview over prepared questions, followed by feedback.
    Interview {
        interview_id: String,
        user_id: String,
        questions: Vec<String>,
        /// Existing feedback record to overwrite.
        feedback_id: Option<String>,
    },
}

impl CallPurpose {
    pub fn is_interview(&self) -> bool {
        matches!(self, CallPurpose::Interview { .. })
    }

    /// Pick the start target and template variables, or explain what is
    /// missing.
    pub fn resolve(
        &self,
        settings: &CallSettings,
    ) -> std::result::Result<(CallTarget, CallVariables), CallError> {
        match self {
            CallPurpose::Generate { user_name, user_id } => {
                let id = settings
                    .workflow_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| CallError::Configuration("workflow id is not set".into()))?;
                let mut variables = CallVariables::new();
                variables.insert("username".to_string(), user_name.clone());
                variables.insert("userid".to_string(), user_id.clone());
                Ok((
                    CallTarget::Workflow { id: id.to_string() },
                    variables,
                ))
            }
            CallPurpose::Interview { questions, .. } => {
                let persona = settings.interviewer.clone().ok_or_else(|| {
                    CallError::Configuration("interviewer persona is not set".into())
                })?;
                if questions.iter().all(|q| q.trim().is_empty()) {
                    return Err(CallError::Configuration(
                        "interview has no questions".into(),
                    ));
                }
                let mut variables = CallVariables::new();
                variables.insert("questions".to_string(), format_questions(questions));
                Ok((CallTarget::Assistant(persona), variables))
            }
        }
    }
}

/// Render questions as `- question` lines for the interviewer prompt.
pub fn format_questions(questions: &[String]) -> String {
    questions
        .iter()
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .map(|q| format!("- {}", q))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Start targets available to the agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSettings {
    pub workflow_id: Option<String>,
    pub interviewer: Option<AssistantSpec>,
    /// Give up on `Connecting` after this long. `None` waits forever.
    pub connect_timeout: Option<Duration>,
}

impl CallSettings {
    pub fn from_config(config: &Config) -> Self {
        let secs = config.call.connect_timeout_secs;
        Self {
            workflow_id: config.call.workflow_id.clone(),
            interviewer: Some(AssistantSpec::from(&config.interviewer)),
            connect_timeout: (secs > 0).then(|| Duration::from_secs(secs)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    EndCall,
    ToggleVideo,
}

/// Cloneable handle for sending user actions to a running agent.
#[derive(Debug, Clone)]
pub struct CallControl {
    tx: mpsc::Sender<UserAction>,
}

impl CallControl {
    /// Returns false once the agent is gone.
    pub async fn send(&self, action: UserAction) -> bool {
        self.tx.send(action).await.is_ok()
    }

    pub async fn end_call(&self) -> bool {
        self.send(UserAction::EndCall).await
    }

    pub async fn toggle_video(&self) -> bool {
        self.send(UserAction::ToggleVideo).await
    }
}

/// Where the host should go once the call is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Home,
    Feedback {
        interview_id: String,
        feedback_id: String,
    },
    /// Remain on the call view (the call reset instead of finishing).
    Stay,
}

impl Navigation {
    pub fn path(&self) -> Option<String> {
        match self {
            Navigation::Home => Some("/".to_string()),
            Navigation::Feedback { interview_id, .. } => {
                Some(format!("/interview/{}/feedback", interview_id))
            }
            Navigation::Stay => None,
        }
    }
}

/// Result of [`CallAgent::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    pub status: CallStatus,
    pub transcript: Vec<TranscriptEntry>,
    pub navigation: Navigation,
}

enum Wake {
    Transport(Option<TransportEvent>),
    Signal(EnvSignal),
    Action(UserAction),
    ConnectTimeout,
}

pub struct CallAgent {
    transport: Arc<dyn Transport>,
    feedback: Arc<dyn FeedbackService>,
    notifier: Arc<dyn Notifier>,
    camera: Box<dyn Camera>,
    purpose: CallPurpose,
    settings: CallSettings,
    session: CallSession,
    subscription: Option<Subscription>,
    connect_deadline: Option<Instant>,
    navigation: Option<Navigation>,
    actions_tx: mpsc::Sender<UserAction>,
    actions_rx: mpsc::Receiver<UserAction>,
    signals_tx: mpsc::Sender<EnvSignal>,
    signals_rx: mpsc::Receiver<EnvSignal>,
}

impl CallAgent {
    pub fn new(
        transport: Arc<dyn Transport>,
        feedback: Arc<dyn FeedbackService>,
        purpose: CallPurpose,
        settings: CallSettings,
    ) -> Self {
        let (actions_tx, actions_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (signals_tx, signals_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        Self {
            transport,
            feedback,
            notifier: Arc::new(LogNotifier),
            camera: Box::new(NoCamera),
            purpose,
            settings,
            session: CallSession::new(),
            subscription: None,
            connect_deadline: None,
            navigation: None,
            actions_tx,
            actions_rx,
            signals_tx,
            signals_rx,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_camera(mut self, camera: Box<dyn Camera>) -> Self {
        self.camera = camera;
        self
    }

    pub fn control(&self) -> CallControl {
        CallControl {
            tx: self.actions_tx.clone(),
        }
    }

    /// Channel for connectivity and visibility signals.
    pub fn signal_sender(&self) -> mpsc::Sender<EnvSignal> {
        self.signals_tx.clone()
    }

    pub fn status(&self) -> CallStatus {
        self.session.status()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.session.transcript()
    }

    pub fn is_speaking(&self) -> bool {
        self.session.is_speaking()
    }

    pub fn video_enabled(&self) -> bool {
        self.session.video_enabled()
    }

    pub fn purpose(&self) -> &CallPurpose {
        &self.purpose
    }

    /// Validate the target, subscribe to the transport and request a call.
    ///
    /// The session enters `Connecting` before the command is sent. Every
    /// error is also reported through the notifier.
    pub async fn start(&mut self) -> std::result::Result<(), CallError> {
        let (target, variables) = match self.purpose.resolve(&self.settings) {
            Ok(resolved) => resolved,
            Err(e) => {
                log::warn!("call not started: {}", e);
                self.notifier.notify(&e);
                return Err(e);
            }
        };

        if self.session.status() == CallStatus::Finished {
            self.session = CallSession::new();
            self.navigation = None;
        }
        if self.session.status() != CallStatus::Inactive {
            log::debug!("start ignored, call already {}", self.session.status());
            return Ok(());
        }

        self.subscription = Some(self.transport.subscribe());
        self.dispatch(SessionInput::Start).await;
        self.connect_deadline = self.settings.connect_timeout.map(|t| Instant::now() + t);
        log::info!(
            "starting call via {} ({} variables)",
            self.transport.name(),
            variables.len()
        );

        if let Err(e) = self.transport.start(&target, &variables).await {
            let message = e.to_string();
            log::error!("start command failed: {}", message);
            self.dispatch(SessionInput::StartFailed(message.clone()))
                .await;
            self.subscription = None;
            return Err(CallError::Transport(message));
        }
        Ok(())
    }

    /// Process inputs until the call finishes or resets.
    ///
    /// On `Finished` in interview purpose this submits exactly one feedback
    /// request. Events already delivered by the transport are handled
    /// before environment signals and user actions.
    pub async fn run(&mut self) -> CallOutcome {
        loop {
            match self.session.status() {
                CallStatus::Finished => return self.complete().await,
                CallStatus::Inactive => {
                    self.subscription = None;
                    return self.outcome(Navigation::Stay);
                }
                CallStatus::Connecting | CallStatus::Active => {}
            }

            match self.next_wake().await {
                Wake::Transport(Some(event)) => {
                    log::trace!("transport event {}", event.kind());
                    self.dispatch(SessionInput::Transport(event)).await;
                }
                Wake::Transport(None) => {
                    self.dispatch(SessionInput::Transport(TransportEvent::Error {
                        message: "transport event stream closed".to_string(),
                    }))
                    .await;
                }
                Wake::Signal(signal) => {
                    log::debug!("environment signal {:?}", signal);
                    self.dispatch(SessionInput::Environment(signal)).await;
                }
                Wake::Action(UserAction::EndCall) => self.end_call().await,
                Wake::Action(UserAction::ToggleVideo) => {
                    self.toggle_video();
                }
                Wake::ConnectTimeout => {
                    log::warn!("call did not connect in time");
                    self.dispatch(SessionInput::ConnectTimedOut).await;
                }
            }
        }
    }

    /// Apply transport events that were already delivered, without
    /// waiting. Returns how many were handled.
    ///
    /// Stops once the call is no longer live, leaving the rest for `run`.
    pub async fn poll_events(&mut self) -> usize {
        let mut handled = 0;
        while self.session.status().is_live()
            && let Some(event) = self.subscription.as_mut().and_then(|s| s.try_recv())
        {
            self.dispatch(SessionInput::Transport(event)).await;
            handled += 1;
        }
        handled
    }

    /// Hang up. While connecting this abandons the attempt.
    pub async fn end_call(&mut self) {
        self.dispatch(SessionInput::EndCall).await;
    }

    /// Flip the camera. Returns whether video is now on.
    pub fn toggle_video(&mut self) -> bool {
        if self.session.video_enabled() {
            self.camera.release();
            self.session.set_video(false);
            return false;
        }
        match self.camera.acquire() {
            Ok(()) => {
                self.session.set_video(true);
                true
            }
            Err(e) => {
                let error = CallError::MediaAccess(e.to_string());
                log::warn!("{}", error);
                self.notifier.notify(&error);
                false
            }
        }
    }

    /// Shut the agent down: stop a live call, release the camera and drop
    /// the subscription. No feedback is submitted.
    pub async fn teardown(mut self) -> CallStatus {
        self.dispatch(SessionInput::Teardown).await;
        self.subscription = None;
        self.session.status()
    }

    async fn next_wake(&mut self) -> Wake {
        let Some(subscription) = self.subscription.as_mut() else {
            return Wake::Transport(None);
        };
        let deadline = self.connect_deadline;

        tokio::select! {
            biased;
            event = subscription.recv() => Wake::Transport(event),
            Some(signal) = self.signals_rx.recv() => Wake::Signal(signal),
            Some(action) = self.actions_rx.recv() => Wake::Action(action),
            _ = sleep_until(deadline) => Wake::ConnectTimeout,
        }
    }

    async fn dispatch(&mut self, input: SessionInput) {
        let mut pending = VecDeque::from([input]);
        while let Some(input) = pending.pop_front() {
            for effect in self.session.apply(input) {
                match effect {
                    Effect::StopTransport => {
                        if let Err(e) = self.transport.stop().await {
                            pending.push_back(SessionInput::StopFailed(e.to_string()));
                        }
                    }
                    Effect::ReleaseCamera => self.camera.release(),
                    Effect::Notify(error) => self.notifier.notify(&error),
                }
            }
        }
        if self.session.status() != CallStatus::Connecting {
            self.connect_deadline = None;
        }
    }

    async fn complete(&mut self) -> CallOutcome {
        self.subscription = None;
        if let Some(navigation) = self.navigation.clone() {
            return self.outcome(navigation);
        }

        let navigation = match self.purpose.clone() {
            CallPurpose::Generate { .. } => Navigation::Home,
            CallPurpose::Interview {
                interview_id,
                user_id,
                feedback_id,
                ..
            } => {
                if self.session.claim_feedback() {
                    self.submit_feedback(interview_id, user_id, feedback_id)
                        .await
                } else {
                    Navigation::Home
                }
            }
        };
        self.navigation = Some(navigation.clone());
        self.outcome(navigation)
    }

    async fn submit_feedback(
        &mut self,
        interview_id: String,
        user_id: String,
        feedback_id: Option<String>,
    ) -> Navigation {
        let request = FeedbackRequest {
            interview_id: interview_id.clone(),
            user_id,
            transcript: self.session.transcript().to_vec(),
            feedback_id,
        };
        log::info!(
            "submitting {} transcript entries for interview {}",
            request.transcript.len(),
            interview_id
        );

        let response = self.feedback.create_feedback(request).await;
        match response.feedback_id {
            Some(feedback_id) if response.success => Navigation::Feedback {
                interview_id,
                feedback_id,
            },
            _ => {
                log::error!("feedback for interview {} was not saved", interview_id);
                self.notifier.notify(&CallError::FeedbackGeneration);
                Navigation::Home
            }
        }
    }

    fn outcome(&self, navigation: Navigation) -> CallOutcome {
        CallOutcome {
            status: self.session.status(),
            transcript: self.session.transcript().to_vec(),
            navigation,
        }
    }
}

impl Drop for CallAgent {
    fn drop(&mut self) {
        self.camera.release();
        if !self.session.status().is_live() {
            return;
        }
        // Best effort: the runtime may already be shutting down.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let transport = Arc::clone(&self.transport);
            handle.spawn(async move {
                if let Err(e) = transport.stop().await {
                    log::warn!("stop on drop failed: {}", e);
                }
            });
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::camera::MockCamera;
    use crate::call::error::CollectingNotifier;
    use crate::feedback::MockFeedbackService;
    use crate::transcript::Role;
    use crate::transport::{Message, ScriptedTransport};

    fn settings() -> CallSettings {
        CallSettings::from_config(&Config::default())
    }

    fn generate() -> CallPurpose {
        CallPurpose::Generate {
            user_name: "Ada".to_string(),
            user_id: "u1".to_string(),
        }
    }

    fn interview() -> CallPurpose {
        CallPurpose::Interview {
            interview_id: "i1".to_string(),
            user_id: "u1".to_string(),
            questions: vec!["What is ownership?".to_string(), "Explain Rc".to_string()],
            feedback_id: None,
        }
    }

    fn final_msg(role: Role, text: &str) -> TransportEvent {
        TransportEvent::Message(Message::final_transcript(role, text))
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        feedback: Arc<MockFeedbackService>,
        notifier: Arc<CollectingNotifier>,
        camera: MockCamera,
        agent: CallAgent,
    }

    fn harness(transport: ScriptedTransport, purpose: CallPurpose, settings: CallSettings) -> Harness {
        let transport = Arc::new(transport);
        let feedback = Arc::new(MockFeedbackService::new().with_feedback_id("f1"));
        let notifier = Arc::new(CollectingNotifier::new());
        let camera = MockCamera::new();
        let agent = CallAgent::new(transport.clone(), feedback.clone(), purpose, settings)
            .with_notifier(notifier.clone())
            .with_camera(Box::new(camera.clone()));
        Harness {
            transport,
            feedback,
            notifier,
            camera,
            agent,
        }
    }

    #[test]
    fn test_format_questions() {
        let questions = vec![
            "First?".to_string(),
            "  ".to_string(),
            " Second? ".to_string(),
        ];
        assert_eq!(format_questions(&questions), "- First?\n- Second?");
    }

    #[test]
    fn test_resolve_generate_requires_workflow() {
        let err = generate().resolve(&CallSettings::default()).unwrap_err();
        assert!(matches!(err, CallError::Configuration(_)));

        let settings = CallSettings {
            workflow_id: Some("  ".to_string()),
            ..CallSettings::default()
        };
        assert!(generate().resolve(&settings).is_err());

        let settings = CallSettings {
            workflow_id: Some("W1".to_string()),
            ..CallSettings::default()
        };
        let (target, variables) = generate().resolve(&settings).unwrap();
        assert_eq!(
            target,
            CallTarget::Workflow {
                id: "W1".to_string()
            }
        );
        assert_eq!(variables.get("username").map(String::as_str), Some("Ada"));
        assert_eq!(variables.get("userid").map(String::as_str), Some("u1"));
    }

    #[test]
    fn test_resolve_interview_requires_persona_and_questions() {
        assert!(interview().resolve(&CallSettings::default()).is_err());

        let empty = CallPurpose::Interview {
            interview_id: "i1".to_string(),
            user_id: "u1".to_string(),
            questions: vec![],
            feedback_id: None,
        };
        assert!(matches!(
            empty.resolve(&settings()),
            Err(CallError::Configuration(_))
        ));

        let (target, variables) = interview().resolve(&settings()).unwrap();
        assert!(matches!(target, CallTarget::Assistant(_)));
        assert_eq!(
            variables.get("questions").map(String::as_str),
            Some("- What is ownership?\n- Explain Rc")
        );
    }

    #[test]
    fn test_settings_connect_timeout_zero_disables() {
        let mut config = Config::default();
        assert_eq!(
            CallSettings::from_config(&config).connect_timeout,
            Some(Duration::from_secs(30))
        );
        config.call.connect_timeout_secs = 0;
        assert_eq!(CallSettings::from_config(&config).connect_timeout, None);
    }

    #[test]
    fn test_navigation_paths() {
        assert_eq!(Navigation::Home.path().as_deref(), Some("/"));
        assert_eq!(
            Navigation::Feedback {
                interview_id: "i1".to_string(),
                feedback_id: "f1".to_string(),
            }
            .path()
            .as_deref(),
            Some("/interview/i1/feedback")
        );
        assert_eq!(Navigation::Stay.path(), None);
    }

    #[tokio::test]
    async fn test_start_without_target_notifies_and_stays_inactive() {
        let mut h = harness(ScriptedTransport::new(), generate(), CallSettings::default());

        let err = h.agent.start().await.unwrap_err();

        assert!(matches!(err, CallError::Configuration(_)));
        assert_eq!(h.agent.status(), CallStatus::Inactive);
        assert!(h.transport.starts().is_empty());
        assert_eq!(h.transport.subscriber_count(), 0);
        assert_eq!(h.notifier.notices(), vec![err]);
    }

    #[tokio::test]
    async fn test_start_failure_resets_and_unsubscribes() {
        let mut h = harness(
            ScriptedTransport::new().with_start_failure("no mic"),
            interview(),
            settings(),
        );

        let err = h.agent.start().await.unwrap_err();

        assert!(matches!(err, CallError::Transport(_)));
        assert_eq!(h.agent.status(), CallStatus::Inactive);
        assert_eq!(h.transport.subscriber_count(), 0);
        assert_eq!(h.notifier.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_interview_call_sends_persona_and_questions() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();

        let starts = h.transport.starts();
        assert_eq!(starts.len(), 1);
        assert!(matches!(starts[0].0, CallTarget::Assistant(_)));
        assert!(starts[0].1["questions"].starts_with("- What is ownership?"));
        assert_eq!(h.transport.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_end_call_action_finishes_and_submits_feedback() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();
        h.transport.emit(final_msg(Role::Assistant, "Tell me about Rust."));
        h.transport.emit(final_msg(Role::User, "It is safe."));
        h.agent.control().end_call().await;

        let outcome = h.agent.run().await;

        assert_eq!(outcome.status, CallStatus::Finished);
        assert_eq!(outcome.transcript.len(), 2);
        assert_eq!(h.transport.stop_count(), 1);
        assert_eq!(h.feedback.requests().len(), 1);
        assert_eq!(
            outcome.navigation,
            Navigation::Feedback {
                interview_id: "i1".to_string(),
                feedback_id: "f1".to_string(),
            }
        );
        assert_eq!(h.transport.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_run_twice_submits_feedback_once() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();
        h.transport.emit(TransportEvent::CallEnd);

        let first = h.agent.run().await;
        let second = h.agent.run().await;

        assert_eq!(first, second);
        assert_eq!(h.feedback.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_feedback_failure_navigates_home() {
        let transport = Arc::new(ScriptedTransport::new().acknowledging());
        let feedback = Arc::new(MockFeedbackService::new().failing());
        let notifier = Arc::new(CollectingNotifier::new());
        let mut agent = CallAgent::new(transport.clone(), feedback.clone(), interview(), settings())
            .with_notifier(notifier.clone());

        agent.start().await.unwrap();
        transport.emit(TransportEvent::CallEnd);
        let outcome = agent.run().await;

        assert_eq!(outcome.navigation, Navigation::Home);
        assert_eq!(feedback.requests().len(), 1);
        assert_eq!(notifier.notices(), vec![CallError::FeedbackGeneration]);
    }

    #[tokio::test]
    async fn test_stop_failure_forces_inactive() {
        let mut h = harness(
            ScriptedTransport::new()
                .acknowledging()
                .with_stop_failure("socket closed"),
            interview(),
            settings(),
        );
        h.agent.start().await.unwrap();
        h.agent.control().end_call().await;

        let outcome = h.agent.run().await;

        assert_eq!(outcome.status, CallStatus::Inactive);
        assert_eq!(outcome.navigation, Navigation::Stay);
        assert!(h.feedback.requests().is_empty());
    }

    #[tokio::test]
    async fn test_connect_timeout_resets() {
        let settings = CallSettings {
            connect_timeout: Some(Duration::from_millis(20)),
            ..settings()
        };
        let mut h = harness(ScriptedTransport::new(), interview(), settings);
        h.agent.start().await.unwrap();
        assert_eq!(h.agent.status(), CallStatus::Connecting);

        let outcome = tokio::time::timeout(Duration::from_secs(5), h.agent.run())
            .await
            .unwrap();

        assert_eq!(outcome.status, CallStatus::Inactive);
        assert_eq!(h.transport.stop_count(), 1);
        assert!(matches!(
            h.notifier.notices().as_slice(),
            [CallError::Transport(_)]
        ));
    }

    #[tokio::test]
    async fn test_toggle_video() {
        let mut h = harness(ScriptedTransport::new(), interview(), settings());
        assert!(h.agent.toggle_video());
        assert!(h.camera.is_active());
        assert!(!h.agent.toggle_video());
        assert!(!h.camera.is_active());
        assert_eq!(h.camera.releases(), 1);
    }

    #[tokio::test]
    async fn test_toggle_video_denied() {
        let notifier = Arc::new(CollectingNotifier::new());
        let mut agent = CallAgent::new(
            Arc::new(ScriptedTransport::new()),
            Arc::new(MockFeedbackService::new()),
            interview(),
            settings(),
        )
        .with_notifier(notifier.clone())
        .with_camera(Box::new(MockCamera::denied()));

        assert!(!agent.toggle_video());
        assert!(!agent.video_enabled());
        assert!(matches!(
            notifier.notices().as_slice(),
            [CallError::MediaAccess(_)]
        ));
    }

    #[tokio::test]
    async fn test_poll_events_applies_delivered_events() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();
        h.transport.emit(final_msg(Role::User, "hi"));

        assert_eq!(h.agent.poll_events().await, 2);
        assert_eq!(h.agent.status(), CallStatus::Active);
        assert_eq!(h.agent.transcript().len(), 1);
        assert_eq!(h.agent.poll_events().await, 0);
    }

    #[tokio::test]
    async fn test_poll_events_stops_at_finish() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();
        h.transport.emit(final_msg(Role::User, "Done."));
        h.transport.emit(TransportEvent::CallEnd);
        h.transport.emit(TransportEvent::Error {
            message: "late".to_string(),
        });

        assert_eq!(h.agent.poll_events().await, 3);
        assert_eq!(h.agent.status(), CallStatus::Finished);

        let outcome = h.agent.run().await;

        assert_eq!(outcome.status, CallStatus::Finished);
        assert_eq!(h.feedback.requests().len(), 1);
        assert_eq!(
            outcome.navigation,
            Navigation::Feedback {
                interview_id: "i1".to_string(),
                feedback_id: "f1".to_string(),
            }
        );
        assert!(h.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_while_active_skips_feedback() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), interview(), settings());
        h.agent.start().await.unwrap();
        h.agent.poll_events().await;
        assert!(h.agent.toggle_video());

        let status = h.agent.teardown().await;

        assert_eq!(status, CallStatus::Finished);
        assert_eq!(h.transport.stop_count(), 1);
        assert!(h.feedback.requests().is_empty());
        assert!(!h.camera.is_active());
        assert_eq!(h.transport.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_teardown_while_connecting_resets() {
        let mut h = harness(ScriptedTransport::new(), interview(), settings());
        h.agent.start().await.unwrap();

        let status = h.agent.teardown().await;

        assert_eq!(status, CallStatus::Inactive);
        assert_eq!(h.transport.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_after_finish_uses_fresh_session() {
        let mut h = harness(ScriptedTransport::new().acknowledging(), generate(), CallSettings {
            workflow_id: Some("W1".to_string()),
            ..CallSettings::default()
        });
        h.agent.start().await.unwrap();
        h.transport.emit(final_msg(Role::User, "first"));
        h.transport.emit(TransportEvent::CallEnd);
        let first = h.agent.run().await;
        assert_eq!(first.transcript.len(), 1);

        h.agent.start().await.unwrap();
        assert_eq!(h.agent.status(), CallStatus::Connecting);
        assert!(h.agent.transcript().is_empty());
        assert_eq!(h.transport.starts().len(), 2);
    }
}
