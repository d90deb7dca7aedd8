//! End-to-end call scenarios against in-process collaborators.

use prepcall::call::{
    CallAgent, CallError, CallPurpose, CallSettings, Camera, CollectingNotifier, EnvSignal,
    MockCamera, Navigation,
};
use prepcall::config::Config;
use prepcall::defaults::FEEDBACK_COLLECTION;
use prepcall::feedback::{FeedbackPipeline, MockFeedbackService, MockLanguageModel};
use prepcall::store::{DocumentStore, MemoryStore, get_feedback_by_id};
use prepcall::transport::{CallTarget, Message, ReplayTransport, ScriptedTransport};
use prepcall::{CallStatus, Role, TranscriptEntry, TransportEvent};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn final_msg(role: Role, text: &str) -> TransportEvent {
    TransportEvent::Message(Message::final_transcript(role, text))
}

fn workflow_settings() -> CallSettings {
    CallSettings {
        workflow_id: Some("W1".to_string()),
        ..CallSettings::from_config(&Config::default())
    }
}

fn generate() -> CallPurpose {
    CallPurpose::Generate {
        user_name: "Ada".to_string(),
        user_id: "u1".to_string(),
    }
}

fn interview(feedback_id: Option<&str>) -> CallPurpose {
    CallPurpose::Interview {
        interview_id: "i1".to_string(),
        user_id: "u1".to_string(),
        questions: vec!["Describe a hard bug you fixed.".to_string()],
        feedback_id: feedback_id.map(str::to_string),
    }
}

#[tokio::test]
async fn generation_call_keeps_transcript_without_feedback() {
    let transport = Arc::new(ScriptedTransport::new());
    let feedback = Arc::new(MockFeedbackService::new());
    let mut agent = CallAgent::new(
        transport.clone(),
        feedback.clone(),
        generate(),
        workflow_settings(),
    );

    agent.start().await.unwrap();
    assert_eq!(
        transport.starts()[0].0,
        CallTarget::Workflow {
            id: "W1".to_string()
        }
    );
    transport.emit(TransportEvent::CallStart);
    transport.emit(final_msg(Role::User, "hi"));
    transport.emit(final_msg(Role::Assistant, "hello"));
    transport.emit(TransportEvent::CallEnd);

    let outcome = agent.run().await;

    assert_eq!(outcome.status, CallStatus::Finished);
    assert_eq!(
        outcome.transcript,
        vec![
            TranscriptEntry::new(Role::User, "hi"),
            TranscriptEntry::new(Role::Assistant, "hello"),
        ]
    );
    assert_eq!(outcome.navigation, Navigation::Home);
    assert!(feedback.requests().is_empty());
    assert_eq!(transport.subscriber_count(), 0);
}

#[tokio::test]
async fn interview_call_requests_feedback_once() {
    let transport = Arc::new(ScriptedTransport::new().acknowledging());
    let feedback = Arc::new(MockFeedbackService::new().with_feedback_id("f1"));
    let mut agent = CallAgent::new(
        transport.clone(),
        feedback.clone(),
        interview(None),
        workflow_settings(),
    );

    agent.start().await.unwrap();
    transport.emit(final_msg(Role::User, "I bisected it."));
    transport.emit(TransportEvent::CallEnd);

    let outcome = agent.run().await;

    let requests = feedback.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].interview_id, "i1");
    assert_eq!(
        requests[0].transcript,
        vec![TranscriptEntry::new(Role::User, "I bisected it.")]
    );
    assert_eq!(
        outcome.navigation,
        Navigation::Feedback {
            interview_id: "i1".to_string(),
            feedback_id: "f1".to_string(),
        }
    );
    assert_eq!(
        outcome.navigation.path().as_deref(),
        Some("/interview/i1/feedback")
    );
}

#[tokio::test]
async fn transport_error_resets_without_feedback() {
    let transport = Arc::new(ScriptedTransport::new().acknowledging());
    let feedback = Arc::new(MockFeedbackService::new());
    let notifier = Arc::new(CollectingNotifier::new());
    let mut agent = CallAgent::new(
        transport.clone(),
        feedback.clone(),
        interview(None),
        workflow_settings(),
    )
    .with_notifier(notifier.clone());

    agent.start().await.unwrap();
    transport.emit(final_msg(Role::User, "Well,"));
    transport.emit(TransportEvent::Error {
        message: "media server gone".to_string(),
    });

    let outcome = agent.run().await;

    assert_eq!(outcome.status, CallStatus::Inactive);
    assert_eq!(outcome.navigation, Navigation::Stay);
    assert!(feedback.requests().is_empty());
    assert!(matches!(
        notifier.notices().as_slice(),
        [CallError::Transport(message)] if message.contains("media server gone")
    ));
    assert_eq!(transport.subscriber_count(), 0);
}

#[tokio::test]
async fn going_offline_forces_disconnect_and_releases_video() {
    let transport = Arc::new(ScriptedTransport::new().acknowledging());
    let notifier = Arc::new(CollectingNotifier::new());
    let camera = MockCamera::new();
    let mut agent = CallAgent::new(
        transport.clone(),
        Arc::new(MockFeedbackService::new()),
        generate(),
        workflow_settings(),
    )
    .with_notifier(notifier.clone())
    .with_camera(Box::new(camera.clone()));

    agent.start().await.unwrap();
    assert!(agent.toggle_video());
    assert!(camera.is_active());
    agent.signal_sender().send(EnvSignal::Offline).await.unwrap();

    let outcome = agent.run().await;

    assert_eq!(outcome.status, CallStatus::Finished);
    assert!(!agent.video_enabled());
    assert!(!camera.is_active());
    assert_eq!(camera.releases(), 1);
    assert_eq!(transport.stop_count(), 1);
    assert_eq!(notifier.notices(), vec![CallError::ConnectivityLoss]);
}

#[tokio::test]
async fn supplied_feedback_id_is_overwritten_in_place() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(FEEDBACK_COLLECTION, "f1", json!({"interviewId": "i1", "totalScore": 10}))
        .await
        .unwrap();
    let model = Arc::new(MockLanguageModel::new("mock").with_response(json!({
        "totalScore": 82,
        "categoryScores": {
            "Communication Skills": 85,
            "Technical Knowledge": 80,
            "Problem-Solving": 84,
            "Cultural & Role Fit": 78,
            "Confidence & Clarity": 83
        },
        "strengths": ["Systematic debugging"],
        "areasForImprovement": ["Quantify impact"],
        "finalAssessment": "Strong candidate."
    })));
    let pipeline = Arc::new(FeedbackPipeline::new(model, store.clone()));

    let transport = Arc::new(ScriptedTransport::new().acknowledging());
    let mut agent = CallAgent::new(
        transport.clone(),
        pipeline,
        interview(Some("f1")),
        workflow_settings(),
    );
    agent.start().await.unwrap();
    transport.emit(final_msg(Role::Assistant, "Describe a hard bug you fixed."));
    transport.emit(final_msg(Role::User, "A race in our cache."));
    transport.emit(TransportEvent::CallEnd);

    let outcome = agent.run().await;

    assert_eq!(
        outcome.navigation,
        Navigation::Feedback {
            interview_id: "i1".to_string(),
            feedback_id: "f1".to_string(),
        }
    );
    assert_eq!(store.count(FEEDBACK_COLLECTION), 1);
    let saved = get_feedback_by_id(store.as_ref(), "f1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.data.assessment.total_score, 82.0);
    assert_eq!(saved.data.user_id, "u1");
}

#[tokio::test]
async fn replayed_event_log_drives_a_full_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.jsonl");
    std::fs::write(
        &path,
        concat!(
            "# recorded setup call\n",
            "{\"event\":\"call-start\"}\n",
            "{\"event\":\"speech-start\"}\n",
            "{\"event\":\"message\",\"type\":\"transcript\",\"role\":\"assistant\",\"transcriptType\":\"partial\",\"transcript\":\"Hel\"}\n",
            "{\"event\":\"message\",\"type\":\"transcript\",\"role\":\"assistant\",\"transcriptType\":\"final\",\"transcript\":\"Hello Ada\"}\n",
            "{\"event\":\"speech-end\"}\n",
            "{\"event\":\"message\",\"type\":\"transcript\",\"role\":\"user\",\"transcriptType\":\"final\",\"transcript\":\"Hi\"}\n",
            "{\"event\":\"call-end\"}\n",
        ),
    )
    .unwrap();

    let transport = Arc::new(ReplayTransport::from_path(&path, Duration::ZERO).unwrap());
    let feedback = Arc::new(MockFeedbackService::new());
    let mut agent = CallAgent::new(transport, feedback.clone(), generate(), workflow_settings());

    agent.start().await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), agent.run())
        .await
        .unwrap();

    assert_eq!(outcome.status, CallStatus::Finished);
    assert_eq!(
        outcome.transcript,
        vec![
            TranscriptEntry::new(Role::Assistant, "Hello Ada"),
            TranscriptEntry::new(Role::User, "Hi"),
        ]
    );
    assert!(!agent.is_speaking());
    assert!(feedback.requests().is_empty());
}

#[tokio::test]
async fn replayed_log_without_call_end_still_finishes() {
    let events = vec![
        TransportEvent::CallStart,
        final_msg(Role::Assistant, "Tell me about yourself."),
    ];
    let transport = Arc::new(ReplayTransport::new(events, Duration::ZERO));
    let mut agent = CallAgent::new(
        transport,
        Arc::new(MockFeedbackService::new()),
        generate(),
        workflow_settings(),
    );

    agent.start().await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), agent.run())
        .await
        .unwrap();

    assert_eq!(outcome.status, CallStatus::Finished);
    assert_eq!(outcome.transcript.len(), 1);
}
