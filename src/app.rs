//! Application entry points behind the CLI.
//!
//! Wires config, storage, the language model and the call agent together:
//! replay events → drive the call → score the transcript → store feedback

use crate::call::{
    CallAgent, CallPurpose, CallSettings, Camera, ConnectivityWatcher, DeviceCamera, NoCamera,
    Navigation,
};
use crate::cli::{CallArgs, FeedbackAction, InterviewsAction};
use crate::config::Config;
use crate::defaults::INTERVIEWS_COLLECTION;
use crate::error::{PrepcallError, Result};
use crate::feedback::{
    FeedbackPipeline, FeedbackRequest, FeedbackResponse, FeedbackService, LanguageModel,
};
use crate::output::{
    StderrNotifier, format_feedback, format_interview, format_interview_line, format_outcome,
};
use crate::store::{
    DocumentStore, FileStore, NewInterview, complete_interview, create_interview,
    finalize_interview, get_feedback_by_interview_id, get_interview_by_id,
    get_interviews_by_user_id, get_latest_interviews,
};
use crate::transcript::TranscriptEntry;
use crate::transport::ReplayTransport;
use std::path::Path;
use std::sync::Arc;

/// Open the document store configured under `[storage]`.
pub fn build_store(config: &Config) -> Arc<dyn DocumentStore> {
    let root = config.storage.resolved_data_dir();
    log::debug!("document store at {}", root.display());
    Arc::new(FileStore::new(root))
}

/// Build the language model used for scoring.
#[cfg(feature = "gemini")]
pub fn build_model(config: &Config) -> Result<Arc<dyn LanguageModel>> {
    let client = crate::feedback::GeminiClient::from_config(&config.feedback)?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "gemini"))]
pub fn build_model(_config: &Config) -> Result<Arc<dyn LanguageModel>> {
    Err(PrepcallError::Other(
        "built without the gemini feature; no language model available".to_string(),
    ))
}

/// Feedback service for setup calls, which never request feedback.
struct FeedbackDisabled;

#[async_trait::async_trait]
impl FeedbackService for FeedbackDisabled {
    async fn create_feedback(&self, request: FeedbackRequest) -> FeedbackResponse {
        log::error!(
            "feedback requested for {} but no model is configured",
            request.interview_id
        );
        FeedbackResponse::failed()
    }
}

/// Resolve what the call is for, loading the interview when one is named.
async fn resolve_purpose(store: &dyn DocumentStore, args: &CallArgs) -> Result<CallPurpose> {
    let Some(interview_id) = args.interview.as_deref() else {
        return Ok(CallPurpose::Generate {
            user_name: args.user_name.clone(),
            user_id: args.user.clone(),
        });
    };

    let record = get_interview_by_id(store, interview_id)
        .await?
        .ok_or_else(|| PrepcallError::DocumentNotFound {
            collection: INTERVIEWS_COLLECTION.to_string(),
            id: interview_id.to_string(),
        })?;
    if !record.data.finalized {
        return Err(PrepcallError::Other(format!(
            "interview {interview_id} has no questions yet; run `prepcall interviews finalize` first"
        )));
    }

    Ok(CallPurpose::Interview {
        interview_id: record.id,
        user_id: args.user.clone(),
        questions: record.data.questions,
        feedback_id: args.feedback_id.clone(),
    })
}

/// Run a call against a recorded event log and report the outcome.
///
/// Returns an error only when the call could not be set up; problems
/// during the call are shown as notices.
pub async fn run_call_command(config: Config, args: CallArgs, quiet: bool) -> Result<()> {
    let store = build_store(&config);
    let purpose = resolve_purpose(store.as_ref(), &args).await?;

    let mut settings = CallSettings::from_config(&config);
    if let Some(workflow) = &args.workflow {
        settings.workflow_id = Some(workflow.clone());
    }

    // Setup calls never score anything, so a missing API key is fine there.
    let feedback: Arc<dyn FeedbackService> = if purpose.is_interview() {
        let model = build_model(&config)?;
        Arc::new(FeedbackPipeline::new(model, store.clone()))
    } else {
        Arc::new(FeedbackDisabled)
    };

    let transport = Arc::new(ReplayTransport::from_path(&args.events, args.pace)?);
    log::info!(
        "replaying {} events from {}",
        transport.len(),
        args.events.display()
    );

    let camera: Box<dyn Camera> = match &args.camera {
        Some(path) => Box::new(DeviceCamera::new(path)),
        None => Box::new(NoCamera),
    };

    let mut agent = CallAgent::new(transport, feedback, purpose, settings)
        .with_notifier(Arc::new(StderrNotifier { quiet }))
        .with_camera(camera);

    let _watcher = (config.network.watch && !args.no_watch)
        .then(|| ConnectivityWatcher::from_config(&config.network).spawn(agent.signal_sender()));

    let control = agent.control();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, ending call");
            if !control.end_call().await {
                log::debug!("call already gone");
            }
        }
    });

    if agent.start().await.is_err() {
        interrupt.abort();
        return Err(PrepcallError::Other("call could not be started".to_string()));
    }
    if args.video && !agent.toggle_video() {
        log::warn!("continuing without video");
    }

    let outcome = agent.run().await;
    interrupt.abort();

    if let Navigation::Feedback { interview_id, .. } = &outcome.navigation {
        complete_interview(store.as_ref(), interview_id).await?;
    }

    if !quiet {
        print!("{}", format_outcome(&outcome, &args.user));
    }
    Ok(())
}

fn read_transcript(path: &Path) -> Result<Vec<TranscriptEntry>> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| PrepcallError::Other(format!(
        "{} is not a transcript (expected a JSON array of {{role, content}}): {e}",
        path.display()
    )))
}

/// Handle `prepcall feedback ...`.
pub async fn run_feedback_command(config: Config, action: FeedbackAction) -> Result<()> {
    let store = build_store(&config);
    match action {
        FeedbackAction::Generate {
            interview,
            user,
            transcript,
            feedback_id,
        } => {
            let transcript = read_transcript(&transcript)?;
            let pipeline = FeedbackPipeline::new(build_model(&config)?, store);
            let request = FeedbackRequest {
                interview_id: interview,
                user_id: user,
                transcript,
                feedback_id,
            };
            let id = pipeline.generate_feedback(&request).await?;
            println!("{}", id);
        }
        FeedbackAction::Show {
            interview,
            user,
            json,
        } => match get_feedback_by_interview_id(store.as_ref(), &interview, &user).await? {
            Some(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
            Some(record) => print!("{}", format_feedback(&record)),
            None => {
                eprintln!("No feedback for interview {} and user {}", interview, user);
                std::process::exit(1);
            }
        },
    }
    Ok(())
}

/// Handle `prepcall interviews ...`.
pub async fn run_interviews_command(config: Config, action: InterviewsAction) -> Result<()> {
    let store = build_store(&config);
    match action {
        InterviewsAction::Create {
            user,
            kind,
            role,
            techstack,
            questions,
        } => {
            let new = NewInterview {
                user_id: user,
                kind,
                role,
                techstack: techstack
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
                questions,
            };
            let id = create_interview(store.as_ref(), new).await?;
            println!("{}", id);
        }
        InterviewsAction::Finalize { id, questions } => {
            finalize_interview(store.as_ref(), &id, questions).await?;
            println!("Interview {} is ready", id);
        }
        InterviewsAction::List { user } => {
            let interviews = get_interviews_by_user_id(store.as_ref(), &user).await?;
            if interviews.is_empty() {
                println!("No interviews for {}", user);
            }
            for record in &interviews {
                println!("{}", format_interview_line(record));
            }
        }
        InterviewsAction::Latest { user, limit } => {
            for record in &get_latest_interviews(store.as_ref(), &user, limit).await? {
                println!("{}", format_interview_line(record));
            }
        }
        InterviewsAction::Show { id } => match get_interview_by_id(store.as_ref(), &id).await? {
            Some(record) => print!("{}", format_interview(&record)),
            None => {
                return Err(PrepcallError::DocumentNotFound {
                    collection: INTERVIEWS_COLLECTION.to_string(),
                    id,
                });
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::path::PathBuf;
    use std::time::Duration;

    fn args(interview: Option<&str>) -> CallArgs {
        CallArgs {
            events: PathBuf::from("events.jsonl"),
            user: "u2".to_string(),
            user_name: "Ada".to_string(),
            interview: interview.map(str::to_string),
            feedback_id: None,
            workflow: None,
            pace: Duration::ZERO,
            camera: None,
            video: false,
            no_watch: true,
        }
    }

    #[tokio::test]
    async fn test_resolve_generate_purpose() {
        let store = MemoryStore::new();
        let purpose = resolve_purpose(&store, &args(None)).await.unwrap();
        assert_eq!(
            purpose,
            CallPurpose::Generate {
                user_name: "Ada".to_string(),
                user_id: "u2".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_resolve_interview_purpose() {
        let store = MemoryStore::new();
        let id = create_interview(
            &store,
            NewInterview {
                user_id: "u1".to_string(),
                kind: "technical".to_string(),
                role: "SRE".to_string(),
                techstack: vec![],
                questions: vec!["What is an SLO?".to_string()],
            },
        )
        .await
        .unwrap();

        let purpose = resolve_purpose(&store, &args(Some(&id))).await.unwrap();
        match purpose {
            CallPurpose::Interview {
                interview_id,
                user_id,
                questions,
                feedback_id,
            } => {
                assert_eq!(interview_id, id);
                assert_eq!(user_id, "u2");
                assert_eq!(questions, vec!["What is an SLO?".to_string()]);
                assert!(feedback_id.is_none());
            }
            other => panic!("Expected interview purpose, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_rejects_missing_or_draft_interview() {
        let store = MemoryStore::new();
        assert!(matches!(
            resolve_purpose(&store, &args(Some("nope"))).await,
            Err(PrepcallError::DocumentNotFound { .. })
        ));

        let draft = create_interview(
            &store,
            NewInterview {
                user_id: "u1".to_string(),
                kind: "behavioral".to_string(),
                role: "PM".to_string(),
                ..NewInterview::default()
            },
        )
        .await
        .unwrap();
        assert!(matches!(
            resolve_purpose(&store, &args(Some(&draft))).await,
            Err(PrepcallError::Other(_))
        ));
    }

    #[test]
    fn test_read_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(
            &path,
            r#"[{"role":"assistant","content":"Hi"},{"role":"user","content":"Hello"}]"#,
        )
        .unwrap();
        let transcript = read_transcript(&path).unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].content, "Hello");

        std::fs::write(&path, "not json").unwrap();
        assert!(read_transcript(&path).is_err());
    }

    #[tokio::test]
    async fn test_disabled_feedback_reports_failure() {
        let response = FeedbackDisabled
            .create_feedback(FeedbackRequest {
                interview_id: "i1".to_string(),
                user_id: "u1".to_string(),
                transcript: vec![],
                feedback_id: None,
            })
            .await;
        assert!(!response.success);
    }
}
