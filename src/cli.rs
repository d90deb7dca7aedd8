//! Command-line interface for prepcall
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Voice mock interviews with scored feedback
#[derive(Parser, Debug)]
#[command(
    name = "prepcall",
    version,
    about = "Voice mock interviews with scored feedback"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a pacing duration.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`250ms`, `1s`, `1m30s`).
fn parse_pace(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a call by replaying a recorded transport event log
    Call(CallArgs),

    /// Generate or inspect interview feedback
    Feedback {
        #[command(subcommand)]
        action: FeedbackAction,
    },

    /// Manage stored interviews
    Interviews {
        #[command(subcommand)]
        action: InterviewsAction,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
pub struct CallArgs {
    /// Recorded transport events, one JSON object per line
    #[arg(long, value_name = "FILE")]
    pub events: PathBuf,

    /// User placing the call
    #[arg(long, value_name = "ID")]
    pub user: String,

    /// Display name passed to the setup workflow
    #[arg(long, value_name = "NAME", default_value = "Candidate")]
    pub user_name: String,

    /// Run a stored interview instead of the setup workflow
    #[arg(long, value_name = "ID")]
    pub interview: Option<String>,

    /// Overwrite this feedback record instead of creating a new one
    #[arg(long, value_name = "ID", requires = "interview")]
    pub feedback_id: Option<String>,

    /// Workflow id for setup calls (overrides call.workflow_id)
    #[arg(long, value_name = "ID", conflicts_with = "interview")]
    pub workflow: Option<String>,

    /// Delay before each replayed event (e.g. 250ms, 1s)
    #[arg(long, value_name = "DURATION", default_value = "0", value_parser = parse_pace)]
    pub pace: Duration,

    /// Video device to open when video is toggled on
    #[arg(long, value_name = "PATH")]
    pub camera: Option<PathBuf>,

    /// Start with video on
    #[arg(long, requires = "camera")]
    pub video: bool,

    /// Do not watch network connectivity during the call
    #[arg(long)]
    pub no_watch: bool,
}

/// Feedback actions
#[derive(Subcommand, Debug)]
pub enum FeedbackAction {
    /// Score a transcript file and store the report
    Generate {
        /// Interview the transcript belongs to
        #[arg(long, value_name = "ID")]
        interview: String,
        /// Candidate user id
        #[arg(long, value_name = "ID")]
        user: String,
        /// JSON array of {role, content} entries
        #[arg(long, value_name = "FILE")]
        transcript: PathBuf,
        /// Overwrite this feedback record
        #[arg(long, value_name = "ID")]
        feedback_id: Option<String>,
    },
    /// Show stored feedback for an interview
    Show {
        /// Interview id
        #[arg(long, value_name = "ID")]
        interview: String,
        /// Candidate user id
        #[arg(long, value_name = "ID")]
        user: String,
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
}

/// Interview actions
#[derive(Subcommand, Debug)]
pub enum InterviewsAction {
    /// Create an interview
    Create {
        /// Owner user id
        #[arg(long, value_name = "ID")]
        user: String,
        /// Interview type (e.g. technical, behavioral, mixed)
        #[arg(long = "type", value_name = "TYPE", default_value = "technical")]
        kind: String,
        /// Job role (e.g. "Backend Engineer")
        #[arg(long, value_name = "ROLE")]
        role: String,
        /// Technologies, comma-separated
        #[arg(long, value_name = "LIST", value_delimiter = ',')]
        techstack: Vec<String>,
        /// Prepared question (repeatable); interviews with questions are ready to take
        #[arg(long = "question", short = 'Q', value_name = "TEXT")]
        questions: Vec<String>,
    },
    /// Attach questions to an interview and mark it ready
    Finalize {
        /// Interview id
        id: String,
        /// Prepared question (repeatable)
        #[arg(long = "question", short = 'Q', value_name = "TEXT", required = true)]
        questions: Vec<String>,
    },
    /// List a user's interviews, newest first
    List {
        /// Owner user id
        #[arg(long, value_name = "ID")]
        user: String,
    },
    /// List ready interviews from other users, newest first
    Latest {
        /// Exclude this user's interviews
        #[arg(long, value_name = "ID")]
        user: String,
        /// Maximum number of interviews
        #[arg(long, short = 'n', value_name = "N", default_value_t = crate::defaults::LATEST_INTERVIEWS_LIMIT)]
        limit: usize,
    },
    /// Show one interview
    Show {
        /// Interview id
        id: String,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value by key (e.g., call.workflow_id)
    Get {
        /// Dotted key path (e.g., call.workflow_id, feedback.model)
        key: String,
    },
    /// Set a configuration value by key
    Set {
        /// Dotted key path (e.g., call.workflow_id, feedback.model)
        key: String,
        /// Value to set
        value: String,
    },
    /// List current configuration values (optionally one section)
    List {
        /// Config section to show (e.g., call, feedback, network)
        key: Option<String>,
    },
    /// Dump the default configuration
    Dump,
    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_minimal() {
        let cli =
            Cli::try_parse_from(["prepcall", "call", "--events", "log.jsonl", "--user", "u1"])
                .unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.events, PathBuf::from("log.jsonl"));
                assert_eq!(args.user, "u1");
                assert_eq!(args.user_name, "Candidate");
                assert!(args.interview.is_none());
                assert_eq!(args.pace, Duration::ZERO);
                assert!(!args.no_watch);
                assert!(!args.video);
            }
            _ => panic!("Expected Call command"),
        }
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 0);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_call_interview() {
        let cli = Cli::try_parse_from([
            "prepcall",
            "call",
            "--events",
            "log.jsonl",
            "--user",
            "u1",
            "--interview",
            "i1",
            "--feedback-id",
            "f1",
            "--pace",
            "250ms",
            "--no-watch",
        ])
        .unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.interview.as_deref(), Some("i1"));
                assert_eq!(args.feedback_id.as_deref(), Some("f1"));
                assert_eq!(args.pace, Duration::from_millis(250));
                assert!(args.no_watch);
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_call_feedback_id_requires_interview() {
        let result = Cli::try_parse_from([
            "prepcall",
            "call",
            "--events",
            "e",
            "--user",
            "u1",
            "--feedback-id",
            "f1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_call_workflow_conflicts_with_interview() {
        let result = Cli::try_parse_from([
            "prepcall",
            "call",
            "--events",
            "e",
            "--user",
            "u1",
            "--interview",
            "i1",
            "--workflow",
            "w1",
        ]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ArgumentConflict
        );
    }

    #[test]
    fn test_call_video_requires_camera() {
        let result = Cli::try_parse_from([
            "prepcall", "call", "--events", "e", "--user", "u1", "--video",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_pace() {
        assert_eq!(parse_pace("0"), Ok(Duration::ZERO));
        assert_eq!(parse_pace("1500"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_pace("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_pace(" 1m30s "), Ok(Duration::from_secs(90)));
        assert!(parse_pace("soon").is_err());
    }

    #[test]
    fn test_parse_verbose_double() {
        let cli = Cli::try_parse_from(["prepcall", "-vv", "config", "path"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_global_options_after_command() {
        let cli = Cli::try_parse_from([
            "prepcall",
            "config",
            "path",
            "-q",
            "--config",
            "/tmp/p.toml",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/p.toml")));
    }

    #[test]
    fn test_command_is_required() {
        let result = Cli::try_parse_from(["prepcall"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_command_returns_error() {
        let result = Cli::try_parse_from(["prepcall", "invalid"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["prepcall", "--version"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_parse_feedback_generate() {
        let cli = Cli::try_parse_from([
            "prepcall",
            "feedback",
            "generate",
            "--interview",
            "i1",
            "--user",
            "u1",
            "--transcript",
            "t.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Feedback {
                action:
                    FeedbackAction::Generate {
                        interview,
                        user,
                        transcript,
                        feedback_id,
                    },
            } => {
                assert_eq!(interview, "i1");
                assert_eq!(user, "u1");
                assert_eq!(transcript, PathBuf::from("t.json"));
                assert!(feedback_id.is_none());
            }
            _ => panic!("Expected Feedback Generate"),
        }
    }

    #[test]
    fn test_parse_interviews_create() {
        let cli = Cli::try_parse_from([
            "prepcall",
            "interviews",
            "create",
            "--user",
            "u1",
            "--role",
            "Backend Engineer",
            "--techstack",
            "rust,postgres",
            "-Q",
            "Why Rust?",
            "--question",
            "What is Send?",
        ])
        .unwrap();
        match cli.command {
            Commands::Interviews {
                action:
                    InterviewsAction::Create {
                        user,
                        kind,
                        role,
                        techstack,
                        questions,
                    },
            } => {
                assert_eq!(user, "u1");
                assert_eq!(kind, "technical");
                assert_eq!(role, "Backend Engineer");
                assert_eq!(techstack, vec!["rust".to_string(), "postgres".to_string()]);
                assert_eq!(questions.len(), 2);
            }
            _ => panic!("Expected Interviews Create"),
        }
    }

    #[test]
    fn test_parse_interviews_latest_default_limit() {
        let cli =
            Cli::try_parse_from(["prepcall", "interviews", "latest", "--user", "u1"]).unwrap();
        match cli.command {
            Commands::Interviews {
                action: InterviewsAction::Latest { user, limit },
            } => {
                assert_eq!(user, "u1");
                assert_eq!(limit, 20);
            }
            _ => panic!("Expected Interviews Latest"),
        }
    }

    #[test]
    fn test_finalize_requires_question() {
        let result = Cli::try_parse_from(["prepcall", "interviews", "finalize", "i1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["prepcall", "config", "set", "feedback.model", "gemini-x"])
            .unwrap();
        match cli.command {
            Commands::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "feedback.model");
                assert_eq!(value, "gemini-x");
            }
            _ => panic!("Expected Config Set"),
        }
    }

    #[test]
    fn test_config_requires_subcommand() {
        let result = Cli::try_parse_from(["prepcall", "config"]);
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_parse_completions() {
        let cli = Cli::try_parse_from(["prepcall", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
