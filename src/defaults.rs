//! Default configuration constants for prepcall.
//!
//! Shared between the config types, the CLI and the runtime so the same
//! value is never spelled twice.

/// Seconds a call may stay in `Connecting` before it is abandoned.
///
/// The transport acknowledges a start with `call-start`; a stalled
/// acknowledgment is treated as a transport error once this elapses.
/// Zero disables the bound.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default language model used to score interviews.
pub const FEEDBACK_MODEL: &str = "gemini-2.0-flash-001";

/// Base URL of the Gemini REST API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the Gemini API key.
///
/// Same name the Google AI SDK reads, so existing deployments keep working.
pub const GEMINI_API_KEY_ENV: &str = "GOOGLE_GENERATIVE_AI_API_KEY";

/// Timeout for a single language model request, in seconds.
pub const MODEL_TIMEOUT_SECS: u64 = 60;

/// Endpoint probed by the connectivity watcher.
pub const NETWORK_PROBE_ADDR: &str = "1.1.1.1:443";

/// Interval between connectivity probes, in milliseconds.
pub const NETWORK_PROBE_INTERVAL_MS: u64 = 2000;

/// Timeout of a single connectivity probe, in milliseconds.
pub const NETWORK_PROBE_TIMEOUT_MS: u64 = 1500;

/// Default page size for `latest interviews` listings.
pub const LATEST_INTERVIEWS_LIMIT: usize = 20;

/// Capacity of the environment signal and user action channels.
pub const CONTROL_CHANNEL_CAPACITY: usize = 32;

/// Collection names in the document store.
pub const INTERVIEWS_COLLECTION: &str = "interviews";
pub const FEEDBACK_COLLECTION: &str = "feedback";

/// Name the interviewer persona introduces itself with.
pub const INTERVIEWER_NAME: &str = "Interviewer";

/// Opening line of the interviewer persona.
pub const INTERVIEWER_FIRST_MESSAGE: &str = "Hello! Thank you for taking the time to speak with me today. I'm excited to learn more about you and your experience.";

/// System prompt of the interviewer persona.
///
/// `{{questions}}` is substituted by the transport from the call variables.
pub const INTERVIEWER_SYSTEM_PROMPT: &str = "You are a professional job interviewer conducting a real-time voice interview with a candidate. Your goal is to assess their qualifications, motivation, and fit for the role.

Interview Guidelines:
Follow the structured question flow:
{{questions}}

Engage naturally and react appropriately:
- Listen actively to responses and acknowledge them before moving forward.
- Ask brief follow-up questions if a response is vague or requires more detail.
- Keep the conversation flowing smoothly while maintaining control.

Be professional, yet warm and welcoming. Keep all your responses short and simple, this is a voice conversation.

Conclude the interview properly: thank the candidate for their time and inform them that the company will reach out soon with feedback.";
