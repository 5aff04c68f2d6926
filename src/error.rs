use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure fetching or reading one page. Always recovered per URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0} not set")]
    MissingApiKey(&'static str),

    #[error("search API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("search timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("failed to parse search response: {0}")]
    Parse(String),
}

/// Fatal for the action that issued the prompt. Serializable so the research
/// workflow can hand it back through its context.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set; export it or add it to .env")]
    MissingApiKey,

    #[error("language model request failed: {0}")]
    Request(String),

    #[error("language model returned an empty completion")]
    EmptyCompletion,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active research session; run a search first")]
    NoActiveSession,

    #[error("refusing to start a session without a summary")]
    EmptySummary,

    #[error("session file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

/// Outcome taxonomy for one user action.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("nothing to summarize: {0}")]
    NothingToSummarize(String),

    #[error("no active research session; search for a topic first")]
    NoActiveSession,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Session(SessionError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("research workflow failed: {0}")]
    Pipeline(String),

    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SessionError> for AssistantError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoActiveSession => AssistantError::NoActiveSession,
            other => AssistantError::Session(other),
        }
    }
}

pub type AssistantResult<T> = Result<T, AssistantError>;
