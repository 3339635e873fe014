use thiserror::Error;

use action_parser::ParseError;
use memory_center::MemoryError;

/// Errors emitted by the agent-core crate.
///
/// Parse errors are NOT represented here: a malformed model reply costs an
/// iteration inside the loop instead of aborting the run. Everything below is
/// fatal to the run that raised it.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A model call failed at the transport or API level.
    #[error("model call failed: {0}")]
    Model(String),

    /// A browser operation failed in a way the loop cannot recover from.
    #[error("browser operation failed: {0}")]
    Browser(String),

    /// The model returned something structurally unusable outside the
    /// per-iteration decision path (planner, judge).
    #[error("unusable model response: {0}")]
    InvalidResponse(String),

    /// Episode recording failed; losing memory writes is fatal.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

impl AgentError {
    /// Helper for model transport failures.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model(message.into())
    }

    /// Helper for browser-side failures.
    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser(message.into())
    }

    /// Helper for structurally unusable responses.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

// ParseError converts for callers that want to surface a parse failure as a
// run abort (the loop itself never does).
impl From<ParseError> for AgentError {
    fn from(err: ParseError) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
